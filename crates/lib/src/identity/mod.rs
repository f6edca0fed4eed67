//! Account identity parsing
//!
//! Turns a combined `user@host` specification into an [`AccountIdentity`]. Either segment may be
//! quoted with `'`, `"` or `` ` `` to embed characters that would otherwise split the
//! specification, most notably `@` inside user names:
//!
//! ```
//! use accord::identity::parse;
//!
//! let id = parse("'svc@corp'@10.0.0.%").unwrap();
//! assert_eq!(id.user(), "svc@corp");
//! assert_eq!(id.host(), "10.0.0.%");
//!
//! // Without a host the account matches any host
//! let id = parse("router").unwrap();
//! assert_eq!(id.host(), "%");
//! assert_eq!(id.to_string(), "'router'@'%'");
//! ```

pub mod errors;

use std::fmt;
use std::str::FromStr;

pub use errors::IdentityError;

use crate::Result;
use crate::sql::quote_string;

/// Host pattern used when the specification names no host.
pub const DEFAULT_HOST: &str = "%";

/// Longest user name the server accepts, in characters.
pub const MAX_USER_LENGTH: usize = 32;

/// Longest host name the server accepts, in characters.
pub const MAX_HOST_LENGTH: usize = 255;

/// A normalized account identity: user name plus host pattern.
///
/// Built once per provisioning call and never modified afterwards. `Display` renders the quoted
/// `'user'@'host'` form used in statements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountIdentity {
    user: String,
    host: String,
}

impl AccountIdentity {
    /// Create an identity from already split parts.
    ///
    /// An empty host selects [`DEFAULT_HOST`]. The same emptiness and length rules as
    /// [`parse`] apply.
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Result<Self> {
        let user = user.into();
        let host = host.into();
        let input = format!("{user}@{host}");
        let host = if host.is_empty() {
            DEFAULT_HOST.to_string()
        } else if host.trim().is_empty() {
            return Err(IdentityError::BlankHost { input }.into());
        } else {
            host
        };
        if user.trim().is_empty() {
            return Err(IdentityError::EmptyUser { input }.into());
        }
        check_parts(&input, &user, &host)?;
        Ok(Self { user, host })
    }

    /// The user name, unquoted.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The host pattern, unquoted.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The grantee string as reported by the `information_schema` privilege views.
    pub fn grantee(&self) -> String {
        format!("'{}'@'{}'", self.user, self.host)
    }
}

impl fmt::Display for AccountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", quote_string(&self.user), quote_string(&self.host))
    }
}

impl FromStr for AccountIdentity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

/// One `@`-delimited piece of the raw specification.
#[derive(Debug)]
enum Segment {
    /// Quoted literal; content kept verbatim
    Quoted(String),
    /// Unquoted text, trimmed; `blank` records that whitespace was present before trimming
    Bare { text: String, blank: bool },
}

#[derive(Default)]
struct SegmentBuilder {
    bare: String,
    quoted: Option<String>,
}

impl SegmentBuilder {
    fn finish(self) -> Segment {
        match self.quoted {
            Some(text) => Segment::Quoted(text),
            None => {
                let text = self.bare.trim().to_string();
                let blank = text.is_empty() && !self.bare.is_empty();
                Segment::Bare { text, blank }
            }
        }
    }
}

/// Parse a `user@host` specification.
///
/// The split happens on the unquoted `@`. Unquoted segments are trimmed, quoted ones are kept
/// verbatim. A missing host, or an `@` with nothing after it, selects [`DEFAULT_HOST`]; a host
/// made only of whitespace is rejected, as is any user name that is empty or blank.
pub fn parse(raw: &str) -> Result<AccountIdentity> {
    let segments = split_segments(raw)?;

    let mut segments = segments.into_iter();
    let user = match segments.next() {
        Some(Segment::Quoted(text)) if !text.trim().is_empty() => text,
        Some(Segment::Bare { text, .. }) if !text.is_empty() => text,
        _ => return Err(IdentityError::EmptyUser { input: raw.to_string() }.into()),
    };

    let host = match segments.next() {
        None => DEFAULT_HOST.to_string(),
        Some(Segment::Quoted(text)) if text.is_empty() => DEFAULT_HOST.to_string(),
        Some(Segment::Quoted(text)) if text.trim().is_empty() => {
            return Err(IdentityError::BlankHost { input: raw.to_string() }.into());
        }
        Some(Segment::Quoted(text)) => text,
        Some(Segment::Bare { blank: true, .. }) => {
            return Err(IdentityError::BlankHost { input: raw.to_string() }.into());
        }
        Some(Segment::Bare { text, .. }) if text.is_empty() => DEFAULT_HOST.to_string(),
        Some(Segment::Bare { text, .. }) => text,
    };

    if segments.next().is_some() {
        return Err(IdentityError::UnquotedSeparator { input: raw.to_string() }.into());
    }

    check_parts(raw, &user, &host)?;
    Ok(AccountIdentity { user, host })
}

fn split_segments(raw: &str) -> Result<Vec<Segment>> {
    let invalid = |reason| IdentityError::InvalidSyntax {
        input: raw.to_string(),
        reason,
    };

    let mut segments = Vec::new();
    let mut current = SegmentBuilder::default();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                if current.quoted.is_some() || !current.bare.trim().is_empty() {
                    return Err(invalid("quotes must enclose a whole user or host name").into());
                }
                current.quoted = Some(read_quoted(raw, c, &mut chars)?);
                current.bare.clear();
            }
            '@' => segments.push(std::mem::take(&mut current).finish()),
            c if c.is_whitespace() => current.bare.push(c),
            c => {
                if current.quoted.is_some() {
                    return Err(invalid("unexpected characters after a quoted name").into());
                }
                current.bare.push(c);
            }
        }
    }
    segments.push(current.finish());

    if segments.len() > 2 {
        return Err(IdentityError::UnquotedSeparator { input: raw.to_string() }.into());
    }
    Ok(segments)
}

/// Read a quoted literal whose opening quote has been consumed.
///
/// A doubled quote character stands for itself; inside `'` and `"` a backslash escapes the next
/// character.
fn read_quoted(raw: &str, quote: char, chars: &mut std::str::Chars<'_>) -> Result<String> {
    let mut text = String::new();
    loop {
        match chars.next() {
            None => return Err(IdentityError::UnterminatedQuote { input: raw.to_string() }.into()),
            Some('\\') if quote != '`' => match chars.next() {
                Some(escaped) => text.push(escaped),
                None => {
                    return Err(IdentityError::UnterminatedQuote { input: raw.to_string() }.into());
                }
            },
            Some(c) if c == quote => {
                if chars.as_str().starts_with(quote) {
                    chars.next();
                    text.push(quote);
                } else {
                    return Ok(text);
                }
            }
            Some(c) => text.push(c),
        }
    }
}

fn check_parts(input: &str, user: &str, host: &str) -> Result<()> {
    if user.chars().chain(host.chars()).any(char::is_control) {
        return Err(IdentityError::InvalidSyntax {
            input: input.to_string(),
            reason: "control characters are not allowed",
        }
        .into());
    }
    for (part, value, max) in [
        ("User name", user, MAX_USER_LENGTH),
        ("Host name", host, MAX_HOST_LENGTH),
    ] {
        let length = value.chars().count();
        if length > max {
            return Err(IdentityError::TooLong {
                part,
                value: value.to_string(),
                length,
                max,
            }
            .into());
        }
    }
    Ok(())
}
