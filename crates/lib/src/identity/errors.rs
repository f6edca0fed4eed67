//! Error types for account identity parsing.

use thiserror::Error;

use crate::Error;

/// Errors that can occur while parsing a `user@host` specification.
///
/// None of these errors involve the cluster; they are raised before any statement runs.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The user name is empty or consists only of whitespace.
    #[error("User name must not be empty: '{input}'")]
    EmptyUser {
        /// The raw account specification
        input: String,
    },

    /// A host follows the `@` but consists only of whitespace.
    #[error("Host name must not be blank: '{input}'")]
    BlankHost {
        /// The raw account specification
        input: String,
    },

    /// A quoted segment is not terminated.
    #[error("Invalid syntax in account name '{input}': unterminated quote")]
    UnterminatedQuote {
        /// The raw account specification
        input: String,
    },

    /// An unquoted `@` appears in a position that makes the split ambiguous.
    #[error(
        "Invalid account name '{input}': '@' in a user name must be quoted, e.g. 'user@domain'@host"
    )]
    UnquotedSeparator {
        /// The raw account specification
        input: String,
    },

    /// Characters outside of any valid account name syntax.
    #[error("Invalid syntax in account name '{input}': {reason}")]
    InvalidSyntax {
        /// The raw account specification
        input: String,
        /// What was wrong with it
        reason: &'static str,
    },

    /// A segment exceeds the server's account name limits.
    #[error("{part} '{value}' is too long ({length} characters, maximum is {max})")]
    TooLong {
        /// Which segment, `User name` or `Host name`
        part: &'static str,
        /// The offending segment
        value: String,
        /// Its length in characters
        length: usize,
        /// The server limit
        max: usize,
    },
}

impl IdentityError {
    /// The raw specification that failed to parse, when it is recorded.
    pub fn input(&self) -> Option<&str> {
        match self {
            IdentityError::EmptyUser { input }
            | IdentityError::BlankHost { input }
            | IdentityError::UnterminatedQuote { input }
            | IdentityError::UnquotedSeparator { input }
            | IdentityError::InvalidSyntax { input, .. } => Some(input),
            IdentityError::TooLong { .. } => None,
        }
    }
}

impl From<IdentityError> for Error {
    fn from(err: IdentityError) -> Self {
        Error::Identity(err)
    }
}
