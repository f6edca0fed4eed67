//! Provisioning option validation
//!
//! Callers hand over a loosely typed option map, the way the cluster shell's scripting API
//! receives it. [`validate`] type-checks every entry and produces [`ProvisioningOptions`], in
//! which the "not given" and "explicitly empty" cases stay distinct:
//!
//! ```
//! use accord::options::{OptionValue, PasswordExpiration, validate_value};
//!
//! let raw = serde_json::json!({"requireCertSubject": "", "passwordExpiration": "never"});
//! let options = validate_value(&raw).unwrap();
//! assert_eq!(options.require_cert_subject, OptionValue::Clear);
//! assert_eq!(options.require_cert_issuer, OptionValue::Absent);
//! assert_eq!(options.password_expiration, Some(PasswordExpiration::Never));
//! ```

pub mod errors;

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use zeroize::Zeroizing;

pub use errors::OptionsError;

use crate::Result;

/// Option name for the account password.
pub const PASSWORD: &str = "password";
/// Option name for the update flag.
pub const UPDATE: &str = "update";
/// Option name for the dry-run flag.
pub const DRY_RUN: &str = "dryRun";
/// Option name for the required certificate issuer.
pub const REQUIRE_CERT_ISSUER: &str = "requireCertIssuer";
/// Option name for the required certificate subject.
pub const REQUIRE_CERT_SUBJECT: &str = "requireCertSubject";
/// Option name for the password expiration policy.
pub const PASSWORD_EXPIRATION: &str = "passwordExpiration";

const KNOWN_OPTIONS: [&str; 6] = [
    PASSWORD,
    UPDATE,
    DRY_RUN,
    REQUIRE_CERT_ISSUER,
    REQUIRE_CERT_SUBJECT,
    PASSWORD_EXPIRATION,
];

/// Largest lifetime, in days, the server stores for a password.
pub const MAX_PASSWORD_LIFETIME_DAYS: u32 = 65535;

/// A tri-state option: not given, given as empty (clear the attribute), or given with a value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionValue<T> {
    /// Not specified; leave the attribute alone
    #[default]
    Absent,
    /// Explicitly empty; clear the attribute
    Clear,
    /// Explicitly set
    Set(T),
}

impl<T> OptionValue<T> {
    /// Whether the caller mentioned this option at all.
    pub fn is_specified(&self) -> bool {
        !matches!(self, OptionValue::Absent)
    }

    /// The value, if one was set.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            OptionValue::Set(value) => Some(value),
            _ => None,
        }
    }
}

/// Password expiration policy of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordExpiration {
    /// Follow the server-wide `default_password_lifetime`
    Default,
    /// The password never expires
    Never,
    /// The password expires after this many days
    Days(u32),
}

impl PasswordExpiration {
    /// Map a `mysql.user.password_lifetime` column value to a policy.
    pub fn from_lifetime(lifetime: Option<u64>) -> Self {
        match lifetime {
            None => PasswordExpiration::Default,
            Some(0) => PasswordExpiration::Never,
            Some(days) => PasswordExpiration::Days(u32::try_from(days).unwrap_or(u32::MAX)),
        }
    }
}

impl fmt::Display for PasswordExpiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordExpiration::Default => f.write_str("DEFAULT"),
            PasswordExpiration::Never => f.write_str("NEVER"),
            PasswordExpiration::Days(days) => write!(f, "INTERVAL {days} DAY"),
        }
    }
}

/// A password held in memory that is wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// The clear-text password. Only statement rendering should need this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// Validated provisioning options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningOptions {
    /// Password; `Clear` means an empty password
    pub password: OptionValue<Secret>,
    /// Update an existing account instead of failing
    pub update: bool,
    /// Compute and report the plan without changing anything
    pub dry_run: bool,
    /// Required X.509 issuer; `Clear` removes the requirement
    pub require_cert_issuer: OptionValue<String>,
    /// Required X.509 subject; `Clear` removes the requirement
    pub require_cert_subject: OptionValue<String>,
    /// Expiration policy; `None` when not specified
    pub password_expiration: Option<PasswordExpiration>,
}

impl ProvisioningOptions {
    /// Whether a password (possibly empty) was supplied.
    pub fn password_set(&self) -> bool {
        self.password.is_specified()
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = if password.is_empty() {
            OptionValue::Clear
        } else {
            OptionValue::Set(Secret::new(password))
        };
        self
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_cert_issuer(mut self, issuer: &str) -> Self {
        self.require_cert_issuer = string_setting(issuer);
        self
    }

    pub fn with_cert_subject(mut self, subject: &str) -> Self {
        self.require_cert_subject = string_setting(subject);
        self
    }

    pub fn with_password_expiration(mut self, policy: PasswordExpiration) -> Self {
        self.password_expiration = Some(policy);
        self
    }
}

fn string_setting(value: &str) -> OptionValue<String> {
    if value.is_empty() {
        OptionValue::Clear
    } else {
        OptionValue::Set(value.to_string())
    }
}

/// Validate an options argument that may be `null` (no options) or a map.
pub fn validate_value(raw: &Value) -> Result<ProvisioningOptions> {
    match raw {
        Value::Null => Ok(ProvisioningOptions::default()),
        Value::Object(map) => validate(map),
        other => Err(OptionsError::NotAMap {
            actual: type_name(other),
        }
        .into()),
    }
}

/// Validate an option map into [`ProvisioningOptions`].
///
/// Pure: this never needs the cluster. Whether `update` fits the account's existence is decided
/// later, once the account state is known.
pub fn validate(raw: &Map<String, Value>) -> Result<ProvisioningOptions> {
    let mut unknown: Vec<String> = raw
        .keys()
        .filter(|name| !KNOWN_OPTIONS.contains(&name.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(OptionsError::UnknownOptions { names: unknown }.into());
    }

    let mut options = ProvisioningOptions::default();

    if let Some(value) = raw.get(PASSWORD) {
        options.password = match expect_string(PASSWORD, value)? {
            "" => OptionValue::Clear,
            password => OptionValue::Set(Secret::new(password)),
        };
    }
    if let Some(value) = raw.get(UPDATE) {
        options.update = expect_bool(UPDATE, value)?;
    }
    if let Some(value) = raw.get(DRY_RUN) {
        options.dry_run = expect_bool(DRY_RUN, value)?;
    }
    if let Some(value) = raw.get(REQUIRE_CERT_ISSUER) {
        options.require_cert_issuer = string_setting(expect_string(REQUIRE_CERT_ISSUER, value)?);
    }
    if let Some(value) = raw.get(REQUIRE_CERT_SUBJECT) {
        options.require_cert_subject = string_setting(expect_string(REQUIRE_CERT_SUBJECT, value)?);
    }
    if let Some(value) = raw.get(PASSWORD_EXPIRATION) {
        options.password_expiration = Some(parse_expiration(value)?);
    }

    Ok(options)
}

/// Parse a `passwordExpiration` value: `NEVER`, `DEFAULT` (any case), `null`, or a day count.
pub fn parse_expiration(value: &Value) -> Result<PasswordExpiration> {
    let invalid = |value: String| -> crate::Error {
        OptionsError::InvalidPasswordExpiration {
            option: PASSWORD_EXPIRATION,
            value,
        }
        .into()
    };

    match value {
        Value::Null => Ok(PasswordExpiration::Default),
        Value::String(token) if token.eq_ignore_ascii_case("never") => {
            Ok(PasswordExpiration::Never)
        }
        Value::String(token) if token.eq_ignore_ascii_case("default") => {
            Ok(PasswordExpiration::Default)
        }
        Value::String(token) => Err(invalid(format!("'{token}'"))),
        Value::Number(number) => {
            if let Some(days) = number.as_u64() {
                match u32::try_from(days) {
                    Ok(days) if (1..=MAX_PASSWORD_LIFETIME_DAYS).contains(&days) => {
                        Ok(PasswordExpiration::Days(days))
                    }
                    _ => Err(invalid(format!("'{days}'"))),
                }
            } else if let Some(days) = number.as_i64() {
                Err(invalid(format!("'{days}'")))
            } else {
                Err(invalid(type_name(value).to_string()))
            }
        }
        other => Err(invalid(type_name(other).to_string())),
    }
}

fn expect_string<'a>(option: &'static str, value: &'a Value) -> Result<&'a str> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(OptionsError::TypeMismatch {
            option,
            expected: "String",
            actual: type_name(other),
        }
        .into()),
    }
}

fn expect_bool(option: &'static str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(OptionsError::TypeMismatch {
            option,
            expected: "Bool",
            actual: type_name(other),
        }
        .into()),
    }
}

/// Type names used in validation messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_f64() => "Float",
        Value::Number(_) => "Integer",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Map",
    }
}
