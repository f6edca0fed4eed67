//! Option validation error types.

use thiserror::Error;

use crate::Error;

/// Errors raised while validating provisioning options or collecting a password.
///
/// All of them are detected before any statement that changes the cluster is executed.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OptionsError {
    /// The options argument itself is not a map.
    #[error("Argument options is expected to be a map, but is {actual}")]
    NotAMap {
        /// Type name of the value that was passed
        actual: &'static str,
    },

    /// Option names that are not recognized.
    #[error("Invalid options: {}", names.join(", "))]
    UnknownOptions {
        /// The unrecognized option names, sorted
        names: Vec<String>,
    },

    /// An option has the wrong type.
    #[error("Option '{option}' is expected to be of type {expected}, but is {actual}")]
    TypeMismatch {
        /// The option name
        option: &'static str,
        /// The expected type name
        expected: &'static str,
        /// The type name of the supplied value
        actual: &'static str,
    },

    /// `passwordExpiration` is not one of its accepted forms.
    #[error("Option '{option}' UInteger, 'NEVER' or 'DEFAULT' expected, but value is {value}")]
    InvalidPasswordExpiration {
        /// The option name
        option: &'static str,
        /// The offending value, quoted for scalars or a type name otherwise
        value: String,
    },

    /// A new account needs a password and none could be obtained.
    #[error(
        "Could not proceed with the operation because no password was specified for new account {account}"
    )]
    PasswordRequired {
        /// The account being created
        account: String,
    },

    /// The interactive password and its confirmation differ.
    #[error("Passwords don't match")]
    PasswordMismatch,

    /// The interactive prompt could not be read.
    #[error("Failed to read password: {reason}")]
    PromptFailed {
        /// Why the prompt failed
        reason: String,
    },
}

impl OptionsError {
    /// Check if this error is about the type or shape of an option value.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            OptionsError::NotAMap { .. }
                | OptionsError::TypeMismatch { .. }
                | OptionsError::InvalidPasswordExpiration { .. }
        )
    }

    /// Check if this error comes from password collection rather than the option map.
    pub fn is_password_error(&self) -> bool {
        matches!(
            self,
            OptionsError::PasswordRequired { .. }
                | OptionsError::PasswordMismatch
                | OptionsError::PromptFailed { .. }
        )
    }
}

impl From<OptionsError> for Error {
    fn from(err: OptionsError) -> Self {
        Error::Options(err)
    }
}
