//! Error types for account reconciliation.

use thiserror::Error;

use crate::Error;
use crate::executor::ExecutorError;

/// Errors raised while resolving cluster state or applying a plan.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SetupError {
    /// The account exists and `update` was not requested.
    #[error(
        "Could not proceed with the operation because account {account} already exists. Enable the 'update' option to update the existing account's privileges."
    )]
    AccountExists {
        /// The quoted account name
        account: String,
    },

    /// `update` was requested for an account that does not exist.
    #[error(
        "Could not proceed with the operation because the account {account} does not exist and the 'update' option is enabled"
    )]
    AccountNotFound {
        /// The quoted account name
        account: String,
    },

    /// The server's password policy rejected the password.
    #[error("{message}")]
    PasswordPolicyRejected {
        /// The server message, verbatim
        message: String,
    },

    /// The executing account lacks a privilege a statement needs.
    #[error("{message}")]
    AccessDenied {
        /// Server error number
        code: Option<u16>,
        /// The server message, verbatim
        message: String,
    },

    /// Any other statement or connection failure.
    #[error("{source}")]
    Execution {
        /// The failing executor call
        source: ExecutorError,
    },
}

impl SetupError {
    /// Check if the account's existence contradicts the requested mode.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SetupError::AccountExists { .. } | SetupError::AccountNotFound { .. }
        )
    }

    /// Check if the password policy rejected the password.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, SetupError::PasswordPolicyRejected { .. })
    }

    /// Check if the executing account is not allowed to perform the operation.
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, SetupError::AccessDenied { .. })
    }

    /// Check if this is a statement or connection failure.
    pub fn is_execution_error(&self) -> bool {
        matches!(self, SetupError::Execution { .. })
    }
}

impl From<ExecutorError> for SetupError {
    fn from(err: ExecutorError) -> Self {
        if err.is_password_policy() {
            SetupError::PasswordPolicyRejected {
                message: err.message,
            }
        } else if err.is_access_denied() {
            SetupError::AccessDenied {
                code: err.code,
                message: err.message,
            }
        } else {
            SetupError::Execution { source: err }
        }
    }
}

impl From<SetupError> for Error {
    fn from(err: SetupError) -> Self {
        Error::Setup(err)
    }
}

impl From<ExecutorError> for Error {
    fn from(err: ExecutorError) -> Self {
        Error::Setup(err.into())
    }
}
