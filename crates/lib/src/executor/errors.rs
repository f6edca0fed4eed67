//! Errors reported by statement executors.

use std::fmt;

/// Server error: password does not satisfy the current policy requirements.
pub const ER_NOT_VALID_PASSWORD: u16 = 1819;
/// Server error: access denied for user to database.
pub const ER_DBACCESS_DENIED_ERROR: u16 = 1044;
/// Server error: access denied for user (authentication).
pub const ER_ACCESS_DENIED_ERROR: u16 = 1045;
/// Server error: command denied to user for table.
pub const ER_TABLEACCESS_DENIED_ERROR: u16 = 1142;
/// Server error: access denied; a specific privilege is needed.
pub const ER_SPECIFIC_ACCESS_DENIED_ERROR: u16 = 1227;
/// Server error: not allowed to create a user with GRANT.
pub const ER_CANT_CREATE_USER_WITH_GRANT: u16 = 1410;
/// Server error: CREATE USER / DROP USER failed for an account.
pub const ER_CANNOT_USER: u16 = 1396;

/// A failed statement, as reported by the server or the connection.
///
/// The message is kept verbatim so callers see exactly what the server said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorError {
    /// Numeric server error code, absent for connection-level failures
    pub code: Option<u16>,
    /// Server or driver message
    pub message: String,
}

impl ExecutorError {
    /// An error returned by the server with its error number.
    pub fn server(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// A failure without a server error number (I/O, protocol, pool).
    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// The server rejected a password against its strength policy.
    pub fn is_password_policy(&self) -> bool {
        self.code == Some(ER_NOT_VALID_PASSWORD)
    }

    /// The executing account lacks a privilege the statement needs.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self.code,
            Some(
                ER_DBACCESS_DENIED_ERROR
                    | ER_ACCESS_DENIED_ERROR
                    | ER_TABLEACCESS_DENIED_ERROR
                    | ER_SPECIFIC_ACCESS_DENIED_ERROR
                    | ER_CANT_CREATE_USER_WITH_GRANT
            )
        )
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (error {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ExecutorError {}
