//!
//! Accord: provisioning and reconciliation of MySQL cluster service accounts.
//! This library decides, for one target account, which privileges it must hold, whether it
//! already exists, and which statements converge the cluster to that state.
//!
//! ## Core Concepts
//!
//! * **Identities (`identity::AccountIdentity`)**: A parsed `user@host` pair, rendered in quoted
//!   form for statements.
//! * **Options (`options::ProvisioningOptions`)**: The validated option bag. Password and
//!   certificate fields are tri-state (absent, explicitly cleared, explicitly set).
//! * **Roles (`privileges::AccountRole`)**: Administrative or router accounts, each mapped to a
//!   fixed, versioned grant table (`privileges::DesiredPrivilegeSet`).
//! * **State (`state::ActualAccountState`)**: A snapshot of the account as the cluster sees it,
//!   limited to the objects the role refers to.
//! * **Plans (`plan::ReconciliationPlan`)**: The diff between desired and actual state. The same
//!   plan drives both real runs and dry runs.
//! * **Setup (`setup::AccountSetup`)**: The entry point. Applies a plan through a
//!   `executor::StatementExecutor`, or reports it without touching the cluster.

pub mod executor;
pub mod identity;
pub mod options;
pub mod plan;
pub mod privileges;
pub mod setup;
pub mod sql;
pub mod state;

pub use identity::AccountIdentity;
pub use options::ProvisioningOptions;
pub use privileges::AccountRole;
pub use setup::{AccountSetup, Report};

/// Result type used throughout the Accord library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Accord library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed account identity
    #[error(transparent)]
    Identity(identity::IdentityError),

    /// Option type or value errors, detected before touching the cluster
    #[error(transparent)]
    Options(options::OptionsError),

    /// Conflicts and failures raised while resolving or applying a plan
    #[error(transparent)]
    Setup(setup::SetupError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Identity(_) => "identity",
            Error::Options(_) => "options",
            Error::Setup(_) => "setup",
        }
    }

    /// Check if this error is a malformed account identity.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Identity(_))
    }

    /// Check if this error comes from option validation, including password prompts.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Options(_))
    }

    /// Check if this error indicates the account exists (or not) contrary to the request.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Setup(setup_err) => setup_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if the server's password policy rejected the candidate password.
    pub fn is_policy_rejection(&self) -> bool {
        match self {
            Error::Setup(setup_err) => setup_err.is_policy_rejection(),
            _ => false,
        }
    }

    /// Check if the executing account lacks the privileges the operation needs.
    pub fn is_authorization_error(&self) -> bool {
        match self {
            Error::Setup(setup_err) => setup_err.is_authorization_error(),
            _ => false,
        }
    }

    /// Check if this error is a connectivity or statement failure.
    pub fn is_execution_error(&self) -> bool {
        match self {
            Error::Setup(setup_err) => setup_err.is_execution_error(),
            _ => false,
        }
    }
}
