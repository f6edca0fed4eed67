//! Account setup: the entry point of the engine.
//!
//! [`AccountSetup`] runs the whole pipeline for one account:
//!
//! 1. parse the `user@host` specification ([`crate::identity`])
//! 2. validate the options ([`crate::options`])
//! 3. compute the role's grants ([`crate::privileges`])
//! 4. read the account's current state ([`crate::state`])
//! 5. diff into a plan ([`crate::plan`]), then either apply it or report it under dry-run
//!
//! Applying is all or nothing from the caller's point of view. Account statements commit
//! implicitly, so each applied statement records how to revert it; when a later statement fails
//! the recorded reverts run in reverse order before the error is returned.
//!
//! ```
//! use accord::AccountRole;
//! use accord::executor::InMemoryCluster;
//! use accord::setup::AccountSetup;
//! use serde_json::json;
//!
//! let cluster = InMemoryCluster::new();
//! let options = json!({"password": "s3cret"});
//! let report = AccountSetup::new(&cluster)
//!     .setup_account("router1@%", options.as_object().unwrap(), AccountRole::Router)
//!     .unwrap();
//! assert!(report.created);
//! assert!(cluster.account_exists("router1", "%"));
//! ```

pub mod errors;
pub mod report;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

pub use errors::SetupError;
pub use report::Report;

use crate::Result;
use crate::executor::StatementExecutor;
use crate::identity::{self, AccountIdentity};
use crate::options::{self, OptionValue, OptionsError, ProvisioningOptions, Secret};
use crate::plan::{self, ReconciliationPlan, Step};
use crate::privileges::{self, AccountRole};
use crate::sql::REDACTED;
use crate::state;

/// Label of the first password prompt.
pub const PASSWORD_PROMPT: &str = "Password for new account: ";
/// Label of the confirmation prompt.
pub const CONFIRM_PROMPT: &str = "Confirm password: ";

/// Source of interactively entered passwords.
pub trait PasswordPrompt {
    /// Ask for a password, showing `label`.
    fn prompt_password(&self, label: &str) -> Result<Secret>;
}

/// Provisions accounts through one executor connected to the cluster's write member.
pub struct AccountSetup<'a> {
    executor: &'a dyn StatementExecutor,
    prompt: Option<&'a dyn PasswordPrompt>,
}

impl<'a> AccountSetup<'a> {
    pub fn new(executor: &'a dyn StatementExecutor) -> Self {
        Self {
            executor,
            prompt: None,
        }
    }

    /// Enable interactive mode: a new account without a password gets one from `prompt`.
    pub fn with_prompt(mut self, prompt: &'a dyn PasswordPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Parse, validate, plan, then apply or preview, from raw caller input.
    pub fn setup_account(
        &self,
        identity_spec: &str,
        options: &Map<String, Value>,
        role: AccountRole,
    ) -> Result<Report> {
        let identity = identity::parse(identity_spec)?;
        let options = options::validate(options)?;
        self.setup(&identity, options, role)
    }

    /// Like [`setup_account`](Self::setup_account) for already typed input.
    pub fn setup(
        &self,
        identity: &AccountIdentity,
        options: ProvisioningOptions,
        role: AccountRole,
    ) -> Result<Report> {
        let dry_run = options.dry_run;
        let plan = self.plan(identity, options, role)?;
        if dry_run {
            Ok(self.preview(&plan))
        } else {
            self.apply(&plan)
        }
    }

    /// Read the account's state and compute the plan, without changing anything.
    ///
    /// Fails if the account exists and `update` is off, or is missing and `update` is on. When
    /// the account will be created and no password was given, the password comes from the
    /// prompt; under dry-run the prompt is skipped and the password is only reported.
    pub fn plan(
        &self,
        identity: &AccountIdentity,
        mut options: ProvisioningOptions,
        role: AccountRole,
    ) -> Result<ReconciliationPlan> {
        let desired = privileges::calculate(role);
        let actual = state::resolve(self.executor, identity, &desired)?;

        match (actual.exists, options.update) {
            (true, false) => {
                return Err(SetupError::AccountExists {
                    account: identity.to_string(),
                }
                .into());
            }
            (false, true) => {
                return Err(SetupError::AccountNotFound {
                    account: identity.to_string(),
                }
                .into());
            }
            (false, false) => self.resolve_password(identity, &mut options)?,
            (true, true) => {}
        }

        let plan = plan::diff(identity, &desired, &actual, &options);
        debug!(
            account = %identity,
            %role,
            create = plan.creates_account(),
            to_grant = plan.to_grant.len(),
            to_revoke = plan.to_revoke.len(),
            "computed reconciliation plan"
        );
        Ok(plan)
    }

    /// Execute a plan. On failure, already applied statements are reverted.
    pub fn apply(&self, plan: &ReconciliationPlan) -> Result<Report> {
        let identity = &plan.identity;
        if plan.creates_account() {
            info!(account = %identity, role = %plan.role, "creating account");
        } else if plan.is_empty() {
            info!(account = %identity, role = %plan.role, "account is up to date");
        } else {
            info!(account = %identity, role = %plan.role, "updating account");
        }

        let steps = plan.steps();
        let mut applied: Vec<&Step> = Vec::with_capacity(steps.len());
        for step in &steps {
            debug!(statement = %step.statement, "executing");
            if let Err(err) = self.executor.execute(step.statement.sql(), &[]) {
                warn!(
                    account = %identity,
                    statement = %step.statement,
                    error = %err,
                    applied = applied.len(),
                    "statement failed, reverting"
                );
                self.revert(&applied);
                return Err(SetupError::from(err).into());
            }
            applied.push(step);
        }

        let report = Report::new(plan, false);
        info!(
            account = %identity,
            created = report.created,
            grants_added = report.grants_added.len(),
            grants_removed = report.grants_removed.len(),
            "account setup complete"
        );
        Ok(report)
    }

    /// Report a plan without executing it.
    pub fn preview(&self, plan: &ReconciliationPlan) -> Report {
        let report = Report::new(plan, true);
        info!(
            account = %plan.identity,
            dry_run = true,
            statements = report.statements.len(),
            "dry run, no changes made"
        );
        report
    }

    fn revert(&self, applied: &[&Step]) {
        for undo in applied.iter().rev().filter_map(|step| step.undo.as_ref()) {
            debug!(statement = %undo, "reverting");
            if let Err(err) = self.executor.execute(undo.sql(), &[]) {
                warn!(statement = %undo, error = %err, "failed to revert statement");
            }
        }
    }

    fn resolve_password(
        &self,
        identity: &AccountIdentity,
        options: &mut ProvisioningOptions,
    ) -> Result<()> {
        if options.password_set() {
            return Ok(());
        }
        let Some(prompt) = self.prompt else {
            return Err(OptionsError::PasswordRequired {
                account: identity.to_string(),
            }
            .into());
        };
        if options.dry_run {
            // Stands in for the password that would be entered; only the redacted form is
            // ever reported.
            options.password = OptionValue::Set(Secret::new(REDACTED));
            return Ok(());
        }

        let password = prompt.prompt_password(PASSWORD_PROMPT)?;
        let confirmation = prompt.prompt_password(CONFIRM_PROMPT)?;
        if password != confirmation {
            return Err(OptionsError::PasswordMismatch.into());
        }
        options.password = if password.expose().is_empty() {
            OptionValue::Clear
        } else {
            OptionValue::Set(password)
        };
        Ok(())
    }
}
