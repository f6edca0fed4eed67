//! Outcome of one provisioning call.

use std::fmt;

use serde::Serialize;

use crate::plan::ReconciliationPlan;
use crate::privileges::{AccountRole, Grant};
use crate::sql::Statement;

/// What a provisioning call did, or under dry-run, would have done.
///
/// A dry-run report and the report of the real run that follows it from the same starting state
/// are identical except for `dry_run`. Statements are kept in redacted form only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Quoted account name
    pub account: String,
    pub role: AccountRole,
    pub account_existed: bool,
    pub created: bool,
    pub grants_added: Vec<Grant>,
    pub grants_removed: Vec<Grant>,
    pub auth_attributes_changed: Vec<String>,
    pub dry_run: bool,
    pub statements: Vec<Statement>,
}

impl Report {
    pub(crate) fn new(plan: &ReconciliationPlan, dry_run: bool) -> Self {
        Self {
            account: plan.identity.to_string(),
            role: plan.role,
            account_existed: plan.account_exists,
            created: plan.creates_account(),
            grants_added: plan.to_grant.iter().cloned().collect(),
            grants_removed: plan.to_revoke.iter().cloned().collect(),
            auth_attributes_changed: plan
                .auth_changes
                .changed_fields()
                .into_iter()
                .map(str::to_string)
                .collect(),
            dry_run,
            statements: plan.statements(),
        }
    }

    /// Whether the call changed (or would change) nothing.
    pub fn is_unchanged(&self) -> bool {
        self.statements.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (created, updated, verb) = if self.dry_run {
            ("would be created", "would be updated", "Statements that would be executed")
        } else {
            ("created", "updated", "Statements executed")
        };

        if self.is_unchanged() {
            return writeln!(
                f,
                "Account {} already has the required {} privileges. Nothing to do.",
                self.account, self.role
            );
        }
        let outcome = if self.created { created } else { updated };
        writeln!(
            f,
            "Account {} {outcome} with {} privileges.",
            self.account, self.role
        )?;
        if self.dry_run {
            writeln!(f, "Dry run: no changes were made.")?;
        }

        if !self.grants_added.is_empty() {
            writeln!(f, "\nPrivileges granted ({}):", self.grants_added.len())?;
            for grant in &self.grants_added {
                writeln!(f, "  {grant}")?;
            }
        }
        if !self.grants_removed.is_empty() {
            writeln!(f, "\nPrivileges revoked ({}):", self.grants_removed.len())?;
            for grant in &self.grants_removed {
                writeln!(f, "  {grant}")?;
            }
        }
        if !self.auth_attributes_changed.is_empty() {
            writeln!(
                f,
                "\nAuthentication attributes changed: {}",
                self.auth_attributes_changed.join(", ")
            )?;
        }

        writeln!(f, "\n{verb}:")?;
        for statement in &self.statements {
            writeln!(f, "  {statement};")?;
        }
        Ok(())
    }
}
