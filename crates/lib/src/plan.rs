//! Reconciliation planning
//!
//! A [`ReconciliationPlan`] is the diff between the grants a role requires and what the account
//! holds, plus the authentication changes the options ask for. Real runs and dry runs use the
//! same plan: [`ReconciliationPlan::steps`] renders it to statements, which are either executed or
//! only reported.

use std::collections::BTreeSet;

use crate::identity::AccountIdentity;
use crate::options::{OptionValue, PasswordExpiration, ProvisioningOptions, Secret};
use crate::privileges::{AccountRole, DesiredPrivilegeSet, GRANT_OPTION, Grant, Scope};
use crate::sql::{
    AlterUserStatement, CertRequirement, CreateUserStatement, DropUserStatement, GrantStatement,
    RevokeStatement, Statement,
};
use crate::state::ActualAccountState;

/// Report names of the authentication attributes.
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_CERT_ISSUER: &str = "certIssuer";
pub const FIELD_CERT_SUBJECT: &str = "certSubject";
pub const FIELD_PASSWORD_EXPIRATION: &str = "passwordExpiration";

/// Authentication attributes to set. `None` leaves an attribute as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthChanges {
    /// New password; an empty secret clears it
    pub password: Option<Secret>,
    pub cert_issuer: Option<String>,
    pub cert_subject: Option<String>,
    pub expiration: Option<PasswordExpiration>,
    /// Complete `REQUIRE` clause once the changed fields are merged with the current ones
    pub require: Option<CertRequirement>,
}

impl AuthChanges {
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Names of the changed attributes, in a fixed order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.password.is_some() {
            fields.push(FIELD_PASSWORD);
        }
        if self.cert_issuer.is_some() {
            fields.push(FIELD_CERT_ISSUER);
        }
        if self.cert_subject.is_some() {
            fields.push(FIELD_CERT_SUBJECT);
        }
        if self.expiration.is_some() {
            fields.push(FIELD_PASSWORD_EXPIRATION);
        }
        fields
    }
}

/// One statement of a plan and the statement that reverts it, if it needs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub statement: Statement,
    pub undo: Option<Statement>,
}

/// What has to change for an account to match its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub identity: AccountIdentity,
    pub role: AccountRole,
    /// Whether the account existed when the plan was computed
    pub account_exists: bool,
    pub to_grant: BTreeSet<Grant>,
    pub to_revoke: BTreeSet<Grant>,
    pub auth_changes: AuthChanges,
}

impl ReconciliationPlan {
    /// Whether the plan creates the account.
    pub fn creates_account(&self) -> bool {
        !self.account_exists
    }

    /// Whether applying the plan would change nothing.
    pub fn is_empty(&self) -> bool {
        self.account_exists
            && self.to_grant.is_empty()
            && self.to_revoke.is_empty()
            && self.auth_changes.is_empty()
    }

    /// The statements that carry out the plan, in execution order.
    ///
    /// A new account is created by one `CREATE USER` carrying every authentication attribute,
    /// followed by its grants; dropping the account reverts all of it. An existing account gets
    /// its grants, then its revokes, then one `ALTER USER`. Grants and revokes revert each other;
    /// the `ALTER USER` comes last so nothing follows it that could fail.
    pub fn steps(&self) -> Vec<Step> {
        let identity = &self.identity;
        let auth = &self.auth_changes;
        let mut steps = Vec::new();

        if self.creates_account() {
            let mut create = CreateUserStatement::new(identity);
            if let Some(password) = &auth.password {
                create = create.password(password.clone());
            }
            if let Some(require) = &auth.require {
                create = create.require(require.clone());
            }
            if let Some(expiration) = auth.expiration {
                create = create.password_expire(expiration);
            }
            steps.push(Step {
                statement: create.build(),
                undo: Some(DropUserStatement::new(identity).if_exists().build()),
            });
            steps.extend(by_scope(&self.to_grant).into_iter().map(|(scope, grants)| Step {
                statement: grant_statement(identity, scope, &grants),
                undo: None,
            }));
            return steps;
        }

        for (scope, grants) in by_scope(&self.to_grant) {
            steps.push(Step {
                statement: grant_statement(identity, scope.clone(), &grants),
                undo: Some(revoke_statement(identity, scope, &grants)),
            });
        }
        for (scope, grants) in by_scope(&self.to_revoke) {
            steps.push(Step {
                statement: revoke_statement(identity, scope.clone(), &grants),
                undo: Some(grant_statement(identity, scope, &grants)),
            });
        }

        let mut alter = AlterUserStatement::new(identity);
        if let Some(password) = &auth.password {
            alter = alter.password(password.clone());
        }
        if let Some(require) = &auth.require {
            alter = alter.require(require.clone());
        }
        if let Some(expiration) = auth.expiration {
            alter = alter.password_expire(expiration);
        }
        if let Some(statement) = alter.build() {
            steps.push(Step {
                statement,
                undo: None,
            });
        }
        steps
    }

    /// The statements alone, in execution order.
    pub fn statements(&self) -> Vec<Statement> {
        self.steps().into_iter().map(|step| step.statement).collect()
    }
}

/// Diff the desired grants against the account's current state.
///
/// `options.password` must already hold the password to use for a new account; prompting is the
/// caller's job. The existence checks (create vs. update) are also left to the caller.
pub fn diff(
    identity: &AccountIdentity,
    desired: &DesiredPrivilegeSet,
    actual: &ActualAccountState,
    options: &ProvisioningOptions,
) -> ReconciliationPlan {
    let (to_grant, to_revoke, auth_changes) = if actual.exists {
        let to_grant = desired
            .grants()
            .difference(&actual.current_grants)
            .cloned()
            .collect();
        let to_revoke = actual
            .current_grants
            .iter()
            .filter(|grant| desired.covers(grant) && !desired.contains(grant))
            .cloned()
            .collect();
        (to_grant, to_revoke, update_auth(actual, options))
    } else {
        (desired.grants().clone(), BTreeSet::new(), create_auth(options))
    };

    ReconciliationPlan {
        identity: identity.clone(),
        role: desired.role(),
        account_exists: actual.exists,
        to_grant,
        to_revoke,
        auth_changes,
    }
}

/// New accounts start from the server defaults; only non-default attributes are set.
fn create_auth(options: &ProvisioningOptions) -> AuthChanges {
    let cert_issuer = options.require_cert_issuer.as_set().cloned();
    let cert_subject = options.require_cert_subject.as_set().cloned();
    let require = (cert_issuer.is_some() || cert_subject.is_some()).then(|| CertRequirement {
        issuer: cert_issuer.clone().unwrap_or_default(),
        subject: cert_subject.clone().unwrap_or_default(),
    });
    AuthChanges {
        password: options.password.as_set().cloned(),
        cert_issuer,
        cert_subject,
        expiration: options
            .password_expiration
            .filter(|policy| *policy != PasswordExpiration::Default),
        require,
    }
}

/// Existing accounts change only what the options mention and what actually differs. A supplied
/// password always counts as a change since the current one cannot be compared.
fn update_auth(actual: &ActualAccountState, options: &ProvisioningOptions) -> AuthChanges {
    let current = &actual.current_auth;
    let password = match &options.password {
        OptionValue::Set(password) => Some(password.clone()),
        OptionValue::Clear => Some(Secret::new("")),
        OptionValue::Absent => None,
    };
    let cert_issuer = changed_text(&options.require_cert_issuer, &current.cert_issuer);
    let cert_subject = changed_text(&options.require_cert_subject, &current.cert_subject);
    let require = (cert_issuer.is_some() || cert_subject.is_some()).then(|| CertRequirement {
        issuer: cert_issuer
            .clone()
            .unwrap_or_else(|| current.cert_issuer.clone()),
        subject: cert_subject
            .clone()
            .unwrap_or_else(|| current.cert_subject.clone()),
    });
    AuthChanges {
        password,
        cert_issuer,
        cert_subject,
        expiration: options
            .password_expiration
            .filter(|policy| *policy != current.expiration),
        require,
    }
}

fn changed_text(option: &OptionValue<String>, current: &str) -> Option<String> {
    let wanted = match option {
        OptionValue::Absent => return None,
        OptionValue::Clear => "",
        OptionValue::Set(value) => value.as_str(),
    };
    (wanted != current).then(|| wanted.to_string())
}

/// Group grants by the object they apply to, keeping scope order.
fn by_scope(grants: &BTreeSet<Grant>) -> Vec<(Scope, Vec<&Grant>)> {
    let mut groups: Vec<(Scope, Vec<&Grant>)> = Vec::new();
    for grant in grants {
        match groups.last_mut() {
            Some((scope, members)) if *scope == grant.scope => members.push(grant),
            _ => groups.push((grant.scope.clone(), vec![grant])),
        }
    }
    groups
}

fn grant_statement(identity: &AccountIdentity, scope: Scope, grants: &[&Grant]) -> Statement {
    let mut statement = GrantStatement::new(identity, scope);
    for grant in grants {
        if grant.is_grant_option() {
            statement = statement.with_grant_option();
        } else {
            statement = statement.privilege(grant.privilege.as_str());
        }
    }
    statement.build()
}

fn revoke_statement(identity: &AccountIdentity, scope: Scope, grants: &[&Grant]) -> Statement {
    // GRANT OPTION goes last, as the server lists it
    let (options, privileges): (Vec<&&Grant>, Vec<&&Grant>) =
        grants.iter().partition(|grant| grant.privilege == GRANT_OPTION);
    privileges
        .into_iter()
        .chain(options)
        .fold(RevokeStatement::new(identity, scope), |statement, grant| {
            statement.privilege(grant.privilege.as_str())
        })
        .build()
}
