//! Account state resolution
//!
//! Reads what the cluster currently holds for one account: whether it exists, its
//! authentication attributes, and its grants on the objects the desired role refers to. Grants on
//! other objects are never read, so privileges added by hand elsewhere are neither reported nor
//! touched.
//!
//! Every call takes a fresh snapshot; nothing is cached or locked.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::Result;
use crate::executor::{Row, StatementExecutor, Value};
use crate::identity::AccountIdentity;
use crate::options::PasswordExpiration;
use crate::privileges::{DesiredPrivilegeSet, GRANT_OPTION, Grant, Scope};

const ACCOUNT_QUERY: &str = "SELECT authentication_string, \
     CONVERT(x509_issuer USING utf8mb4), CONVERT(x509_subject USING utf8mb4), password_lifetime \
     FROM mysql.user WHERE user = ? AND host = ?";

const GLOBAL_PRIVILEGES_QUERY: &str = "SELECT PRIVILEGE_TYPE, IS_GRANTABLE \
     FROM information_schema.USER_PRIVILEGES WHERE GRANTEE = ?";

/// Authentication attributes of an existing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthAttributes {
    pub has_password: bool,
    pub cert_issuer: String,
    pub cert_subject: String,
    pub expiration: PasswordExpiration,
}

impl Default for AuthAttributes {
    fn default() -> Self {
        Self {
            has_password: false,
            cert_issuer: String::new(),
            cert_subject: String::new(),
            expiration: PasswordExpiration::Default,
        }
    }
}

/// Snapshot of one account, limited to the desired role's objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActualAccountState {
    pub exists: bool,
    pub current_grants: BTreeSet<Grant>,
    pub current_auth: AuthAttributes,
}

impl ActualAccountState {
    /// State of an account that does not exist.
    pub fn missing() -> Self {
        Self::default()
    }
}

/// Read the current state of `identity` for the objects in `desired`.
pub fn resolve(
    executor: &dyn StatementExecutor,
    identity: &AccountIdentity,
    desired: &DesiredPrivilegeSet,
) -> Result<ActualAccountState> {
    let rows = executor.execute(
        ACCOUNT_QUERY,
        &[identity.user().into(), identity.host().into()],
    )?;
    let Some(row) = rows.first() else {
        debug!(account = %identity, "account does not exist");
        return Ok(ActualAccountState::missing());
    };

    let current_auth = auth_attributes(row);
    let grantee = identity.grantee();
    let scopes = desired.scopes();
    let mut current_grants = BTreeSet::new();

    if scopes.contains(&&Scope::Global) {
        let rows = executor.execute(GLOBAL_PRIVILEGES_QUERY, &[grantee.as_str().into()])?;
        collect_grants(&rows, 0, |_| Some(Scope::Global), &mut current_grants);
    }

    let schemas: Vec<&str> = scopes
        .iter()
        .filter_map(|scope| match scope {
            Scope::Schema(schema) => Some(schema.as_str()),
            _ => None,
        })
        .collect();
    if !schemas.is_empty() {
        let sql = format!(
            "SELECT TABLE_SCHEMA, PRIVILEGE_TYPE, IS_GRANTABLE \
             FROM information_schema.SCHEMA_PRIVILEGES WHERE GRANTEE = ? AND TABLE_SCHEMA IN ({})",
            placeholders("?", schemas.len())
        );
        let mut params: Vec<Value> = vec![grantee.as_str().into()];
        params.extend(schemas.iter().map(|schema| Value::from(*schema)));
        let rows = executor.execute(&sql, &params)?;
        collect_grants(
            &rows,
            1,
            |row| row.text(0).map(|schema| Scope::Schema(schema.to_string())),
            &mut current_grants,
        );
    }

    let tables: Vec<(&str, &str)> = scopes
        .iter()
        .filter_map(|scope| match scope {
            Scope::Table { schema, table } => Some((schema.as_str(), table.as_str())),
            _ => None,
        })
        .collect();
    if !tables.is_empty() {
        let sql = format!(
            "SELECT TABLE_SCHEMA, TABLE_NAME, PRIVILEGE_TYPE, IS_GRANTABLE \
             FROM information_schema.TABLE_PRIVILEGES \
             WHERE GRANTEE = ? AND (TABLE_SCHEMA, TABLE_NAME) IN ({})",
            placeholders("(?, ?)", tables.len())
        );
        let mut params: Vec<Value> = vec![grantee.as_str().into()];
        for (schema, table) in &tables {
            params.push((*schema).into());
            params.push((*table).into());
        }
        let rows = executor.execute(&sql, &params)?;
        collect_grants(
            &rows,
            2,
            |row| match (row.text(0), row.text(1)) {
                (Some(schema), Some(table)) => Some(Scope::Table {
                    schema: schema.to_string(),
                    table: table.to_string(),
                }),
                _ => None,
            },
            &mut current_grants,
        );
    }

    // wildcard schema grants can match more than the role's objects
    current_grants.retain(|grant| desired.covers(grant));

    debug!(
        account = %identity,
        grants = current_grants.len(),
        has_password = current_auth.has_password,
        "resolved account state"
    );
    Ok(ActualAccountState {
        exists: true,
        current_grants,
        current_auth,
    })
}

fn placeholders(each: &str, count: usize) -> String {
    vec![each; count].join(", ")
}

fn auth_attributes(row: &Row) -> AuthAttributes {
    AuthAttributes {
        has_password: row.text(0).is_some_and(|auth| !auth.is_empty()),
        cert_issuer: row.text(1).unwrap_or_default().to_string(),
        cert_subject: row.text(2).unwrap_or_default().to_string(),
        expiration: PasswordExpiration::from_lifetime(row.get(3).as_u64()),
    }
}

/// Turn privilege view rows into grants. `privilege_column` is followed by `IS_GRANTABLE`.
fn collect_grants(
    rows: &[Row],
    privilege_column: usize,
    scope_of: impl Fn(&Row) -> Option<Scope>,
    grants: &mut BTreeSet<Grant>,
) {
    for row in rows {
        let (Some(scope), Some(privilege)) = (scope_of(row), row.text(privilege_column)) else {
            warn!(?row, "skipping malformed privilege row");
            continue;
        };
        let privilege = privilege.trim().to_ascii_uppercase();
        if privilege.is_empty() {
            warn!(?row, "skipping privilege row without a privilege name");
            continue;
        }
        if row
            .text(privilege_column + 1)
            .is_some_and(|grantable| grantable.eq_ignore_ascii_case("YES"))
        {
            grants.insert(Grant::new(GRANT_OPTION, scope.clone()));
        }
        // USAGE is the placeholder for "no privileges"
        if privilege != "USAGE" {
            grants.insert(Grant::new(privilege, scope));
        }
    }
}
