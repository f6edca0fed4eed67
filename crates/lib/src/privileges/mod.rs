//! Privilege set calculation
//!
//! Maps an [`AccountRole`] to the exact set of grants the account must hold. The mapping is a
//! fixed table per role (see [`tables`]), never derived from cluster state.
//!
//! `WITH GRANT OPTION` is represented as the pseudo-privilege [`GRANT_OPTION`] at the scope it
//! applies to, so it takes part in diffs like any other privilege.

pub mod tables;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

pub use tables::{ADMIN_GRANTS_VERSION, ROUTER_GRANTS_VERSION};

use crate::sql::quote_identifier;
use tables::{ADMIN_GRANTS, GrantRow, ROUTER_GRANTS, TableScope};

/// Pseudo-privilege standing for `WITH GRANT OPTION` at a scope.
pub const GRANT_OPTION: &str = "GRANT OPTION";

/// Kind of service account being provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    /// Cluster administration tooling
    Administrative,
    /// Routing proxy
    Router,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRole::Administrative => f.write_str("admin"),
            AccountRole::Router => f.write_str("router"),
        }
    }
}

/// The object a privilege applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// `*.*`
    Global,
    /// `schema.*`
    Schema(String),
    /// `schema.table`
    Table { schema: String, table: String },
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("*.*"),
            Scope::Schema(schema) => write!(f, "{}.*", quote_identifier(schema)),
            Scope::Table { schema, table } => {
                write!(f, "{}.{}", quote_identifier(schema), quote_identifier(table))
            }
        }
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<TableScope> for Scope {
    fn from(scope: TableScope) -> Self {
        match scope {
            TableScope::Global => Scope::Global,
            TableScope::Schema(schema) => Scope::Schema(schema.to_string()),
            TableScope::Table(schema, table) => Scope::Table {
                schema: schema.to_string(),
                table: table.to_string(),
            },
        }
    }
}

/// One privilege on one object.
///
/// Ordering sorts by scope first so that grants on the same object are adjacent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Grant {
    pub scope: Scope,
    pub privilege: String,
}

impl Grant {
    pub fn new(privilege: impl Into<String>, scope: Scope) -> Self {
        Self {
            scope,
            privilege: privilege.into(),
        }
    }

    pub fn is_grant_option(&self) -> bool {
        self.privilege == GRANT_OPTION
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ON {}", self.privilege, self.scope)
    }
}

/// The grants a role requires, in a stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredPrivilegeSet {
    role: AccountRole,
    version: u32,
    grants: BTreeSet<Grant>,
}

impl DesiredPrivilegeSet {
    pub fn role(&self) -> AccountRole {
        self.role
    }

    /// Version of the grant table the set was built from.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn grants(&self) -> &BTreeSet<Grant> {
        &self.grants
    }

    pub fn contains(&self, grant: &Grant) -> bool {
        self.grants.contains(grant)
    }

    /// Every object the role refers to. Reconciliation never looks outside these.
    pub fn scopes(&self) -> BTreeSet<&Scope> {
        self.grants.iter().map(|grant| &grant.scope).collect()
    }

    /// Whether `grant` is on an object this role manages.
    pub fn covers(&self, grant: &Grant) -> bool {
        self.grants.iter().any(|desired| desired.scope == grant.scope)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

/// Compute the grants required by `role`.
pub fn calculate(role: AccountRole) -> DesiredPrivilegeSet {
    let (version, table) = match role {
        AccountRole::Administrative => (ADMIN_GRANTS_VERSION, ADMIN_GRANTS),
        AccountRole::Router => (ROUTER_GRANTS_VERSION, ROUTER_GRANTS),
    };
    DesiredPrivilegeSet {
        role,
        version,
        grants: expand(table),
    }
}

fn expand(table: &[GrantRow]) -> BTreeSet<Grant> {
    let mut grants = BTreeSet::new();
    for row in table {
        let scope = Scope::from(row.scope);
        for privilege in row.privileges {
            grants.insert(Grant::new(*privilege, scope.clone()));
        }
        if row.with_grant_option {
            grants.insert(Grant::new(GRANT_OPTION, scope));
        }
    }
    grants
}
