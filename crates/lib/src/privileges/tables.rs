//! Versioned grant tables.
//!
//! These tables define what each kind of account may do on every cluster member. Changing a row
//! changes the security surface of every account created or reconciled afterwards, so every edit
//! must bump the matching version constant and the content tests in the parent module.

/// Schema holding the cluster metadata.
pub const METADATA_SCHEMA: &str = "mysql_innodb_cluster_metadata";
/// Backup copy of the metadata kept during metadata upgrades.
pub const METADATA_BACKUP_SCHEMA: &str = "mysql_innodb_cluster_metadata_bkp";
/// Previous metadata version kept during metadata upgrades.
pub const METADATA_PREVIOUS_SCHEMA: &str = "mysql_innodb_cluster_metadata_previous";

pub const ROUTER_GRANTS_VERSION: u32 = 1;
pub const ADMIN_GRANTS_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub(crate) enum TableScope {
    Global,
    Schema(&'static str),
    Table(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GrantRow {
    pub privileges: &'static [&'static str],
    pub scope: TableScope,
    pub with_grant_option: bool,
}

const fn row(privileges: &'static [&'static str], scope: TableScope) -> GrantRow {
    GrantRow {
        privileges,
        scope,
        with_grant_option: false,
    }
}

const fn grantable(privileges: &'static [&'static str], scope: TableScope) -> GrantRow {
    GrantRow {
        privileges,
        scope,
        with_grant_option: true,
    }
}

// Router: reads metadata and group membership, registers itself, and creates its own
// per-instance accounts during bootstrap.
pub(crate) const ROUTER_GRANTS: &[GrantRow] = &[
    grantable(&["CREATE USER"], TableScope::Global),
    row(&["SELECT", "EXECUTE"], TableScope::Schema(METADATA_SCHEMA)),
    row(
        &["INSERT", "UPDATE", "DELETE"],
        TableScope::Table(METADATA_SCHEMA, "routers"),
    ),
    row(
        &["INSERT", "UPDATE", "DELETE"],
        TableScope::Table(METADATA_SCHEMA, "v2_routers"),
    ),
    row(
        &["SELECT"],
        TableScope::Table("performance_schema", "global_variables"),
    ),
    row(
        &["SELECT"],
        TableScope::Table("performance_schema", "replication_group_member_stats"),
    ),
    row(
        &["SELECT"],
        TableScope::Table("performance_schema", "replication_group_members"),
    ),
];

const METADATA_ADMIN_PRIVILEGES: &[&str] = &[
    "ALTER",
    "ALTER ROUTINE",
    "CREATE",
    "CREATE ROUTINE",
    "CREATE TEMPORARY TABLES",
    "CREATE VIEW",
    "DELETE",
    "DROP",
    "EVENT",
    "EXECUTE",
    "INDEX",
    "INSERT",
    "LOCK TABLES",
    "REFERENCES",
    "SHOW VIEW",
    "TRIGGER",
    "UPDATE",
];

// Administrator: manages instances, replication and accounts. Global SELECT covers the tables
// the router role lists one by one.
pub(crate) const ADMIN_GRANTS: &[GrantRow] = &[
    grantable(
        &[
            "RELOAD",
            "SHUTDOWN",
            "PROCESS",
            "FILE",
            "SELECT",
            "SUPER",
            "REPLICATION SLAVE",
            "REPLICATION CLIENT",
            "CREATE USER",
            "CLONE_ADMIN",
            "CONNECTION_ADMIN",
            "GROUP_REPLICATION_ADMIN",
            "PERSIST_RO_VARIABLES_ADMIN",
            "REPLICATION_APPLIER",
            "REPLICATION_SLAVE_ADMIN",
            "ROLE_ADMIN",
            "SYSTEM_VARIABLES_ADMIN",
        ],
        TableScope::Global,
    ),
    grantable(&["INSERT", "UPDATE", "DELETE"], TableScope::Schema("mysql")),
    grantable(METADATA_ADMIN_PRIVILEGES, TableScope::Schema(METADATA_SCHEMA)),
    grantable(
        METADATA_ADMIN_PRIVILEGES,
        TableScope::Schema(METADATA_BACKUP_SCHEMA),
    ),
    grantable(
        METADATA_ADMIN_PRIVILEGES,
        TableScope::Schema(METADATA_PREVIOUS_SCHEMA),
    ),
];
