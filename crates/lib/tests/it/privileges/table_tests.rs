//! Role grant tables.

use std::collections::BTreeSet;

use accord::AccountRole;
use accord::privileges::{ADMIN_GRANTS_VERSION, ROUTER_GRANTS_VERSION, Scope, calculate};

#[test]
fn test_versions_are_exposed() {
    assert_eq!(calculate(AccountRole::Router).version(), ROUTER_GRANTS_VERSION);
    assert_eq!(
        calculate(AccountRole::Administrative).version(),
        ADMIN_GRANTS_VERSION
    );
}

#[test]
fn test_same_role_same_set() {
    for role in [AccountRole::Router, AccountRole::Administrative] {
        let first: BTreeSet<String> = calculate(role).grants().iter().map(|g| g.to_string()).collect();
        let second: BTreeSet<String> = calculate(role).grants().iter().map(|g| g.to_string()).collect();
        assert_eq!(first, second);
    }
}

#[test]
fn test_router_writes_only_router_tables() {
    let router = calculate(AccountRole::Router);
    for grant in router.grants() {
        if ["INSERT", "UPDATE", "DELETE"].contains(&grant.privilege.as_str()) {
            match &grant.scope {
                Scope::Table { table, .. } => assert!(table.ends_with("routers"), "{grant}"),
                other => panic!("router writes outside its tables: {other}"),
            }
        }
    }
}

#[test]
fn test_admin_covers_cluster_metadata() {
    let admin = calculate(AccountRole::Administrative);
    let schemas: Vec<String> = admin
        .scopes()
        .into_iter()
        .filter_map(|scope| match scope {
            Scope::Schema(name) => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert!(schemas.contains(&"mysql_innodb_cluster_metadata".to_string()));
    assert!(schemas.contains(&"mysql".to_string()));
    assert!(admin.scopes().contains(&Scope::Global));
}
