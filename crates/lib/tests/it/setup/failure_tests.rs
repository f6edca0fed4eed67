//! Failures while applying, and the revert of partial work.

use accord::AccountRole;
use accord::executor::errors::{
    ER_CANT_CREATE_USER_WITH_GRANT, ER_SPECIFIC_ACCESS_DENIED_ERROR, ER_TABLEACCESS_DENIED_ERROR,
};
use accord::executor::in_memory::PASSWORD_POLICY_MESSAGE;
use accord::executor::{ExecutorError, InMemoryCluster, StatementExecutor};
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_password_policy_rejection_is_verbatim() {
    let cluster = InMemoryCluster::new().with_password_policy(8);
    let err = setup_router(&cluster, "svc", json!({"password": "foo"})).unwrap_err();
    assert!(err.is_policy_rejection());
    assert_eq!(err.to_string(), PASSWORD_POLICY_MESSAGE);
    assert!(!cluster.account_exists("svc", "%"));
    assert!(cluster.mutations().is_empty());

    let report = setup_router(&cluster, "svc", json!({"password": "long enough"})).unwrap();
    assert!(report.created);
}

#[test]
fn test_denied_grant_drops_new_account() {
    let cluster = InMemoryCluster::new();
    cluster.fail_on(
        "ON `performance_schema`.`replication_group_members`",
        ExecutorError::server(
            ER_TABLEACCESS_DENIED_ERROR,
            "GRANT command denied to user 'admin'@'%' for table 'replication_group_members'",
        ),
    );

    let err = setup_router(&cluster, "svc", json!({"password": "x"})).unwrap_err();
    assert!(err.is_authorization_error());
    assert_eq!(
        err.to_string(),
        "GRANT command denied to user 'admin'@'%' for table 'replication_group_members'"
    );
    assert!(!cluster.account_exists("svc", "%"));
    assert_eq!(
        cluster.mutations().last().map(String::as_str),
        Some("DROP USER IF EXISTS 'svc'@'%'")
    );
}

#[test]
fn test_missing_privilege_to_create() {
    let cluster = InMemoryCluster::new();
    cluster.fail_on(
        "CREATE USER",
        ExecutorError::server(
            ER_SPECIFIC_ACCESS_DENIED_ERROR,
            "Access denied; you need (at least one of) the CREATE USER privilege(s) for this operation",
        ),
    );
    let err = setup_admin(&cluster, "adm", json!({"password": "x"})).unwrap_err();
    assert!(err.is_authorization_error());
    assert!(cluster.mutations().is_empty());
}

#[test]
fn test_failed_update_restores_grants() {
    let cluster = cluster_with_router("svc", "x");
    for sql in [
        "REVOKE SELECT ON `mysql_innodb_cluster_metadata`.* FROM 'svc'@'%'",
        "GRANT DROP ON `mysql_innodb_cluster_metadata`.* TO 'svc'@'%'",
    ] {
        cluster.execute(sql, &[]).unwrap();
    }
    let before = snapshot(&cluster, "svc", AccountRole::Router);

    cluster.fail_on(
        "ALTER USER",
        ExecutorError::server(ER_CANT_CREATE_USER_WITH_GRANT, "You are not allowed to alter this user"),
    );
    let err = setup_router(&cluster, "svc", json!({"update": true, "password": "new"})).unwrap_err();
    assert!(err.is_authorization_error());

    assert_eq!(snapshot(&cluster, "svc", AccountRole::Router), before);
    assert!(cluster.account("svc", "%").unwrap().password_matches("x"));
}

#[test]
fn test_weak_password_on_update_restores_grants() {
    let cluster = InMemoryCluster::new().with_password_policy(4);
    setup_router(&cluster, "svc", json!({"password": "strong"})).unwrap();
    cluster
        .execute("REVOKE SELECT ON `mysql_innodb_cluster_metadata`.* FROM 'svc'@'%'", &[])
        .unwrap();
    let before = snapshot(&cluster, "svc", AccountRole::Router);

    let err = setup_router(&cluster, "svc", json!({"update": true, "password": "ab"})).unwrap_err();
    assert!(err.is_policy_rejection());
    assert_eq!(snapshot(&cluster, "svc", AccountRole::Router), before);
}

#[test]
fn test_connection_failure_is_execution_error() {
    let cluster = InMemoryCluster::new();
    cluster.fail_on("FROM mysql.user", ExecutorError::connection("Lost connection to MySQL server"));
    let err = setup_router(&cluster, "svc", json!({"password": "x"})).unwrap_err();
    assert!(err.is_execution_error());
    assert_eq!(err.module(), "setup");
    assert!(cluster.mutations().is_empty());
}
