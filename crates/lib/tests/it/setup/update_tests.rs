//! Updating existing accounts.

use accord::AccountRole;
use accord::executor::StatementExecutor;
use accord::privileges::{Grant, Scope};
use serde_json::json;

use crate::helpers::*;

const METADATA: &str = "mysql_innodb_cluster_metadata";

#[test]
fn test_existing_account_without_update_conflicts() {
    let cluster = cluster_with_router("svc", "x");
    let before = cluster.mutations();
    for opts in [json!({}), json!({"update": false}), json!({"dryRun": true})] {
        let err = setup_router(&cluster, "svc", opts).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(
            err.to_string(),
            "Could not proceed with the operation because account 'svc'@'%' already exists. Enable the 'update' option to update the existing account's privileges."
        );
    }
    assert_eq!(cluster.mutations(), before);
}

#[test]
fn test_update_of_missing_account_conflicts() {
    let cluster = accord::executor::InMemoryCluster::new();
    for opts in [json!({"update": true}), json!({"update": true, "dryRun": true})] {
        let err = setup_router(&cluster, "nobody", opts).unwrap_err();
        assert!(err.is_conflict());
    }
    assert!(cluster.mutations().is_empty());
}

#[test]
fn test_update_is_idempotent() {
    let cluster = cluster_with_router("svc", "x");
    cluster
        .execute(&format!("REVOKE SELECT ON `{METADATA}`.* FROM 'svc'@'%'"), &[])
        .unwrap();

    let first = setup_router(&cluster, "svc", json!({"update": true})).unwrap();
    assert_eq!(
        first.grants_added,
        vec![Grant::new("SELECT", Scope::Schema(METADATA.into()))]
    );

    let second = setup_router(&cluster, "svc", json!({"update": true})).unwrap();
    assert!(second.grants_added.is_empty());
    assert!(second.grants_removed.is_empty());
    assert!(second.auth_attributes_changed.is_empty());
    assert!(second.is_unchanged());
    assert!(!second.created);
    assert!(second.account_existed);
}

#[test]
fn test_update_revokes_only_in_scope_extras() {
    let cluster = cluster_with_router("svc", "x");
    for sql in [
        format!("GRANT DROP ON `{METADATA}`.* TO 'svc'@'%'"),
        "GRANT SELECT ON `app`.* TO 'svc'@'%'".to_string(),
        "GRANT PROCESS ON *.* TO 'svc'@'%'".to_string(),
    ] {
        cluster.execute(&sql, &[]).unwrap();
    }

    let report = setup_router(&cluster, "svc", json!({"update": true})).unwrap();
    assert_eq!(
        report.grants_removed,
        vec![
            Grant::new("PROCESS", Scope::Global),
            Grant::new("DROP", Scope::Schema(METADATA.into())),
        ]
    );

    let account = cluster.account("svc", "%").unwrap();
    assert!(account.grants.contains(&Grant::new("SELECT", Scope::Schema("app".into()))));
    assert!(!account.grants.contains(&Grant::new("PROCESS", Scope::Global)));
}

#[test]
fn test_clearing_subject_leaves_other_attributes() {
    let cluster = accord::executor::InMemoryCluster::new();
    setup_router(
        &cluster,
        "svc",
        json!({"password": "x", "requireCertIssuer": "/CN=ca", "requireCertSubject": "/CN=svc"}),
    )
    .unwrap();

    let report = setup_router(
        &cluster,
        "svc",
        json!({"update": true, "requireCertSubject": ""}),
    )
    .unwrap();
    assert_eq!(report.auth_attributes_changed, vec!["certSubject"]);
    assert!(report.grants_added.is_empty() && report.grants_removed.is_empty());

    let account = cluster.account("svc", "%").unwrap();
    assert_eq!(account.cert_subject, "");
    assert_eq!(account.cert_issuer, "/CN=ca");
    assert!(account.password_matches("x"));
}

#[test]
fn test_clearing_both_requirements() {
    let cluster = accord::executor::InMemoryCluster::new();
    setup_router(&cluster, "svc", json!({"password": "x", "requireCertIssuer": "/CN=ca"})).unwrap();
    let report = setup_router(
        &cluster,
        "svc",
        json!({"update": true, "requireCertIssuer": "", "requireCertSubject": ""}),
    )
    .unwrap();
    // the subject was already empty
    assert_eq!(report.auth_attributes_changed, vec!["certIssuer"]);
    assert_eq!(
        report.statements.last().unwrap().redacted(),
        "ALTER USER 'svc'@'%' REQUIRE NONE"
    );
}

#[test]
fn test_password_changes() {
    let cluster = cluster_with_router("svc", "old");
    let report = setup_router(&cluster, "svc", json!({"update": true, "password": "new"})).unwrap();
    assert_eq!(report.auth_attributes_changed, vec!["password"]);
    assert!(cluster.account("svc", "%").unwrap().password_matches("new"));

    setup_router(&cluster, "svc", json!({"update": true, "password": ""})).unwrap();
    let account = cluster.account("svc", "%").unwrap();
    assert!(!account.has_password());
    let state = snapshot(&cluster, "svc", AccountRole::Router);
    assert!(!state.current_auth.has_password);
}

#[test]
fn test_password_expiration_updates() {
    let cluster = cluster_with_router("svc", "x");
    for (value, lifetime) in [
        (json!("NEVER"), Some(0)),
        (json!(42), Some(42)),
        (json!("DEFAULT"), None),
        (json!(null), None),
    ] {
        setup_router(
            &cluster,
            "svc",
            json!({"update": true, "passwordExpiration": value}),
        )
        .unwrap();
        assert_eq!(
            cluster.account("svc", "%").unwrap().password_lifetime,
            lifetime
        );
    }
}

#[test]
fn test_update_touches_only_the_exact_account() {
    let cluster = cluster_with_router("svc@localhost", "x");
    setup_router(&cluster, "svc@%", json!({"password": "y"})).unwrap();
    setup_router(&cluster, "svc@localhost", json!({"update": true, "password": "z"})).unwrap();
    assert!(cluster.account("svc", "%").unwrap().password_matches("y"));
    assert!(cluster.account("svc", "localhost").unwrap().password_matches("z"));
}
