//! Dry runs report the plan and change nothing.

use accord::AccountRole;
use accord::executor::{InMemoryCluster, StatementExecutor};
use serde_json::{Value, json};

use crate::helpers::*;

/// A router account with drift in every dimension the engine manages.
fn drifted_cluster() -> InMemoryCluster {
    let cluster = InMemoryCluster::new();
    setup_router(
        &cluster,
        "svc",
        json!({"password": "x", "requireCertIssuer": "/CN=ca"}),
    )
    .unwrap();
    for sql in [
        "REVOKE EXECUTE ON `mysql_innodb_cluster_metadata`.* FROM 'svc'@'%'",
        "GRANT ALTER ON `mysql_innodb_cluster_metadata`.* TO 'svc'@'%'",
        "REVOKE GRANT OPTION ON *.* FROM 'svc'@'%'",
    ] {
        cluster.execute(sql, &[]).unwrap();
    }
    cluster
}

fn update_options() -> Value {
    json!({
        "update": true,
        "password": "y",
        "requireCertSubject": "/CN=svc",
        "passwordExpiration": 90,
    })
}

fn with_dry_run(mut opts: Value) -> Value {
    opts["dryRun"] = json!(true);
    opts
}

#[test]
fn test_dry_run_does_not_mutate() {
    let cluster = drifted_cluster();
    let before = snapshot(&cluster, "svc", AccountRole::Router);
    let mutations = cluster.mutations();

    let report = setup_router(&cluster, "svc", with_dry_run(update_options())).unwrap();
    assert!(report.dry_run);
    assert!(!report.statements.is_empty());

    assert_eq!(snapshot(&cluster, "svc", AccountRole::Router), before);
    assert_eq!(cluster.mutations(), mutations);
}

#[test]
fn test_dry_run_create_does_not_mutate() {
    let cluster = InMemoryCluster::new();
    let report = setup_router(&cluster, "svc", json!({"password": "x", "dryRun": true})).unwrap();
    assert!(report.created);
    assert!(report.dry_run);
    assert!(!cluster.account_exists("svc", "%"));
    assert!(cluster.mutations().is_empty());
}

#[test]
fn test_dry_run_matches_real_run() {
    let preview_cluster = drifted_cluster();
    let apply_cluster = drifted_cluster();

    let preview = setup_router(&preview_cluster, "svc", with_dry_run(update_options())).unwrap();
    let applied = setup_router(&apply_cluster, "svc", update_options()).unwrap();

    assert!(preview.dry_run && !applied.dry_run);
    assert_eq!(preview.grants_added, applied.grants_added);
    assert_eq!(preview.grants_removed, applied.grants_removed);
    assert_eq!(
        preview.auth_attributes_changed,
        vec!["password", "certSubject", "passwordExpiration"]
    );
    assert_eq!(preview.statements, applied.statements);
    assert_eq!(
        accord::Report {
            dry_run: false,
            ..preview
        },
        applied
    );

    // the applied statements are exactly the previewed ones
    let executed: Vec<String> = apply_cluster
        .mutations()
        .into_iter()
        .skip(preview_cluster.mutations().len())
        .collect();
    let expected: Vec<String> = applied
        .statements
        .iter()
        .map(|s| s.redacted().to_string())
        .collect();
    assert_eq!(
        executed
            .iter()
            .map(|sql| sql.replace("IDENTIFIED BY 'y'", "IDENTIFIED BY '****'"))
            .collect::<Vec<_>>(),
        expected
    );
}

#[test]
fn test_dry_run_create_matches_real_create() {
    let opts = json!({"password": "x", "passwordExpiration": "never"});
    let preview = setup_router(&InMemoryCluster::new(), "svc", with_dry_run(opts.clone())).unwrap();
    let applied = setup_router(&InMemoryCluster::new(), "svc", opts).unwrap();
    assert_eq!(accord::Report { dry_run: false, ..preview }, applied);
}

#[test]
fn test_dry_run_ignores_password_policy() {
    let cluster = InMemoryCluster::new().with_password_policy(8);
    let report = setup_router(&cluster, "svc", json!({"password": "foo", "dryRun": true})).unwrap();
    assert!(report.created);
    assert!(setup_router(&cluster, "svc", json!({"password": "foo"}))
        .unwrap_err()
        .is_policy_rejection());
}

#[test]
fn test_dry_run_report_text() {
    let cluster = drifted_cluster();
    let report = setup_router(&cluster, "svc", with_dry_run(update_options())).unwrap();
    let text = report.to_string();
    assert!(text.starts_with("Account 'svc'@'%' would be updated with router privileges."));
    assert!(text.contains("Dry run: no changes were made."));
    assert!(text.contains("Statements that would be executed:"));
    assert!(!text.contains("'y'"));
}
