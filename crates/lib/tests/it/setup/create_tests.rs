//! Creating accounts that do not exist yet.

use accord::AccountRole;
use accord::executor::InMemoryCluster;
use accord::options::PasswordExpiration;
use accord::privileges::calculate;
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_create_router_account() {
    let cluster = InMemoryCluster::new();
    let report = setup_router(&cluster, "svc@%", json!({"password": "x"})).unwrap();

    assert!(report.created);
    assert!(!report.account_existed);
    assert!(!report.dry_run);
    assert_eq!(report.role, AccountRole::Router);
    let expected: Vec<_> = calculate(AccountRole::Router).grants().iter().cloned().collect();
    assert_eq!(report.grants_added, expected);
    assert!(report.grants_removed.is_empty());
    assert!(report.auth_attributes_changed.contains(&"password".to_string()));

    let account = cluster.account("svc", "%").unwrap();
    assert!(account.password_matches("x"));
    assert_eq!(
        account.grants.iter().cloned().collect::<Vec<_>>(),
        expected
    );
}

#[test]
fn test_account_is_created_by_one_statement() {
    let cluster = InMemoryCluster::new();
    setup_router(
        &cluster,
        "cert1@%",
        json!({
            "password": "pwd",
            "requireCertIssuer": "/CN=Test Issuer",
            "requireCertSubject": "/CN=Test Subject",
            "passwordExpiration": 42,
        }),
    )
    .unwrap();

    let mutations = cluster.mutations();
    assert_eq!(
        mutations[0],
        "CREATE USER 'cert1'@'%' IDENTIFIED BY 'pwd' REQUIRE ISSUER '/CN=Test Issuer' AND SUBJECT '/CN=Test Subject' PASSWORD EXPIRE INTERVAL 42 DAY"
    );
    assert_eq!(
        mutations.iter().filter(|sql| sql.starts_with("CREATE USER")).count(),
        1
    );
    assert!(mutations[1..].iter().all(|sql| sql.starts_with("GRANT")));

    let account = cluster.account("cert1", "%").unwrap();
    assert_eq!(account.cert_issuer, "/CN=Test Issuer");
    assert_eq!(account.cert_subject, "/CN=Test Subject");
    assert_eq!(account.password_lifetime, Some(42));
}

#[test]
fn test_create_lists_only_supplied_attributes() {
    let cluster = InMemoryCluster::new();
    let report = setup_router(
        &cluster,
        "svc",
        json!({"password": "x", "requireCertSubject": "", "passwordExpiration": "NEVER"}),
    )
    .unwrap();
    assert_eq!(
        report.auth_attributes_changed,
        vec!["password", "passwordExpiration"]
    );
    let account = cluster.account("svc", "%").unwrap();
    assert_eq!(account.cert_subject, "");
    assert_eq!(
        PasswordExpiration::from_lifetime(account.password_lifetime),
        PasswordExpiration::Never
    );
}

#[test]
fn test_create_admin_account() {
    let cluster = InMemoryCluster::new();
    let report = setup_admin(&cluster, "admin@localhost", json!({"password": "adm"})).unwrap();
    assert!(report.created);
    assert_eq!(report.role, AccountRole::Administrative);
    assert_eq!(
        report.grants_added.len(),
        calculate(AccountRole::Administrative).len()
    );
    let state = snapshot(&cluster, "admin@localhost", AccountRole::Administrative);
    assert_eq!(&state.current_grants, calculate(AccountRole::Administrative).grants());
}

#[test]
fn test_update_flag_false_still_creates() {
    let cluster = InMemoryCluster::new();
    let report = setup_router(&cluster, "svc", json!({"password": "x", "update": false})).unwrap();
    assert!(report.created);
}

#[test]
fn test_missing_password_without_prompt() {
    let cluster = InMemoryCluster::new();
    let err = setup_router(&cluster, "svc", json!({})).unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(
        err.to_string(),
        "Could not proceed with the operation because no password was specified for new account 'svc'@'%'"
    );
    assert!(cluster.mutations().is_empty());
}

#[test]
fn test_report_serializes_redacted() {
    let cluster = InMemoryCluster::new();
    let report = setup_router(&cluster, "svc", json!({"password": "hunter22"})).unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["account"], "'svc'@'%'");
    assert_eq!(value["role"], "router");
    assert_eq!(value["created"], true);
    assert_eq!(value["authAttributesChanged"], json!(["password"]));
    assert_eq!(
        value["statements"][0],
        "CREATE USER 'svc'@'%' IDENTIFIED BY '****'"
    );
    let text = format!("{report}\n{value}");
    assert!(!text.contains("hunter22"));
    assert!(report.to_string().starts_with("Account 'svc'@'%' created with router privileges."));
}
