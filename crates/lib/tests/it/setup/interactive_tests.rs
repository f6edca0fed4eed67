//! Password prompting for new accounts.

use accord::AccountRole;
use accord::executor::InMemoryCluster;
use accord::setup::{AccountSetup, CONFIRM_PROMPT, PASSWORD_PROMPT};
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_prompts_for_missing_password() {
    let cluster = InMemoryCluster::new();
    let prompt = ScriptedPrompt::new(&["s3cret", "s3cret"]);
    let report = AccountSetup::new(&cluster)
        .with_prompt(&prompt)
        .setup_account("svc", &options(json!({})), AccountRole::Router)
        .unwrap();

    assert!(report.created);
    assert_eq!(report.auth_attributes_changed, vec!["password"]);
    assert_eq!(prompt.labels(), vec![PASSWORD_PROMPT, CONFIRM_PROMPT]);
    assert_eq!(PASSWORD_PROMPT, "Password for new account: ");
    assert!(cluster.account("svc", "%").unwrap().password_matches("s3cret"));
}

#[test]
fn test_mismatched_confirmation() {
    let cluster = InMemoryCluster::new();
    let prompt = ScriptedPrompt::new(&["one", "two"]);
    let err = AccountSetup::new(&cluster)
        .with_prompt(&prompt)
        .setup_account("svc", &options(json!({})), AccountRole::Router)
        .unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(err.to_string(), "Passwords don't match");
    assert!(cluster.mutations().is_empty());
}

#[test]
fn test_no_prompt_when_password_given() {
    let cluster = InMemoryCluster::new();
    let prompt = ScriptedPrompt::new(&[]);
    AccountSetup::new(&cluster)
        .with_prompt(&prompt)
        .setup_account("svc", &options(json!({"password": "x"})), AccountRole::Router)
        .unwrap();
    assert!(prompt.labels().is_empty());
}

#[test]
fn test_no_prompt_for_updates() {
    let cluster = cluster_with_router("svc", "x");
    let prompt = ScriptedPrompt::new(&[]);
    let report = AccountSetup::new(&cluster)
        .with_prompt(&prompt)
        .setup_account("svc", &options(json!({"update": true})), AccountRole::Router)
        .unwrap();
    assert!(report.auth_attributes_changed.is_empty());
    assert!(prompt.labels().is_empty());
}

#[test]
fn test_dry_run_does_not_prompt() {
    let cluster = InMemoryCluster::new();
    let prompt = ScriptedPrompt::new(&[]);
    let report = AccountSetup::new(&cluster)
        .with_prompt(&prompt)
        .setup_account("svc", &options(json!({"dryRun": true})), AccountRole::Router)
        .unwrap();
    assert!(prompt.labels().is_empty());
    assert_eq!(report.auth_attributes_changed, vec!["password"]);
    assert_eq!(
        report.statements[0].redacted(),
        "CREATE USER 'svc'@'%' IDENTIFIED BY '****'"
    );
}
