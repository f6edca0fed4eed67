use std::cell::RefCell;
use std::collections::VecDeque;

use accord::{
    AccountRole, Report, Result,
    executor::InMemoryCluster,
    identity::parse,
    options::Secret,
    privileges::calculate,
    setup::{AccountSetup, PasswordPrompt},
    state::{ActualAccountState, resolve},
};
use serde_json::{Map, Value};

/// Turn a `json!({...})` literal into an option map.
pub fn options(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("options must be a JSON object, got {other}"),
    }
}

/// Run a router account setup against `cluster`.
pub fn setup_router(cluster: &InMemoryCluster, account: &str, opts: Value) -> Result<Report> {
    AccountSetup::new(cluster).setup_account(account, &options(opts), AccountRole::Router)
}

/// Run an administrative account setup against `cluster`.
pub fn setup_admin(cluster: &InMemoryCluster, account: &str, opts: Value) -> Result<Report> {
    AccountSetup::new(cluster).setup_account(account, &options(opts), AccountRole::Administrative)
}

/// A cluster holding a freshly created router account.
pub fn cluster_with_router(account: &str, password: &str) -> InMemoryCluster {
    let cluster = InMemoryCluster::new();
    setup_router(&cluster, account, serde_json::json!({ "password": password }))
        .expect("Failed to create router account");
    cluster
}

/// The resolver's view of an account for `role`.
pub fn snapshot(cluster: &InMemoryCluster, account: &str, role: AccountRole) -> ActualAccountState {
    let identity = parse(account).expect("Failed to parse account");
    resolve(cluster, &identity, &calculate(role)).expect("Failed to resolve account state")
}

/// Prompt that answers from a fixed script and records the labels it was shown.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: RefCell<VecDeque<String>>,
    labels: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            labels: RefCell::default(),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.borrow().clone()
    }
}

impl PasswordPrompt for ScriptedPrompt {
    fn prompt_password(&self, label: &str) -> Result<Secret> {
        self.labels.borrow_mut().push(label.to_string());
        let answer = self
            .answers
            .borrow_mut()
            .pop_front()
            .expect("Prompt asked more often than scripted");
        Ok(Secret::new(answer))
    }
}
