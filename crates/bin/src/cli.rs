//! CLI argument definitions for the Accord binary.

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use accord::options::{
    DRY_RUN, PASSWORD, PASSWORD_EXPIRATION, REQUIRE_CERT_ISSUER, REQUIRE_CERT_SUBJECT, UPDATE,
};

use crate::output::OutputFormat;

/// Provision and reconcile MySQL cluster service accounts
#[derive(Parser, Debug)]
#[command(name = "accord")]
#[command(about = "Accord: provision router and administrative accounts on a MySQL cluster")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update an account for a routing proxy
    SetupRouterAccount(SetupArgs),
    /// Create or update an account for cluster administration
    SetupAdminAccount(SetupArgs),
}

/// Arguments shared by the account setup commands
#[derive(clap::Args, Debug)]
pub struct SetupArgs {
    /// Account to set up, as user[@host]; the host defaults to %
    pub account: String,

    /// Connection URL of the cluster member that accepts writes
    #[arg(long, env = "ACCORD_URL", hide_env_values = true)]
    pub url: String,

    /// Password for the account
    #[arg(long, env = "ACCORD_ACCOUNT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Update an existing account instead of failing
    #[arg(long)]
    pub update: bool,

    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Required X.509 issuer; an empty value removes the requirement
    #[arg(long)]
    pub require_cert_issuer: Option<String>,

    /// Required X.509 subject; an empty value removes the requirement
    #[arg(long)]
    pub require_cert_subject: Option<String>,

    /// Password expiration: NEVER, DEFAULT, or a number of days
    #[arg(long)]
    pub password_expiration: Option<String>,

    /// Prompt for the password of a new account when none is given
    #[arg(short, long)]
    pub interactive: bool,
}

impl SetupArgs {
    /// The option map handed to the library validator.
    ///
    /// Only flags that were given appear in the map, so "not given" and "given empty" stay
    /// distinct.
    pub fn options(&self) -> Map<String, Value> {
        let mut options = Map::new();
        if let Some(password) = &self.password {
            options.insert(PASSWORD.into(), Value::from(password.as_str()));
        }
        if self.update {
            options.insert(UPDATE.into(), Value::Bool(true));
        }
        if self.dry_run {
            options.insert(DRY_RUN.into(), Value::Bool(true));
        }
        if let Some(issuer) = &self.require_cert_issuer {
            options.insert(REQUIRE_CERT_ISSUER.into(), Value::from(issuer.as_str()));
        }
        if let Some(subject) = &self.require_cert_subject {
            options.insert(REQUIRE_CERT_SUBJECT.into(), Value::from(subject.as_str()));
        }
        if let Some(expiration) = &self.password_expiration {
            options.insert(PASSWORD_EXPIRATION.into(), expiration_value(expiration));
        }
        options
    }
}

/// Numbers become JSON numbers so that the validator applies its numeric rules to them.
fn expiration_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(days) = trimmed.parse::<i64>() {
        Value::from(days)
    } else if let Ok(days) = trimmed.parse::<f64>() {
        Value::from(days)
    } else {
        Value::from(raw)
    }
}
