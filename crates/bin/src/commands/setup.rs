//! Account setup commands.

use accord::AccountRole;
use accord::executor::SqlxExecutor;
use accord::setup::AccountSetup;

use crate::cli::SetupArgs;
use crate::output::{OutputFormat, print_report, redact_url};
use crate::prompt::TerminalPrompt;

/// Run `setup-router-account` or `setup-admin-account`
pub fn run(
    args: &SetupArgs,
    role: AccountRole,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    // Options are checked before connecting, so typos fail fast.
    let options = args.options();
    accord::options::validate(&options)?;

    let display_url = redact_url(&args.url);
    tracing::info!("Connecting to {display_url}");
    let executor = SqlxExecutor::connect(&args.url)
        .map_err(|e| format!("Failed to connect to {display_url}: {e}"))?;

    let prompt = TerminalPrompt;
    let mut setup = AccountSetup::new(&executor);
    if args.interactive {
        setup = setup.with_prompt(&prompt);
    }

    let report = setup.setup_account(&args.account, &options, role)?;
    print_report(&report, format)?;
    Ok(())
}
