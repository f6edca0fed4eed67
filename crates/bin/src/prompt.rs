//! Terminal password prompt.

use accord::options::{OptionsError, Secret};
use accord::setup::PasswordPrompt;
use dialoguer::Password;

/// Reads passwords from the terminal without echo.
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn prompt_password(&self, label: &str) -> accord::Result<Secret> {
        // dialoguer appends its own ": "
        let label = label.trim_end().trim_end_matches(':');
        Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .map(Secret::new)
            .map_err(|e| {
                OptionsError::PromptFailed {
                    reason: e.to_string(),
                }
                .into()
            })
    }
}
