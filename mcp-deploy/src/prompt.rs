use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};

pub trait Prompter: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Asks on the terminal, defaulting to "no"
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Failed to get confirmation")
    }
}
