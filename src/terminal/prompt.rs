use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Editor, Input};

use crate::resolve::{Answer, Prompter};

fn prompt(prompt: &str) -> Result<String> {
    Ok(Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?)
}

pub fn prompt_yes_no(prompt: &str) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact()?)
}

/// Opens `text` in the user's editor. None if the editor was closed without saving.
pub fn edit_text(text: &str) -> Result<Option<String>> {
    Ok(Editor::new().extension(".csv").edit(text)?)
}

/// Asks the operator on the terminal. Blocks until an answer is typed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask_relation_code(&mut self, name: &str, position: usize, total: usize) -> Result<Answer> {
        prompt(&format!("Enter Relatiecode for {name} ({position}/{total})")).map(Answer::Code)
    }

    fn ask_ledger_account(
        &mut self,
        relation_code: &str,
        position: usize,
        total: usize,
    ) -> Result<Answer> {
        prompt(&format!(
            "Enter grootboekrekening for {relation_code} ({position}/{total})"
        ))
        .map(Answer::Code)
    }
}
