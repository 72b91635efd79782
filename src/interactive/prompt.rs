//
//  bb-cloud
//  interactive/prompt.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Interactive Prompts Module
//!
//! Thin wrappers over `dialoguer` for text input, masked token entry,
//! confirmations and editor integration.
//!
//! # Example
//!
//! ```no_run
//! use bb_cloud::interactive::{prompt_confirm_with_default, prompt_password};
//!
//! let token = prompt_password("Paste your API token").unwrap();
//! if prompt_confirm_with_default("Store it in the keyring?", true).unwrap() {
//!     println!("Stored {} characters", token.len());
//! }
//! ```

use anyhow::Result;
use dialoguer::{Confirm, Editor, Input, Password};

pub fn prompt_input(message: &str) -> Result<String> {
    let input: String = Input::new().with_prompt(message).interact_text()?;
    Ok(input)
}

pub fn prompt_input_optional(message: &str) -> Result<Option<String>> {
    let input: String = Input::new()
        .with_prompt(message)
        .allow_empty(true)
        .interact_text()?;
    if input.is_empty() {
        Ok(None)
    } else {
        Ok(Some(input))
    }
}

pub fn prompt_password(message: &str) -> Result<String> {
    let password = Password::new().with_prompt(message).interact()?;
    Ok(password)
}

pub fn prompt_confirm_with_default(message: &str, default: bool) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(default)
        .interact()?;
    Ok(confirmed)
}

/// Opens `editor` (or the `dialoguer` default) on `initial`.
///
/// Returns `None` if the user quit without saving.
pub fn prompt_editor(editor: Option<&str>, initial: &str) -> Result<Option<String>> {
    let mut prompt = Editor::new();
    if let Some(command) = editor.filter(|e| !e.is_empty()) {
        prompt.executable(command);
    }
    Ok(prompt.edit(initial)?)
}

/// Returns true when both stdin and stdout are attached to a terminal.
pub fn is_interactive() -> bool {
    use std::io::IsTerminal;
    console::user_attended() && std::io::stdin().is_terminal()
}
