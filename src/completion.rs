//! # Shell Completion Module
//!
//! Completion scripts for the `cadence` command, plus a hidden helper that
//! lists user ids from the dataset for dynamic `--user` completion.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! cadence completion bash > ~/.local/share/bash-completion/completions/cadence
//!
//! # Generate zsh completions
//! cadence completion zsh > ~/.config/zsh/completions/_cadence
//! ```

use crate::cli::Shell;
use crate::loader;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use log::debug;
use std::io;
use std::path::Path;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

#[must_use]
pub fn shell_to_completion_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Known user ids, sorted. Empty when the dataset is missing, so completion never errors.
pub fn get_user_completions(data_dir: &Path) -> Result<Vec<String>> {
    let users = match loader::load_users(data_dir) {
        Ok(users) => users,
        Err(e) => {
            debug!("No user completions available: {e:#}");
            return Ok(Vec::new());
        }
    };

    let mut ids: Vec<_> = users.into_iter().map(|user| user.user_id).collect();
    ids.sort_unstable();
    Ok(ids.into_iter().map(|id| id.to_string()).collect())
}

pub fn print_user_completions(data_dir: &Path) -> Result<()> {
    for completion in get_user_completions(data_dir)? {
        println!("{completion}");
    }
    Ok(())
}
