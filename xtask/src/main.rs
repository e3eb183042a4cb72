//! Build automation tasks for ghlog.
//!
//! - `completions` - Generate shell completions
//! - `man` - Generate man pages for `ghlog` and each subcommand
//!
//! Run `cargo xtask --help` to see available commands.

#![deny(unsafe_code)]

mod commands;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// Name of the installed binary.
const BIN_NAME: &str = "ghlog";

#[derive(Parser, Debug)]
#[command(name = "xtask")]
#[command(about = "Project maintenance tasks")]
struct Xtask {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand, Debug)]
enum Task {
    /// Generate shell completions for the ghlog CLI.
    Completions(commands::completions::CompletionsArgs),

    /// Generate manpages for the ghlog CLI.
    Man(commands::man::ManArgs),
}

fn main() -> Result<(), String> {
    match Xtask::parse().command {
        Task::Completions(args) => commands::completions::cmd_completions(args),
        Task::Man(args) => commands::man::cmd_man(args),
    }
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.parent().unwrap_or(&manifest_dir).to_path_buf()
}

/// Resolve `out_dir` against the workspace root and make sure it exists.
fn output_dir(out_dir: &Path) -> Result<PathBuf, String> {
    let dir = workspace_root().join(out_dir);
    fs::create_dir_all(&dir).map_err(|e| format!("{}: {e}", dir.display()))?;
    Ok(dir)
}
