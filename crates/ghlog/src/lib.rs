//! Argument parsing and commands for the `ghlog` binary.
//!
//! Split from `main.rs` so integration tests and `xtask` (man pages, shell
//! completions via [`command()`]) can see the clap tree.

pub mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Set the process-wide `owo-colors` override.
    pub fn apply(self) {
        match self {
            Self::Auto => {}
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter when -q/-v are absent (e.g. ghlog_core=debug)
    GHLOG_LOG_PATH          Log file; rolls daily as NAME.<date>.EXT
    GHLOG_LOG_DIR           Directory for daily ghlog.<date>.jsonl files
";

/// Global flags and the chosen subcommand.
#[derive(Parser)]
#[command(name = "ghlog")]
#[command(about = "Changelog generator for GitHub issues and pull requests", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// What to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Extra config file, layered over the discovered ones
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Log errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Print JSON instead of Markdown or text
    #[arg(long, global = true)]
    pub json: bool,
}

/// Subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Check git, tags, and config before generating
    Doctor(commands::doctor::DoctorArgs),

    /// Compile a changelog from fetched issues and tags
    Generate(commands::generate::GenerateArgs),

    /// Show the effective settings and sections
    Info(commands::info::InfoArgs),
}

/// The clap command tree, for man pages and completions.
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        command().debug_assert();
    }

    #[test]
    fn generate_rejects_two_tag_sources() {
        let result = Cli::try_parse_from([
            "ghlog",
            "generate",
            "--issues",
            "issues.json",
            "--tags",
            "tags.json",
            "--git-tags",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn generate_parses_window_flags() {
        let cli = Cli::try_parse_from([
            "ghlog",
            "--json",
            "generate",
            "--issues",
            "-",
            "--since-tag",
            "v1.0.0",
            "--no-author",
        ])
        .unwrap();
        assert!(cli.json);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.since_tag.as_deref(), Some("v1.0.0"));
        assert!(args.no_author);
        assert!(!args.author);
    }
}
