//! ghlog CLI
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ghlog::{Cli, Commands, commands};
use ghlog_core::config::{Config, ConfigLoader};
use tracing::debug;

mod observability;

fn utf8_path(path: PathBuf, what: &str) -> anyhow::Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path)
        .map_err(|e| anyhow::anyhow!("{what} is not valid UTF-8: {}", e.into_path_buf().display()))
}

/// Project config found from `cwd`, then the `--config` file on top.
fn load_config(cli: &Cli, cwd: &Utf8Path) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new().with_project_search(cwd);
    if let Some(ref path) = cli.config {
        loader = loader.with_file(utf8_path(path.clone(), "config path")?);
    }
    loader.load().context("failed to load configuration")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.apply();

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = utf8_path(cwd, "current directory")?;

    let config = load_config(&cli, &cwd)?;
    let filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let _log_guard = observability::init(config.log_dir.as_deref().map(Utf8Path::as_std_path), filter)?;

    debug!(
        cwd = %cwd,
        config_file = ?cli.config,
        verbose = cli.verbose,
        json = cli.json,
        "starting"
    );

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::cmd_generate(args, cli.json, &config, &cwd),
        Commands::Info(args) => commands::info::cmd_info(args, cli.json, &config, &cwd),
        Commands::Doctor(args) => commands::doctor::cmd_doctor(args, cli.json, &config, &cwd),
    };
    if let Err(ref err) = result {
        tracing::error!(error = %format!("{err:#}"), "command failed");
    }
    result
}
