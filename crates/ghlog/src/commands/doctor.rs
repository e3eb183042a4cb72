//! Doctor command — check what `generate` will have to work with.

use camino::Utf8Path;
use clap::Args;
use ghlog_core::config::{self, ChangelogConfig, Config};
use ghlog_core::git;
use ghlog_core::model::RecordKind;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct DoctorReport {
    config: ConfigStatus,
    git: GitStatus,
    user_config_dir: Option<String>,
    env_vars: Vec<EnvVar>,
}

#[derive(Serialize)]
struct ConfigStatus {
    file: Option<String>,
    found: bool,
    categories: usize,
    /// Record kinds no catch-all section will pick up when unlabelled.
    unclaimed_kinds: Vec<RecordKind>,
}

impl ConfigStatus {
    fn check(changelog: &ChangelogConfig, file: Option<String>) -> Self {
        let included = [
            (RecordKind::Issue, changelog.include_issues),
            (RecordKind::PullRequest, changelog.include_pull_requests),
        ];
        let unclaimed_kinds = included
            .into_iter()
            .filter(|&(kind, on)| {
                on && !changelog
                    .categories
                    .iter()
                    .any(|c| c.catch_all && c.kinds.accepts(kind))
            })
            .map(|(kind, _)| kind)
            .collect();

        Self {
            found: file.is_some(),
            file,
            categories: changelog.categories.len(),
            unclaimed_kinds,
        }
    }
}

#[derive(Serialize)]
struct GitStatus {
    /// `git` on PATH; `--git-tags` needs it
    available: bool,
    inside_repo: bool,
    /// Tags `--git-tags` would read, when inside a repository
    tags: Option<usize>,
    remote: Option<String>,
    /// Link base derived from `origin`, GitHub remotes only
    repo_url: Option<String>,
}

impl GitStatus {
    fn check() -> Self {
        let available = git::git_available();
        let inside_repo = available && git::is_inside_repo().unwrap_or(false);
        if !inside_repo {
            return Self {
                available,
                inside_repo,
                tags: None,
                remote: None,
                repo_url: None,
            };
        }

        let tags = match git::list_tags() {
            Ok(tags) => Some(tags.len()),
            Err(err) => {
                debug!(error = %err, "could not list tags");
                None
            }
        };
        let remote = git::remote_url("origin").ok().flatten();
        let repo_url = remote.as_deref().and_then(git::repo_web_url);
        Self {
            available,
            inside_repo,
            tags,
            remote,
            repo_url,
        }
    }
}

#[derive(Serialize)]
struct EnvVar {
    name: &'static str,
    value: Option<String>,
}

impl EnvVar {
    fn read(name: &'static str) -> Self {
        Self {
            name,
            value: std::env::var(name).ok(),
        }
    }
}

const WATCHED_ENV: &[&str] = &[
    "GHLOG_LOG_PATH",
    "GHLOG_LOG_DIR",
    "RUST_LOG",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
];

impl DoctorReport {
    fn gather(config: &Config, cwd: &Utf8Path) -> Self {
        let file = config::find_project_config(cwd).map(|p| p.to_string());
        Self {
            config: ConfigStatus::check(&config.changelog, file),
            git: GitStatus::check(),
            user_config_dir: config::user_config_dir().map(|p| p.to_string()),
            env_vars: WATCHED_ENV.iter().copied().map(EnvVar::read).collect(),
        }
    }
}

/// Run the checks and print the report.
#[instrument(name = "cmd_doctor", skip_all, fields(json_output = global_json))]
pub fn cmd_doctor(
    _args: DoctorArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Checking git and configuration...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    let report = DoctorReport::gather(config, cwd);
    spinner.finish_and_clear();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let ok = "✓".green().to_string();
    let note = "○".yellow().to_string();
    let bad = "✗".red().to_string();

    println!("{}", "Configuration".bold().underline());
    match report.config.file {
        Some(ref file) => println!("  {ok} {}", file.cyan()),
        None => println!("  {note} No project config; using defaults"),
    }
    println!("  {ok} {} categories", report.config.categories);
    for kind in &report.config.unclaimed_kinds {
        println!("  {note} Unlabelled {kind}s match no section and are left out");
    }
    println!();

    println!("{}", "Git".bold().underline());
    if !report.git.available {
        println!("  {bad} git not found; --git-tags is unavailable");
    } else if !report.git.inside_repo {
        println!("  {note} {cwd} is not inside a repository");
    } else {
        match report.git.tags {
            Some(0) => println!("  {note} No tags; everything would be unreleased"),
            Some(n) => println!("  {ok} {n} tags"),
            None => println!("  {bad} Tags could not be read"),
        }
        match (&report.git.remote, &report.git.repo_url) {
            (_, Some(url)) => println!("  {ok} Links point at {}", url.cyan()),
            (Some(remote), None) => {
                println!("  {note} origin ({remote}) is not on github.com; pass --repo-url for links");
            }
            (None, None) => println!("  {note} No origin remote; pass --repo-url for links"),
        }
    }
    println!();

    println!("{}", "Environment".bold().underline());
    if let Some(ref dir) = report.user_config_dir {
        println!("  {}: {}", "User config".dimmed(), dir.cyan());
    }
    for var in report.env_vars.iter().filter(|v| v.value.is_some()) {
        println!(
            "  {}: {}",
            var.name.dimmed(),
            var.value.as_deref().unwrap_or_default().cyan()
        );
    }

    if report.config.file.is_none() {
        offer_config_creation()?;
    }
    Ok(())
}

/// Offer to write the default settings as the user config.
fn offer_config_creation() -> anyhow::Result<()> {
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Ok(());
    }
    let Some(config_path) = config::user_config_dir().map(|dir| dir.join("config.yaml")) else {
        return Ok(());
    };
    if config_path.exists() {
        return Ok(());
    }

    let create = Confirm::new("Write the default changelog settings to your user config?")
        .with_default(false)
        .with_help_message(&format!("Will create {config_path}"))
        .prompt();

    if let Ok(true) = create {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_saphyr::to_string(&Config::default())?;
        std::fs::write(&config_path, yaml)?;
        println!("  {} Created {}", "✓".green(), config_path.cyan());
    }
    Ok(())
}
