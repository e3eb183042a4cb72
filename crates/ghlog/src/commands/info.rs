//! Info command — show the changelog layout the loaded config produces.

use std::collections::BTreeSet;

use camino::Utf8Path;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::instrument;

use ghlog_core::classify::{BoundaryRule, SortKey};
use ghlog_core::config::{self, Config};
use ghlog_core::model::{Category, KindFilter};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct ConfigInfo<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<&'a Utf8Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repo_url: Option<&'a str>,
    boundary: BoundaryRule,
    sort: SortKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    since_tag: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_tag: Option<&'a str>,
    exclude_labels: &'a BTreeSet<String>,
}

impl<'a> ConfigInfo<'a> {
    fn new(config: &'a Config, cwd: &Utf8Path) -> Self {
        let changelog = &config.changelog;
        Self {
            config_file: config::find_project_config(cwd).map(|p| p.to_string()),
            log_level: config.log_level.as_str(),
            log_dir: config.log_dir.as_deref(),
            repo_url: changelog.repo_base(),
            boundary: changelog.boundary,
            sort: changelog.sort,
            since_tag: changelog.since_tag.as_deref(),
            due_tag: changelog.due_tag.as_deref(),
            exclude_labels: &changelog.exclude_labels,
        }
    }
}

#[derive(Serialize)]
struct Info<'a> {
    name: &'static str,
    version: &'static str,
    config: ConfigInfo<'a>,
    categories: &'a [Category],
}

/// One-line description of what a category collects.
fn describe(category: &Category) -> String {
    if category.catch_all {
        let kinds = match category.kinds {
            KindFilter::All => "issues and pull requests",
            KindFilter::Issues => "issues",
            KindFilter::PullRequests => "pull requests",
        };
        format!("unlabelled {kinds}")
    } else {
        let labels: Vec<&str> = category.labels.iter().map(String::as_str).collect();
        format!("labels: {}", labels.join(", "))
    }
}

fn window(since: Option<&str>, due: Option<&str>) -> String {
    match (since, due) {
        (None, None) => "all releases".to_string(),
        (Some(since), None) => format!("after {since}"),
        (None, Some(due)) => format!("before {due}"),
        (Some(since), Some(due)) => format!("after {since}, before {due}"),
    }
}

/// Print the effective settings and sections.
#[instrument(name = "cmd_info", skip_all, fields(json_output = global_json))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    let info = Info {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        config: ConfigInfo::new(config, cwd),
        categories: &config.changelog.categories,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", info.name.bold(), info.version.green());
    println!();

    let settings = &info.config;
    println!("{}", "Settings".bold().underline());
    let source = settings.config_file.as_deref().unwrap_or("defaults");
    println!("  {}: {}", "Loaded from".dimmed(), source.cyan());
    println!(
        "  {}: {}",
        "Links".dimmed(),
        settings.repo_url.unwrap_or("from origin remote")
    );
    println!(
        "  {}: {}",
        "Releases".dimmed(),
        window(settings.since_tag, settings.due_tag)
    );
    println!(
        "  {}: ties go to the {} release, sorted by {}",
        "Order".dimmed(),
        format!("{:?}", settings.boundary).to_lowercase(),
        format!("{:?}", settings.sort).to_lowercase()
    );
    if !settings.exclude_labels.is_empty() {
        let labels: Vec<&str> = settings.exclude_labels.iter().map(String::as_str).collect();
        println!("  {}: {}", "Excluded labels".dimmed(), labels.join(", "));
    }
    println!("  {}: {}", "Log level".dimmed(), settings.log_level);

    println!();
    println!("{}", "Sections".bold().underline());
    if info.categories.is_empty() {
        println!("  {}", "No sections configured".yellow());
    }
    for category in info.categories {
        println!(
            "  {} {}",
            category.prefix.cyan(),
            format!("({})", describe(category)).dimmed()
        );
    }

    Ok(())
}
