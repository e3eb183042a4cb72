//! Generate command — thin CLI layer over `ghlog_core::generate`.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{debug, info, instrument, warn};

use ghlog_core::classify::{BoundaryRule, SortKey};
use ghlog_core::config::{ChangelogConfig, Config};
use ghlog_core::model::{IssueRecord, Tag};
use ghlog_core::{git, input};

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// GitHub issues JSON, as returned by the issues API (`-` for stdin)
    #[arg(long, value_name = "FILE")]
    pub issues: PathBuf,

    /// Tags JSON: `[{"name": ..., "date": ...}]`
    #[arg(long, value_name = "FILE", conflicts_with = "git_tags")]
    pub tags: Option<PathBuf>,

    /// Read tags from the local git repository
    #[arg(long)]
    pub git_tags: bool,

    /// Write the changelog here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only include releases newer than TAG
    #[arg(long, value_name = "TAG")]
    pub since_tag: Option<String>,

    /// Only include releases older than TAG
    #[arg(long, value_name = "TAG")]
    pub due_tag: Option<String>,

    /// Plain list without category headings
    #[arg(long)]
    pub simple_list: bool,

    /// Credit pull request authors
    #[arg(long, overrides_with = "no_author")]
    pub author: bool,

    /// Don't credit pull request authors
    #[arg(long, overrides_with = "author")]
    pub no_author: bool,

    /// Show the first line of each body under its title
    #[arg(long)]
    pub body: bool,

    /// Leave out releases with no changes
    #[arg(long)]
    pub skip_empty_tags: bool,

    /// Repository web URL for links (default: from the `origin` remote)
    #[arg(long, value_name = "URL")]
    pub repo_url: Option<String>,

    /// Which release gets a change stamped exactly at a tag's time
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryRule>,

    /// Order of entries within a section
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,
}

impl GenerateArgs {
    /// Layer command-line choices over the loaded changelog configuration.
    fn apply(&self, changelog: &mut ChangelogConfig) {
        if self.since_tag.is_some() {
            changelog.since_tag.clone_from(&self.since_tag);
        }
        if self.due_tag.is_some() {
            changelog.due_tag.clone_from(&self.due_tag);
        }
        if self.repo_url.is_some() {
            changelog.repo_url.clone_from(&self.repo_url);
        }
        if let Some(boundary) = self.boundary {
            changelog.boundary = boundary;
        }
        if let Some(sort) = self.sort {
            changelog.sort = sort;
        }
        if self.simple_list {
            changelog.render.simple_list = true;
        }
        if self.author {
            changelog.render.author = true;
        }
        if self.no_author {
            changelog.render.author = false;
        }
        if self.body {
            changelog.render.issue_line_body = true;
        }
        if self.skip_empty_tags {
            changelog.skip_empty_tags = true;
        }
    }
}

/// Execute the generate command.
#[instrument(name = "cmd_generate", skip_all, fields(issues = %args.issues.display()))]
pub fn cmd_generate(
    args: GenerateArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    let mut changelog_config = config.changelog.clone();
    args.apply(&mut changelog_config);

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let (records, tags) = behind_spinner(&spinner, |spinner| {
        spinner.set_message("Reading issues...");
        let records = read_records(&args.issues)?;

        spinner.set_message("Reading tags...");
        let tags = read_tags(&args)?;

        if changelog_config.repo_url.is_none() {
            changelog_config.repo_url = detect_repo_url();
        }
        Ok((records, tags))
    })?;

    debug!(
        records = records.len(),
        tags = tags.len(),
        repo_url = ?changelog_config.repo_url,
        cwd = %cwd,
        "compiling changelog"
    );
    let changelog = ghlog_core::generate(&records, &tags, &changelog_config)
        .context("failed to compile changelog")?;

    for warning in &changelog.warnings {
        warn!(%warning, "changelog warning");
        eprintln!("{} {warning}", "warning:".yellow().bold());
    }

    let rendered = if global_json {
        let mut json = serde_json::to_string_pretty(&changelog)?;
        json.push('\n');
        json
    } else {
        changelog.document.clone()
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), entries = changelog.entries.len(), "changelog written");
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

/// Run `work` with the spinner showing, clearing it whether or not `work` fails.
fn behind_spinner<T>(
    spinner: &ProgressBar,
    work: impl FnOnce(&ProgressBar) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let result = work(spinner);
    spinner.finish_and_clear();
    result
}

fn read_records(path: &Path) -> anyhow::Result<Vec<IssueRecord>> {
    let json = read_input(path)?;
    input::parse_issues(&json).with_context(|| format!("failed to read {}", path.display()))
}

fn read_tags(args: &GenerateArgs) -> anyhow::Result<Vec<Tag>> {
    if let Some(ref path) = args.tags {
        let json = read_input(path)?;
        return input::parse_tags(&json)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    if args.git_tags {
        if !git::git_available() {
            bail!("--git-tags needs git on PATH");
        }
        return git::list_tags().context("failed to list git tags");
    }
    debug!("no tags given; everything is unreleased");
    Ok(Vec::new())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Web URL of the `origin` remote, when it points at GitHub-style hosting.
fn detect_repo_url() -> Option<String> {
    if !git::git_available() || !git::is_inside_repo().unwrap_or(false) {
        return None;
    }
    let remote = git::remote_url("origin").ok().flatten()?;
    let url = git::repo_web_url(&remote);
    debug!(%remote, ?url, "repository URL from remote");
    url
}
