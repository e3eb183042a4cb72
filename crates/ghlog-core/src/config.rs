//! Configuration loading and discovery.
//!
//! This module provides configuration file discovery by:
//! 1. Walking up from the current directory to find project config
//! 2. Loading user config from XDG config directory
//! 3. Merging with the built-in changelog layout
//!
//! # Supported formats
//!
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - `.ghlog.<ext>` in current directory or any parent
//! - `ghlog.<ext>` in current directory or any parent
//! - `~/.config/ghlog/config.<ext>` (user config)
//!
//! # Example
//! ```toml
//! log_level = "warn"
//!
//! [changelog]
//! header = "# Changelog"
//! repo_url = "https://github.com/octo/widgets"
//! exclude_labels = ["duplicate", "wontfix"]
//!
//! [changelog.render]
//! author = true
//! usernames_as_github_logins = true
//!
//! [[changelog.categories]]
//! name = "Security"
//! prefix = "**Security fixes:**"
//! labels = ["security"]
//!
//! [[changelog.categories]]
//! name = "Other"
//! prefix = "**Other changes:**"
//! catch_all = true
//! ```

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::classify::{BoundaryRule, SortKey};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{Category, IssueRecord, default_categories};
use crate::section::RenderOptions;

/// The configuration for ghlog.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Changelog layout and rendering.
    pub changelog: ChangelogConfig,
}

/// Everything that shapes the generated changelog.
///
/// Built once per run and passed by reference to the classifier, section
/// builder, and compiler.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Document title, printed first.
    pub header: String,
    /// Optional closing line.
    pub footer: Option<String>,
    /// Web URL of the repository (e.g., `https://github.com/owner/repo`).
    ///
    /// When set, tag headings link to the tree at that tag.
    pub repo_url: Option<String>,
    /// Emit a `[Full Changelog]` compare link under each heading.
    pub compare_link: bool,
    /// Include changes newer than the latest tag.
    pub unreleased: bool,
    /// Heading for changes newer than the latest tag.
    pub unreleased_label: String,
    /// Emit the unreleased heading even when it has no changes.
    pub unreleased_always: bool,
    /// Drop tag headings that have no changes.
    pub skip_empty_tags: bool,
    /// Only include releases newer than this tag.
    pub since_tag: Option<String>,
    /// Only include releases older than this tag.
    pub due_tag: Option<String>,
    /// Which range claims a record stamped exactly at a tag boundary.
    pub boundary: BoundaryRule,
    /// Ordering of records within a section.
    pub sort: SortKey,
    /// Include plain issues.
    pub include_issues: bool,
    /// Include pull requests.
    pub include_pull_requests: bool,
    /// Records carrying any of these labels are left out entirely.
    pub exclude_labels: BTreeSet<String>,
    /// Per-line rendering toggles.
    pub render: RenderOptions,
    /// Sections, in output order.
    pub categories: Vec<Category>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            header: "# Changelog".to_string(),
            footer: None,
            repo_url: None,
            compare_link: true,
            unreleased: true,
            unreleased_label: "Unreleased".to_string(),
            unreleased_always: false,
            skip_empty_tags: false,
            since_tag: None,
            due_tag: None,
            boundary: BoundaryRule::default(),
            sort: SortKey::default(),
            include_issues: true,
            include_pull_requests: true,
            exclude_labels: ["duplicate", "question", "invalid", "wontfix"]
                .into_iter()
                .map(String::from)
                .collect(),
            render: RenderOptions {
                author: true,
                ..RenderOptions::default()
            },
            categories: default_categories(),
        }
    }
}

impl ChangelogConfig {
    /// Returns `true` if `record` passes the kind toggles and label exclusions.
    pub fn admits(&self, record: &IssueRecord) -> bool {
        let kind_enabled = if record.is_pull_request() {
            self.include_pull_requests
        } else {
            self.include_issues
        };
        kind_enabled && !record.has_any_label(&self.exclude_labels)
    }

    /// The repository URL without a trailing slash.
    pub fn repo_base(&self) -> Option<&str> {
        self.repo_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "ghlog";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load (for testing or programmatic use).
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/ghlog/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the upward search at a directory containing `marker`.
    /// Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Search all the way to the filesystem root.
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file. Later files take precedence, and all
    /// explicit files override discovered ones.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. Explicit files (in order added via `with_file`)
    /// 2. Project config (closest to search root)
    /// 3. User config (`~/.config/ghlog/config.<ext>`)
    /// 4. Default values
    ///
    /// Arrays replace rather than extend, so a config that lists
    /// `categories` replaces the built-in layout.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
        }

        if let Some(ref root) = self.project_search_root
            && let Some(project_config) = self.find_project_config(root)
        {
            figment = Self::merge_file(figment, &project_config);
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            categories = config.changelog.categories.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Find the nearest project config at or above `start`.
    ///
    /// The directory holding the boundary marker is the last one searched,
    /// so a config at the repository root is found from any subdirectory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        for dir in start.ancestors() {
            if let Some(found) = Self::config_in(dir) {
                return Some(found);
            }
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
            {
                tracing::debug!(%dir, marker = marker.as_str(), "stopping config search at boundary");
                break;
            }
        }
        None
    }

    /// A `.ghlog.<ext>` or `ghlog.<ext>` file directly inside `dir`.
    ///
    /// Extensions are tried in [`CONFIG_EXTENSIONS`] order, the dotfile
    /// before the plain name for each.
    fn config_in(dir: &Utf8Path) -> Option<Utf8PathBuf> {
        CONFIG_EXTENSIONS
            .iter()
            .flat_map(|ext| [format!(".{APP_NAME}.{ext}"), format!("{APP_NAME}.{ext}")])
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Find the project config file path without loading it.
pub fn find_project_config<P: AsRef<Utf8Path>>(start: P) -> Option<Utf8PathBuf> {
    ConfigLoader::new()
        .without_boundary_marker()
        .find_project_config(start.as_ref())
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the user config directory path.
///
/// Returns `~/.config/ghlog/` on Linux, `~/Library/Application Support/ghlog/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

/// Get the local data directory path, where logs land by default.
pub fn user_data_local_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.data_local_dir().to_path_buf()).ok()
}
