//! Core library for ghlog.
//!
//! Turns already-fetched GitHub issues and pull requests, plus a list of
//! release tags, into a Markdown changelog grouped by release and category.
//! Nothing here talks to the network.
//!
//! # Modules
//!
//! - [`model`] - Issue records, tags, and category definitions
//! - [`input`] - Decoding GitHub API JSON into the model
//! - [`classify`] - Bucketing records by tag range and category
//! - [`section`] - Markdown for one category's block
//! - [`compile`] - Assembling the full document
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//! - [`git`] - Reading tags and the remote URL from a local clone
//!
//! # Quick Start
//!
//! ```no_run
//! use ghlog_core::{ConfigLoader, generate, input};
//!
//! let config = ConfigLoader::new().load().expect("Failed to load configuration");
//! let records = input::parse_issues(&std::fs::read_to_string("issues.json").unwrap()).unwrap();
//! let tags = input::parse_tags(&std::fs::read_to_string("tags.json").unwrap()).unwrap();
//!
//! let changelog = generate(&records, &tags, &config.changelog).expect("bad input");
//! print!("{}", changelog.document);
//! ```
#![deny(unsafe_code)]

pub mod classify;

pub mod compile;

pub mod config;

pub mod error;

pub mod git;

pub mod input;

pub mod model;

pub mod section;

pub use classify::{BoundaryRule, Classification, SortKey, Warning, classify};

pub use compile::{Changelog, TagEntry, compile, generate};

pub use config::{ChangelogConfig, Config, ConfigLoader, LogLevel};

pub use error::{CompileError, CompileResult, ConfigError, ConfigResult};

pub use model::{Category, IssueRecord, KindFilter, RecordKind, Tag};

pub use section::RenderOptions;
