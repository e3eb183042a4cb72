//! Changelog assembly.
//!
//! Turns a [`Classification`] into the final document: one entry per tag
//! range, newest first, each made of a heading and the non-empty sections in
//! configured order.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::classify::{self, Classification, TagRange, Warning};
use crate::config::ChangelogConfig;
use crate::error::{CompileError, CompileResult};
use crate::model::{IssueRecord, Tag};
use crate::section;

/// One rendered tag entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    /// Tag name, or the unreleased label.
    pub tag: String,
    /// Release date; `None` for unreleased changes.
    pub date: Option<NaiveDate>,
    /// Rendered Markdown for this entry, heading included.
    pub content: String,
}

/// A compiled changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Changelog {
    /// The full Markdown document.
    pub document: String,
    /// Entries in document order.
    pub entries: Vec<TagEntry>,
    /// Non-fatal anomalies found along the way.
    pub warnings: Vec<Warning>,
}

/// Reject inputs that would produce a corrupted changelog.
pub fn validate(records: &[IssueRecord], tags: &[Tag]) -> CompileResult<()> {
    let mut numbers = HashSet::with_capacity(records.len());
    for record in records {
        if !numbers.insert(record.number) {
            return Err(CompileError::DuplicateRecord {
                number: record.number,
            });
        }
    }

    let mut names = HashSet::with_capacity(tags.len());
    for tag in tags {
        if !names.insert(tag.name.as_str()) {
            return Err(CompileError::DuplicateTag {
                tag: tag.name.clone(),
            });
        }
    }

    Ok(())
}

/// Validate, classify, and compile in one step.
#[instrument(skip_all, fields(records = records.len(), tags = tags.len()))]
pub fn generate(
    records: &[IssueRecord],
    tags: &[Tag],
    config: &ChangelogConfig,
) -> CompileResult<Changelog> {
    validate(records, tags)?;
    let classification = classify::classify(records, tags, config);
    let changelog = compile(&classification, config);
    info!(
        entries = changelog.entries.len(),
        warnings = changelog.warnings.len(),
        "changelog compiled"
    );
    Ok(changelog)
}

/// Render a classification into a document.
pub fn compile(classification: &Classification<'_>, config: &ChangelogConfig) -> Changelog {
    let mut entries = Vec::new();

    for range in &classification.ranges {
        let sections: String = range
            .groups
            .iter()
            .map(|g| section::render(g.category, &g.records, &config.render))
            .collect();

        let keep = match range.tag {
            None => !sections.is_empty() || config.unreleased_always,
            Some(_) => !sections.is_empty() || !config.skip_empty_tags,
        };
        if !keep {
            debug!(
                tag = range.tag.map_or("unreleased", |t| t.name.as_str()),
                "skipping empty entry"
            );
            continue;
        }

        let mut content = heading(range, config);
        content.push_str("\n\n");
        if let Some(link) = compare_link(range, config) {
            content.push_str(&link);
            content.push_str("\n\n");
        }
        content.push_str(&sections);

        entries.push(TagEntry {
            tag: range
                .tag
                .map_or_else(|| config.unreleased_label.clone(), |t| t.name.clone()),
            date: range.tag.map(|t| t.timestamp.date_naive()),
            content,
        });
    }

    let mut document = String::new();
    if !config.header.trim().is_empty() {
        document.push_str(config.header.trim_end());
        document.push_str("\n\n");
    }
    for entry in &entries {
        document.push_str(&entry.content);
    }
    if let Some(footer) = config.footer.as_deref().filter(|f| !f.trim().is_empty()) {
        document.push_str(footer.trim_end());
        document.push('\n');
    }
    let trimmed = document.trim_end().len();
    document.truncate(trimmed);
    if !document.is_empty() {
        document.push('\n');
    }

    Changelog {
        document,
        entries,
        warnings: classification.warnings.clone(),
    }
}

fn heading(range: &TagRange<'_>, config: &ChangelogConfig) -> String {
    let base = config.repo_base();
    match (range.tag, base) {
        (None, Some(url)) => format!("## [{}]({url}/tree/HEAD)", config.unreleased_label),
        (None, None) => format!("## {}", config.unreleased_label),
        (Some(tag), Some(url)) => format!(
            "## [{name}]({url}/tree/{name}) ({date})",
            name = tag.name,
            date = tag.timestamp.format("%Y-%m-%d")
        ),
        (Some(tag), None) => format!(
            "## {} ({})",
            tag.name,
            tag.timestamp.format("%Y-%m-%d")
        ),
    }
}

fn compare_link(range: &TagRange<'_>, config: &ChangelogConfig) -> Option<String> {
    if !config.compare_link {
        return None;
    }
    let url = config.repo_base()?;
    let older = range.older?;
    let newer = range.tag.map_or("HEAD", |t| t.name.as_str());
    Some(format!(
        "[Full Changelog]({url}/compare/{}...{newer})",
        older.name
    ))
}
