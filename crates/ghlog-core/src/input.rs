//! Decoding of already-fetched GitHub data.
//!
//! Accepts the JSON the GitHub REST API returns from
//! `GET /repos/{owner}/{repo}/issues?state=all` (pull requests included,
//! marked by a `pull_request` object) and a list of `{ "name", "date" }`
//! tag objects. Pagination is the fetcher's business: this module expects
//! the concatenated pages as one array.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::error::CompileError;
use crate::model::{Author, IssueRecord, RecordKind, Tag};

/// Errors from decoding fetched input.
#[derive(Error, Debug)]
pub enum InputError {
    /// The payload is not the expected JSON shape.
    #[error("malformed {what} JSON: {source}")]
    Json {
        /// What was being decoded (`"issues"` or `"tags"`).
        what: &'static str,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The payload decoded but describes an invalid changelog input.
    #[error(transparent)]
    Invalid(#[from] CompileError),
}

/// Result alias for input decoding.
pub type InputResult<T> = Result<T, InputError>;

#[derive(Debug, Deserialize)]
struct GithubIssue {
    number: u64,
    title: String,
    html_url: String,
    #[serde(default)]
    labels: Vec<GithubLabel>,
    #[serde(default)]
    user: Option<GithubUser>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    pull_request: Option<GithubPullRef>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Labels come back as objects from the API but as bare strings from some
/// exporters.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GithubLabel {
    Name(String),
    Object { name: String },
}

impl GithubLabel {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Object { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
    html_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct GithubPullRef {
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
}

impl From<GithubIssue> for IssueRecord {
    fn from(raw: GithubIssue) -> Self {
        let (kind, pr_merged_at) = match raw.pull_request {
            Some(pr) => (RecordKind::PullRequest, pr.merged_at),
            None => (RecordKind::Issue, None),
        };
        let labels: BTreeSet<String> = raw.labels.into_iter().map(GithubLabel::into_name).collect();

        Self {
            number: raw.number,
            title: raw.title,
            url: raw.html_url,
            labels,
            kind,
            author: raw.user.map(|u| Author {
                login: u.login,
                profile_url: u.html_url,
            }),
            body: raw.body,
            merged_at: raw.merged_at.or(pr_merged_at),
            closed_at: raw.closed_at,
            created_at: raw.created_at,
        }
    }
}

/// Decode a GitHub issues payload into records.
pub fn parse_issues(json: &str) -> InputResult<Vec<IssueRecord>> {
    let raw: Vec<GithubIssue> =
        serde_json::from_str(json).map_err(|source| InputError::Json {
            what: "issues",
            source,
        })?;
    let records: Vec<IssueRecord> = raw.into_iter().map(IssueRecord::from).collect();
    debug!(count = records.len(), "decoded records");
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RawTag {
    name: String,
    date: String,
}

/// Decode a `[{ "name": ..., "date": ... }]` tag list.
///
/// Dates are RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_tags(json: &str) -> InputResult<Vec<Tag>> {
    let raw: Vec<RawTag> = serde_json::from_str(json).map_err(|source| InputError::Json {
        what: "tags",
        source,
    })?;
    let tags = raw
        .into_iter()
        .map(|t| parse_tag(&t.name, &t.date))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = tags.len(), "decoded tags");
    Ok(tags)
}

/// Build a [`Tag`] from a name and a textual timestamp.
pub fn parse_tag(name: &str, raw: &str) -> Result<Tag, CompileError> {
    let value = raw.trim();
    let timestamp = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        })
        .map_err(|_| CompileError::InvalidTagTimestamp {
            tag: name.to_string(),
            value: raw.to_string(),
        })?;
    Ok(Tag::new(name, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ISSUES: &str = r#"[
      {
        "number": 12,
        "title": "Crash on <empty> input",
        "html_url": "https://github.com/octo/widgets/issues/12",
        "labels": [{"name": "bug", "color": "d73a4a"}],
        "user": {"login": "octocat", "html_url": "https://github.com/octocat"},
        "body": "Steps to reproduce\n1. run it",
        "closed_at": "2024-02-01T10:00:00Z",
        "created_at": "2024-01-20T08:00:00Z"
      },
      {
        "number": 13,
        "title": "Fix crash",
        "html_url": "https://github.com/octo/widgets/pull/13",
        "labels": ["bug", "ui"],
        "user": null,
        "body": null,
        "pull_request": {"merged_at": "2024-02-02T12:00:00Z"},
        "closed_at": "2024-02-02T12:00:00Z",
        "created_at": "2024-02-01T11:00:00Z"
      },
      {
        "number": 14,
        "title": "Open question",
        "html_url": "https://github.com/octo/widgets/issues/14",
        "created_at": "2024-02-03T00:00:00Z"
      }
    ]"#;

    #[test]
    fn decodes_issues_and_pulls() {
        let records = parse_issues(ISSUES).unwrap();
        assert_eq!(records.len(), 3);

        let issue = &records[0];
        assert_eq!(issue.kind, RecordKind::Issue);
        assert_eq!(issue.title, "Crash on <empty> input");
        assert!(issue.labels.contains("bug"));
        assert_eq!(issue.author.as_ref().unwrap().login, "octocat");
        assert_eq!(
            issue.closed_at,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap())
        );

        let pr = &records[1];
        assert_eq!(pr.kind, RecordKind::PullRequest);
        assert!(pr.author.is_none());
        assert!(pr.body.is_none());
        assert_eq!(pr.labels.len(), 2);
        assert_eq!(
            pr.merged_at,
            Some(Utc.with_ymd_and_hms(2024, 2, 2, 12, 0, 0).unwrap())
        );

        let open = &records[2];
        assert!(open.labels.is_empty());
        assert!(open.closed_at.is_none());
        assert!(open.reference_time().is_some());
    }

    #[test]
    fn malformed_issues_json_is_an_error() {
        let err = parse_issues(r#"[{"number": "twelve"}]"#).unwrap_err();
        assert!(matches!(err, InputError::Json { what: "issues", .. }));
    }

    #[test]
    fn decodes_tags_in_both_date_forms() {
        let tags = parse_tags(
            r#"[{"name": "v1.0.0", "date": "2024-01-01T12:00:00+02:00"},
                {"name": "v0.9.0", "date": "2023-12-01"}]"#,
        )
        .unwrap();
        assert_eq!(
            tags[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            tags[1].timestamp,
            Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn malformed_tag_date_names_the_tag() {
        let err = parse_tags(r#"[{"name": "v2.0.0", "date": "last tuesday"}]"#).unwrap_err();
        match err {
            InputError::Invalid(CompileError::InvalidTagTimestamp { tag, value }) => {
                assert_eq!(tag, "v2.0.0");
                assert_eq!(value, "last tuesday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
