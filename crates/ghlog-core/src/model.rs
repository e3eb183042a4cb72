//! Changelog data model.
//!
//! Plain data: issue records, release tags, and category definitions. The
//! classifier and renderers read these by reference and never mutate them.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Records
// ──────────────────────────────────────────────

/// Whether a record is a plain issue or a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A plain issue.
    Issue,
    /// A pull request.
    PullRequest,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issue => write!(f, "issue"),
            Self::PullRequest => write!(f, "pull request"),
        }
    }
}

/// The user who opened an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Account login (e.g., `"octocat"`).
    pub login: String,
    /// Link to the account's profile page.
    pub profile_url: String,
}

/// One fetched issue or pull request, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Repository-unique number.
    pub number: u64,
    /// Title as written by the author.
    pub title: String,
    /// Stable link to the item.
    pub url: String,
    /// Label names attached to the item.
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// Issue or pull request.
    pub kind: RecordKind,
    /// Opening user; `None` when the source supplied no user (deleted account).
    #[serde(default)]
    pub author: Option<Author>,
    /// Free-text description.
    #[serde(default)]
    pub body: Option<String>,
    /// When the pull request was merged.
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    /// When the item was closed.
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// When the item was opened.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl IssueRecord {
    /// Create a record with no labels, author, body, or timestamps.
    pub fn new(number: u64, title: impl Into<String>, url: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            number,
            title: title.into(),
            url: url.into(),
            labels: BTreeSet::new(),
            kind,
            author: None,
            body: None,
            merged_at: None,
            closed_at: None,
            created_at: None,
        }
    }

    /// Returns `true` for pull requests.
    pub fn is_pull_request(&self) -> bool {
        self.kind == RecordKind::PullRequest
    }

    /// The timestamp used to place this record within a tag range.
    ///
    /// Merged pull requests use `merged_at`; everything else falls back from
    /// `closed_at` to `created_at`.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        if self.is_pull_request()
            && let Some(merged) = self.merged_at
        {
            return Some(merged);
        }
        self.closed_at.or(self.created_at)
    }

    /// Returns `true` if any of this record's labels is in `filter`.
    pub fn has_any_label(&self, filter: &BTreeSet<String>) -> bool {
        !self.labels.is_disjoint(filter)
    }
}

// ──────────────────────────────────────────────
// Tags
// ──────────────────────────────────────────────

/// A release tag and the moment it was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name (e.g., `"v1.2.0"`).
    pub name: String,
    /// Creation time of the tag.
    pub timestamp: DateTime<Utc>,
}

impl Tag {
    /// Create a tag.
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            timestamp,
        }
    }
}

// ──────────────────────────────────────────────
// Categories
// ──────────────────────────────────────────────

/// Which record kinds a category accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindFilter {
    /// Issues and pull requests.
    #[default]
    All,
    /// Plain issues only.
    Issues,
    /// Pull requests only.
    PullRequests,
}

impl KindFilter {
    /// Returns `true` if a record of `kind` passes this filter.
    pub const fn accepts(self, kind: RecordKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _)
                | (Self::Issues, RecordKind::Issue)
                | (Self::PullRequests, RecordKind::PullRequest)
        )
    }
}

/// A named changelog section and the label rule that fills it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Display name, used to key the classification result.
    pub name: String,
    /// Line printed before the list (skipped in simple-list mode).
    pub prefix: String,
    /// Records qualify when their labels intersect this set.
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// Collects records that no labelled category claimed.
    #[serde(default)]
    pub catch_all: bool,
    /// Record kinds this category accepts.
    #[serde(default)]
    pub kinds: KindFilter,
}

impl Category {
    /// Create a label-filtered category accepting all kinds.
    pub fn labelled<I, S>(name: impl Into<String>, prefix: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            catch_all: false,
            kinds: KindFilter::All,
        }
    }

    /// Create a catch-all category restricted to `kinds`.
    pub fn catch_all(name: impl Into<String>, prefix: impl Into<String>, kinds: KindFilter) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            labels: BTreeSet::new(),
            catch_all: true,
            kinds,
        }
    }

    /// Returns `true` if this non-catch-all category's label rule matches.
    ///
    /// Always `false` for catch-all categories and for empty filters.
    pub fn matches_labels(&self, record: &IssueRecord) -> bool {
        !self.catch_all && self.kinds.accepts(record.kind) && record.has_any_label(&self.labels)
    }
}

/// The built-in section layout: enhancements, bugs, then the issue and pull
/// request catch-alls.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::labelled(
            "Implemented enhancements",
            "**Implemented enhancements:**",
            ["enhancement", "Enhancement", "Type: Enhancement", "feature"],
        ),
        Category::labelled(
            "Fixed bugs",
            "**Fixed bugs:**",
            ["bug", "Bug", "Type: Bug"],
        ),
        Category::catch_all("Closed issues", "**Closed issues:**", KindFilter::Issues),
        Category::catch_all(
            "Merged pull requests",
            "**Merged pull requests:**",
            KindFilter::PullRequests,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn merged_pull_request_uses_merged_at() {
        let mut pr = IssueRecord::new(1, "t", "u", RecordKind::PullRequest);
        pr.created_at = Some(at(1));
        pr.closed_at = Some(at(3));
        pr.merged_at = Some(at(2));
        assert_eq!(pr.reference_time(), Some(at(2)));
    }

    #[test]
    fn issue_ignores_merged_at() {
        let mut issue = IssueRecord::new(1, "t", "u", RecordKind::Issue);
        issue.merged_at = Some(at(2));
        issue.closed_at = Some(at(5));
        assert_eq!(issue.reference_time(), Some(at(5)));
    }

    #[test]
    fn open_record_falls_back_to_created_at() {
        let mut issue = IssueRecord::new(1, "t", "u", RecordKind::Issue);
        issue.created_at = Some(at(4));
        assert_eq!(issue.reference_time(), Some(at(4)));

        let bare = IssueRecord::new(2, "t", "u", RecordKind::PullRequest);
        assert_eq!(bare.reference_time(), None);
    }

    #[test]
    fn kind_filter_accepts() {
        assert!(KindFilter::All.accepts(RecordKind::Issue));
        assert!(KindFilter::All.accepts(RecordKind::PullRequest));
        assert!(KindFilter::Issues.accepts(RecordKind::Issue));
        assert!(!KindFilter::Issues.accepts(RecordKind::PullRequest));
        assert!(KindFilter::PullRequests.accepts(RecordKind::PullRequest));
        assert!(!KindFilter::PullRequests.accepts(RecordKind::Issue));
    }

    #[test]
    fn catch_all_never_matches_labels() {
        let mut record = IssueRecord::new(1, "t", "u", RecordKind::Issue);
        record.labels.insert("bug".into());
        let mut cat = Category::catch_all("All", "**All:**", KindFilter::All);
        cat.labels.insert("bug".into());
        assert!(!cat.matches_labels(&record));
    }

    #[test]
    fn labelled_category_respects_kinds() {
        let mut record = IssueRecord::new(1, "t", "u", RecordKind::PullRequest);
        record.labels.insert("bug".into());
        let mut cat = Category::labelled("Bugs", "**Bugs:**", ["bug"]);
        assert!(cat.matches_labels(&record));
        cat.kinds = KindFilter::Issues;
        assert!(!cat.matches_labels(&record));
    }

    #[test]
    fn default_categories_layout() {
        let cats = default_categories();
        let names: Vec<_> = cats.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Implemented enhancements",
                "Fixed bugs",
                "Closed issues",
                "Merged pull requests"
            ]
        );
        assert!(cats[2].catch_all && cats[3].catch_all);
    }
}
