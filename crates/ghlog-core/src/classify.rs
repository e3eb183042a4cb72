//! Tag-range partitioning and label classification.
//!
//! Records are bucketed by the tag range their reference timestamp falls
//! into, then each bucket is split into the configured categories:
//!
//! 1. Tags are sorted newest first. Range `i` belongs to tag `t_i` and covers
//!    `(t_{i+1}, t_i]` under [`BoundaryRule::Older`] or `[t_{i+1}, t_i)` under
//!    [`BoundaryRule::Newer`]. Anything newer than every tag is unreleased;
//!    the oldest tag's range is unbounded below.
//! 2. Labelled categories take every record whose labels intersect their
//!    filter. A record may land in several of them, but only once in each.
//! 3. Catch-all categories take what no labelled category took. The first
//!    catch-all accepting the record's kind wins.
//!
//! Classification never fails. Anomalies are collected as [`Warning`]s.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ChangelogConfig;
use crate::model::{Category, IssueRecord, Tag};

/// Which range claims a record whose timestamp equals a tag's timestamp.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryRule {
    /// The tag's own (older) range: lower bound exclusive, upper inclusive.
    #[default]
    Older,
    /// The next newer range: lower bound inclusive, upper exclusive.
    Newer,
}

/// Ordering of records within a section. Both keys sort descending.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Highest number first.
    #[default]
    Number,
    /// Most recent reference timestamp first, ties by number.
    Date,
}

/// A non-fatal anomaly found while classifying.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Configuration cites a tag that is not in the fetched tag list.
    #[error("tag {tag} not found among fetched tags; ignoring it")]
    UnknownTag {
        /// The cited tag name.
        tag: String,
    },

    /// A non-catch-all category has no labels and can never match.
    #[error("category {category:?} has an empty label filter and is not a catch-all")]
    EmptyFilter {
        /// The category name.
        category: String,
    },

    /// A record has no usable timestamp and was placed in the unreleased range.
    #[error("record #{number} has no timestamp; treating it as unreleased")]
    NoTimestamp {
        /// The record number.
        number: u64,
    },
}

/// One category's records within a tag range.
#[derive(Debug, Clone)]
pub struct CategoryGroup<'a> {
    /// The category definition.
    pub category: &'a Category,
    /// Qualifying records, already sorted.
    pub records: Vec<&'a IssueRecord>,
}

/// All records that fall between two releases.
#[derive(Debug, Clone)]
pub struct TagRange<'a> {
    /// The release closing this range; `None` for unreleased changes.
    pub tag: Option<&'a Tag>,
    /// The next older release, if any.
    pub older: Option<&'a Tag>,
    /// One group per configured category, in configured order.
    pub groups: Vec<CategoryGroup<'a>>,
}

impl TagRange<'_> {
    /// Returns `true` if no category received any record.
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.records.is_empty())
    }

    /// The records of the named category, if that category exists.
    pub fn group(&self, name: &str) -> Option<&[&IssueRecord]> {
        self.groups
            .iter()
            .find(|g| g.category.name == name)
            .map(|g| g.records.as_slice())
    }
}

/// The result of classifying a set of records.
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    /// Ranges newest first; the unreleased range, when kept, comes first.
    pub ranges: Vec<TagRange<'a>>,
    /// Non-fatal anomalies, in discovery order.
    pub warnings: Vec<Warning>,
}

impl<'a> Classification<'a> {
    /// The unreleased range, if it was kept.
    pub fn unreleased(&self) -> Option<&TagRange<'a>> {
        self.ranges.first().filter(|r| r.tag.is_none())
    }

    /// The range closed by the named tag, if it was kept.
    pub fn range(&self, tag: &str) -> Option<&TagRange<'a>> {
        self.ranges
            .iter()
            .find(|r| r.tag.is_some_and(|t| t.name == tag))
    }
}

/// Sort tags newest first. Equal timestamps order by name.
pub fn sort_tags(tags: &[Tag]) -> Vec<&Tag> {
    let mut sorted: Vec<&Tag> = tags.iter().collect();
    sorted.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
}

/// Index of the range containing `timestamp`, given tags sorted newest first.
///
/// `0` is the unreleased range; `i + 1` is the range closed by `sorted[i]`.
pub fn range_index(
    sorted: &[&Tag],
    timestamp: chrono::DateTime<chrono::Utc>,
    rule: BoundaryRule,
) -> usize {
    match rule {
        BoundaryRule::Older => sorted.partition_point(|t| t.timestamp >= timestamp),
        BoundaryRule::Newer => sorted.partition_point(|t| t.timestamp > timestamp),
    }
}

/// Partition `records` into tag ranges and categories.
#[instrument(skip_all, fields(records = records.len(), tags = tags.len()))]
pub fn classify<'a>(
    records: &'a [IssueRecord],
    tags: &'a [Tag],
    config: &'a ChangelogConfig,
) -> Classification<'a> {
    let mut warnings = Vec::new();

    for category in &config.categories {
        if !category.catch_all && category.labels.is_empty() {
            warn!(category = %category.name, "category can never match");
            warnings.push(Warning::EmptyFilter {
                category: category.name.clone(),
            });
        }
    }

    let sorted = sort_tags(tags);

    let mut buckets: Vec<Vec<&IssueRecord>> = vec![Vec::new(); sorted.len() + 1];
    for record in records.iter().filter(|r| config.admits(r)) {
        let index = match record.reference_time() {
            Some(ts) => range_index(&sorted, ts, config.boundary),
            None => {
                warn!(number = record.number, "record has no timestamp");
                warnings.push(Warning::NoTimestamp {
                    number: record.number,
                });
                0
            }
        };
        buckets[index].push(record);
    }

    let (lo, hi) = window(&sorted, config, &mut warnings);

    let mut ranges = Vec::new();
    for (index, bucket) in buckets.into_iter().enumerate() {
        let kept = match index.checked_sub(1) {
            None => lo == 0 && config.unreleased,
            Some(tag_index) => (lo..hi).contains(&tag_index),
        };
        if !kept {
            continue;
        }
        let tag = index.checked_sub(1).map(|i| sorted[i]);
        let older = sorted.get(index).copied();
        let groups = group_by_category(&bucket, &config.categories, config.sort);
        debug!(
            tag = tag.map_or("unreleased", |t| t.name.as_str()),
            records = bucket.len(),
            "classified range"
        );
        ranges.push(TagRange { tag, older, groups });
    }

    Classification { ranges, warnings }
}

/// Resolve `since_tag` / `due_tag` into the kept tag indices `lo..hi`.
///
/// The since tag and everything older is dropped; the due tag and everything
/// newer, including unreleased changes, is dropped. Unknown tags are ignored.
fn window(sorted: &[&Tag], config: &ChangelogConfig, warnings: &mut Vec<Warning>) -> (usize, usize) {
    let mut lookup = |name: Option<&str>| -> Option<usize> {
        let name = name?;
        let found = sorted.iter().position(|t| t.name == name);
        if found.is_none() {
            warn!(tag = name, "configured tag not found");
            warnings.push(Warning::UnknownTag {
                tag: name.to_string(),
            });
        }
        found
    };

    let hi = lookup(config.since_tag.as_deref()).unwrap_or(sorted.len());
    let lo = lookup(config.due_tag.as_deref()).map_or(0, |i| i + 1);
    (lo, hi)
}

/// Split one range's records into the configured categories.
fn group_by_category<'a>(
    bucket: &[&'a IssueRecord],
    categories: &'a [Category],
    sort: SortKey,
) -> Vec<CategoryGroup<'a>> {
    let labelled: Vec<bool> = bucket
        .iter()
        .map(|r| categories.iter().any(|c| c.matches_labels(r)))
        .collect();
    let mut caught = vec![false; bucket.len()];

    categories
        .iter()
        .map(|category| {
            let mut records: Vec<&IssueRecord> = Vec::new();
            for (i, record) in bucket.iter().enumerate() {
                let take = if category.catch_all {
                    !labelled[i] && !caught[i] && category.kinds.accepts(record.kind)
                } else {
                    category.matches_labels(record)
                };
                if take {
                    if category.catch_all {
                        caught[i] = true;
                    }
                    records.push(record);
                }
            }
            sort_records(&mut records, sort);
            CategoryGroup { category, records }
        })
        .collect()
}

fn sort_records(records: &mut [&IssueRecord], key: SortKey) {
    match key {
        SortKey::Number => records.sort_by(|a, b| b.number.cmp(&a.number)),
        SortKey::Date => records.sort_by(|a, b| {
            b.reference_time()
                .cmp(&a.reference_time())
                .then_with(|| b.number.cmp(&a.number))
        }),
    }
}
