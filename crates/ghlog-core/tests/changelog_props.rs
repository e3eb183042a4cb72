//! Property-based tests for escaping, classification, and compilation.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use ghlog_core::classify::{BoundaryRule, SortKey, classify};
use ghlog_core::config::ChangelogConfig;
use ghlog_core::model::{Category, IssueRecord, KindFilter, RecordKind, Tag};
use ghlog_core::section::escape_markdown;
use ghlog_core::generate;
use proptest::prelude::*;

const SPECIAL: &[char] = &['\\', '<', '>', '*', '_', '(', ')', '[', ']', '#'];

/// Reverse `escape_markdown`, failing on any special character left bare.
fn unescape(escaped: &str) -> Result<String, String> {
    let mut out = String::new();
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if SPECIAL.contains(&next) => out.push(next),
                other => return Err(format!("dangling escape before {other:?}")),
            }
        } else if SPECIAL.contains(&c) {
            return Err(format!("unescaped {c:?}"));
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn at(offset: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(i64::from(offset))
}

/// Titles drawn heavily from Markdown-significant characters.
fn arb_title() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            3 => prop::sample::select(SPECIAL.to_vec()),
            2 => any::<char>(),
        ],
        0..40,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Tags with distinct names and small timestamps so collisions with records happen.
fn arb_tags() -> impl Strategy<Value = Vec<Tag>> {
    prop::collection::vec(0u32..50, 0..6).prop_map(|offsets| {
        offsets
            .into_iter()
            .enumerate()
            .map(|(i, offset)| Tag::new(format!("v0.{i}.0"), at(offset)))
            .collect()
    })
}

/// Records numbered `1..=n` with optional timestamps.
fn arb_records() -> impl Strategy<Value = Vec<IssueRecord>> {
    prop::collection::vec((prop::option::weighted(0.9, 0u32..60), any::<bool>()), 0..30).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (offset, is_pull))| {
                    let number = i as u64 + 1;
                    let kind = if is_pull {
                        RecordKind::PullRequest
                    } else {
                        RecordKind::Issue
                    };
                    let mut record = IssueRecord::new(number, format!("Change {number}"), "u", kind);
                    if is_pull {
                        record.merged_at = offset.map(at);
                    } else {
                        record.closed_at = offset.map(at);
                    }
                    record
                })
                .collect()
        },
    )
}

fn arb_boundary() -> impl Strategy<Value = BoundaryRule> {
    prop_oneof![Just(BoundaryRule::Older), Just(BoundaryRule::Newer)]
}

/// One catch-all section so every admitted record has exactly one home.
fn single_section(boundary: BoundaryRule) -> ChangelogConfig {
    ChangelogConfig {
        boundary,
        categories: vec![Category::catch_all("All", "**All:**", KindFilter::All)],
        ..ChangelogConfig::default()
    }
}

proptest! {
    #[test]
    fn prop_escape_round_trips(title in arb_title()) {
        let escaped = escape_markdown(&title);
        prop_assert_eq!(unescape(&escaped), Ok(title));
    }

    #[test]
    fn prop_every_record_lands_in_one_range(
        records in arb_records(),
        tags in arb_tags(),
        boundary in arb_boundary(),
    ) {
        let config = single_section(boundary);
        let classification = classify(&records, &tags, &config);

        let mut seen: BTreeMap<u64, usize> = BTreeMap::new();
        for range in &classification.ranges {
            for group in &range.groups {
                for record in &group.records {
                    *seen.entry(record.number).or_default() += 1;
                }
            }
        }
        prop_assert_eq!(seen.len(), records.len());
        prop_assert!(seen.values().all(|&count| count == 1));
    }

    #[test]
    fn prop_records_fall_inside_their_range(
        records in arb_records(),
        tags in arb_tags(),
        boundary in arb_boundary(),
    ) {
        let config = single_section(boundary);
        let classification = classify(&records, &tags, &config);

        for range in &classification.ranges {
            for record in range.groups.iter().flat_map(|g| g.records.iter()) {
                let Some(ts) = record.reference_time() else {
                    prop_assert!(range.tag.is_none());
                    continue;
                };
                match boundary {
                    BoundaryRule::Older => {
                        prop_assert!(range.tag.is_none_or(|t| ts <= t.timestamp));
                        prop_assert!(range.older.is_none_or(|t| ts > t.timestamp));
                    }
                    BoundaryRule::Newer => {
                        prop_assert!(range.tag.is_none_or(|t| ts < t.timestamp));
                        prop_assert!(range.older.is_none_or(|t| ts >= t.timestamp));
                    }
                }
            }
        }
    }

    #[test]
    fn prop_sections_sorted_by_descending_number(
        records in arb_records(),
        tags in arb_tags(),
    ) {
        let config = ChangelogConfig {
            sort: SortKey::Number,
            ..single_section(BoundaryRule::Older)
        };
        let classification = classify(&records, &tags, &config);
        for group in classification.ranges.iter().flat_map(|r| r.groups.iter()) {
            prop_assert!(group.records.windows(2).all(|w| w[0].number > w[1].number));
        }
    }

    #[test]
    fn prop_generate_is_deterministic(
        records in arb_records(),
        tags in arb_tags(),
    ) {
        let config = ChangelogConfig::default();
        let first = generate(&records, &tags, &config);
        let second = generate(&records, &tags, &config);
        prop_assert_eq!(first, second);
    }
}
