//! Markdown rendering of a single changelog section.
//!
//! A section is a category's prefix line followed by one list item per
//! record:
//!
//! ```text
//! **Fixed bugs:**
//!
//! - Fix crash on empty input [\#42](https://github.com/octo/widgets/issues/42)
//! - Handle \<none\> gracefully [\#40](https://github.com/octo/widgets/pull/40) (@octocat)
//!
//! ```
//!
//! Titles, label names, and body excerpts are escaped; URLs never are.

use serde::{Deserialize, Serialize};

use crate::model::{Category, IssueRecord};

/// Placeholder appended when a pull request has no resolvable author.
pub const NULL_USER: &str = "({Null user})";

/// Value of `issue_line_labels` that selects every label.
pub const ALL_LABELS: &str = "ALL";

/// Characters that get a backslash in front of them, besides `\` itself.
const ESCAPED_CHARACTERS: &[char] = &['<', '>', '*', '_', '(', ')', '[', ']', '#'];

/// Per-line rendering toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Skip the category prefix line.
    pub simple_list: bool,
    /// Label names to show after each line, or `["ALL"]` for every label.
    ///
    /// Labels render as escaped text in `\[..\]` with no link, since a
    /// record keeps only label names.
    pub issue_line_labels: Vec<String>,
    /// Credit pull request authors.
    pub author: bool,
    /// Credit authors as `@login` instead of a profile link.
    pub usernames_as_github_logins: bool,
    /// Show the first line of the body under the title.
    pub issue_line_body: bool,
}

/// Escape Markdown-significant characters with a backslash.
///
/// Works in a single pass over the input, which is equivalent to escaping
/// backslashes first and the rest afterwards: inserted backslashes are never
/// themselves escaped.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || ESCAPED_CHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render one category's block.
///
/// Returns an empty string when `records` is empty, so callers can skip the
/// section without leaving a dangling heading.
pub fn render(category: &Category, records: &[&IssueRecord], options: &RenderOptions) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut content = String::new();
    if !options.simple_list {
        content.push_str(&category.prefix);
        content.push_str("\n\n");
    }
    for record in records {
        content.push_str("- ");
        content.push_str(&issue_line(record, options));
        content.push('\n');
    }
    content.push('\n');
    content
}

/// Format a single record as a list item body (without the leading `- `).
pub fn issue_line(record: &IssueRecord, options: &RenderOptions) -> String {
    let mut line = format!(
        "{} [\\#{}]({})",
        escape_markdown(&record.title),
        record.number,
        record.url
    );

    line.push_str(&line_labels(record, &options.issue_line_labels));

    if options.author && record.is_pull_request() {
        line.push(' ');
        line.push_str(&author_credit(record, options.usernames_as_github_logins));
    }

    if options.issue_line_body
        && let Some(first) = first_body_line(record.body.as_deref())
    {
        return format!("**{line}**   \n{}", escape_markdown(first));
    }

    line
}

fn line_labels(record: &IssueRecord, wanted: &[String]) -> String {
    if wanted.is_empty() {
        return String::new();
    }
    let all = wanted.iter().any(|w| w == ALL_LABELS);
    record
        .labels
        .iter()
        .filter(|label| all || wanted.contains(label))
        .map(|label| format!(" \\[{}\\]", escape_markdown(label)))
        .collect()
}

fn author_credit(record: &IssueRecord, as_login: bool) -> String {
    match &record.author {
        None => NULL_USER.to_string(),
        Some(author) if as_login => format!("(@{})", author.login),
        Some(author) => format!("([{}]({}))", author.login, author.profile_url),
    }
}

/// Text up to the first line break, trailing whitespace removed.
///
/// `None` only for a missing or all-whitespace body; a blank first line
/// followed by text yields an empty excerpt.
fn first_body_line(body: Option<&str>) -> Option<&str> {
    let body = body.filter(|b| !b.trim().is_empty())?;
    body.split('\n').next().map(str::trim_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Author, KindFilter, RecordKind};

    fn issue(number: u64, title: &str) -> IssueRecord {
        IssueRecord::new(
            number,
            title,
            format!("https://github.com/octo/widgets/issues/{number}"),
            RecordKind::Issue,
        )
    }

    fn pull(number: u64, title: &str) -> IssueRecord {
        IssueRecord::new(
            number,
            title,
            format!("https://github.com/octo/widgets/pull/{number}"),
            RecordKind::PullRequest,
        )
    }

    fn bugs() -> Category {
        Category::catch_all("Fixed bugs", "**Fixed bugs:**", KindFilter::All)
    }

    #[test]
    fn empty_records_render_nothing() {
        assert_eq!(render(&bugs(), &[], &RenderOptions::default()), "");
    }

    #[test]
    fn plain_issue_section() {
        let record = IssueRecord::new(42, "Fix crash", "<url>", RecordKind::Issue);
        let out = render(&bugs(), &[&record], &RenderOptions::default());
        assert_eq!(out, "**Fixed bugs:**\n\n- Fix crash [\\#42](<url>)\n\n");
    }

    #[test]
    fn simple_list_omits_prefix() {
        let a = issue(2, "Two");
        let b = issue(1, "One");
        let options = RenderOptions {
            simple_list: true,
            ..RenderOptions::default()
        };
        let out = render(&bugs(), &[&a, &b], &options);
        assert_eq!(
            out,
            "- Two [\\#2](https://github.com/octo/widgets/issues/2)\n\
             - One [\\#1](https://github.com/octo/widgets/issues/1)\n\n"
        );
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            escape_markdown("Use [brackets] & *stars*"),
            "Use \\[brackets\\] & \\*stars\\*"
        );
        assert_eq!(escape_markdown("A (B) <C>"), "A \\(B\\) \\<C\\>");
        assert_eq!(escape_markdown("snake_case #1"), "snake\\_case \\#1");
    }

    #[test]
    fn backslash_is_not_double_escaped() {
        assert_eq!(escape_markdown("a\\b"), "a\\\\b");
        assert_eq!(escape_markdown("\\*"), "\\\\\\*");
        assert_eq!(escape_markdown("**"), "\\*\\*");
    }

    #[test]
    fn url_is_not_escaped() {
        let record = IssueRecord::new(7, "x_y", "https://h/a_b(c)", RecordKind::Issue);
        let line = issue_line(&record, &RenderOptions::default());
        assert_eq!(line, "x\\_y [\\#7](https://h/a_b(c))");
    }

    #[test]
    fn author_placeholder_for_missing_user() {
        let record = pull(5, "Add thing");
        let options = RenderOptions {
            author: true,
            ..RenderOptions::default()
        };
        let line = issue_line(&record, &options);
        assert!(line.ends_with(" ({Null user})"), "{line}");
    }

    #[test]
    fn author_as_login_or_link() {
        let mut record = pull(5, "Add thing");
        record.author = Some(Author {
            login: "octocat".into(),
            profile_url: "https://github.com/octocat".into(),
        });

        let mut options = RenderOptions {
            author: true,
            ..RenderOptions::default()
        };
        assert!(issue_line(&record, &options).ends_with(" ([octocat](https://github.com/octocat))"));

        options.usernames_as_github_logins = true;
        assert!(issue_line(&record, &options).ends_with(" (@octocat)"));
    }

    #[test]
    fn author_only_credited_on_pull_requests() {
        let mut record = issue(3, "Bug");
        record.author = Some(Author {
            login: "octocat".into(),
            profile_url: "https://github.com/octocat".into(),
        });
        let options = RenderOptions {
            author: true,
            ..RenderOptions::default()
        };
        assert!(!issue_line(&record, &options).contains("octocat"));
    }

    #[test]
    fn body_first_paragraph_is_bolded_and_escaped() {
        let mut record = issue(9, "Title");
        record.body = Some("First *line*   \r\nSecond line".into());
        let options = RenderOptions {
            issue_line_body: true,
            ..RenderOptions::default()
        };
        assert_eq!(
            issue_line(&record, &options),
            "**Title [\\#9](https://github.com/octo/widgets/issues/9)**   \nFirst \\*line\\*"
        );
    }

    #[test]
    fn blank_body_is_omitted() {
        let options = RenderOptions {
            issue_line_body: true,
            ..RenderOptions::default()
        };
        let mut record = issue(9, "Title");
        let bare = issue_line(&record, &options);
        assert!(!bare.starts_with("**"));

        record.body = Some(" \r\n\t\n".into());
        assert_eq!(issue_line(&record, &options), bare);
    }

    #[test]
    fn blank_first_body_line_keeps_bold_with_empty_excerpt() {
        let options = RenderOptions {
            issue_line_body: true,
            ..RenderOptions::default()
        };
        let mut record = issue(9, "Title");
        record.body = Some("   \nrest".into());
        assert_eq!(
            issue_line(&record, &options),
            "**Title [\\#9](https://github.com/octo/widgets/issues/9)**   \n"
        );
    }

    #[test]
    fn selected_labels_are_listed() {
        let mut record = issue(4, "Thing");
        record.labels = ["bug", "good_first", "ui"].into_iter().map(String::from).collect();

        let options = RenderOptions {
            issue_line_labels: vec!["ui".into(), "good_first".into()],
            ..RenderOptions::default()
        };
        assert!(
            issue_line(&record, &options)
                .ends_with("/issues/4) \\[good\\_first\\] \\[ui\\]")
        );

        let all = RenderOptions {
            issue_line_labels: vec![ALL_LABELS.into()],
            ..RenderOptions::default()
        };
        assert!(issue_line(&record, &all).contains(" \\[bug\\] \\[good\\_first\\] \\[ui\\]"));
    }
}
