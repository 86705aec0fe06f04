//! Find the lines of text that mention a tag.
//!
//! Used by the tag manager to show every journal line and task title where a
//! hashtag was written, newest first.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Daily, OwnerRef, Task};

/// A single line of text mentioning a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mention {
    pub owner: OwnerRef,
    /// Entry date for dailies (midnight UTC), creation time for tasks.
    pub date: DateTime<Utc>,
    pub text: String,
}

/// Collect every daily line and task title that mentions `#tag`.
///
/// Matching is a case-insensitive substring test on `#tag`, so `#work` also
/// finds lines containing `#workout`. A leading `#` on `tag` is ignored.
/// Results are sorted newest first; ties keep dailies before tasks in input
/// order.
pub fn find_mentions(tag: &str, dailies: &[Daily], tasks: &[Task]) -> Vec<Mention> {
    let tag = tag.trim_start_matches('#');
    if tag.is_empty() {
        return Vec::new();
    }
    let needle = format!("#{}", tag.to_lowercase());

    let mut mentions = Vec::new();

    for daily in dailies {
        let date = daily.entry_date.and_time(chrono::NaiveTime::MIN).and_utc();
        for line in daily.content.lines() {
            if line.to_lowercase().contains(&needle) {
                mentions.push(Mention {
                    owner: daily.owner(),
                    date,
                    text: line.trim().to_string(),
                });
            }
        }
    }

    for task in tasks {
        if task.title.to_lowercase().contains(&needle) {
            mentions.push(Mention {
                owner: task.owner(),
                date: task.created_at_utc,
                text: task.title.clone(),
            });
        }
    }

    mentions.sort_by(|a, b| b.date.cmp(&a.date));
    mentions
}
