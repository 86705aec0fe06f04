//! Subcommand implementations.
//!
//! Each command returns a serializable report; `main` decides how to print it.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use taskdaily_core::{
    dedup_names, distinct_hashtags, extract_hashtags, find_mentions, segment_hashtags,
    tag_color_index, transition, AutocompleteEvent, AutocompleteState, Daily, EngineConfig, Key,
    Mention, OwnerRef, Tag, UserContext,
};
use taskdaily_db::{AssociationStore, MemoryBackend, TagRegistry};
use taskdaily_jobs::{AutosaveEvent, Autosaver};

/// Use `text` when given, otherwise read all of stdin.
pub fn read_text(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

// =============================================================================
// EXTRACT
// =============================================================================

pub fn extract(text: &str, distinct: bool) -> Vec<String> {
    if distinct {
        distinct_hashtags(text)
    } else {
        extract_hashtags(text)
    }
}

// =============================================================================
// SUGGEST
// =============================================================================

/// Autocomplete session state after replaying the requested keys.
#[derive(Debug, Serialize)]
pub struct SuggestReport {
    pub text: String,
    pub cursor: usize,
    pub suggesting: bool,
    pub candidates: Vec<String>,
    pub selected: Option<String>,
    /// Tag inserted by `--select`, if a candidate was open.
    pub completed: Option<String>,
}

/// Build an in-memory registry from bare tag names, keeping their order.
pub fn registry_from_names(names: &[String]) -> Vec<Tag> {
    let now = Utc::now();
    names
        .iter()
        .map(|name| name.trim().trim_start_matches('#'))
        .filter(|name| !name.is_empty())
        .map(|name| Tag {
            id: Uuid::now_v7(),
            name: name.to_string(),
            user_id: Uuid::nil(),
            created_at_utc: now,
        })
        .collect()
}

pub fn suggest(
    text: &str,
    cursor: Option<usize>,
    tags: &[String],
    down: usize,
    up: usize,
    select: bool,
) -> SuggestReport {
    let registry = registry_from_names(tags);
    let cursor = cursor.unwrap_or(text.len());

    let mut state = transition(
        AutocompleteState::default(),
        AutocompleteEvent::text_changed(text, cursor),
        &registry,
    )
    .state;

    let keys = std::iter::repeat(Key::ArrowDown)
        .take(down)
        .chain(std::iter::repeat(Key::ArrowUp).take(up));
    for key in keys {
        state = transition(state, AutocompleteEvent::Key(key), &registry).state;
    }

    let mut completed = None;
    if select {
        let step = transition(state, AutocompleteEvent::Key(Key::Enter), &registry);
        completed = step.completion.map(|c| c.tag);
        state = step.state;
    }

    debug!(
        suggesting = state.is_suggesting(),
        candidates = state.candidates().len(),
        "Autocomplete replay finished"
    );

    SuggestReport {
        text: state.text().to_string(),
        cursor: state.cursor(),
        suggesting: state.is_suggesting(),
        candidates: state.candidates().iter().map(|t| t.name.clone()).collect(),
        selected: state.selected().map(|t| t.name.clone()),
        completed,
    }
}

// =============================================================================
// SEGMENTS
// =============================================================================

/// A run of text for display, with a palette slot for hashtags.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ColoredSegment<'a> {
    pub kind: &'static str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<usize>,
}

pub fn segments(text: &str, palette: usize) -> Vec<ColoredSegment<'_>> {
    segment_hashtags(text)
        .into_iter()
        .map(|segment| {
            if segment.is_hashtag() {
                ColoredSegment {
                    kind: "hashtag",
                    text: segment.as_str(),
                    color: Some(tag_color_index(segment.as_str(), palette)),
                }
            } else {
                ColoredSegment {
                    kind: "plain",
                    text: segment.as_str(),
                    color: None,
                }
            }
        })
        .collect()
}

// =============================================================================
// DAILY FILES
// =============================================================================

/// Load one daily entry from a file named after its date (`2026-10-16.md`).
pub fn load_daily(path: &Path) -> Result<Daily> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("no file name in {}", path.display()))?;
    let entry_date = NaiveDate::parse_from_str(stem, "%Y-%m-%d")
        .with_context(|| format!("file name {} is not a YYYY-MM-DD date", path.display()))?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    Ok(Daily {
        id: Uuid::now_v7(),
        entry_date,
        content,
        created_at_utc: Utc::now(),
    })
}

pub fn load_dailies(paths: &[PathBuf]) -> Result<Vec<Daily>> {
    paths.iter().map(|p| load_daily(p)).collect()
}

// =============================================================================
// MENTIONS
// =============================================================================

/// A mention printed with its entry date instead of an owner id.
#[derive(Debug, Serialize)]
pub struct MentionLine {
    pub date: NaiveDate,
    pub text: String,
}

impl From<Mention> for MentionLine {
    fn from(m: Mention) -> Self {
        Self {
            date: m.date.date_naive(),
            text: m.text,
        }
    }
}

pub fn mentions(tag: &str, paths: &[PathBuf]) -> Result<Vec<MentionLine>> {
    let dailies = load_dailies(paths)?;
    Ok(find_mentions(tag, &dailies, &[])
        .into_iter()
        .map(MentionLine::from)
        .collect())
}

// =============================================================================
// INDEX
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TagSummary {
    pub name: String,
    pub entries: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct IndexReport {
    pub tags: Vec<TagSummary>,
    /// Entries carrying every `--filter` tag, when a filter was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<PathBuf>>,
    pub warnings: Vec<String>,
}

/// Save every daily file through the autosaver, then report the tags it
/// linked and the entries matching `filter`.
pub async fn index(
    paths: &[PathBuf],
    filter: &[String],
    config: &EngineConfig,
) -> Result<IndexReport> {
    let dailies = load_dailies(paths)?;
    let backend = MemoryBackend::with_config(&config.tags);
    let ctx = UserContext::new(Uuid::now_v7());
    let linker = backend.linker();

    let saver = Autosaver::new(
        config.autosave.clone(),
        ctx,
        backend.content.clone(),
        linker.clone(),
    );
    let mut events = saver.events();

    // Each entry is closed before the next is edited, so the event channel
    // holds at most one entry's events when drained.
    let mut by_owner: HashMap<OwnerRef, PathBuf> = HashMap::new();
    let mut warnings = Vec::new();
    for (daily, path) in dailies.iter().zip(paths) {
        let owner = daily.owner();
        by_owner.insert(owner, path.clone());
        saver.edit(owner, daily.content.clone()).await?;
        saver.close(owner).await;
        drain_warnings(&mut events, &by_owner, &mut warnings);
    }
    saver.shutdown().await;
    drain_warnings(&mut events, &by_owner, &mut warnings);

    let to_paths = |owners: Vec<OwnerRef>| -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = owners
            .into_iter()
            .filter_map(|o| by_owner.get(&o).cloned())
            .collect();
        entries.sort();
        entries
    };

    let mut tags = Vec::new();
    for tag in linker.registry().list_all(&ctx).await? {
        let owners = linker.links().owners_for_tag(tag.id).await?;
        tags.push(TagSummary {
            name: tag.name,
            entries: to_paths(owners),
        });
    }

    let matches = if filter.is_empty() {
        None
    } else {
        let wanted = dedup_names(filter.iter().map(|f| f.trim_start_matches('#')));
        let found = linker.registry().lookup_by_names(&ctx, &wanted).await?;
        if found.len() < wanted.len() {
            Some(Vec::new())
        } else {
            let ids: Vec<Uuid> = found.iter().map(|t| t.id).collect();
            Some(to_paths(linker.owners_with_all_tags(&ids).await?))
        }
    };

    info!(
        entries = paths.len(),
        tag_count = tags.len(),
        "Indexed daily entries"
    );

    Ok(IndexReport {
        tags,
        matches,
        warnings,
    })
}

/// Collect tagging warnings and save failures from buffered autosave events.
fn drain_warnings(
    events: &mut broadcast::Receiver<AutosaveEvent>,
    by_owner: &HashMap<OwnerRef, PathBuf>,
    warnings: &mut Vec<String>,
) {
    loop {
        match events.try_recv() {
            Ok(AutosaveEvent::Tagged { warnings: w, .. }) => warnings.extend(w),
            Ok(AutosaveEvent::Failed { owner, error, .. }) => {
                let entry = by_owner
                    .get(&owner)
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| owner.to_string());
                warnings.push(format!("{}: {}", entry, error));
            }
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Autosave events dropped before they were read");
                warnings.push(format!("{} autosave events were dropped", skipped));
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

/// A palette needs at least one color.
pub fn check_palette(palette: usize) -> Result<usize> {
    if palette == 0 {
        bail!("--palette must be at least 1");
    }
    Ok(palette)
}
