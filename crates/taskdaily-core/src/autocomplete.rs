//! Inline hashtag autocomplete.
//!
//! The autocomplete session for one text input is a value, and every input
//! event maps the current session to the next one through [`transition`].
//! Nothing here touches a UI toolkit, so the whole state machine is testable
//! with plain values.
//!
//! ```text
//!            text/cursor change with a matching token
//!   Idle  ───────────────────────────────────────────▶  Suggesting
//!    ▲                                                    │  ▲
//!    │   Escape, Enter/Tab/click selection, blur,         │  │ ArrowUp/ArrowDown
//!    └─── or a rescan with no in-progress token  ◀────────┘──┘
//! ```
//!
//! Offsets are byte offsets into UTF-8 text. Out-of-range cursors are clamped
//! to the text length and snapped back to a character boundary.
//!
//! # Example
//!
//! ```
//! use taskdaily_core::autocomplete::{transition, AutocompleteEvent, AutocompleteState, Key};
//! # use taskdaily_core::Tag;
//! # fn tag(name: &str) -> Tag {
//! #     Tag { id: uuid::Uuid::new_v4(), name: name.into(), user_id: uuid::Uuid::nil(), created_at_utc: chrono::Utc::now() }
//! # }
//! let registry = vec![tag("work"), tag("workout"), tag("home")];
//!
//! let step = transition(
//!     AutocompleteState::default(),
//!     AutocompleteEvent::text_changed("meeting #wo", 11),
//!     &registry,
//! );
//! assert!(step.state.is_suggesting());
//!
//! let step = transition(step.state, AutocompleteEvent::Key(Key::Enter), &registry);
//! assert_eq!(step.state.text(), "meeting #work ");
//! assert!(!step.state.is_suggesting());
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::Tag;

/// Keys the dropdown reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Tab,
    Escape,
}

/// Input events delivered to the autocomplete session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutocompleteEvent {
    /// The text was edited; `cursor` is the new caret position.
    TextChanged { text: String, cursor: usize },
    /// The caret moved without editing.
    CursorMoved { cursor: usize },
    /// A key was pressed while the input had focus.
    Key(Key),
    /// A candidate was clicked.
    Click(usize),
    /// The input lost focus.
    Blur,
}

impl AutocompleteEvent {
    pub fn text_changed(text: impl Into<String>, cursor: usize) -> Self {
        Self::TextChanged {
            text: text.into(),
            cursor,
        }
    }
}

/// Open dropdown state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestions {
    /// Byte offset of the `#` that starts the in-progress token.
    pub match_start: usize,
    /// Text between the `#` and the cursor.
    pub query: String,
    /// Registry tags whose name contains the query, in registry order.
    pub candidates: Vec<Tag>,
    pub selected: usize,
}

impl Suggestions {
    pub fn selected_tag(&self) -> Option<&Tag> {
        self.candidates.get(self.selected)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Suggesting(Suggestions),
}

/// Autocomplete session for one text input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutocompleteState {
    text: String,
    cursor: usize,
    phase: Phase,
}

impl AutocompleteState {
    /// Start a session for existing text with the caret at `cursor`.
    ///
    /// The session starts idle; suggestions appear on the first event.
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let cursor = clamp_cursor(&text, cursor);
        Self {
            text,
            cursor,
            phase: Phase::Idle,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_suggesting(&self) -> bool {
        matches!(self.phase, Phase::Suggesting(_))
    }

    /// Offset of the `#` being completed, if the dropdown is open.
    pub fn match_start(&self) -> Option<usize> {
        match &self.phase {
            Phase::Suggesting(s) => Some(s.match_start),
            Phase::Idle => None,
        }
    }

    /// Current candidates; empty when idle.
    pub fn candidates(&self) -> &[Tag] {
        match &self.phase {
            Phase::Suggesting(s) => &s.candidates,
            Phase::Idle => &[],
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        match &self.phase {
            Phase::Suggesting(s) => Some(s.selected),
            Phase::Idle => None,
        }
    }

    pub fn selected(&self) -> Option<&Tag> {
        match &self.phase {
            Phase::Suggesting(s) => s.selected_tag(),
            Phase::Idle => None,
        }
    }

    fn idle(self) -> Self {
        Self {
            phase: Phase::Idle,
            ..self
        }
    }

    /// Recompute the phase from the current text and cursor.
    fn rescan(mut self, registry: &[Tag]) -> Self {
        self.phase = match active_token(&self.text, self.cursor) {
            Some((match_start, query)) => {
                let candidates = filter_candidates(registry, query);
                if candidates.is_empty() {
                    Phase::Idle
                } else {
                    Phase::Suggesting(Suggestions {
                        match_start,
                        query: query.to_string(),
                        candidates,
                        selected: 0,
                    })
                }
            }
            None => Phase::Idle,
        };
        self
    }
}

/// A completed selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Name of the chosen tag.
    pub tag: String,
    /// Byte range of the original text that was replaced.
    pub replaced: std::ops::Range<usize>,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: AutocompleteState,
    /// Whether the event was handled by the dropdown; the input should then
    /// suppress its default key behaviour.
    pub consumed: bool,
    /// Set when the event selected a candidate and rewrote the text.
    pub completion: Option<Completion>,
}

impl Transition {
    fn passed(state: AutocompleteState) -> Self {
        Self {
            state,
            consumed: false,
            completion: None,
        }
    }

    fn consumed(state: AutocompleteState) -> Self {
        Self {
            state,
            consumed: true,
            completion: None,
        }
    }
}

/// Apply an input event to an autocomplete session.
///
/// `registry` is the full tag list in its natural order; candidates keep that
/// order.
pub fn transition(
    state: AutocompleteState,
    event: AutocompleteEvent,
    registry: &[Tag],
) -> Transition {
    trace!(?event, suggesting = state.is_suggesting(), "autocomplete event");

    match event {
        AutocompleteEvent::TextChanged { text, cursor } => {
            let cursor = clamp_cursor(&text, cursor);
            let state = AutocompleteState {
                text,
                cursor,
                phase: Phase::Idle,
            };
            Transition::passed(state.rescan(registry))
        }
        AutocompleteEvent::CursorMoved { cursor } => {
            let cursor = clamp_cursor(&state.text, cursor);
            let state = AutocompleteState { cursor, ..state };
            Transition::passed(state.rescan(registry))
        }
        AutocompleteEvent::Blur => Transition::passed(state.idle()),
        AutocompleteEvent::Key(key) => on_key(state, key),
        AutocompleteEvent::Click(index) => {
            if index < state.candidates().len() {
                select(state, index)
            } else {
                Transition::passed(state)
            }
        }
    }
}

fn on_key(mut state: AutocompleteState, key: Key) -> Transition {
    let selected = match state.selected_index() {
        Some(selected) => selected,
        None => return Transition::passed(state),
    };

    match key {
        Key::Enter | Key::Tab => return select(state, selected),
        Key::Escape => return Transition::passed(state.idle()),
        Key::ArrowDown | Key::ArrowUp => {}
    }

    if let Phase::Suggesting(suggestions) = &mut state.phase {
        let count = suggestions.candidates.len();
        suggestions.selected = if key == Key::ArrowDown {
            (selected + 1) % count
        } else {
            (selected + count - 1) % count
        };
    }
    Transition::consumed(state)
}

/// Replace the in-progress token with the candidate at `index` and close the
/// dropdown.
fn select(state: AutocompleteState, index: usize) -> Transition {
    let picked = match &state.phase {
        Phase::Suggesting(s) => s
            .candidates
            .get(index)
            .map(|tag| (s.match_start, tag.name.clone())),
        Phase::Idle => None,
    };
    let Some((match_start, name)) = picked else {
        return Transition::passed(state);
    };

    let (text, cursor) = complete_token(&state.text, match_start, state.cursor, &name);
    let completion = Completion {
        tag: name,
        replaced: match_start..state.cursor,
    };

    Transition {
        state: AutocompleteState {
            text,
            cursor,
            phase: Phase::Idle,
        },
        consumed: true,
        completion: Some(completion),
    }
}

/// Rewrite `text` so that `match_start..cursor` becomes `#name` plus a
/// separating space. Returns the new text and the caret position after the
/// separator.
///
/// The text after the cursor is kept as-is. If it already begins with
/// whitespace, that whitespace is the separator.
pub fn complete_token(text: &str, match_start: usize, cursor: usize, name: &str) -> (String, usize) {
    let cursor = clamp_cursor(text, cursor);
    let match_start = match_start.min(cursor);
    let prefix = &text[..match_start];
    let suffix = &text[cursor..];

    let mut out = String::with_capacity(text.len() + name.len() + 2);
    out.push_str(prefix);
    out.push('#');
    out.push_str(name);

    let caret = match suffix.chars().next() {
        Some(c) if c.is_whitespace() => out.len() + c.len_utf8(),
        _ => {
            out.push(' ');
            out.len()
        }
    };
    out.push_str(suffix);
    (out, caret)
}

/// Find the hashtag token being typed at `cursor`.
///
/// Returns the offset of the nearest `#` before the cursor and the query text
/// after it, or `None` if there is no `#` or whitespace separates it from the
/// cursor.
pub fn active_token(text: &str, cursor: usize) -> Option<(usize, &str)> {
    let before = &text[..clamp_cursor(text, cursor)];
    let hash = before.rfind('#')?;
    let query = &before[hash + 1..];
    if query.chars().any(char::is_whitespace) {
        return None;
    }
    Some((hash, query))
}

/// Registry tags whose name contains `query`, ignoring case, in registry order.
pub fn filter_candidates(registry: &[Tag], query: &str) -> Vec<Tag> {
    let query = query.to_lowercase();
    registry
        .iter()
        .filter(|tag| tag.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Clamp `cursor` to the text and move it back onto a character boundary.
pub fn clamp_cursor(text: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}
