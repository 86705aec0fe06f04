//! Data models for TaskDaily.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// TAGS
// =============================================================================

/// A named label, unique per user by exact (case-sensitive) name.
///
/// Tags are created implicitly the first time a `#name` token is saved and are
/// never renamed. Deleting a tag removes every [`TagLink`] that points at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
}

/// The record a tag is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum OwnerRef {
    Task(Uuid),
    Daily(Uuid),
}

impl OwnerRef {
    /// The owner's identifier, without its kind.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Task(id) | Self::Daily(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Task(_) => "task",
            Self::Daily(_) => "daily",
        }
    }
}

impl std::fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Association between a task or daily entry and a tag. Unique per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagLink {
    pub owner: OwnerRef,
    pub tag_id: Uuid,
}

// =============================================================================
// CONTENT
// =============================================================================

/// How a task was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    /// Added from the task list.
    #[default]
    Manual,
    /// Added from inside a daily entry.
    Daily,
}

impl std::fmt::Display for TaskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Daily => write!(f, "daily"),
        }
    }
}

impl std::str::FromStr for TaskSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "daily" => Ok(Self::Daily),
            _ => Err(format!("Invalid task source: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub source: TaskSource,
    pub daily_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
}

/// One journal entry per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Daily {
    pub id: Uuid,
    pub entry_date: NaiveDate,
    pub content: String,
    pub created_at_utc: DateTime<Utc>,
}

impl Task {
    pub fn owner(&self) -> OwnerRef {
        OwnerRef::Task(self.id)
    }
}

impl Daily {
    pub fn owner(&self) -> OwnerRef {
        OwnerRef::Daily(self.id)
    }
}

// =============================================================================
// CALLER CONTEXT
// =============================================================================

/// The user on whose behalf a registry or linking operation runs.
///
/// Passed explicitly so that tag operations never depend on an ambient
/// session lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
}

impl UserContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}
