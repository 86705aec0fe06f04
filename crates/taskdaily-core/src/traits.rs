//! Core traits for TaskDaily collaborators.
//!
//! The hashtag engine never talks to a database directly. These traits are the
//! seams that a concrete backend implements; `taskdaily-db` ships in-memory
//! implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// TAG REGISTRY
// =============================================================================

/// Registry of known tags for a user.
#[async_trait]
pub trait TagRegistry: Send + Sync {
    /// Fetch every tag whose name exactly matches one of `names`.
    ///
    /// Names with no match are simply absent from the result.
    async fn lookup_by_names(&self, ctx: &UserContext, names: &[String]) -> Result<Vec<Tag>>;

    /// Create one tag per name in a single batch.
    ///
    /// Fails with [`crate::Error::DuplicateTag`] and creates nothing if any
    /// name already exists.
    async fn create_many(&self, ctx: &UserContext, names: &[String]) -> Result<Vec<Tag>>;

    /// List all tags, ordered by name.
    async fn list_all(&self, ctx: &UserContext) -> Result<Vec<Tag>>;

    /// Delete a tag.
    async fn delete(&self, ctx: &UserContext, tag_id: Uuid) -> Result<()>;
}

// =============================================================================
// ASSOCIATION STORE
// =============================================================================

/// Many-to-many links between owners (tasks, dailies) and tags.
#[async_trait]
pub trait AssociationStore: Send + Sync {
    /// Link a tag to an owner. Returns `false` if the link already existed.
    async fn link(&self, owner: OwnerRef, tag_id: Uuid) -> Result<bool>;

    /// Remove a link. Returns `false` if there was nothing to remove.
    async fn unlink(&self, owner: OwnerRef, tag_id: Uuid) -> Result<bool>;

    /// Tag ids linked to an owner, in link order.
    async fn tags_for_owner(&self, owner: OwnerRef) -> Result<Vec<Uuid>>;

    /// Owners linked to a tag, in link order.
    async fn owners_for_tag(&self, tag_id: Uuid) -> Result<Vec<OwnerRef>>;

    /// Remove every link to a tag. Returns the number of links removed.
    async fn unlink_tag(&self, tag_id: Uuid) -> Result<usize>;

    /// All links, in link order.
    async fn all_links(&self) -> Result<Vec<TagLink>>;
}

// =============================================================================
// CONTENT STORE
// =============================================================================

/// Result of a revision-ordered save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// The content was written.
    Applied,
    /// A newer revision is already stored; the write was dropped.
    Stale { current: u64 },
}

/// Stored content of a task title or daily entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContent {
    pub content: String,
    pub revision: u64,
}

/// Persistence for task titles and daily entry text.
///
/// Writes are last-write-wins keyed by `revision`, so a slow save that
/// completes after a newer one cannot overwrite it.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn save(&self, owner: OwnerRef, content: &str, revision: u64) -> Result<SaveOutcome>;

    async fn load(&self, owner: OwnerRef) -> Result<Option<StoredContent>>;
}
