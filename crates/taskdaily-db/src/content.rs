//! Content store implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use taskdaily_core::{ContentStore, OwnerRef, Result, SaveOutcome, StoredContent};

/// In-memory implementation of [`ContentStore`].
///
/// A save is applied only when its revision is at least the stored one.
/// Re-saving the same revision is accepted so that a retried request stays
/// idempotent.
#[derive(Default)]
pub struct MemoryContentStore {
    entries: RwLock<HashMap<OwnerRef, StoredContent>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn save(&self, owner: OwnerRef, content: &str, revision: u64) -> Result<SaveOutcome> {
        let mut entries = self.entries.write().await;
        if let Some(current) = entries.get(&owner) {
            if current.revision > revision {
                debug!(
                    %owner,
                    revision,
                    current = current.revision,
                    "Dropping stale save"
                );
                return Ok(SaveOutcome::Stale {
                    current: current.revision,
                });
            }
        }
        entries.insert(
            owner,
            StoredContent {
                content: content.to_string(),
                revision,
            },
        );
        Ok(SaveOutcome::Applied)
    }

    async fn load(&self, owner: OwnerRef) -> Result<Option<StoredContent>> {
        Ok(self.entries.read().await.get(&owner).cloned())
    }
}
