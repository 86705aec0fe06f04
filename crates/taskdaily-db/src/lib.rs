//! # taskdaily-db
//!
//! Storage layer for the TaskDaily hashtag engine.
//!
//! This crate provides:
//! - In-memory tag registry, association store and content store
//! - Tag name validation
//! - The [`TagLinker`] reconciliation service
//!
//! ## Example
//!
//! ```rust,ignore
//! use taskdaily_db::{MemoryBackend, OwnerRef, UserContext};
//!
//! let backend = MemoryBackend::new();
//! let linker = backend.linker();
//! let outcome = linker
//!     .tag_content(&UserContext::new(user_id), OwnerRef::Daily(daily_id), "gym #health")
//!     .await;
//! assert_eq!(outcome.tags[0].name, "health");
//! ```

pub mod content;
pub mod linker;
pub mod links;
pub mod tags;

use std::sync::Arc;

pub use content::MemoryContentStore;
pub use linker::{TagLinker, TaggingOutcome};
pub use links::MemoryAssociationStore;
pub use tags::{validate_tag_name, MemoryTagRegistry};

// Re-export core types
pub use taskdaily_core::*;

/// All in-memory stores, shared behind `Arc`s.
#[derive(Clone)]
pub struct MemoryBackend {
    pub tags: Arc<MemoryTagRegistry>,
    pub links: Arc<MemoryAssociationStore>,
    pub content: Arc<MemoryContentStore>,
    tag_config: TagConfig,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_config(&TagConfig::default())
    }

    pub fn with_config(config: &TagConfig) -> Self {
        Self {
            tags: Arc::new(MemoryTagRegistry::with_config(config)),
            links: Arc::new(MemoryAssociationStore::new()),
            content: Arc::new(MemoryContentStore::new()),
            tag_config: config.clone(),
        }
    }

    /// A [`TagLinker`] over this backend's registry and links.
    pub fn linker(&self) -> TagLinker {
        TagLinker::new(self.tags.clone(), self.links.clone()).with_config(&self.tag_config)
    }
}
