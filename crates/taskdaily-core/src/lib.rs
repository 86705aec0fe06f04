//! # taskdaily-core
//!
//! Core types, traits, and text processing for the TaskDaily hashtag engine.
//!
//! This crate provides:
//! - The tag, link, task and daily data model
//! - Collaborator traits for tag registries, link stores and content stores
//! - Hashtag extraction, segmentation and mention search
//! - The inline autocomplete state machine
//! - Engine configuration and shared defaults

pub mod autocomplete;
pub mod config;
pub mod defaults;
pub mod error;
pub mod hashtags;
pub mod logging;
pub mod mentions;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use autocomplete::{
    transition, AutocompleteEvent, AutocompleteState, Completion, Key, Phase, Suggestions,
    Transition,
};
pub use config::{AutosaveConfig, ConfigError, EngineConfig, TagConfig};
pub use error::{Error, Result};
pub use hashtags::{
    dedup_names, distinct_hashtags, extract_hashtags, hashtag_matches, segment_hashtags,
    tag_color_index, HashtagMatch, Segment,
};
pub use mentions::{find_mentions, Mention};
pub use models::*;
pub use traits::*;
