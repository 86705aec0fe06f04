//! # taskdaily-jobs
//!
//! Background persistence for TaskDaily.
//!
//! This crate provides:
//! - Debounced autosave of task titles and daily entries
//! - Revision-ordered commits that never let an older edit win
//! - Hashtag linking after every successful commit
//! - Progress notifications via broadcast channels
//!
//! ## Example
//!
//! ```ignore
//! use taskdaily_jobs::{Autosaver, AutosaveConfig, MemoryBackend, OwnerRef, UserContext};
//!
//! let backend = MemoryBackend::new();
//! let saver = Autosaver::new(
//!     AutosaveConfig::from_env(),
//!     UserContext::new(user_id),
//!     backend.content.clone(),
//!     backend.linker(),
//! );
//!
//! let mut events = saver.events();
//! saver.edit(OwnerRef::Daily(daily_id), "gym #health").await?;
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Flush pending edits before exit
//! saver.shutdown().await;
//! ```

pub mod autosave;

// Re-export storage and core types
pub use taskdaily_db::*;

pub use autosave::{AutosaveEvent, Autosaver};
