//! Tag registry implementation.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

use taskdaily_core::{defaults, Error, Result, Tag, TagConfig, TagRegistry, UserContext};

/// Validate a tag name.
///
/// Rules:
/// - Length between 1 and `max_len` characters
/// - Allowed characters: ASCII letters, digits and underscores (`_`), the
///   same class the hashtag grammar accepts, so every tag can be typed inline
///
/// Returns Ok(()) if valid, Err with message if invalid.
pub fn validate_tag_name(tag: &str, max_len: usize) -> std::result::Result<(), String> {
    if tag.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if tag.chars().count() > max_len {
        return Err(format!("Tag name must be {} characters or less", max_len));
    }

    let invalid_chars: Vec<char> = tag
        .chars()
        .filter(|c| !c.is_ascii_alphanumeric() && *c != '_')
        .collect();

    if !invalid_chars.is_empty() {
        let chars_display: String = invalid_chars
            .iter()
            .take(5)
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "Tag contains invalid characters: {}. Only letters, digits, and underscores are allowed",
            chars_display
        ));
    }

    Ok(())
}

/// In-memory implementation of [`TagRegistry`].
///
/// Tags are scoped per user. Names are unique per user and compared exactly,
/// so `Work` and `work` are two tags. A batch create is all-or-nothing: if any
/// name already exists the whole batch fails with [`Error::DuplicateTag`],
/// mirroring a multi-row insert against a unique index.
pub struct MemoryTagRegistry {
    tags: RwLock<Vec<Tag>>,
    max_name_len: usize,
}

impl Default for MemoryTagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTagRegistry {
    pub fn new() -> Self {
        Self {
            tags: RwLock::new(Vec::new()),
            max_name_len: defaults::TAG_NAME_MAX_LEN,
        }
    }

    /// Create a registry enforcing the configured name rules.
    pub fn with_config(config: &TagConfig) -> Self {
        Self {
            tags: RwLock::new(Vec::new()),
            max_name_len: config.max_name_len,
        }
    }

    pub fn max_name_len(&self) -> usize {
        self.max_name_len
    }

    /// Number of tags across all users.
    pub async fn len(&self) -> usize {
        self.tags.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tags.read().await.is_empty()
    }
}

#[async_trait]
impl TagRegistry for MemoryTagRegistry {
    async fn lookup_by_names(&self, ctx: &UserContext, names: &[String]) -> Result<Vec<Tag>> {
        let tags = self.tags.read().await;
        let found: Vec<Tag> = tags
            .iter()
            .filter(|t| t.user_id == ctx.user_id && names.contains(&t.name))
            .cloned()
            .collect();
        trace!(requested = names.len(), found = found.len(), "Tag lookup");
        Ok(found)
    }

    async fn create_many(&self, ctx: &UserContext, names: &[String]) -> Result<Vec<Tag>> {
        for name in names {
            validate_tag_name(name, self.max_name_len).map_err(Error::InvalidInput)?;
        }

        let mut tags = self.tags.write().await;

        for (i, name) in names.iter().enumerate() {
            let exists = tags
                .iter()
                .any(|t| t.user_id == ctx.user_id && &t.name == name);
            if exists || names[..i].contains(name) {
                return Err(Error::DuplicateTag(name.clone()));
            }
        }

        let now = Utc::now();
        let created: Vec<Tag> = names
            .iter()
            .map(|name| Tag {
                id: Uuid::now_v7(),
                name: name.clone(),
                user_id: ctx.user_id,
                created_at_utc: now,
            })
            .collect();
        tags.extend(created.iter().cloned());

        debug!(created_count = created.len(), "Created tags");
        Ok(created)
    }

    async fn list_all(&self, ctx: &UserContext) -> Result<Vec<Tag>> {
        let tags = self.tags.read().await;
        let mut listed: Vec<Tag> = tags
            .iter()
            .filter(|t| t.user_id == ctx.user_id)
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    async fn delete(&self, ctx: &UserContext, tag_id: Uuid) -> Result<()> {
        let mut tags = self.tags.write().await;
        let before = tags.len();
        tags.retain(|t| !(t.id == tag_id && t.user_id == ctx.user_id));
        if tags.len() == before {
            return Err(Error::TagNotFound(tag_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> UserContext {
        UserContext::new(Uuid::new_v4())
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_tag_name_valid() {
        assert!(validate_tag_name("work", 100).is_ok());
        assert!(validate_tag_name("Project_2026", 100).is_ok());
        assert!(validate_tag_name("123", 100).is_ok());
    }

    #[test]
    fn test_validate_tag_name_empty() {
        assert_eq!(
            validate_tag_name("", 100),
            Err("Tag name cannot be empty".to_string())
        );
    }

    #[test]
    fn test_validate_tag_name_too_long() {
        let long = "a".repeat(101);
        assert!(validate_tag_name(&long, 100).is_err());
        assert!(validate_tag_name(&"a".repeat(100), 100).is_ok());
    }

    #[test]
    fn test_validate_tag_name_invalid_chars() {
        let err = validate_tag_name("my tag", 100).unwrap_err();
        assert!(err.contains("' '"));
        assert!(validate_tag_name("a-b", 100).is_err());
        assert!(validate_tag_name("#work", 100).is_err());
        assert!(validate_tag_name("café", 100).is_err());
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let registry = MemoryTagRegistry::new();
        let ctx = ctx();

        let created = registry
            .create_many(&ctx, &names(&["work", "home"]))
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|t| t.user_id == ctx.user_id));

        let found = registry
            .lookup_by_names(&ctx, &names(&["home", "missing"]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "home");
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let registry = MemoryTagRegistry::new();
        let ctx = ctx();
        registry.create_many(&ctx, &names(&["Work"])).await.unwrap();

        let found = registry
            .lookup_by_names(&ctx, &names(&["work"]))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_batch_creates_nothing() {
        let registry = MemoryTagRegistry::new();
        let ctx = ctx();
        registry.create_many(&ctx, &names(&["work"])).await.unwrap();

        let err = registry
            .create_many(&ctx, &names(&["home", "work"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateTag(ref n) if n == "work"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_within_batch() {
        let registry = MemoryTagRegistry::new();
        let err = registry
            .create_many(&ctx(), &names(&["a", "a"]))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_name_rejected() {
        let registry = MemoryTagRegistry::with_config(&TagConfig { max_name_len: 3 });
        let err = registry
            .create_many(&ctx(), &names(&["long"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let registry = MemoryTagRegistry::new();
        let alice = ctx();
        let bob = ctx();
        registry.create_many(&alice, &names(&["work"])).await.unwrap();
        registry.create_many(&bob, &names(&["work"])).await.unwrap();

        assert_eq!(registry.list_all(&alice).await.unwrap().len(), 1);
        assert_eq!(registry.list_all(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_all_sorted_by_name() {
        let registry = MemoryTagRegistry::new();
        let ctx = ctx();
        registry
            .create_many(&ctx, &names(&["zeta", "alpha", "Mid"]))
            .await
            .unwrap();

        let listed: Vec<String> = registry
            .list_all(&ctx)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(listed, vec!["Mid", "alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let registry = MemoryTagRegistry::new();
        let ctx = ctx();
        let created = registry.create_many(&ctx, &names(&["work"])).await.unwrap();

        registry.delete(&ctx, created[0].id).await.unwrap();
        assert!(registry.is_empty().await);

        let err = registry.delete(&ctx, created[0].id).await.unwrap_err();
        assert!(matches!(err, Error::TagNotFound(_)));
    }
}
