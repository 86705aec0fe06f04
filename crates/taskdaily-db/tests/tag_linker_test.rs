//! Integration tests for tag reconciliation and linking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use taskdaily_db::{
    AssociationStore, Error, MemoryAssociationStore, MemoryBackend, MemoryTagRegistry, OwnerRef,
    Result, Tag, TagLink, TagLinker, TagRegistry, UserContext,
};
use uuid::Uuid;

fn ctx() -> UserContext {
    UserContext::new(Uuid::new_v4())
}

fn names(tags: &[Tag]) -> Vec<&str> {
    tags.iter().map(|t| t.name.as_str()).collect()
}

/// Registry whose first batch create loses a race: another writer creates the
/// first requested name just before the batch lands.
struct RacingRegistry {
    inner: MemoryTagRegistry,
    races: AtomicUsize,
}

impl RacingRegistry {
    fn new(races: usize) -> Self {
        Self {
            inner: MemoryTagRegistry::new(),
            races: AtomicUsize::new(races),
        }
    }
}

#[async_trait]
impl TagRegistry for RacingRegistry {
    async fn lookup_by_names(&self, ctx: &UserContext, names: &[String]) -> Result<Vec<Tag>> {
        self.inner.lookup_by_names(ctx, names).await
    }

    async fn create_many(&self, ctx: &UserContext, names: &[String]) -> Result<Vec<Tag>> {
        let remaining = self.races.load(Ordering::SeqCst);
        if remaining > 0 && !names.is_empty() {
            self.races.store(remaining - 1, Ordering::SeqCst);
            self.inner.create_many(ctx, &names[..1]).await?;
            return Err(Error::DuplicateTag(names[0].clone()));
        }
        self.inner.create_many(ctx, names).await
    }

    async fn list_all(&self, ctx: &UserContext) -> Result<Vec<Tag>> {
        self.inner.list_all(ctx).await
    }

    async fn delete(&self, ctx: &UserContext, tag_id: Uuid) -> Result<()> {
        self.inner.delete(ctx, tag_id).await
    }
}

/// Registry that is unreachable.
struct FailingRegistry;

#[async_trait]
impl TagRegistry for FailingRegistry {
    async fn lookup_by_names(&self, _ctx: &UserContext, _names: &[String]) -> Result<Vec<Tag>> {
        Err(Error::Storage("connection refused".to_string()))
    }

    async fn create_many(&self, _ctx: &UserContext, _names: &[String]) -> Result<Vec<Tag>> {
        Err(Error::Storage("connection refused".to_string()))
    }

    async fn list_all(&self, _ctx: &UserContext) -> Result<Vec<Tag>> {
        Err(Error::Storage("connection refused".to_string()))
    }

    async fn delete(&self, _ctx: &UserContext, _tag_id: Uuid) -> Result<()> {
        Err(Error::Storage("connection refused".to_string()))
    }
}

/// Association store that rejects every write.
struct FailingLinks;

#[async_trait]
impl AssociationStore for FailingLinks {
    async fn link(&self, _owner: OwnerRef, _tag_id: Uuid) -> Result<bool> {
        Err(Error::Storage("links table locked".to_string()))
    }

    async fn unlink(&self, _owner: OwnerRef, _tag_id: Uuid) -> Result<bool> {
        Err(Error::Storage("links table locked".to_string()))
    }

    async fn tags_for_owner(&self, _owner: OwnerRef) -> Result<Vec<Uuid>> {
        Ok(Vec::new())
    }

    async fn owners_for_tag(&self, _tag_id: Uuid) -> Result<Vec<OwnerRef>> {
        Ok(Vec::new())
    }

    async fn unlink_tag(&self, _tag_id: Uuid) -> Result<usize> {
        Ok(0)
    }

    async fn all_links(&self) -> Result<Vec<TagLink>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_reconciliation_is_idempotent() {
    let backend = MemoryBackend::new();
    let linker = backend.linker();
    let ctx = ctx();

    let first = linker
        .ensure_tags_exist(&ctx, &["work", "home"])
        .await
        .unwrap();
    let second = linker
        .ensure_tags_exist(&ctx, &["work", "home"])
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.tags.len().await, 2);
}

#[tokio::test]
async fn test_duplicate_conflict_is_recovered() {
    let linker = TagLinker::new(
        Arc::new(RacingRegistry::new(1)),
        Arc::new(MemoryAssociationStore::new()),
    );
    let ctx = ctx();

    let tags = linker
        .ensure_tags_exist(&ctx, &["work", "home", "gym"])
        .await
        .unwrap();
    assert_eq!(names(&tags), vec!["work", "home", "gym"]);

    let all = linker.registry().list_all(&ctx).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_repeated_conflicts_are_recovered() {
    let linker = TagLinker::new(
        Arc::new(RacingRegistry::new(3)),
        Arc::new(MemoryAssociationStore::new()),
    );
    let tags = linker
        .ensure_tags_exist(&ctx(), &["a", "b", "c"])
        .await
        .unwrap();
    assert_eq!(names(&tags), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_registry_failure_propagates_from_reconcile() {
    let linker = TagLinker::new(
        Arc::new(FailingRegistry),
        Arc::new(MemoryAssociationStore::new()),
    );
    let err = linker
        .ensure_tags_exist(&ctx(), &["work"])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

#[tokio::test]
async fn test_registry_failure_is_a_warning_when_tagging() {
    let linker = TagLinker::new(
        Arc::new(FailingRegistry),
        Arc::new(MemoryAssociationStore::new()),
    );
    let outcome = linker
        .tag_content(&ctx(), OwnerRef::Daily(Uuid::new_v4()), "gym #health")
        .await;

    assert!(outcome.tags.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("connection refused"));
}

#[tokio::test]
async fn test_link_failure_is_a_warning_when_tagging() {
    let linker = TagLinker::new(Arc::new(MemoryTagRegistry::new()), Arc::new(FailingLinks));
    let outcome = linker
        .tag_content(&ctx(), OwnerRef::Task(Uuid::new_v4()), "#a #b")
        .await;

    assert_eq!(names(&outcome.tags), vec!["a", "b"]);
    assert!(outcome.newly_linked.is_empty());
    assert_eq!(outcome.warnings.len(), 2);
}

#[tokio::test]
async fn test_tag_content_links_once() {
    let backend = MemoryBackend::new();
    let linker = backend.linker();
    let ctx = ctx();
    let owner = OwnerRef::Daily(Uuid::new_v4());

    let first = linker
        .tag_content(&ctx, owner, "- call #mom\n- gym #health #mom")
        .await;
    assert_eq!(names(&first.tags), vec!["mom", "health"]);
    assert_eq!(first.newly_linked.len(), 2);
    assert!(first.is_clean());

    let second = linker.tag_content(&ctx, owner, "gym #health").await;
    assert!(second.newly_linked.is_empty());
    assert_eq!(backend.links.len().await, 2);
}

#[tokio::test]
async fn test_removing_hashtag_from_text_keeps_link() {
    let backend = MemoryBackend::new();
    let linker = backend.linker();
    let ctx = ctx();
    let owner = OwnerRef::Task(Uuid::new_v4());

    linker.tag_content(&ctx, owner, "buy milk #errands").await;
    linker.tag_content(&ctx, owner, "buy milk").await;

    let linked = linker.tags_for_owner(&ctx, owner).await.unwrap();
    assert_eq!(names(&linked), vec!["errands"]);
}

#[tokio::test]
async fn test_delete_tag_cascades_links() {
    let backend = MemoryBackend::new();
    let linker = backend.linker();
    let ctx = ctx();
    let task = OwnerRef::Task(Uuid::new_v4());
    let daily = OwnerRef::Daily(Uuid::new_v4());

    let outcome = linker.tag_content(&ctx, task, "#work #home").await;
    linker.tag_content(&ctx, daily, "#work").await;
    let work = outcome.tags[0].id;

    let removed = linker.delete_tag(&ctx, work).await.unwrap();
    assert_eq!(removed, 2);
    assert!(backend.links.owners_for_tag(work).await.unwrap().is_empty());
    assert_eq!(names(&linker.tags_for_owner(&ctx, task).await.unwrap()), vec!["home"]);

    let err = linker.delete_tag(&ctx, work).await.unwrap_err();
    assert!(matches!(err, Error::TagNotFound(id) if id == work));
}

#[tokio::test]
async fn test_assign_and_remove_tag() {
    let backend = MemoryBackend::new();
    let linker = backend.linker();
    let ctx = ctx();
    let owner = OwnerRef::Task(Uuid::new_v4());
    let tag = linker.create_tag(&ctx, "urgent").await.unwrap();

    assert!(linker.assign_tag(&ctx, owner, tag.id).await.unwrap());
    assert!(!linker.assign_tag(&ctx, owner, tag.id).await.unwrap());
    assert!(linker.remove_tag(owner, tag.id).await.unwrap());
    assert!(!linker.remove_tag(owner, tag.id).await.unwrap());
}

#[tokio::test]
async fn test_assign_unknown_tag_fails() {
    let linker = MemoryBackend::new().linker();
    let err = linker
        .assign_tag(&ctx(), OwnerRef::Task(Uuid::new_v4()), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TagNotFound(_)));
}

#[tokio::test]
async fn test_assign_other_users_tag_fails() {
    let linker = MemoryBackend::new().linker();
    let tag = linker.create_tag(&ctx(), "private").await.unwrap();
    let err = linker
        .assign_tag(&ctx(), OwnerRef::Task(Uuid::new_v4()), tag.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TagNotFound(_)));
}

#[tokio::test]
async fn test_owners_with_all_tags() {
    let linker = MemoryBackend::new().linker();
    let ctx = ctx();
    let both = OwnerRef::Task(Uuid::new_v4());
    let only_work = OwnerRef::Task(Uuid::new_v4());
    let only_home = OwnerRef::Daily(Uuid::new_v4());

    let tags = linker.tag_content(&ctx, both, "#work #home").await.tags;
    linker.tag_content(&ctx, only_work, "#work").await;
    linker.tag_content(&ctx, only_home, "#home").await;
    let (work, home) = (tags[0].id, tags[1].id);

    assert_eq!(
        linker.owners_with_all_tags(&[work]).await.unwrap(),
        vec![both, only_work]
    );
    assert_eq!(
        linker.owners_with_all_tags(&[work, home]).await.unwrap(),
        vec![both]
    );
    assert!(linker
        .owners_with_all_tags(&[work, Uuid::new_v4()])
        .await
        .unwrap()
        .is_empty());
}
