//! Association store implementation.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;
use uuid::Uuid;

use taskdaily_core::{AssociationStore, OwnerRef, Result, TagLink};

/// In-memory implementation of [`AssociationStore`].
///
/// Links keep insertion order. `(owner, tag_id)` is unique; linking an
/// existing pair is a no-op that reports `false`.
#[derive(Default)]
pub struct MemoryAssociationStore {
    links: RwLock<Vec<TagLink>>,
}

impl MemoryAssociationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.links.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.links.read().await.is_empty()
    }
}

#[async_trait]
impl AssociationStore for MemoryAssociationStore {
    async fn link(&self, owner: OwnerRef, tag_id: Uuid) -> Result<bool> {
        let mut links = self.links.write().await;
        if links.iter().any(|l| l.owner == owner && l.tag_id == tag_id) {
            trace!(%owner, %tag_id, "Link already present");
            return Ok(false);
        }
        links.push(TagLink { owner, tag_id });
        Ok(true)
    }

    async fn unlink(&self, owner: OwnerRef, tag_id: Uuid) -> Result<bool> {
        let mut links = self.links.write().await;
        let before = links.len();
        links.retain(|l| !(l.owner == owner && l.tag_id == tag_id));
        Ok(links.len() != before)
    }

    async fn tags_for_owner(&self, owner: OwnerRef) -> Result<Vec<Uuid>> {
        let links = self.links.read().await;
        Ok(links
            .iter()
            .filter(|l| l.owner == owner)
            .map(|l| l.tag_id)
            .collect())
    }

    async fn owners_for_tag(&self, tag_id: Uuid) -> Result<Vec<OwnerRef>> {
        let links = self.links.read().await;
        Ok(links
            .iter()
            .filter(|l| l.tag_id == tag_id)
            .map(|l| l.owner)
            .collect())
    }

    async fn unlink_tag(&self, tag_id: Uuid) -> Result<usize> {
        let mut links = self.links.write().await;
        let before = links.len();
        links.retain(|l| l.tag_id != tag_id);
        Ok(before - links.len())
    }

    async fn all_links(&self) -> Result<Vec<TagLink>> {
        Ok(self.links.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_link_is_idempotent() {
        let store = MemoryAssociationStore::new();
        let owner = OwnerRef::Task(Uuid::new_v4());
        let tag = Uuid::new_v4();

        assert!(store.link(owner, tag).await.unwrap());
        assert!(!store.link(owner, tag).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_same_id_different_owner_kind() {
        let store = MemoryAssociationStore::new();
        let id = Uuid::new_v4();
        let tag = Uuid::new_v4();

        assert!(store.link(OwnerRef::Task(id), tag).await.unwrap());
        assert!(store.link(OwnerRef::Daily(id), tag).await.unwrap());
        assert_eq!(store.owners_for_tag(tag).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unlink() {
        let store = MemoryAssociationStore::new();
        let owner = OwnerRef::Daily(Uuid::new_v4());
        let tag = Uuid::new_v4();
        store.link(owner, tag).await.unwrap();

        assert!(store.unlink(owner, tag).await.unwrap());
        assert!(!store.unlink(owner, tag).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_tags_for_owner_in_link_order() {
        let store = MemoryAssociationStore::new();
        let owner = OwnerRef::Task(Uuid::new_v4());
        let tags: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for tag in tags.iter().rev() {
            store.link(owner, *tag).await.unwrap();
        }

        let linked = store.tags_for_owner(owner).await.unwrap();
        assert_eq!(linked, tags.into_iter().rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unlink_tag_removes_all_owners() {
        let store = MemoryAssociationStore::new();
        let tag = Uuid::new_v4();
        let other = Uuid::new_v4();
        for _ in 0..3 {
            store.link(OwnerRef::Task(Uuid::new_v4()), tag).await.unwrap();
        }
        let keeper = OwnerRef::Daily(Uuid::new_v4());
        store.link(keeper, other).await.unwrap();

        assert_eq!(store.unlink_tag(tag).await.unwrap(), 3);
        assert_eq!(
            store.all_links().await.unwrap(),
            vec![TagLink {
                owner: keeper,
                tag_id: other
            }]
        );
    }
}
