//! Tag reconciliation and linking.
//!
//! [`TagLinker`] turns hashtag names found in saved content into tag records
//! and links them to the owning task or daily entry. Reconciliation is
//! additive: saving text that no longer mentions a tag never unlinks it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use taskdaily_core::{
    dedup_names, defaults, distinct_hashtags, AssociationStore, Error, OwnerRef, Result, Tag,
    TagConfig, TagRegistry, UserContext,
};

use crate::tags::validate_tag_name;

/// Result of tagging a piece of saved content.
///
/// Tagging never fails the save it follows; problems are reported in
/// `warnings` and logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggingOutcome {
    /// Tags referenced by the content, in first-occurrence order.
    pub tags: Vec<Tag>,
    /// Ids of tags that were linked to the owner by this call.
    pub newly_linked: Vec<Uuid>,
    pub warnings: Vec<String>,
}

impl TaggingOutcome {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Reconciles hashtag names against a [`TagRegistry`] and links the results
/// through an [`AssociationStore`].
#[derive(Clone)]
pub struct TagLinker {
    registry: Arc<dyn TagRegistry>,
    links: Arc<dyn AssociationStore>,
    max_name_len: usize,
}

impl TagLinker {
    pub fn new(registry: Arc<dyn TagRegistry>, links: Arc<dyn AssociationStore>) -> Self {
        Self {
            registry,
            links,
            max_name_len: defaults::TAG_NAME_MAX_LEN,
        }
    }

    pub fn with_config(mut self, config: &TagConfig) -> Self {
        self.max_name_len = config.max_name_len;
        self
    }

    pub fn registry(&self) -> &Arc<dyn TagRegistry> {
        &self.registry
    }

    pub fn links(&self) -> &Arc<dyn AssociationStore> {
        &self.links
    }

    /// Return the tag records for `names`, creating any that do not exist.
    ///
    /// One record per distinct name, in first-occurrence order. A duplicate
    /// conflict from a concurrent creator is recovered by re-fetching; any
    /// other registry failure is returned.
    #[instrument(
        skip(self, ctx, names),
        fields(
            subsystem = "db",
            component = "tag_linker",
            op = "ensure_tags_exist",
            user_id = %ctx.user_id,
            name_count = names.len(),
        )
    )]
    pub async fn ensure_tags_exist<S: AsRef<str>>(
        &self,
        ctx: &UserContext,
        names: &[S],
    ) -> Result<Vec<Tag>> {
        let distinct = dedup_names(names);
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_name: HashMap<String, Tag> = self
            .registry
            .lookup_by_names(ctx, &distinct)
            .await?
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();

        let missing: Vec<String> = distinct
            .iter()
            .filter(|n| !by_name.contains_key(*n))
            .cloned()
            .collect();

        debug!(
            existing_count = by_name.len(),
            missing_count = missing.len(),
            "Reconciling tag names"
        );

        if !missing.is_empty() {
            match self.registry.create_many(ctx, &missing).await {
                Ok(created) => {
                    debug!(created_count = created.len(), "Created missing tags");
                    by_name.extend(created.into_iter().map(|t| (t.name.clone(), t)));
                }
                Err(e) if e.is_duplicate() => {
                    debug!(error = %e, "Batch create conflicted, recovering per name");
                    for tag in self.recover_conflict(ctx, &missing).await? {
                        by_name.insert(tag.name.clone(), tag);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        distinct
            .into_iter()
            .map(|name| {
                by_name
                    .remove(&name)
                    .ok_or_else(|| Error::Internal(format!("tag '{}' missing after reconcile", name)))
            })
            .collect()
    }

    /// Resolve names whose batch create lost a race.
    ///
    /// Re-fetches first, then creates whatever is still missing one name at a
    /// time so a second conflict only affects its own name.
    async fn recover_conflict(&self, ctx: &UserContext, missing: &[String]) -> Result<Vec<Tag>> {
        let mut resolved = self.registry.lookup_by_names(ctx, missing).await?;

        let still_missing: Vec<String> = missing
            .iter()
            .filter(|n| !resolved.iter().any(|t| &t.name == *n))
            .cloned()
            .collect();

        for name in still_missing {
            resolved.push(self.create_or_fetch(ctx, &name).await?);
        }
        Ok(resolved)
    }

    async fn create_or_fetch(&self, ctx: &UserContext, name: &str) -> Result<Tag> {
        let batch = [name.to_string()];
        match self.registry.create_many(ctx, &batch).await {
            Ok(mut created) => created
                .pop()
                .ok_or_else(|| Error::Internal(format!("registry created no tag for '{}'", name))),
            Err(e) if e.is_duplicate() => {
                trace!(tag_name = name, "Tag created concurrently, fetching");
                self.registry
                    .lookup_by_names(ctx, &batch)
                    .await?
                    .pop()
                    .ok_or_else(|| Error::NotFound(format!("tag '{}'", name)))
            }
            Err(e) => Err(e),
        }
    }

    /// Create a single tag by name, returning the existing record if the name
    /// is already taken.
    #[instrument(
        skip(self, ctx, name),
        fields(subsystem = "db", component = "tag_linker", op = "create_tag", user_id = %ctx.user_id, tag_name = %name)
    )]
    pub async fn create_tag(&self, ctx: &UserContext, name: &str) -> Result<Tag> {
        validate_tag_name(name, self.max_name_len).map_err(Error::InvalidInput)?;
        let tag = self.create_or_fetch(ctx, name).await?;
        info!(tag_id = %tag.id, tag_name = %tag.name, "Tag ready");
        Ok(tag)
    }

    /// Link each tag to `owner`, ignoring links that already exist.
    ///
    /// Returns the ids that were newly linked.
    pub async fn link_tags(&self, owner: OwnerRef, tags: &[Tag]) -> Result<Vec<Uuid>> {
        let mut newly_linked = Vec::new();
        for tag in tags {
            if self.links.link(owner, tag.id).await? {
                trace!(%owner, tag_name = %tag.name, "Linked tag");
                newly_linked.push(tag.id);
            }
        }
        Ok(newly_linked)
    }

    /// Extract hashtags from `text`, reconcile them and link them to `owner`.
    ///
    /// Never fails. Names that cannot become tags and store failures are
    /// logged and reported as warnings.
    #[instrument(
        skip(self, ctx, owner, text),
        fields(
            subsystem = "db",
            component = "tag_linker",
            op = "tag_content",
            user_id = %ctx.user_id,
            owner = %owner,
            content_len = text.len(),
        )
    )]
    pub async fn tag_content(&self, ctx: &UserContext, owner: OwnerRef, text: &str) -> TaggingOutcome {
        let start = Instant::now();
        let mut outcome = TaggingOutcome::default();

        let names: Vec<String> = distinct_hashtags(text)
            .into_iter()
            .filter(|name| match validate_tag_name(name, self.max_name_len) {
                Ok(()) => true,
                Err(reason) => {
                    warn!(tag_name = %name, %reason, "Skipping hashtag");
                    outcome.warnings.push(format!("skipped #{}: {}", name, reason));
                    false
                }
            })
            .collect();

        if names.is_empty() {
            return outcome;
        }

        let tags = match self.ensure_tags_exist(ctx, &names).await {
            Ok(tags) => tags,
            Err(e) => {
                warn!(error = %e, "Tag reconciliation failed");
                outcome.warnings.push(format!("reconcile failed: {}", e));
                return outcome;
            }
        };

        for tag in &tags {
            match self.links.link(owner, tag.id).await {
                Ok(true) => outcome.newly_linked.push(tag.id),
                Ok(false) => {}
                Err(e) => {
                    warn!(tag_name = %tag.name, error = %e, "Failed to link tag");
                    outcome
                        .warnings
                        .push(format!("link #{} failed: {}", tag.name, e));
                }
            }
        }
        outcome.tags = tags;

        info!(
            tag_count = outcome.tags.len(),
            linked_count = outcome.newly_linked.len(),
            warning_count = outcome.warnings.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tagged content"
        );
        outcome
    }

    /// Manually link a known tag to an owner.
    ///
    /// Returns `false` if the link already existed.
    #[instrument(
        skip(self, ctx, owner, tag_id),
        fields(subsystem = "db", component = "tag_linker", op = "assign_tag", owner = %owner, tag_id = %tag_id)
    )]
    pub async fn assign_tag(&self, ctx: &UserContext, owner: OwnerRef, tag_id: Uuid) -> Result<bool> {
        let known = self
            .registry
            .list_all(ctx)
            .await?
            .iter()
            .any(|t| t.id == tag_id);
        if !known {
            return Err(Error::TagNotFound(tag_id));
        }
        self.links.link(owner, tag_id).await
    }

    /// Manually unlink a tag from an owner.
    pub async fn remove_tag(&self, owner: OwnerRef, tag_id: Uuid) -> Result<bool> {
        let removed = self.links.unlink(owner, tag_id).await?;
        debug!(%owner, %tag_id, removed, "Removed tag from owner");
        Ok(removed)
    }

    /// Delete a tag and every link to it.
    ///
    /// Returns the number of links removed.
    #[instrument(
        skip(self, ctx, tag_id),
        fields(subsystem = "db", component = "tag_linker", op = "delete_tag", tag_id = %tag_id)
    )]
    pub async fn delete_tag(&self, ctx: &UserContext, tag_id: Uuid) -> Result<usize> {
        self.registry.delete(ctx, tag_id).await?;
        let unlinked = self.links.unlink_tag(tag_id).await?;
        info!(unlinked, "Deleted tag");
        Ok(unlinked)
    }

    /// Tags linked to an owner, in link order.
    pub async fn tags_for_owner(&self, ctx: &UserContext, owner: OwnerRef) -> Result<Vec<Tag>> {
        let ids = self.links.tags_for_owner(owner).await?;
        let all = self.registry.list_all(ctx).await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| all.iter().find(|t| t.id == id).cloned())
            .collect())
    }

    /// Owners linked to every tag in `tag_ids`.
    ///
    /// An empty filter matches every owner that has at least one link.
    pub async fn owners_with_all_tags(&self, tag_ids: &[Uuid]) -> Result<Vec<OwnerRef>> {
        let Some((first, rest)) = tag_ids.split_first() else {
            let mut owners: Vec<OwnerRef> = Vec::new();
            for link in self.links.all_links().await? {
                if !owners.contains(&link.owner) {
                    owners.push(link.owner);
                }
            }
            return Ok(owners);
        };

        let mut owners = self.links.owners_for_tag(*first).await?;
        for tag_id in rest {
            let linked = self.links.owners_for_tag(*tag_id).await?;
            owners.retain(|o| linked.contains(o));
            if owners.is_empty() {
                break;
            }
        }
        Ok(owners)
    }
}
