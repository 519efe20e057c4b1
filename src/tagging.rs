// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tag reconciliation for provider resources.
//!
//! Every resource this core creates is tagged with a cluster identifier, a
//! stack identifier, and its stable resource id, so a tag-tracking provider
//! (out of scope here) can discover and adopt resources independently of the
//! CRD API. [`TaggingManager`] also reconciles user-supplied tags, with
//! tracking tags always winning a key collision.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::ReconcilerConfig;
use crate::constants::{TAG_CLUSTER_KEY, TAG_RESOURCE_ID_KEY, TAG_STACK_KEY};
use crate::errors::ReconcileError;
use crate::provider::{Provider, SdkTag};

struct CacheEntry {
    tags: BTreeMap<String, String>,
    fetched_at: Instant,
}

/// A TTL-expiring read cache of tags-per-ARN, guarding against a tag read per
/// resource per reconcile.
struct TagCache {
    entries: RwLock<BTreeMap<String, CacheEntry>>,
    ttl: Duration,
}

impl TagCache {
    fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            ttl,
        }
    }

    fn get(&self, arn: &str) -> Option<BTreeMap<String, String>> {
        let entries = self.entries.read().unwrap();
        let entry = entries.get(arn)?;
        if entry.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.tags.clone())
    }

    fn put(&self, arn: &str, tags: BTreeMap<String, String>) {
        self.entries.write().unwrap().insert(
            arn.to_string(),
            CacheEntry {
                tags,
                fetched_at: Instant::now(),
            },
        );
    }

    fn invalidate(&self, arn: &str) {
        self.entries.write().unwrap().remove(arn);
    }
}

/// Reads and reconciles tags on provider resources, backed by a TTL cache.
pub struct TaggingManager {
    provider: Arc<dyn Provider>,
    cache: TagCache,
    ignored_keys: BTreeSet<String>,
}

impl TaggingManager {
    /// Builds a tagging manager sharing the given provider client.
    #[must_use]
    pub fn new(provider: Arc<dyn Provider>, config: &ReconcilerConfig) -> Self {
        Self {
            provider,
            cache: TagCache::new(config.tag_cache_ttl),
            ignored_keys: config.ignored_tag_keys.clone(),
        }
    }

    /// The tracking tags every resource created for `stack_id`/`resource_id`
    /// must carry.
    #[must_use]
    pub fn tracking_tags(
        cluster_id: &str,
        stack_id: &str,
        resource_id: &str,
    ) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert(TAG_CLUSTER_KEY.to_string(), cluster_id.to_string());
        tags.insert(TAG_STACK_KEY.to_string(), stack_id.to_string());
        tags.insert(TAG_RESOURCE_ID_KEY.to_string(), resource_id.to_string());
        tags
    }

    /// Merges user-supplied tags with tracking tags, tracking tags winning
    /// any key collision.
    #[must_use]
    pub fn merge_tags(
        user_tags: &BTreeMap<String, String>,
        tracking_tags: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut merged = user_tags.clone();
        merged.extend(tracking_tags.clone());
        merged
    }

    /// Reads the current tags on `arn`, through the cache when still fresh.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::errors::ProviderError`] from the underlying
    /// `list_tags_for_resource` call.
    pub async fn current_tags(&self, arn: &str) -> Result<BTreeMap<String, String>, ReconcileError> {
        if let Some(tags) = self.cache.get(arn) {
            return Ok(tags);
        }
        let tags = self.provider.list_tags_for_resource(arn).await?;
        self.cache.put(arn, tags.clone());
        Ok(tags)
    }

    /// Reconciles `desired` tags onto `arn`, fetching current tags unless the
    /// caller already has them.
    ///
    /// Keys in [`ReconcilerConfig::ignored_tag_keys`] are skipped on both
    /// sides of the diff: never added, updated, or removed by this call.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::errors::ProviderError`] from the tag/untag calls.
    pub async fn reconcile_tags(
        &self,
        arn: &str,
        desired: &BTreeMap<String, String>,
        current: Option<BTreeMap<String, String>>,
    ) -> Result<(), ReconcileError> {
        let current = match current {
            Some(tags) => tags,
            None => self.current_tags(arn).await?,
        };

        let mut to_update = BTreeMap::new();
        for (key, value) in desired {
            if self.ignored_keys.contains(key) {
                continue;
            }
            if current.get(key) != Some(value) {
                to_update.insert(key.clone(), value.clone());
            }
        }

        let to_remove: Vec<String> = current
            .keys()
            .filter(|key| !self.ignored_keys.contains(*key) && !desired.contains_key(*key))
            .cloned()
            .collect();

        if to_update.is_empty() && to_remove.is_empty() {
            return Ok(());
        }

        if !to_update.is_empty() {
            debug!(arn, count = to_update.len(), "applying tag updates");
            self.provider.tag_resource(arn, to_update).await?;
        }
        if !to_remove.is_empty() {
            debug!(arn, count = to_remove.len(), "removing stale tags");
            self.provider.untag_resource(arn, to_remove).await?;
        }
        self.cache.invalidate(arn);
        Ok(())
    }
}

/// Converts an internal tag map into the provider SDK's key/value pair shape.
#[must_use]
pub fn convert_tags_to_sdk_tags(tags: &BTreeMap<String, String>) -> Vec<SdkTag> {
    tags.iter()
        .map(|(key, value)| SdkTag {
            key: key.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Converts the provider SDK's key/value pair shape back into an internal tag map.
#[must_use]
pub fn parse_sdk_tags(tags: &[SdkTag]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|tag| (tag.key.clone(), tag.value.clone()))
        .collect()
}

#[cfg(test)]
#[path = "tagging_tests.rs"]
mod tagging_tests;
