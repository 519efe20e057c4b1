// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciler tunables.
//!
//! Unlike a standalone binary, this crate has no environment or CLI surface
//! of its own — the embedding controller owns process configuration — so
//! [`ReconcilerConfig`] is a plain struct the caller builds and hands to
//! [`crate::context::Context::new`].

use std::collections::BTreeSet;
use std::time::Duration;

use crate::constants::TAG_CACHE_TTL_SECS;

/// Tunable knobs for one reconciler instance.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Identifier for the Kubernetes cluster this reconciler runs in, written
    /// into every tracked resource's cluster tag.
    pub cluster_id: String,
    /// Tag keys the tagging manager never adds, updates, or removes, even if
    /// they appear in a resource's desired tags or the provider's observed
    /// tags. Used to carve out tags another system (e.g. cost allocation
    /// automation) owns exclusively.
    pub ignored_tag_keys: BTreeSet<String>,
    /// How long a tag read is trusted before the tagging manager re-fetches
    /// it from the provider.
    pub tag_cache_ttl: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            cluster_id: String::new(),
            ignored_tag_keys: BTreeSet::new(),
            tag_cache_ttl: Duration::from_secs(TAG_CACHE_TTL_SECS),
        }
    }
}

impl ReconcilerConfig {
    /// Builds a config scoped to a single cluster identifier, with the
    /// default tag cache TTL and no ignored tag keys.
    #[must_use]
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
