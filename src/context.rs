// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context passed to the stack deployer and its synthesizers.
//!
//! Callers build one `Context` per reconciler instance and pass it around as
//! `Arc<Context>`; it bundles the provider client, the tag cache, and the
//! reconciler's tunables so synthesizers don't each need their own copies.

use std::sync::Arc;

use crate::config::ReconcilerConfig;
use crate::provider::Provider;
use crate::tagging::TaggingManager;

/// Shared, cheaply cloneable state for one reconciler instance.
pub struct Context {
    /// The provider client used for every AGA and tagging API call.
    pub provider: Arc<dyn Provider>,
    /// Tag read cache and reconcile helper.
    pub tagging: TaggingManager,
    /// Reconciler tunables.
    pub config: ReconcilerConfig,
}

impl Context {
    /// Builds a context from a provider and config, wiring up a fresh tag cache.
    #[must_use]
    pub fn new(provider: Arc<dyn Provider>, config: ReconcilerConfig) -> Self {
        let tagging = TaggingManager::new(Arc::clone(&provider), &config);
        Self {
            provider,
            tagging,
            config,
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
