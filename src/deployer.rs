// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Orchestrates one reconcile across every resource layer.
//!
//! The stack deployer is the only place that knows the full layer order:
//! accelerator before listener before endpoint group. A forward pass
//! synthesizes each layer in that order (create/update happen as early as
//! their dependencies allow); a reverse pass then runs `post_synthesize` on
//! each layer, which today is only load-bearing for the accelerator, whose
//! own teardown must wait until every listener beneath it is gone.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::context::Context;
use crate::errors::ReconcileError;
use crate::stack::Stack;
use crate::synth::{AcceleratorSynthesizer, EndpointGroupSynthesizer, ListenerSynthesizer};

/// Drives one stack through a full forward-then-reverse reconcile pass.
pub struct StackDeployer {
    accelerator: AcceleratorSynthesizer,
    listener: ListenerSynthesizer,
    endpoint_group: EndpointGroupSynthesizer,
}

impl StackDeployer {
    /// Builds a deployer with one synthesizer per layer, all sharing `ctx`.
    #[must_use]
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            accelerator: AcceleratorSynthesizer::new(Arc::clone(&ctx)),
            listener: ListenerSynthesizer::new(Arc::clone(&ctx)),
            endpoint_group: EndpointGroupSynthesizer::new(ctx),
        }
    }

    /// Converges `stack` against the provider, leaves-last on the way in and
    /// leaves-first on the way out.
    ///
    /// Checked for cancellation between every layer in both passes; a
    /// cancellation mid-pass leaves the stack in whatever partially-converged
    /// state the completed layers produced; a later call picks up from there.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Cancelled`] if `cancel` fires before the
    /// deploy finishes, or whatever error the first failing layer surfaces.
    #[instrument(skip(self, stack, cancel), fields(stack_id = %stack.stack_id()))]
    pub async fn deploy(&self, stack: &mut Stack, cancel: &CancellationToken) -> Result<(), ReconcileError> {
        check_cancelled(cancel)?;
        self.accelerator.synthesize(stack).await?;

        check_cancelled(cancel)?;
        self.listener.synthesize(stack).await?;

        check_cancelled(cancel)?;
        self.endpoint_group.synthesize(stack).await?;

        check_cancelled(cancel)?;
        self.endpoint_group.post_synthesize(stack).await?;

        check_cancelled(cancel)?;
        self.listener.post_synthesize(stack).await?;

        check_cancelled(cancel)?;
        self.accelerator.post_synthesize(stack).await?;

        Ok(())
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), ReconcileError> {
    if cancel.is_cancelled() {
        return Err(ReconcileError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
#[path = "deployer_tests.rs"]
mod deployer_tests;
