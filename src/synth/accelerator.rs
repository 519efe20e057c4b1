// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciles the stack's single accelerator.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::Context;
use crate::errors::ReconcileError;
use crate::model::{AcceleratorSpec, AcceleratorStatus, Resource};
use crate::provider::{
    CreateAcceleratorRequest, ObservedAccelerator, UpdateAcceleratorRequest,
};
use crate::stack::Stack;
use crate::tagging::TaggingManager;

/// Reconciles the accelerator layer.
pub struct AcceleratorSynthesizer {
    ctx: Arc<Context>,
}

impl AcceleratorSynthesizer {
    /// Builds a synthesizer sharing the given context.
    #[must_use]
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// Converges the stack's accelerator against the provider.
    ///
    /// No-ops entirely while [`Stack::is_deleting`] is set: accelerator
    /// teardown is deferred to [`Self::post_synthesize`] so it only runs
    /// after every listener has had a chance to be deleted first.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] if the stack has no accelerator, or any
    /// provider call fails.
    #[instrument(skip(self, stack), fields(stack_id = %stack.stack_id()))]
    pub async fn synthesize(&self, stack: &mut Stack) -> Result<(), ReconcileError> {
        if stack.is_deleting() {
            return Ok(());
        }

        let stack_id = stack.stack_id();
        let cluster_id = self.ctx.config.cluster_id.clone();

        let resource = stack
            .accelerator_mut()
            .ok_or_else(|| ReconcileError::InvalidSpec("stack has no accelerator".into()))?;
        let Resource::Accelerator { id, spec, status } = resource else {
            unreachable!("accelerator_mut only returns Accelerator variants");
        };
        let resource_id = id.clone();
        let spec = spec.clone();

        let tracking = TaggingManager::tracking_tags(&cluster_id, &stack_id, &resource_id);
        let desired_tags = TaggingManager::merge_tags(&spec.tags, &tracking);

        let (observed, replaced_arn) = self.converge(status, &spec, &desired_tags).await?;

        *status = AcceleratorStatus {
            arn: Some(observed.arn.clone()),
            dns_name: Some(observed.dns_name.clone()),
            dual_stack_dns_name: observed.dual_stack_dns_name.clone(),
            state: Some(observed.state),
            ip_sets: observed.ip_sets.clone(),
        };

        if let Some(old_arn) = replaced_arn {
            stack.queue_accelerator_deletion(old_arn);
        }

        self.ctx
            .tagging
            .reconcile_tags(&observed.arn, &desired_tags, None)
            .await?;

        Ok(())
    }

    /// Converges the accelerator, returning the observed result plus the old
    /// ARN to queue for post-synthesize deletion when replacement occurred.
    async fn converge(
        &self,
        status: &AcceleratorStatus,
        spec: &AcceleratorSpec,
        tags: &std::collections::BTreeMap<String, String>,
    ) -> Result<(ObservedAccelerator, Option<String>), ReconcileError> {
        let Some(arn) = status.arn.clone() else {
            return Ok((self.create(spec, tags).await?, None));
        };

        match self.ctx.provider.describe_accelerator(&arn).await {
            Ok(observed) => {
                if requires_replacement(spec, &observed) {
                    warn!(arn = %arn, "accelerator requires replacement, queuing old ARN for teardown");
                    Ok((self.create(spec, tags).await?, Some(arn)))
                } else if drifted(spec, &observed) {
                    info!(arn = %arn, "accelerator spec drifted, updating");
                    let updated = self
                        .ctx
                        .provider
                        .update_accelerator(
                            &arn,
                            UpdateAcceleratorRequest {
                                name: spec.name.clone(),
                                ip_address_type: spec.ip_address_type,
                                enabled: spec.enabled,
                            },
                        )
                        .await?;
                    Ok((updated, None))
                } else {
                    Ok((observed, None))
                }
            }
            Err(err) if err.is_not_found() => {
                info!(arn = %arn, "accelerator missing from provider, recreating");
                Ok((self.create(spec, tags).await?, None))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn create(
        &self,
        spec: &AcceleratorSpec,
        tags: &std::collections::BTreeMap<String, String>,
    ) -> Result<ObservedAccelerator, ReconcileError> {
        spec.validate_ip_addresses()?;
        Ok(self
            .ctx
            .provider
            .create_accelerator(CreateAcceleratorRequest {
                idempotency_token: Uuid::new_v4().to_string(),
                name: spec.name.clone(),
                ip_address_type: spec.ip_address_type,
                enabled: spec.enabled,
                ip_addresses: spec.ip_addresses.clone(),
                tags: tags.clone(),
            })
            .await?)
    }

    /// Runs after every other layer's `post_synthesize`: disables and deletes
    /// any accelerator queued for teardown by a BYOIP replacement, and —
    /// while the stack is being deleted — the stack's own accelerator.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] if a provider call fails for a reason other
    /// than not-found.
    #[instrument(skip(self, stack), fields(stack_id = %stack.stack_id()))]
    pub async fn post_synthesize(&self, stack: &mut Stack) -> Result<(), ReconcileError> {
        for arn in stack.take_pending_accelerator_deletions() {
            self.disable_and_delete(&arn).await?;
        }

        if stack.is_deleting() {
            if let Some(Resource::Accelerator { status, .. }) = stack.accelerator() {
                if let Some(arn) = status.arn.clone() {
                    self.disable_and_delete(&arn).await?;
                }
            }
        }

        Ok(())
    }

    /// Idempotently advances an accelerator toward deletion: disables it if
    /// still enabled, then deletes it once the provider reports it deployed
    /// and disabled. No embedded retry loop — a caller that reconciles again
    /// later will pick up where this left off.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] if a provider call fails for a reason other
    /// than not-found.
    pub async fn disable_and_delete(&self, arn: &str) -> Result<(), ReconcileError> {
        let observed = match self.ctx.provider.describe_accelerator(arn).await {
            Ok(observed) => observed,
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        if observed.enabled {
            self.ctx
                .provider
                .update_accelerator(
                    arn,
                    UpdateAcceleratorRequest {
                        name: observed.name,
                        ip_address_type: observed.ip_address_type,
                        enabled: false,
                    },
                )
                .await?;
            return Ok(());
        }

        if observed.state != crate::model::AcceleratorState::Deployed {
            return Ok(());
        }

        match self.ctx.provider.delete_accelerator(arn).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(ReconcileError::Provider(err)),
        }
    }
}

/// Whether the observed accelerator must be replaced rather than updated.
///
/// Always `false`: AGA accelerators don't support BYOIP swaps or IP-type
/// changes in place today, but this is the extension point a future BYOIP
/// replacement flow would hook into. Left here rather than inlined so that
/// hook is easy to find.
fn requires_replacement(_spec: &AcceleratorSpec, _observed: &ObservedAccelerator) -> bool {
    false
}

fn drifted(spec: &AcceleratorSpec, observed: &ObservedAccelerator) -> bool {
    spec.name != observed.name
        || spec.ip_address_type != observed.ip_address_type
        || spec.enabled != observed.enabled
}

#[cfg(test)]
#[path = "accelerator_tests.rs"]
mod accelerator_tests;
