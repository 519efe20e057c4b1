// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciles listeners under the stack's accelerator.
//!
//! Listeners have no caller-assigned identity in the provider, so this
//! synthesizer leans on [`crate::matching`] to pair desired specs with
//! observed listeners before deciding what to create, update, or delete.
//! Execution order within one call: delete conflicting listeners, scrub port
//! overrides their removal (or a matched listener's port-range change) makes
//! invalid, update drifted matches, delete non-conflicting leftovers, create
//! unmatched desired — deleting before creating frees listener slots so a
//! shrinking-then-growing stack never spuriously hits the provider's
//! listener-count limit on create.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::Context;
use crate::errors::ReconcileError;
use crate::matching::{conflicts_with_any, match_listeners};
use crate::model::{ListenerSpec, ListenerStatus, PortOverride, Resource};
use crate::provider::{
    CreateListenerRequest, ObservedEndpointGroup, ObservedListener, UpdateEndpointGroupRequest,
    UpdateListenerRequest,
};
use crate::stack::Stack;

/// Reconciles the listener layer.
pub struct ListenerSynthesizer {
    ctx: Arc<Context>,
}

impl ListenerSynthesizer {
    /// Builds a synthesizer sharing the given context.
    #[must_use]
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// Converges every listener in the stack against the provider.
    ///
    /// While [`Stack::is_deleting`] is set, the desired set is treated as
    /// empty, which naturally drives every observed listener through the
    /// non-conflicting deletion path.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] if the accelerator hasn't been synthesized
    /// yet or any provider call fails.
    #[instrument(skip(self, stack), fields(stack_id = %stack.stack_id()))]
    pub async fn synthesize(&self, stack: &mut Stack) -> Result<(), ReconcileError> {
        let Some(Resource::Accelerator { status, .. }) = stack.accelerator() else {
            return Err(ReconcileError::InvalidSpec("stack has no accelerator".into()));
        };
        let Some(accelerator_arn) = status.arn.clone() else {
            return Err(ReconcileError::TokenResolution(
                "accelerator not yet synthesized".into(),
            ));
        };

        let desired_specs: Vec<ListenerSpec> = if stack.is_deleting() {
            Vec::new()
        } else {
            stack
                .listeners()
                .filter_map(|r| match r {
                    Resource::Listener { spec, .. } => Some(spec.clone()),
                    _ => None,
                })
                .collect()
        };

        let observed = self.ctx.provider.list_listeners(&accelerator_arn).await?;
        let result = match_listeners(&desired_specs, &observed);

        let matched_desired_specs: Vec<&ListenerSpec> = result
            .pairs
            .iter()
            .map(|(d, _)| &desired_specs[*d])
            .collect();

        let (conflicting, non_conflicting): (Vec<usize>, Vec<usize>) = result
            .unmatched_observed
            .iter()
            .partition(|&&o| conflicts_with_any(&observed[o], &matched_desired_specs));

        // 1. Delete conflicting listeners first so the provider's per-protocol
        // port-uniqueness invariant doesn't reject the matched updates below.
        for &o_index in &conflicting {
            self.teardown_listener(&observed[o_index]).await?;
        }

        // 2. Scrub port overrides on every surviving listener's endpoint
        // groups that the deletions above, or a pending port-range update,
        // made invalid.
        for &(d_index, o_index) in &result.pairs {
            self.scrub_invalid_overrides(&observed[o_index].arn, &desired_specs[d_index], &desired_specs)
                .await?;
        }

        // 3. Update matched pairs whose spec drifted from what's observed.
        for &(d_index, o_index) in &result.pairs {
            self.update_if_drifted(&desired_specs[d_index], &observed[o_index])
                .await?;
            self.write_status(stack, &desired_specs[d_index], &observed[o_index].arn);
        }

        // 4. Delete observed listeners that are simply no longer desired,
        // freeing their slots before anything new is created.
        for &o_index in &non_conflicting {
            self.teardown_listener(&observed[o_index]).await?;
        }

        // 5. Create desired listeners that found no match at all.
        for &d_index in &result.unmatched_desired {
            let created = self
                .create(&accelerator_arn, &desired_specs[d_index])
                .await?;
            self.write_status(stack, &desired_specs[d_index], &created.arn);
        }

        Ok(())
    }

    /// No deferred work: every listener-layer deletion already happened
    /// inline during [`Self::synthesize`]. Present so the stack deployer can
    /// call every synthesizer's `post_synthesize` uniformly.
    #[allow(clippy::unused_async)]
    pub async fn post_synthesize(&self, _stack: &mut Stack) -> Result<(), ReconcileError> {
        Ok(())
    }

    async fn update_if_drifted(
        &self,
        desired: &ListenerSpec,
        observed: &ObservedListener,
    ) -> Result<(), ReconcileError> {
        if desired.protocol == observed.protocol
            && desired.client_affinity == observed.client_affinity
            && same_port_ranges(&desired.port_ranges, &observed.port_ranges)
        {
            return Ok(());
        }
        info!(arn = %observed.arn, "listener spec drifted, updating");
        self.ctx
            .provider
            .update_listener(
                &observed.arn,
                UpdateListenerRequest {
                    protocol: desired.protocol,
                    client_affinity: desired.client_affinity,
                    port_ranges: desired.port_ranges.clone(),
                },
            )
            .await?;
        Ok(())
    }

    async fn create(
        &self,
        accelerator_arn: &str,
        desired: &ListenerSpec,
    ) -> Result<ObservedListener, ReconcileError> {
        Ok(self
            .ctx
            .provider
            .create_listener(
                accelerator_arn,
                CreateListenerRequest {
                    idempotency_token: Uuid::new_v4().to_string(),
                    protocol: desired.protocol,
                    client_affinity: desired.client_affinity,
                    port_ranges: desired.port_ranges.clone(),
                },
            )
            .await?)
    }

    fn write_status(&self, stack: &mut Stack, desired: &ListenerSpec, arn: &str) {
        for resource in stack.listeners_mut() {
            if let Resource::Listener { spec, status, .. } = resource {
                if spec == desired {
                    *status = ListenerStatus {
                        arn: Some(arn.to_string()),
                    };
                }
            }
        }
    }

    /// Deletes an observed listener that is no longer wanted, including its
    /// own endpoint groups: the provider won't delete a listener that still
    /// has endpoint groups attached, and a removed listener's endpoint
    /// groups were never independently desired in the first place.
    async fn teardown_listener(&self, listener: &ObservedListener) -> Result<(), ReconcileError> {
        for group in self.ctx.provider.list_endpoint_groups(&listener.arn).await? {
            match self.ctx.provider.delete_endpoint_group(&group.arn).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }
        match self.ctx.provider.delete_listener(&listener.arn).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes port overrides from `listener_arn`'s endpoint groups that no
    /// longer correspond to any port the listener's desired spec owns.
    async fn scrub_invalid_overrides(
        &self,
        listener_arn: &str,
        desired: &ListenerSpec,
        all_desired_specs: &[ListenerSpec],
    ) -> Result<(), ReconcileError> {
        for group in self.ctx.provider.list_endpoint_groups(listener_arn).await? {
            let valid: Vec<PortOverride> = group
                .port_overrides
                .iter()
                .copied()
                .filter(|o| !override_is_invalid(o, desired, all_desired_specs))
                .collect();
            if valid.len() == group.port_overrides.len() {
                continue;
            }
            warn!(arn = %group.arn, "scrubbing port overrides invalidated by listener changes");
            self.update_endpoint_group_overrides(&group, valid).await?;
        }
        Ok(())
    }

    async fn update_endpoint_group_overrides(
        &self,
        group: &ObservedEndpointGroup,
        valid_overrides: Vec<PortOverride>,
    ) -> Result<(), ReconcileError> {
        self.ctx
            .provider
            .update_endpoint_group(
                &group.arn,
                UpdateEndpointGroupRequest {
                    traffic_dial_percentage: Some(group.traffic_dial_percentage),
                    port_overrides: valid_overrides,
                    endpoints: None,
                },
            )
            .await?;
        Ok(())
    }
}

fn same_port_ranges(a: &[crate::model::PortRange], b: &[crate::model::PortRange]) -> bool {
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort_by_key(|r| (r.from_port, r.to_port));
    b_sorted.sort_by_key(|r| (r.from_port, r.to_port));
    a_sorted == b_sorted
}

/// A port override on `owner`'s endpoint group is invalid once either:
/// its `listener_port` no longer falls within `owner`'s own desired ranges,
/// or its `endpoint_port` now falls within some *other* listener's desired
/// ranges (which would otherwise create two routes to the same port).
fn override_is_invalid(o: &PortOverride, owner: &ListenerSpec, all_desired_specs: &[ListenerSpec]) -> bool {
    let still_owned = owner.port_ranges.iter().any(|r| r.contains(o.listener_port));
    if !still_owned {
        return true;
    }
    all_desired_specs
        .iter()
        .any(|spec| spec.port_ranges.iter().any(|r| r.contains(o.endpoint_port)))
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod listener_tests;
