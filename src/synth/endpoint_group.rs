// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciles endpoint groups across every listener on the stack's accelerator.
//!
//! Unlike listeners, endpoint groups carry a natural identity (their region is
//! unique within a listener), so matching needs no similarity layer. What
//! this layer does need, and listener/accelerator don't, is a cross-listener
//! pass: the provider enforces endpoint-port uniqueness per region across
//! every listener on the accelerator, not just within one, so a port override
//! belonging to another listener's endpoint group can block ours from being
//! created or updated unless it's rewritten out of the way first.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::constants::{DEFAULT_TRAFFIC_DIAL_PERCENTAGE, TRAFFIC_DIAL_EPSILON};
use crate::context::Context;
use crate::errors::ReconcileError;
use crate::model::{EndpointConfig, EndpointGroupSpec, EndpointGroupStatus, PortOverride, Resource};
use crate::provider::{
    CreateEndpointGroupRequest, ObservedEndpointGroup, UpdateEndpointGroupRequest,
};
use crate::stack::Stack;

/// Reconciles the endpoint-group layer.
pub struct EndpointGroupSynthesizer {
    ctx: Arc<Context>,
}

impl EndpointGroupSynthesizer {
    /// Builds a synthesizer sharing the given context.
    #[must_use]
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// Converges every endpoint group in the stack against the provider.
    ///
    /// While [`Stack::is_deleting`] is set, the desired set is treated as
    /// empty. This is usually a no-op in practice: the listener synthesizer
    /// already cascade-deletes a listener's endpoint groups the moment that
    /// listener stops being desired, and during a whole-stack deletion every
    /// listener stops being desired in the same pass.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] if a listener token fails to resolve or any
    /// provider call fails.
    #[instrument(skip(self, stack), fields(stack_id = %stack.stack_id()))]
    pub async fn synthesize(&self, stack: &mut Stack) -> Result<(), ReconcileError> {
        let listener_arns: Vec<String> = stack
            .listeners()
            .filter_map(|r| match r {
                Resource::Listener { status, .. } => status.arn.clone(),
                _ => None,
            })
            .collect();

        let mut desired: Vec<(String, EndpointGroupSpec)> = Vec::new();
        if !stack.is_deleting() {
            let specs: Vec<EndpointGroupSpec> = stack
                .endpoint_groups()
                .filter_map(|r| match r {
                    Resource::EndpointGroup { spec, .. } => Some(spec.clone()),
                    _ => None,
                })
                .collect();
            for spec in specs {
                let listener_arn = stack.resolve_token(&spec.listener_arn)?;
                desired.push((listener_arn, spec));
            }
        }

        let mut observed: Vec<ObservedEndpointGroup> = Vec::new();
        for listener_arn in &listener_arns {
            observed.extend(self.ctx.provider.list_endpoint_groups(listener_arn).await?);
        }

        self.resolve_cross_listener_conflicts(&desired, &observed).await?;

        for listener_arn in &listener_arns {
            let desired_for_listener: Vec<&EndpointGroupSpec> = desired
                .iter()
                .filter(|(l, _)| l == listener_arn)
                .map(|(_, spec)| spec)
                .collect();
            let observed_for_listener: Vec<&ObservedEndpointGroup> = observed
                .iter()
                .filter(|g| &g.listener_arn == listener_arn)
                .collect();

            for &desired_spec in &desired_for_listener {
                match observed_for_listener
                    .iter()
                    .find(|g| g.region == desired_spec.region)
                {
                    Some(observed_group) => {
                        self.update_if_drifted(observed_group, desired_spec).await?;
                        self.reconcile_endpoints(observed_group, desired_spec).await?;
                        self.write_status(stack, desired_spec, &observed_group.arn);
                    }
                    None => {
                        let created = self.create(listener_arn, desired_spec).await?;
                        self.write_status(stack, desired_spec, &created.arn);
                    }
                }
            }

            for observed_group in &observed_for_listener {
                if !desired_for_listener
                    .iter()
                    .any(|d| d.region == observed_group.region)
                {
                    match self.ctx.provider.delete_endpoint_group(&observed_group.arn).await {
                        Ok(()) => {}
                        Err(err) if err.is_not_found() => {}
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }

        Ok(())
    }

    /// No deferred work: this is the leaf layer, nothing depends on it.
    #[allow(clippy::unused_async)]
    pub async fn post_synthesize(&self, _stack: &mut Stack) -> Result<(), ReconcileError> {
        Ok(())
    }

    /// Rewrites away port overrides that collide with a different listener's
    /// desired endpoint-port in the same region, since the provider's
    /// per-region endpoint-port uniqueness invariant spans every listener on
    /// the accelerator, not just the one an endpoint group belongs to.
    ///
    /// Collect-then-execute: the set of conflicting ports is decided against
    /// the full snapshot before any update call runs, so processing order
    /// never changes the outcome.
    async fn resolve_cross_listener_conflicts(
        &self,
        desired: &[(String, EndpointGroupSpec)],
        observed: &[ObservedEndpointGroup],
    ) -> Result<(), ReconcileError> {
        let mut desired_owner: HashMap<(String, u16), &str> = HashMap::new();
        for (listener_arn, spec) in desired {
            for o in &spec.port_overrides {
                desired_owner.insert((spec.region.clone(), o.endpoint_port), listener_arn.as_str());
            }
        }

        for group in observed {
            let conflicting_ports: HashSet<u16> = group
                .port_overrides
                .iter()
                .filter_map(|o| {
                    let owner = desired_owner.get(&(group.region.clone(), o.endpoint_port))?;
                    (*owner != group.listener_arn).then_some(o.endpoint_port)
                })
                .collect();
            if conflicting_ports.is_empty() {
                continue;
            }
            warn!(arn = %group.arn, "yielding endpoint-port override to a different listener's desired state");
            let remaining: Vec<PortOverride> = group
                .port_overrides
                .iter()
                .copied()
                .filter(|o| !conflicting_ports.contains(&o.endpoint_port))
                .collect();
            self.ctx
                .provider
                .update_endpoint_group(
                    &group.arn,
                    UpdateEndpointGroupRequest {
                        traffic_dial_percentage: Some(group.traffic_dial_percentage),
                        port_overrides: remaining,
                        endpoints: None,
                    },
                )
                .await?;
        }
        Ok(())
    }

    async fn update_if_drifted(
        &self,
        observed: &ObservedEndpointGroup,
        desired: &EndpointGroupSpec,
    ) -> Result<(), ReconcileError> {
        if !drifted(desired, observed) {
            return Ok(());
        }
        info!(arn = %observed.arn, "endpoint group spec drifted, updating");
        self.ctx
            .provider
            .update_endpoint_group(
                &observed.arn,
                UpdateEndpointGroupRequest {
                    traffic_dial_percentage: desired.traffic_dial_percentage,
                    port_overrides: desired.port_overrides.clone(),
                    endpoints: None,
                },
            )
            .await?;
        Ok(())
    }

    /// Reconciles one endpoint group's endpoint membership.
    ///
    /// `toAdd`/`toUpdate` drive `isUpdateRequired`; when set, a single
    /// atomic full-replace update call carries the entire desired endpoint
    /// set (`toAdd` union `toUpdate` is exactly the desired set), which
    /// implicitly drops anything in `toRemove` too. Otherwise this is a pure
    /// add/remove, done add-first to minimize connection disruption, with a
    /// remove-then-add flip-flop if the add hits the provider's capacity
    /// limit and there's something to remove to make room.
    async fn reconcile_endpoints(
        &self,
        observed: &ObservedEndpointGroup,
        desired: &EndpointGroupSpec,
    ) -> Result<(), ReconcileError> {
        let (to_add, to_update, to_remove, update_required) =
            diff_endpoints(&observed.endpoints, &desired.endpoints);

        if to_add.is_empty() && to_update.is_empty() && to_remove.is_empty() {
            return Ok(());
        }

        if update_required {
            let mut configs = to_add;
            configs.extend(to_update);
            self.ctx
                .provider
                .update_endpoint_group(
                    &observed.arn,
                    UpdateEndpointGroupRequest {
                        traffic_dial_percentage: Some(observed.traffic_dial_percentage),
                        port_overrides: observed.port_overrides.clone(),
                        endpoints: Some(configs),
                    },
                )
                .await?;
            return Ok(());
        }

        match self
            .ctx
            .provider
            .add_endpoints(&observed.arn, to_add.clone())
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_limit_exceeded() && !to_remove.is_empty() => {
                warn!(arn = %observed.arn, "add-endpoints hit a capacity limit, flip-flopping");
                self.ctx
                    .provider
                    .remove_endpoints(&observed.arn, to_remove.clone())
                    .await?;
                self.ctx.provider.add_endpoints(&observed.arn, to_add).await?;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        if !to_remove.is_empty() {
            self.ctx.provider.remove_endpoints(&observed.arn, to_remove).await?;
        }
        Ok(())
    }

    async fn create(
        &self,
        listener_arn: &str,
        desired: &EndpointGroupSpec,
    ) -> Result<ObservedEndpointGroup, ReconcileError> {
        Ok(self
            .ctx
            .provider
            .create_endpoint_group(
                listener_arn,
                CreateEndpointGroupRequest {
                    idempotency_token: Uuid::new_v4().to_string(),
                    region: desired.region.clone(),
                    traffic_dial_percentage: desired.traffic_dial_percentage,
                    port_overrides: desired.port_overrides.clone(),
                    endpoints: desired.endpoints.clone(),
                },
            )
            .await?)
    }

    fn write_status(&self, stack: &mut Stack, desired: &EndpointGroupSpec, arn: &str) {
        for resource in stack.endpoint_groups_mut() {
            if let Resource::EndpointGroup { spec, status, .. } = resource {
                if spec == desired {
                    *status = EndpointGroupStatus {
                        arn: Some(arn.to_string()),
                    };
                }
            }
        }
    }
}

fn drifted(desired: &EndpointGroupSpec, observed: &ObservedEndpointGroup) -> bool {
    let desired_dial = desired.traffic_dial_percentage.unwrap_or(DEFAULT_TRAFFIC_DIAL_PERCENTAGE);
    if (desired_dial - observed.traffic_dial_percentage).abs() > TRAFFIC_DIAL_EPSILON {
        return true;
    }
    !same_port_overrides(&desired.port_overrides, &observed.port_overrides)
}

fn same_port_overrides(a: &[PortOverride], b: &[PortOverride]) -> bool {
    let a_map: BTreeMap<u16, u16> = a.iter().map(|o| (o.listener_port, o.endpoint_port)).collect();
    let b_map: BTreeMap<u16, u16> = b.iter().map(|o| (o.listener_port, o.endpoint_port)).collect();
    a_map == b_map
}

/// Partitions desired endpoint configs against observed ones by endpoint id.
///
/// Returns `(toAdd, toUpdate, toRemove, isUpdateRequired)`. `toUpdate` keeps
/// every endpoint present on both sides regardless of drift; the caller only
/// acts on it when `isUpdateRequired` is set.
fn diff_endpoints(
    existing: &[EndpointConfig],
    desired: &[EndpointConfig],
) -> (Vec<EndpointConfig>, Vec<EndpointConfig>, Vec<String>, bool) {
    let existing_by_id: HashMap<&str, &EndpointConfig> =
        existing.iter().map(|e| (e.endpoint_id.as_str(), e)).collect();
    let desired_by_id: HashSet<&str> = desired.iter().map(|d| d.endpoint_id.as_str()).collect();

    let to_add: Vec<EndpointConfig> = desired
        .iter()
        .filter(|d| !existing_by_id.contains_key(d.endpoint_id.as_str()))
        .cloned()
        .collect();
    let to_update: Vec<EndpointConfig> = desired
        .iter()
        .filter(|d| existing_by_id.contains_key(d.endpoint_id.as_str()))
        .cloned()
        .collect();
    let to_remove: Vec<String> = existing
        .iter()
        .filter(|e| !desired_by_id.contains(e.endpoint_id.as_str()))
        .map(|e| e.endpoint_id.clone())
        .collect();

    let update_required = to_update.iter().any(|d| {
        let e = existing_by_id[d.endpoint_id.as_str()];
        e.weight != d.weight || e.client_ip_preservation != d.client_ip_preservation
    });

    (to_add, to_update, to_remove, update_required)
}

#[cfg(test)]
#[path = "endpoint_group_tests.rs"]
mod endpoint_group_tests;
