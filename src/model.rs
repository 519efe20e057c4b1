// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state data model for AGA resources.
//!
//! These types mirror the spec/status split of a Kubernetes custom resource
//! without depending on the CRD API surface itself (out of scope for this
//! core): each variant of [`Resource`] carries a `spec` the stack owns and a
//! `status` the synthesizers fill in as they reconcile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{KIND_ACCELERATOR, KIND_ENDPOINT_GROUP, KIND_LISTENER, MAX_PORT, MIN_PORT};
use crate::errors::ReconcileError;
use crate::token::StringToken;

/// IP address family an accelerator is provisioned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpAddressType {
    /// IPv4 only.
    IPv4,
    /// IPv4 and IPv6.
    DualStack,
}

/// Provider-reported lifecycle state of an accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceleratorState {
    /// Still being provisioned or updated by the provider.
    InProgress,
    /// Fully provisioned and ready to route traffic.
    Deployed,
}

/// Transport protocol a listener accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
}

/// Client affinity mode for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientAffinity {
    /// No affinity; each connection may land on a different endpoint.
    None,
    /// Route all traffic from one client IP to the same endpoint.
    SourceIp,
}

impl ClientAffinity {
    /// Whether this affinity mode is anything other than [`ClientAffinity::None`].
    #[must_use]
    pub fn is_set(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// An inclusive `[from_port, to_port]` range, with `1 <= from_port <= to_port <= 65535`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    /// Inclusive lower bound.
    pub from_port: u16,
    /// Inclusive upper bound.
    pub to_port: u16,
}

impl PortRange {
    /// Builds a port range, validating the bounds invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidSpec`] if `from_port` is zero, or if
    /// `from_port > to_port`.
    pub fn new(from_port: u16, to_port: u16) -> Result<Self, ReconcileError> {
        if from_port < MIN_PORT || from_port > to_port || to_port > MAX_PORT {
            return Err(ReconcileError::InvalidSpec(format!(
                "invalid port range {from_port}-{to_port}"
            )));
        }
        Ok(Self { from_port, to_port })
    }

    /// Whether `port` falls within this range, inclusive on both ends.
    #[must_use]
    pub fn contains(&self, port: u16) -> bool {
        port >= self.from_port && port <= self.to_port
    }

    /// Whether this range shares any port with `other`.
    #[must_use]
    pub fn overlaps(&self, other: &PortRange) -> bool {
        self.from_port <= other.to_port && other.from_port <= self.to_port
    }
}

/// A listener-port-to-endpoint-port remapping on an endpoint group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortOverride {
    /// The listener-facing port being remapped.
    pub listener_port: u16,
    /// The endpoint-facing port traffic is actually delivered to.
    pub endpoint_port: u16,
}

/// A single endpoint attached to an endpoint group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// ARN of an external load balancer or ENI, or an EC2 instance ID.
    pub endpoint_id: String,
    /// Relative traffic weight, 0-255.
    pub weight: Option<u8>,
    /// Whether the endpoint should see the original client IP.
    pub client_ip_preservation: Option<bool>,
}

/// Desired spec for the single accelerator in a stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorSpec {
    /// Accelerator display name.
    pub name: String,
    /// IPv4-only or dual-stack.
    pub ip_address_type: IpAddressType,
    /// Whether the accelerator should be routing traffic.
    pub enabled: bool,
    /// User-supplied BYOIP addresses; empty unless BYOIP is in use.
    pub ip_addresses: Vec<String>,
    /// User-supplied tags, merged with tracking tags (tracking wins on conflict).
    pub tags: BTreeMap<String, String>,
}

impl AcceleratorSpec {
    /// Validates `ip_addresses` against `ip_address_type` before create.
    ///
    /// An `IPv4`-typed accelerator cannot carry an IPv6 BYOIP override, and a
    /// `DualStack`-typed accelerator cannot be restricted to IPv4-only
    /// overrides; both leave the accelerator unable to obtain the address
    /// family its type promises.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidSpec`] if any supplied address fails
    /// to parse, or parses as the wrong family for `ip_address_type`.
    pub fn validate_ip_addresses(&self) -> Result<(), ReconcileError> {
        if self.ip_addresses.is_empty() {
            return Ok(());
        }
        let mut saw_v4 = false;
        let mut saw_v6 = false;
        for addr in &self.ip_addresses {
            match addr.parse::<std::net::IpAddr>() {
                Ok(std::net::IpAddr::V4(_)) => saw_v4 = true,
                Ok(std::net::IpAddr::V6(_)) => saw_v6 = true,
                Err(_) => {
                    return Err(ReconcileError::InvalidSpec(format!(
                        "invalid BYOIP address '{addr}'"
                    )))
                }
            }
        }
        match self.ip_address_type {
            IpAddressType::IPv4 if saw_v6 => Err(ReconcileError::InvalidSpec(
                "IPv4 accelerator cannot carry an IPv6 BYOIP override".into(),
            )),
            IpAddressType::DualStack if saw_v4 && !saw_v6 => Err(ReconcileError::InvalidSpec(
                "DualStack accelerator requires no user-supplied IPv4-only overrides".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Observed status for an accelerator, written back onto the desired resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorStatus {
    /// Provider-assigned ARN, `None` before the first successful create.
    pub arn: Option<String>,
    /// Public DNS name.
    pub dns_name: Option<String>,
    /// Public dual-stack DNS name, present only for `DualStack` accelerators.
    pub dual_stack_dns_name: Option<String>,
    /// Lifecycle state as last observed.
    pub state: Option<AcceleratorState>,
    /// Anycast IP sets assigned to the accelerator.
    pub ip_sets: Vec<String>,
}

/// Desired spec for one listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerSpec {
    /// Token resolving to the owning accelerator's ARN.
    pub accelerator_arn: StringToken,
    /// TCP or UDP.
    pub protocol: Protocol,
    /// Client affinity mode.
    pub client_affinity: ClientAffinity,
    /// Port ranges this listener accepts on. Order is not significant.
    pub port_ranges: Vec<PortRange>,
}

/// Observed status for a listener.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListenerStatus {
    /// Provider-assigned ARN, `None` before the first successful create.
    pub arn: Option<String>,
}

/// Desired spec for one endpoint group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointGroupSpec {
    /// Token resolving to the owning listener's ARN.
    pub listener_arn: StringToken,
    /// AWS region the endpoint group targets.
    pub region: String,
    /// Percentage of listener traffic dialed to this region, 0-100.
    pub traffic_dial_percentage: Option<f64>,
    /// Listener-port to endpoint-port remappings.
    pub port_overrides: Vec<PortOverride>,
    /// Endpoints behind this group.
    pub endpoints: Vec<EndpointConfig>,
}

/// Observed status for an endpoint group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointGroupStatus {
    /// Provider-assigned ARN, `None` before the first successful create.
    pub arn: Option<String>,
}

/// A node in the desired resource graph.
///
/// A closed sum rather than open-world dynamic dispatch: the kind tag is part
/// of the stable API surface (it shows up in observed-state keys), so it is
/// derived from the variant rather than stored redundantly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resource {
    /// The stack's single accelerator.
    Accelerator {
        /// Resource id, unique within the stack.
        id: String,
        /// Desired spec.
        spec: AcceleratorSpec,
        /// Observed status, filled in by the accelerator synthesizer.
        status: AcceleratorStatus,
    },
    /// One listener under the stack's accelerator.
    Listener {
        /// Resource id, unique within the stack.
        id: String,
        /// Desired spec.
        spec: ListenerSpec,
        /// Observed status, filled in by the listener synthesizer.
        status: ListenerStatus,
    },
    /// One endpoint group under a listener.
    EndpointGroup {
        /// Resource id, unique within the stack.
        id: String,
        /// Desired spec.
        spec: EndpointGroupSpec,
        /// Observed status, filled in by the endpoint-group synthesizer.
        status: EndpointGroupStatus,
    },
}

impl Resource {
    /// The resource's kind tag, as it appears in observed-state keys.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Accelerator { .. } => KIND_ACCELERATOR,
            Self::Listener { .. } => KIND_LISTENER,
            Self::EndpointGroup { .. } => KIND_ENDPOINT_GROUP,
        }
    }

    /// The resource's id, unique within its stack.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Accelerator { id, .. }
            | Self::Listener { id, .. }
            | Self::EndpointGroup { id, .. } => id,
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;
