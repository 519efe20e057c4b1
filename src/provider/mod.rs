// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The provider seam: an async trait describing the AWS Global Accelerator
//! (and resource-groups tagging) API calls the synthesizers drive.
//!
//! The concrete AWS SDK client is out of scope for this crate; callers supply
//! their own [`Provider`] implementation. [`mock::InMemoryProvider`] is a
//! minimal in-process test double exercising the same trait.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::model::{AcceleratorState, ClientAffinity, EndpointConfig, IpAddressType, PortOverride, PortRange, Protocol};

pub mod mock;

/// Request body for creating an accelerator.
#[derive(Debug, Clone)]
pub struct CreateAcceleratorRequest {
    /// Idempotency token for this create attempt.
    pub idempotency_token: String,
    /// Accelerator display name.
    pub name: String,
    /// IPv4-only or dual-stack.
    pub ip_address_type: IpAddressType,
    /// Whether the accelerator starts enabled.
    pub enabled: bool,
    /// BYOIP addresses to assign, if any.
    pub ip_addresses: Vec<String>,
    /// Tags to apply at creation time.
    pub tags: BTreeMap<String, String>,
}

/// Request body for updating an accelerator's mutable fields.
#[derive(Debug, Clone)]
pub struct UpdateAcceleratorRequest {
    /// New display name.
    pub name: String,
    /// New IP address type.
    pub ip_address_type: IpAddressType,
    /// New enabled state.
    pub enabled: bool,
}

/// Provider-observed accelerator state.
#[derive(Debug, Clone)]
pub struct ObservedAccelerator {
    /// Provider-assigned ARN.
    pub arn: String,
    /// Display name.
    pub name: String,
    /// IP address type.
    pub ip_address_type: IpAddressType,
    /// Whether the accelerator is currently enabled.
    pub enabled: bool,
    /// Assigned BYOIP addresses, if any.
    pub ip_addresses: Vec<String>,
    /// Public DNS name.
    pub dns_name: String,
    /// Public dual-stack DNS name, present only for dual-stack accelerators.
    pub dual_stack_dns_name: Option<String>,
    /// Current lifecycle state.
    pub state: AcceleratorState,
    /// Anycast IP sets assigned to the accelerator.
    pub ip_sets: Vec<String>,
}

/// Request body for creating a listener.
#[derive(Debug, Clone)]
pub struct CreateListenerRequest {
    /// Idempotency token for this create attempt.
    pub idempotency_token: String,
    /// TCP or UDP.
    pub protocol: Protocol,
    /// Client affinity mode.
    pub client_affinity: ClientAffinity,
    /// Accepted port ranges.
    pub port_ranges: Vec<PortRange>,
}

/// Request body for updating a listener's mutable fields.
#[derive(Debug, Clone)]
pub struct UpdateListenerRequest {
    /// TCP or UDP.
    pub protocol: Protocol,
    /// Client affinity mode.
    pub client_affinity: ClientAffinity,
    /// Accepted port ranges.
    pub port_ranges: Vec<PortRange>,
}

/// Provider-observed listener state.
#[derive(Debug, Clone)]
pub struct ObservedListener {
    /// Provider-assigned ARN.
    pub arn: String,
    /// ARN of the owning accelerator.
    pub accelerator_arn: String,
    /// TCP or UDP.
    pub protocol: Protocol,
    /// Client affinity mode.
    pub client_affinity: ClientAffinity,
    /// Accepted port ranges.
    pub port_ranges: Vec<PortRange>,
}

/// Request body for creating an endpoint group.
#[derive(Debug, Clone)]
pub struct CreateEndpointGroupRequest {
    /// Idempotency token for this create attempt.
    pub idempotency_token: String,
    /// Target AWS region.
    pub region: String,
    /// Percentage of listener traffic dialed to this region.
    pub traffic_dial_percentage: Option<f64>,
    /// Listener-port to endpoint-port remappings.
    pub port_overrides: Vec<PortOverride>,
    /// Endpoints to attach at creation time.
    pub endpoints: Vec<EndpointConfig>,
}

/// Request body for updating an endpoint group.
///
/// `endpoints`, when `Some`, replaces the provider's endpoint set atomically;
/// `None` leaves endpoint membership untouched (used when the caller is only
/// adjusting `traffic_dial_percentage` or `port_overrides`, or is handling
/// endpoint membership itself via [`Provider::add_endpoints`] /
/// [`Provider::remove_endpoints`]).
#[derive(Debug, Clone)]
pub struct UpdateEndpointGroupRequest {
    /// Percentage of listener traffic dialed to this region.
    pub traffic_dial_percentage: Option<f64>,
    /// Listener-port to endpoint-port remappings.
    pub port_overrides: Vec<PortOverride>,
    /// Replacement endpoint set, or `None` to leave membership untouched.
    pub endpoints: Option<Vec<EndpointConfig>>,
}

/// Provider-observed endpoint group state.
#[derive(Debug, Clone)]
pub struct ObservedEndpointGroup {
    /// Provider-assigned ARN.
    pub arn: String,
    /// ARN of the owning listener.
    pub listener_arn: String,
    /// Target AWS region.
    pub region: String,
    /// Percentage of listener traffic dialed to this region.
    pub traffic_dial_percentage: f64,
    /// Listener-port to endpoint-port remappings currently in effect.
    pub port_overrides: Vec<PortOverride>,
    /// Endpoints currently attached.
    pub endpoints: Vec<EndpointConfig>,
}

/// A tag key/value pair in the provider SDK's own wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkTag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// The subset of the AWS Global Accelerator and resource-groups-tagging APIs
/// this core depends on.
///
/// Every method maps to one external-interface operation named in the
/// reconciliation core's requirements; the concrete client implementing this
/// trait (and the admission/scheduler wiring that drives it) is out of scope
/// here.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Creates an accelerator and returns its observed state.
    async fn create_accelerator(
        &self,
        request: CreateAcceleratorRequest,
    ) -> Result<ObservedAccelerator, ProviderError>;

    /// Fetches the current observed state of an accelerator.
    async fn describe_accelerator(&self, arn: &str) -> Result<ObservedAccelerator, ProviderError>;

    /// Updates an accelerator's mutable fields.
    async fn update_accelerator(
        &self,
        arn: &str,
        request: UpdateAcceleratorRequest,
    ) -> Result<ObservedAccelerator, ProviderError>;

    /// Deletes an accelerator. The accelerator must already be disabled and
    /// fully deployed; the provider is expected to reject otherwise.
    async fn delete_accelerator(&self, arn: &str) -> Result<(), ProviderError>;

    /// Lists every listener under an accelerator.
    async fn list_listeners(&self, accelerator_arn: &str) -> Result<Vec<ObservedListener>, ProviderError>;

    /// Creates a listener under an accelerator.
    async fn create_listener(
        &self,
        accelerator_arn: &str,
        request: CreateListenerRequest,
    ) -> Result<ObservedListener, ProviderError>;

    /// Updates a listener's mutable fields.
    async fn update_listener(
        &self,
        arn: &str,
        request: UpdateListenerRequest,
    ) -> Result<ObservedListener, ProviderError>;

    /// Deletes a listener.
    async fn delete_listener(&self, arn: &str) -> Result<(), ProviderError>;

    /// Lists every endpoint group under a listener.
    async fn list_endpoint_groups(
        &self,
        listener_arn: &str,
    ) -> Result<Vec<ObservedEndpointGroup>, ProviderError>;

    /// Creates an endpoint group under a listener.
    async fn create_endpoint_group(
        &self,
        listener_arn: &str,
        request: CreateEndpointGroupRequest,
    ) -> Result<ObservedEndpointGroup, ProviderError>;

    /// Updates an endpoint group's mutable fields.
    async fn update_endpoint_group(
        &self,
        arn: &str,
        request: UpdateEndpointGroupRequest,
    ) -> Result<ObservedEndpointGroup, ProviderError>;

    /// Deletes an endpoint group.
    async fn delete_endpoint_group(&self, arn: &str) -> Result<(), ProviderError>;

    /// Adds endpoints to an existing endpoint group.
    async fn add_endpoints(
        &self,
        endpoint_group_arn: &str,
        configs: Vec<EndpointConfig>,
    ) -> Result<(), ProviderError>;

    /// Removes endpoints from an existing endpoint group by id.
    async fn remove_endpoints(
        &self,
        endpoint_group_arn: &str,
        endpoint_ids: Vec<String>,
    ) -> Result<(), ProviderError>;

    /// Applies tags to a resource.
    async fn tag_resource(&self, arn: &str, tags: BTreeMap<String, String>) -> Result<(), ProviderError>;

    /// Removes tags from a resource by key.
    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> Result<(), ProviderError>;

    /// Lists every tag currently on a resource.
    async fn list_tags_for_resource(&self, arn: &str) -> Result<BTreeMap<String, String>, ProviderError>;
}
