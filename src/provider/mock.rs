// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! An in-memory [`Provider`] test double.
//!
//! Mirrors the AGA API closely enough to exercise the synthesizers end to
//! end in unit and integration tests, without pulling in a real SDK client.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::model::{AcceleratorState, EndpointConfig};

use super::{
    CreateAcceleratorRequest, CreateEndpointGroupRequest, CreateListenerRequest,
    ObservedAccelerator, ObservedEndpointGroup, ObservedListener, Provider,
    UpdateAcceleratorRequest, UpdateEndpointGroupRequest, UpdateListenerRequest,
};

#[derive(Default)]
struct State {
    accelerators: BTreeMap<String, ObservedAccelerator>,
    listeners: BTreeMap<String, ObservedListener>,
    endpoint_groups: BTreeMap<String, ObservedEndpointGroup>,
    tags: BTreeMap<String, BTreeMap<String, String>>,
    next_id: u64,
}

/// An in-memory provider backing store, useful in tests and local examples.
///
/// Accelerators are created already `Deployed`, matching the common case
/// exercised by this crate's own tests; callers wanting to exercise
/// in-progress polling can mutate [`InMemoryProvider::set_accelerator_state`]
/// directly.
pub struct InMemoryProvider {
    state: Mutex<State>,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn next_arn(state: &mut State, kind: &str) -> String {
        state.next_id += 1;
        format!("arn:aws:globalaccelerator::mock:{kind}/{}", state.next_id)
    }

    /// Forces an accelerator's observed lifecycle state, for tests exercising
    /// the disable-then-delete polling loop.
    pub fn set_accelerator_state(&self, arn: &str, state: AcceleratorState) {
        if let Some(a) = self.state.lock().unwrap().accelerators.get_mut(arn) {
            a.state = state;
        }
    }
}

#[async_trait]
impl Provider for InMemoryProvider {
    async fn create_accelerator(
        &self,
        request: CreateAcceleratorRequest,
    ) -> Result<ObservedAccelerator, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let arn = Self::next_arn(&mut state, "accelerator");
        let observed = ObservedAccelerator {
            dns_name: format!("{arn}.awsglobalaccelerator.com"),
            dual_stack_dns_name: None,
            arn: arn.clone(),
            name: request.name,
            ip_address_type: request.ip_address_type,
            enabled: request.enabled,
            ip_addresses: request.ip_addresses,
            state: AcceleratorState::Deployed,
            ip_sets: vec!["127.0.0.1".into()],
        };
        state.accelerators.insert(arn.clone(), observed.clone());
        state.tags.insert(arn, request.tags);
        Ok(observed)
    }

    async fn describe_accelerator(&self, arn: &str) -> Result<ObservedAccelerator, ProviderError> {
        self.state
            .lock()
            .unwrap()
            .accelerators
            .get(arn)
            .cloned()
            .ok_or_else(|| ProviderError::AcceleratorNotFound { arn: arn.to_string() })
    }

    async fn update_accelerator(
        &self,
        arn: &str,
        request: UpdateAcceleratorRequest,
    ) -> Result<ObservedAccelerator, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let accelerator = state
            .accelerators
            .get_mut(arn)
            .ok_or_else(|| ProviderError::AcceleratorNotFound { arn: arn.to_string() })?;
        accelerator.name = request.name;
        accelerator.ip_address_type = request.ip_address_type;
        accelerator.enabled = request.enabled;
        Ok(accelerator.clone())
    }

    async fn delete_accelerator(&self, arn: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state
            .accelerators
            .remove(arn)
            .map(|_| ())
            .ok_or_else(|| ProviderError::AcceleratorNotFound { arn: arn.to_string() })
    }

    async fn list_listeners(&self, accelerator_arn: &str) -> Result<Vec<ObservedListener>, ProviderError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .listeners
            .values()
            .filter(|l| l.accelerator_arn == accelerator_arn)
            .cloned()
            .collect())
    }

    async fn create_listener(
        &self,
        accelerator_arn: &str,
        request: CreateListenerRequest,
    ) -> Result<ObservedListener, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let arn = Self::next_arn(&mut state, "listener");
        let observed = ObservedListener {
            arn: arn.clone(),
            accelerator_arn: accelerator_arn.to_string(),
            protocol: request.protocol,
            client_affinity: request.client_affinity,
            port_ranges: request.port_ranges,
        };
        state.listeners.insert(arn, observed.clone());
        Ok(observed)
    }

    async fn update_listener(
        &self,
        arn: &str,
        request: UpdateListenerRequest,
    ) -> Result<ObservedListener, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let listener = state
            .listeners
            .get_mut(arn)
            .ok_or_else(|| ProviderError::ListenerNotFound { arn: arn.to_string() })?;
        listener.protocol = request.protocol;
        listener.client_affinity = request.client_affinity;
        listener.port_ranges = request.port_ranges;
        Ok(listener.clone())
    }

    async fn delete_listener(&self, arn: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state
            .listeners
            .remove(arn)
            .map(|_| ())
            .ok_or_else(|| ProviderError::ListenerNotFound { arn: arn.to_string() })
    }

    async fn list_endpoint_groups(
        &self,
        listener_arn: &str,
    ) -> Result<Vec<ObservedEndpointGroup>, ProviderError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .endpoint_groups
            .values()
            .filter(|eg| eg.listener_arn == listener_arn)
            .cloned()
            .collect())
    }

    async fn create_endpoint_group(
        &self,
        listener_arn: &str,
        request: CreateEndpointGroupRequest,
    ) -> Result<ObservedEndpointGroup, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let arn = Self::next_arn(&mut state, "endpoint-group");
        let observed = ObservedEndpointGroup {
            arn: arn.clone(),
            listener_arn: listener_arn.to_string(),
            region: request.region,
            traffic_dial_percentage: request.traffic_dial_percentage.unwrap_or(100.0),
            port_overrides: request.port_overrides,
            endpoints: request.endpoints,
        };
        state.endpoint_groups.insert(arn, observed.clone());
        Ok(observed)
    }

    async fn update_endpoint_group(
        &self,
        arn: &str,
        request: UpdateEndpointGroupRequest,
    ) -> Result<ObservedEndpointGroup, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let group = state
            .endpoint_groups
            .get_mut(arn)
            .ok_or_else(|| ProviderError::EndpointGroupNotFound { arn: arn.to_string() })?;
        if let Some(dial) = request.traffic_dial_percentage {
            group.traffic_dial_percentage = dial;
        }
        group.port_overrides = request.port_overrides;
        if let Some(endpoints) = request.endpoints {
            group.endpoints = endpoints;
        }
        Ok(group.clone())
    }

    async fn delete_endpoint_group(&self, arn: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state
            .endpoint_groups
            .remove(arn)
            .map(|_| ())
            .ok_or_else(|| ProviderError::EndpointGroupNotFound { arn: arn.to_string() })
    }

    async fn add_endpoints(
        &self,
        endpoint_group_arn: &str,
        configs: Vec<EndpointConfig>,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        let group = state
            .endpoint_groups
            .get_mut(endpoint_group_arn)
            .ok_or_else(|| ProviderError::EndpointGroupNotFound {
                arn: endpoint_group_arn.to_string(),
            })?;
        for config in configs {
            group.endpoints.retain(|e| e.endpoint_id != config.endpoint_id);
            group.endpoints.push(config);
        }
        Ok(())
    }

    async fn remove_endpoints(
        &self,
        endpoint_group_arn: &str,
        endpoint_ids: Vec<String>,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        let group = state
            .endpoint_groups
            .get_mut(endpoint_group_arn)
            .ok_or_else(|| ProviderError::EndpointGroupNotFound {
                arn: endpoint_group_arn.to_string(),
            })?;
        group.endpoints.retain(|e| !endpoint_ids.contains(&e.endpoint_id));
        Ok(())
    }

    async fn tag_resource(&self, arn: &str, tags: BTreeMap<String, String>) -> Result<(), ProviderError> {
        self.state
            .lock()
            .unwrap()
            .tags
            .entry(arn.to_string())
            .or_default()
            .extend(tags);
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> Result<(), ProviderError> {
        if let Some(tags) = self.state.lock().unwrap().tags.get_mut(arn) {
            for key in keys {
                tags.remove(&key);
            }
        }
        Ok(())
    }

    async fn list_tags_for_resource(&self, arn: &str) -> Result<BTreeMap<String, String>, ProviderError> {
        let state = self.state.lock().unwrap();
        if let Some(tags) = state.tags.get(arn) {
            return Ok(tags.clone());
        }
        let known = state.accelerators.contains_key(arn)
            || state.listeners.contains_key(arn)
            || state.endpoint_groups.contains_key(arn);
        if known {
            return Ok(BTreeMap::new());
        }
        Err(ProviderError::TaggingResourceNotFound { arn: arn.to_string() })
    }
}

#[cfg(test)]
#[path = "mock_tests.rs"]
mod mock_tests;
