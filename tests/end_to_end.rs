// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end reconcile scenarios against the in-memory provider, driven
//! through the public [`StackDeployer`] entry point rather than individual
//! synthesizers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use aga_reconciler::config::ReconcilerConfig;
use aga_reconciler::context::Context;
use aga_reconciler::deployer::StackDeployer;
use aga_reconciler::errors::ProviderError;
use aga_reconciler::matching::{match_listeners, similarity_score};
use aga_reconciler::model::{
    AcceleratorSpec, AcceleratorStatus, ClientAffinity, EndpointConfig, EndpointGroupSpec,
    EndpointGroupStatus, IpAddressType, ListenerSpec, ListenerStatus, PortOverride, PortRange,
    Protocol, Resource,
};
use aga_reconciler::provider::mock::InMemoryProvider;
use aga_reconciler::provider::{
    CreateAcceleratorRequest, CreateEndpointGroupRequest, CreateListenerRequest,
    ObservedAccelerator, ObservedEndpointGroup, ObservedListener, Provider,
    UpdateAcceleratorRequest, UpdateEndpointGroupRequest, UpdateListenerRequest,
};
use aga_reconciler::stack::Stack;
use aga_reconciler::token::{StatusField, StringToken};

/// Wraps [`InMemoryProvider`], recording the name of every call so tests can
/// assert ordering, not just final state.
struct RecordingProvider {
    inner: InMemoryProvider,
    calls: Mutex<Vec<String>>,
}

impl RecordingProvider {
    fn new() -> Self {
        Self {
            inner: InMemoryProvider::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for RecordingProvider {
    async fn create_accelerator(
        &self,
        request: CreateAcceleratorRequest,
    ) -> Result<ObservedAccelerator, ProviderError> {
        self.record("create_accelerator");
        self.inner.create_accelerator(request).await
    }

    async fn describe_accelerator(&self, arn: &str) -> Result<ObservedAccelerator, ProviderError> {
        self.record("describe_accelerator");
        self.inner.describe_accelerator(arn).await
    }

    async fn update_accelerator(
        &self,
        arn: &str,
        request: UpdateAcceleratorRequest,
    ) -> Result<ObservedAccelerator, ProviderError> {
        self.record("update_accelerator");
        self.inner.update_accelerator(arn, request).await
    }

    async fn delete_accelerator(&self, arn: &str) -> Result<(), ProviderError> {
        self.record("delete_accelerator");
        self.inner.delete_accelerator(arn).await
    }

    async fn list_listeners(&self, accelerator_arn: &str) -> Result<Vec<ObservedListener>, ProviderError> {
        self.inner.list_listeners(accelerator_arn).await
    }

    async fn create_listener(
        &self,
        accelerator_arn: &str,
        request: CreateListenerRequest,
    ) -> Result<ObservedListener, ProviderError> {
        self.record("create_listener");
        self.inner.create_listener(accelerator_arn, request).await
    }

    async fn update_listener(
        &self,
        arn: &str,
        request: UpdateListenerRequest,
    ) -> Result<ObservedListener, ProviderError> {
        self.record("update_listener");
        self.inner.update_listener(arn, request).await
    }

    async fn delete_listener(&self, arn: &str) -> Result<(), ProviderError> {
        self.record("delete_listener");
        self.inner.delete_listener(arn).await
    }

    async fn list_endpoint_groups(
        &self,
        listener_arn: &str,
    ) -> Result<Vec<ObservedEndpointGroup>, ProviderError> {
        self.inner.list_endpoint_groups(listener_arn).await
    }

    async fn create_endpoint_group(
        &self,
        listener_arn: &str,
        request: CreateEndpointGroupRequest,
    ) -> Result<ObservedEndpointGroup, ProviderError> {
        self.record("create_endpoint_group");
        self.inner.create_endpoint_group(listener_arn, request).await
    }

    async fn update_endpoint_group(
        &self,
        arn: &str,
        request: UpdateEndpointGroupRequest,
    ) -> Result<ObservedEndpointGroup, ProviderError> {
        self.record("update_endpoint_group");
        self.inner.update_endpoint_group(arn, request).await
    }

    async fn delete_endpoint_group(&self, arn: &str) -> Result<(), ProviderError> {
        self.record("delete_endpoint_group");
        self.inner.delete_endpoint_group(arn).await
    }

    async fn add_endpoints(
        &self,
        endpoint_group_arn: &str,
        configs: Vec<EndpointConfig>,
    ) -> Result<(), ProviderError> {
        self.record("add_endpoints");
        self.inner.add_endpoints(endpoint_group_arn, configs).await
    }

    async fn remove_endpoints(
        &self,
        endpoint_group_arn: &str,
        endpoint_ids: Vec<String>,
    ) -> Result<(), ProviderError> {
        self.record("remove_endpoints");
        self.inner.remove_endpoints(endpoint_group_arn, endpoint_ids).await
    }

    async fn tag_resource(&self, arn: &str, tags: BTreeMap<String, String>) -> Result<(), ProviderError> {
        self.record("tag_resource");
        self.inner.tag_resource(arn, tags).await
    }

    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> Result<(), ProviderError> {
        self.record("untag_resource");
        self.inner.untag_resource(arn, keys).await
    }

    async fn list_tags_for_resource(&self, arn: &str) -> Result<BTreeMap<String, String>, ProviderError> {
        self.inner.list_tags_for_resource(arn).await
    }
}

fn accelerator_resource(name: &str) -> Resource {
    Resource::Accelerator {
        id: "accel-0".into(),
        spec: AcceleratorSpec {
            name: name.into(),
            ip_address_type: IpAddressType::IPv4,
            enabled: true,
            ip_addresses: Vec::new(),
            tags: BTreeMap::new(),
        },
        status: AcceleratorStatus::default(),
    }
}

fn listener_resource(id: &str, from: u16, to: u16) -> Resource {
    Resource::Listener {
        id: id.into(),
        spec: ListenerSpec {
            accelerator_arn: StringToken::from_status("accel-0", StatusField::AcceleratorArn),
            protocol: Protocol::Tcp,
            client_affinity: ClientAffinity::None,
            port_ranges: vec![PortRange::new(from, to).unwrap()],
        },
        status: ListenerStatus::default(),
    }
}

/// S1 — Green-field: create-accelerator, create-listener, create-endpoint-group,
/// add-endpoints, in that order, with an ARN recorded in status for each.
#[tokio::test]
async fn s1_green_field_creates_every_layer_in_dependency_order() {
    let provider = Arc::new(RecordingProvider::new());
    let ctx = Arc::new(Context::new(Arc::clone(&provider) as _, ReconcilerConfig::new("cluster-1")));
    let deployer = StackDeployer::new(ctx);

    let mut stack = Stack::new("default", "a1");
    stack.add_resource(accelerator_resource("a1"));
    stack.add_resource(listener_resource("listener-0", 80, 80));
    stack.add_resource(Resource::EndpointGroup {
        id: "eg-0".into(),
        spec: EndpointGroupSpec {
            listener_arn: StringToken::from_status("listener-0", StatusField::ListenerArn),
            region: "us-west-2".into(),
            traffic_dial_percentage: None,
            port_overrides: Vec::new(),
            endpoints: vec![EndpointConfig {
                endpoint_id: "elb-arn-x".into(),
                weight: None,
                client_ip_preservation: None,
            }],
        },
        status: EndpointGroupStatus::default(),
    });

    deployer.deploy(&mut stack, &CancellationToken::new()).await.unwrap();

    assert_eq!(
        provider.calls(),
        vec!["create_accelerator", "create_listener", "create_endpoint_group", "add_endpoints"]
    );

    match stack.accelerator().unwrap() {
        Resource::Accelerator { status, .. } => assert!(status.arn.is_some()),
        _ => unreachable!(),
    }
    match stack.listeners().next().unwrap() {
        Resource::Listener { status, .. } => assert!(status.arn.is_some()),
        _ => unreachable!(),
    }
    match stack.endpoint_groups().next().unwrap() {
        Resource::EndpointGroup { status, .. } => assert!(status.arn.is_some()),
        _ => unreachable!(),
    }
}

/// S2 — Exact-match no-op: desired matches observed exactly on both
/// listeners, so the second deploy issues zero mutating calls.
#[tokio::test]
async fn s2_exact_match_reconcile_is_a_noop() {
    let provider = Arc::new(RecordingProvider::new());
    let ctx = Arc::new(Context::new(Arc::clone(&provider) as _, ReconcilerConfig::new("cluster-1")));
    let deployer = StackDeployer::new(ctx);

    let mut stack = Stack::new("default", "a1");
    stack.add_resource(accelerator_resource("a1"));
    stack.add_resource(listener_resource("listener-0", 80, 80));
    stack.add_resource(listener_resource("listener-1", 443, 443));
    deployer.deploy(&mut stack, &CancellationToken::new()).await.unwrap();

    let before = provider.calls().len();
    deployer.deploy(&mut stack, &CancellationToken::new()).await.unwrap();
    let after = provider.calls();

    // describe_accelerator is the only call a no-op reconcile issues beyond
    // the read-only list_listeners/list_endpoint_groups calls (unrecorded).
    let mutating: Vec<&String> = after[before..]
        .iter()
        .filter(|c| c.as_str() != "describe_accelerator")
        .collect();
    assert!(mutating.is_empty(), "expected no mutating calls, got {mutating:?}");
}

/// S3 — Similarity rematch: a desired TCP:80-100 listener matches a prior
/// TCP:85-95 observed listener by score (40 protocol + floor(100*11/21)=52
/// jaccard = 92), triggering an update rather than delete+create.
#[tokio::test]
async fn s3_similarity_rematch_updates_in_place() {
    let desired = ListenerSpec {
        accelerator_arn: StringToken::literal("irrelevant"),
        protocol: Protocol::Tcp,
        client_affinity: ClientAffinity::None,
        port_ranges: vec![PortRange::new(80, 100).unwrap()],
    };
    let observed = ObservedListener {
        arn: "arn:listener/1".into(),
        accelerator_arn: "arn:accelerator/1".into(),
        protocol: Protocol::Tcp,
        client_affinity: ClientAffinity::None,
        port_ranges: vec![PortRange::new(85, 95).unwrap()],
    };
    assert_eq!(similarity_score(&desired, &observed), 92);

    let result = match_listeners(std::slice::from_ref(&desired), std::slice::from_ref(&observed));
    assert_eq!(result.pairs, vec![(0, 0)]);
    assert!(result.unmatched_desired.is_empty());
    assert!(result.unmatched_observed.is_empty());

    let provider = Arc::new(RecordingProvider::new());
    let ctx = Arc::new(Context::new(Arc::clone(&provider) as _, ReconcilerConfig::new("cluster-1")));
    let deployer = StackDeployer::new(ctx);
    let mut stack = Stack::new("default", "a1");
    stack.add_resource(accelerator_resource("a1"));
    stack.add_resource(listener_resource("listener-0", 85, 95));
    deployer.deploy(&mut stack, &CancellationToken::new()).await.unwrap();

    if let Some(Resource::Listener { spec, .. }) = stack.listeners_mut().next() {
        spec.port_ranges = vec![PortRange::new(80, 100).unwrap()];
    }
    let before = provider.calls().len();
    deployer.deploy(&mut stack, &CancellationToken::new()).await.unwrap();

    assert_eq!(&provider.calls()[before..], &["update_listener"]);
}

/// S4 — Listener port conflict: a stable UDP:9000-9000 listener stays
/// matched and untouched; a UDP:9000-9005 leftover from a different prior
/// listener overlaps it and must be deleted as a conflict; an unrelated
/// UDP:1-1 leftover matches nothing and is simply no longer desired; and a
/// new TCP:80-80 listener has no observed counterpart at all and must be
/// created. Both deletes must happen before the create — the order this
/// scenario exists to pin down.
#[tokio::test]
async fn s4_listener_port_conflict_deletes_before_creating() {
    let provider = Arc::new(RecordingProvider::new());
    let ctx = Arc::new(Context::new(Arc::clone(&provider) as _, ReconcilerConfig::new("cluster-1")));
    let deployer = StackDeployer::new(ctx);

    let accelerator = provider
        .create_accelerator(CreateAcceleratorRequest {
            idempotency_token: "t0".into(),
            name: "a1".into(),
            ip_address_type: IpAddressType::IPv4,
            enabled: true,
            ip_addresses: Vec::new(),
            tags: BTreeMap::new(),
        })
        .await
        .unwrap();
    let kept = provider
        .create_listener(
            &accelerator.arn,
            CreateListenerRequest {
                idempotency_token: "t1".into(),
                protocol: Protocol::Udp,
                client_affinity: ClientAffinity::None,
                port_ranges: vec![PortRange::new(9000, 9000).unwrap()],
            },
        )
        .await
        .unwrap();
    let conflicting = provider
        .create_listener(
            &accelerator.arn,
            CreateListenerRequest {
                idempotency_token: "t2".into(),
                protocol: Protocol::Udp,
                client_affinity: ClientAffinity::None,
                port_ranges: vec![PortRange::new(9000, 9005).unwrap()],
            },
        )
        .await
        .unwrap();
    let stray = provider
        .create_listener(
            &accelerator.arn,
            CreateListenerRequest {
                idempotency_token: "t3".into(),
                protocol: Protocol::Udp,
                client_affinity: ClientAffinity::None,
                port_ranges: vec![PortRange::new(1, 1).unwrap()],
            },
        )
        .await
        .unwrap();

    let mut stack = Stack::new("default", "a1");
    stack.add_resource(Resource::Accelerator {
        id: "accel-0".into(),
        spec: AcceleratorSpec {
            name: "a1".into(),
            ip_address_type: IpAddressType::IPv4,
            enabled: true,
            ip_addresses: Vec::new(),
            tags: BTreeMap::new(),
        },
        status: AcceleratorStatus { arn: Some(accelerator.arn.clone()), ..Default::default() },
    });
    stack.add_resource(Resource::Listener {
        id: "listener-keep".into(),
        spec: ListenerSpec {
            accelerator_arn: StringToken::from_status("accel-0", StatusField::AcceleratorArn),
            protocol: Protocol::Udp,
            client_affinity: ClientAffinity::None,
            port_ranges: vec![PortRange::new(9000, 9000).unwrap()],
        },
        status: ListenerStatus { arn: Some(kept.arn.clone()) },
    });
    stack.add_resource(Resource::Listener {
        id: "listener-new".into(),
        spec: ListenerSpec {
            accelerator_arn: StringToken::from_status("accel-0", StatusField::AcceleratorArn),
            protocol: Protocol::Tcp,
            client_affinity: ClientAffinity::None,
            port_ranges: vec![PortRange::new(80, 80).unwrap()],
        },
        status: ListenerStatus::default(),
    });

    let before = provider.calls().len();
    deployer.deploy(&mut stack, &CancellationToken::new()).await.unwrap();
    let calls = &provider.calls()[before..];

    let delete_positions: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| c.as_str() == "delete_listener")
        .map(|(i, _)| i)
        .collect();
    let create_position = calls.iter().position(|c| c.as_str() == "create_listener").unwrap();
    assert_eq!(delete_positions.len(), 2, "expected both leftovers deleted, got {calls:?}");
    assert!(
        delete_positions.iter().all(|&i| i < create_position),
        "both deletes must precede the create, got {calls:?}"
    );

    let listeners = provider.list_listeners(&accelerator.arn).await.unwrap();
    let arns: Vec<&str> = listeners.iter().map(|l| l.arn.as_str()).collect();
    assert!(arns.contains(&kept.arn.as_str()));
    assert!(!arns.contains(&conflicting.arn.as_str()));
    assert!(!arns.contains(&stray.arn.as_str()));
    assert_eq!(listeners.len(), 2);
}

/// S5 — Endpoint flip-flop: add-endpoints on the new desired set fails with
/// LimitExceeded, so remove-endpoints on the stale set runs first, then
/// add-endpoints retries and succeeds.
#[tokio::test]
async fn s5_endpoint_flip_flop_removes_before_retrying_add() {
    struct FlipFlopProvider(InMemoryProvider, std::sync::atomic::AtomicBool);

    #[async_trait]
    impl Provider for FlipFlopProvider {
        async fn create_accelerator(&self, r: CreateAcceleratorRequest) -> Result<ObservedAccelerator, ProviderError> {
            self.0.create_accelerator(r).await
        }
        async fn describe_accelerator(&self, arn: &str) -> Result<ObservedAccelerator, ProviderError> {
            self.0.describe_accelerator(arn).await
        }
        async fn update_accelerator(&self, arn: &str, r: UpdateAcceleratorRequest) -> Result<ObservedAccelerator, ProviderError> {
            self.0.update_accelerator(arn, r).await
        }
        async fn delete_accelerator(&self, arn: &str) -> Result<(), ProviderError> {
            self.0.delete_accelerator(arn).await
        }
        async fn list_listeners(&self, arn: &str) -> Result<Vec<ObservedListener>, ProviderError> {
            self.0.list_listeners(arn).await
        }
        async fn create_listener(&self, arn: &str, r: CreateListenerRequest) -> Result<ObservedListener, ProviderError> {
            self.0.create_listener(arn, r).await
        }
        async fn update_listener(&self, arn: &str, r: UpdateListenerRequest) -> Result<ObservedListener, ProviderError> {
            self.0.update_listener(arn, r).await
        }
        async fn delete_listener(&self, arn: &str) -> Result<(), ProviderError> {
            self.0.delete_listener(arn).await
        }
        async fn list_endpoint_groups(&self, arn: &str) -> Result<Vec<ObservedEndpointGroup>, ProviderError> {
            self.0.list_endpoint_groups(arn).await
        }
        async fn create_endpoint_group(&self, arn: &str, r: CreateEndpointGroupRequest) -> Result<ObservedEndpointGroup, ProviderError> {
            self.0.create_endpoint_group(arn, r).await
        }
        async fn update_endpoint_group(&self, arn: &str, r: UpdateEndpointGroupRequest) -> Result<ObservedEndpointGroup, ProviderError> {
            self.0.update_endpoint_group(arn, r).await
        }
        async fn delete_endpoint_group(&self, arn: &str) -> Result<(), ProviderError> {
            self.0.delete_endpoint_group(arn).await
        }
        async fn add_endpoints(&self, arn: &str, configs: Vec<EndpointConfig>) -> Result<(), ProviderError> {
            if !self.1.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(ProviderError::LimitExceeded {
                    operation: "add_endpoints".into(),
                    arn: arn.into(),
                    reason: "endpoint capacity exceeded".into(),
                });
            }
            self.0.add_endpoints(arn, configs).await
        }
        async fn remove_endpoints(&self, arn: &str, ids: Vec<String>) -> Result<(), ProviderError> {
            self.0.remove_endpoints(arn, ids).await
        }
        async fn tag_resource(&self, arn: &str, tags: BTreeMap<String, String>) -> Result<(), ProviderError> {
            self.0.tag_resource(arn, tags).await
        }
        async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> Result<(), ProviderError> {
            self.0.untag_resource(arn, keys).await
        }
        async fn list_tags_for_resource(&self, arn: &str) -> Result<BTreeMap<String, String>, ProviderError> {
            self.0.list_tags_for_resource(arn).await
        }
    }

    let backing = InMemoryProvider::new();
    let accelerator = backing
        .create_accelerator(CreateAcceleratorRequest {
            idempotency_token: "t0".into(),
            name: "a1".into(),
            ip_address_type: IpAddressType::IPv4,
            enabled: true,
            ip_addresses: Vec::new(),
            tags: BTreeMap::new(),
        })
        .await
        .unwrap();
    let listener = backing
        .create_listener(
            &accelerator.arn,
            CreateListenerRequest {
                idempotency_token: "t1".into(),
                protocol: Protocol::Tcp,
                client_affinity: ClientAffinity::None,
                port_ranges: vec![PortRange::new(80, 80).unwrap()],
            },
        )
        .await
        .unwrap();
    let group = backing
        .create_endpoint_group(
            &listener.arn,
            CreateEndpointGroupRequest {
                idempotency_token: "t2".into(),
                region: "us-west-2".into(),
                traffic_dial_percentage: None,
                port_overrides: Vec::new(),
                endpoints: vec![
                    EndpointConfig { endpoint_id: "e1".into(), weight: None, client_ip_preservation: None },
                    EndpointConfig { endpoint_id: "e2".into(), weight: None, client_ip_preservation: None },
                ],
            },
        )
        .await
        .unwrap();

    let mut stack = Stack::new("default", "a1");
    stack.add_resource(Resource::Accelerator {
        id: "accel-0".into(),
        spec: AcceleratorSpec {
            name: "a1".into(),
            ip_address_type: IpAddressType::IPv4,
            enabled: true,
            ip_addresses: Vec::new(),
            tags: BTreeMap::new(),
        },
        status: AcceleratorStatus { arn: Some(accelerator.arn.clone()), ..Default::default() },
    });
    stack.add_resource(Resource::Listener {
        id: "listener-0".into(),
        spec: ListenerSpec {
            accelerator_arn: StringToken::from_status("accel-0", StatusField::AcceleratorArn),
            protocol: Protocol::Tcp,
            client_affinity: ClientAffinity::None,
            port_ranges: vec![PortRange::new(80, 80).unwrap()],
        },
        status: ListenerStatus { arn: Some(listener.arn.clone()) },
    });
    stack.add_resource(Resource::EndpointGroup {
        id: "eg-0".into(),
        spec: EndpointGroupSpec {
            listener_arn: StringToken::from_status("listener-0", StatusField::ListenerArn),
            region: "us-west-2".into(),
            traffic_dial_percentage: None,
            port_overrides: Vec::new(),
            endpoints: vec![
                EndpointConfig { endpoint_id: "e3".into(), weight: None, client_ip_preservation: None },
                EndpointConfig { endpoint_id: "e4".into(), weight: None, client_ip_preservation: None },
            ],
        },
        status: EndpointGroupStatus { arn: Some(group.arn.clone()) },
    });

    let provider = Arc::new(FlipFlopProvider(backing, std::sync::atomic::AtomicBool::new(false)));
    let ctx = Arc::new(Context::new(Arc::clone(&provider) as _, ReconcilerConfig::new("cluster-1")));
    let deployer = StackDeployer::new(ctx);

    deployer.deploy(&mut stack, &CancellationToken::new()).await.unwrap();

    let observed = provider.0.list_endpoint_groups(&listener.arn).await.unwrap();
    let mut ids: Vec<&str> = observed[0].endpoints.iter().map(|e| e.endpoint_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["e3", "e4"]);
}

/// S6 — Cross-listener port-override conflict: L1's desired eg in us-west-2
/// wants endpoint-port 8080; L2's observed eg in us-west-2 already has it via
/// a different override. L2's eg must be rewritten to drop 8080 before L1's
/// eg is created or updated.
#[tokio::test]
async fn s6_cross_listener_port_override_conflict_yields_to_desired_owner() {
    let backing = InMemoryProvider::new();
    let accelerator = backing
        .create_accelerator(CreateAcceleratorRequest {
            idempotency_token: "t0".into(),
            name: "a1".into(),
            ip_address_type: IpAddressType::IPv4,
            enabled: true,
            ip_addresses: Vec::new(),
            tags: BTreeMap::new(),
        })
        .await
        .unwrap();
    let l1 = backing
        .create_listener(
            &accelerator.arn,
            CreateListenerRequest {
                idempotency_token: "t1".into(),
                protocol: Protocol::Tcp,
                client_affinity: ClientAffinity::None,
                port_ranges: vec![PortRange::new(80, 80).unwrap()],
            },
        )
        .await
        .unwrap();
    let l2 = backing
        .create_listener(
            &accelerator.arn,
            CreateListenerRequest {
                idempotency_token: "t2".into(),
                protocol: Protocol::Tcp,
                client_affinity: ClientAffinity::None,
                port_ranges: vec![PortRange::new(81, 81).unwrap()],
            },
        )
        .await
        .unwrap();
    let l2_group = backing
        .create_endpoint_group(
            &l2.arn,
            CreateEndpointGroupRequest {
                idempotency_token: "t3".into(),
                region: "us-west-2".into(),
                traffic_dial_percentage: None,
                port_overrides: vec![PortOverride { listener_port: 81, endpoint_port: 8080 }],
                endpoints: Vec::new(),
            },
        )
        .await
        .unwrap();

    let mut stack = Stack::new("default", "a1");
    stack.add_resource(Resource::Accelerator {
        id: "accel-0".into(),
        spec: AcceleratorSpec {
            name: "a1".into(),
            ip_address_type: IpAddressType::IPv4,
            enabled: true,
            ip_addresses: Vec::new(),
            tags: BTreeMap::new(),
        },
        status: AcceleratorStatus { arn: Some(accelerator.arn.clone()), ..Default::default() },
    });
    stack.add_resource(Resource::Listener {
        id: "listener-1".into(),
        spec: ListenerSpec {
            accelerator_arn: StringToken::from_status("accel-0", StatusField::AcceleratorArn),
            protocol: Protocol::Tcp,
            client_affinity: ClientAffinity::None,
            port_ranges: vec![PortRange::new(80, 80).unwrap()],
        },
        status: ListenerStatus { arn: Some(l1.arn.clone()) },
    });
    stack.add_resource(Resource::Listener {
        id: "listener-2".into(),
        spec: ListenerSpec {
            accelerator_arn: StringToken::from_status("accel-0", StatusField::AcceleratorArn),
            protocol: Protocol::Tcp,
            client_affinity: ClientAffinity::None,
            port_ranges: vec![PortRange::new(81, 81).unwrap()],
        },
        status: ListenerStatus { arn: Some(l2.arn.clone()) },
    });
    stack.add_resource(Resource::EndpointGroup {
        id: "eg-1".into(),
        spec: EndpointGroupSpec {
            listener_arn: StringToken::from_status("listener-1", StatusField::ListenerArn),
            region: "us-west-2".into(),
            traffic_dial_percentage: None,
            port_overrides: vec![PortOverride { listener_port: 80, endpoint_port: 8080 }],
            endpoints: Vec::new(),
        },
        status: EndpointGroupStatus::default(),
    });
    stack.add_resource(Resource::EndpointGroup {
        id: "eg-2".into(),
        spec: EndpointGroupSpec {
            listener_arn: StringToken::from_status("listener-2", StatusField::ListenerArn),
            region: "us-west-2".into(),
            traffic_dial_percentage: None,
            port_overrides: Vec::new(),
            endpoints: Vec::new(),
        },
        status: EndpointGroupStatus { arn: Some(l2_group.arn.clone()) },
    });

    let provider = Arc::new(backing);
    let ctx = Arc::new(Context::new(Arc::clone(&provider) as _, ReconcilerConfig::new("cluster-1")));
    let deployer = StackDeployer::new(ctx);
    deployer.deploy(&mut stack, &CancellationToken::new()).await.unwrap();

    let l2_observed = provider.list_endpoint_groups(&l2.arn).await.unwrap();
    assert!(l2_observed[0].port_overrides.is_empty());

    let l1_observed = provider.list_endpoint_groups(&l1.arn).await.unwrap();
    assert_eq!(l1_observed[0].port_overrides, vec![PortOverride { listener_port: 80, endpoint_port: 8080 }]);
}
