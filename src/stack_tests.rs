// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use super::*;
use crate::model::{
    AcceleratorSpec, IpAddressType, ListenerSpec, Protocol, ClientAffinity, PortRange,
};

fn accelerator(id: &str, arn: Option<&str>) -> Resource {
    Resource::Accelerator {
        id: id.into(),
        spec: AcceleratorSpec {
            name: "demo".into(),
            ip_address_type: IpAddressType::IPv4,
            enabled: true,
            ip_addresses: Vec::new(),
            tags: BTreeMap::new(),
        },
        status: AcceleratorStatus {
            arn: arn.map(str::to_string),
            ..Default::default()
        },
    }
}

#[test]
fn stack_id_joins_namespace_and_name() {
    let stack = Stack::new("default", "public-web");
    assert_eq!(stack.stack_id(), "default/public-web");
}

#[test]
fn resolves_literal_token_without_touching_stack() {
    let stack = Stack::new("ns", "name");
    let token = StringToken::literal("arn:aws:literal/1");
    assert_eq!(stack.resolve_token(&token).unwrap(), "arn:aws:literal/1");
}

#[test]
fn resolves_from_status_token_once_populated() {
    let mut stack = Stack::new("ns", "name");
    stack.add_resource(accelerator("accel-0", Some("arn:aws:accel/1")));
    let token = StringToken::from_status("accel-0", StatusField::AcceleratorArn);
    assert_eq!(stack.resolve_token(&token).unwrap(), "arn:aws:accel/1");
}

#[test]
fn fails_to_resolve_when_status_field_unset() {
    let mut stack = Stack::new("ns", "name");
    stack.add_resource(accelerator("accel-0", None));
    let token = StringToken::from_status("accel-0", StatusField::AcceleratorArn);
    assert!(stack.resolve_token(&token).is_err());
}

#[test]
fn fails_to_resolve_when_resource_missing() {
    let stack = Stack::new("ns", "name");
    let token = StringToken::from_status("accel-0", StatusField::AcceleratorArn);
    assert!(stack.resolve_token(&token).is_err());
}

#[test]
fn listeners_iterator_only_yields_listener_resources() {
    let mut stack = Stack::new("ns", "name");
    stack.add_resource(accelerator("accel-0", Some("arn:aws:accel/1")));
    stack.add_resource(Resource::Listener {
        id: "listener-0".into(),
        spec: ListenerSpec {
            accelerator_arn: StringToken::from_status("accel-0", StatusField::AcceleratorArn),
            protocol: Protocol::Tcp,
            client_affinity: ClientAffinity::None,
            port_ranges: vec![PortRange::new(80, 80).unwrap()],
        },
        status: ListenerStatus::default(),
    });
    assert_eq!(stack.listeners().count(), 1);
    assert_eq!(stack.accelerator().unwrap().id(), "accel-0");
}

#[test]
fn pending_accelerator_deletions_queue_and_drain() {
    let mut stack = Stack::new("ns", "name");
    stack.queue_accelerator_deletion("arn:aws:accel/old-1");
    stack.queue_accelerator_deletion("arn:aws:accel/old-2");
    let drained = stack.take_pending_accelerator_deletions();
    assert_eq!(drained, vec!["arn:aws:accel/old-1", "arn:aws:accel/old-2"]);
    assert!(stack.take_pending_accelerator_deletions().is_empty());
}

#[test]
fn mark_deleting_flips_flag() {
    let mut stack = Stack::new("ns", "name");
    assert!(!stack.is_deleting());
    stack.mark_deleting();
    assert!(stack.is_deleting());
}
