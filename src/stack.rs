// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The in-memory resource graph a single reconcile operates on.
//!
//! A [`Stack`] is the owned collection of every [`Resource`] belonging to one
//! AGA-backed custom resource (`namespace/name`), plus the bookkeeping the
//! synthesizers need across a single deploy: token resolution, a whole-stack
//! deletion flag, and a queue of accelerator ARNs awaiting disable-then-delete
//! after a BYOIP replacement.

use crate::errors::ReconcileError;
use crate::model::{AcceleratorStatus, Resource};
use crate::token::{StatusField, StringToken};

/// The full set of resources backing one custom resource, plus reconcile-scoped state.
#[derive(Debug, Clone)]
pub struct Stack {
    namespace: String,
    name: String,
    resources: Vec<Resource>,
    /// Set when the owning custom resource is being deleted; synthesizers
    /// treat every desired resource as absent and only perform teardown.
    deleting: bool,
    pending_accelerator_deletions: Vec<String>,
}

impl Stack {
    /// Creates an empty stack for the given namespace/name pair.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            resources: Vec::new(),
            deleting: false,
            pending_accelerator_deletions: Vec::new(),
        }
    }

    /// The stable `namespace/name` identifier used as the tracking-tag value.
    #[must_use]
    pub fn stack_id(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Adds a resource to the stack. Ids must be unique within the stack;
    /// callers are expected to enforce this when building a stack from a spec.
    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// All resources currently in the stack.
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Looks up a resource by id.
    #[must_use]
    pub fn resource_by_id(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id() == id)
    }

    /// Looks up a resource by id, mutably.
    pub fn resource_by_id_mut(&mut self, id: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.id() == id)
    }

    /// The stack's single accelerator, if present.
    #[must_use]
    pub fn accelerator(&self) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| matches!(r, Resource::Accelerator { .. }))
    }

    /// The stack's single accelerator, mutably.
    pub fn accelerator_mut(&mut self) -> Option<&mut Resource> {
        self.resources
            .iter_mut()
            .find(|r| matches!(r, Resource::Accelerator { .. }))
    }

    /// Every listener in the stack.
    pub fn listeners(&self) -> impl Iterator<Item = &Resource> {
        self.resources
            .iter()
            .filter(|r| matches!(r, Resource::Listener { .. }))
    }

    /// Every listener in the stack, mutably.
    pub fn listeners_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        self.resources
            .iter_mut()
            .filter(|r| matches!(r, Resource::Listener { .. }))
    }

    /// Every endpoint group in the stack.
    pub fn endpoint_groups(&self) -> impl Iterator<Item = &Resource> {
        self.resources
            .iter()
            .filter(|r| matches!(r, Resource::EndpointGroup { .. }))
    }

    /// Every endpoint group in the stack, mutably.
    pub fn endpoint_groups_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        self.resources
            .iter_mut()
            .filter(|r| matches!(r, Resource::EndpointGroup { .. }))
    }

    /// Whether the owning custom resource is being deleted.
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    /// Marks the stack for whole-resource teardown.
    pub fn mark_deleting(&mut self) {
        self.deleting = true;
    }

    /// Queues an accelerator ARN for disable-then-delete, used by the BYOIP
    /// replacement extension point when an old accelerator is superseded.
    pub fn queue_accelerator_deletion(&mut self, arn: impl Into<String>) {
        self.pending_accelerator_deletions.push(arn.into());
    }

    /// Drains and returns the queued accelerator deletions.
    pub fn take_pending_accelerator_deletions(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_accelerator_deletions)
    }

    /// Resolves a [`StringToken`] against this stack's current resource statuses.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::TokenResolution`] if the referenced resource
    /// does not exist, is the wrong kind for the requested field, or its
    /// status field has not been populated yet.
    pub fn resolve_token(&self, token: &StringToken) -> Result<String, ReconcileError> {
        match token {
            StringToken::Literal(value) => Ok(value.clone()),
            StringToken::FromStatus { resource_id, field } => {
                let resource = self.resource_by_id(resource_id).ok_or_else(|| {
                    ReconcileError::TokenResolution(format!(
                        "resource '{resource_id}' not found in stack"
                    ))
                })?;
                resolve_status_field(resource, *field).ok_or_else(|| {
                    ReconcileError::TokenResolution(format!(
                        "status field {field:?} not yet populated on '{resource_id}'"
                    ))
                })
            }
        }
    }
}

fn resolve_status_field(resource: &Resource, field: StatusField) -> Option<String> {
    match (resource, field) {
        (Resource::Accelerator { status, .. }, StatusField::AcceleratorArn) => status.arn.clone(),
        (Resource::Accelerator { status, .. }, StatusField::AcceleratorDnsName) => {
            status.dns_name.clone()
        }
        (Resource::Listener { status, .. }, StatusField::ListenerArn) => status.arn.clone(),
        (Resource::EndpointGroup { status, .. }, StatusField::EndpointGroupArn) => {
            status.arn.clone()
        }
        _ => None,
    }
}

/// Convenience accessor used by synthesizers that only care whether an
/// accelerator has finished provisioning and is enabled.
#[must_use]
pub fn accelerator_status(resource: &Resource) -> Option<&AcceleratorStatus> {
    match resource {
        Resource::Accelerator { status, .. } => Some(status),
        _ => None,
    }
}

#[cfg(test)]
#[path = "stack_tests.rs"]
mod stack_tests;
