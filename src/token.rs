// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lazy cross-resource references.
//!
//! A [`StringToken`] lets a spec reference a field on another resource's
//! observed status (for instance a listener pointing at its accelerator's
//! ARN) without holding a handle to that resource directly. The token is
//! resolved against a [`crate::stack::Stack`] once the referenced resource has
//! been synthesized.

use serde::{Deserialize, Serialize};

use crate::errors::ReconcileError;

/// A named field on a resource's observed status, usable as a token target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusField {
    /// [`crate::model::AcceleratorStatus::arn`].
    AcceleratorArn,
    /// [`crate::model::AcceleratorStatus::dns_name`].
    AcceleratorDnsName,
    /// [`crate::model::ListenerStatus::arn`].
    ListenerArn,
    /// [`crate::model::EndpointGroupStatus::arn`].
    EndpointGroupArn,
}

/// A value known up front, or deferred until another resource's status field
/// is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StringToken {
    /// A value already known when the spec was built.
    Literal(String),
    /// A value sourced from another resource's observed status once it is
    /// synthesized.
    FromStatus {
        /// The id of the resource the field lives on.
        resource_id: String,
        /// Which status field to read.
        field: StatusField,
    },
}

impl StringToken {
    /// Builds a token that already carries its value.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Builds a token deferred to another resource's status.
    pub fn from_status(resource_id: impl Into<String>, field: StatusField) -> Self {
        Self::FromStatus {
            resource_id: resource_id.into(),
            field,
        }
    }

    /// The resource id this token depends on, if any.
    ///
    /// Used by [`crate::stack::Stack`] to build the dependency graph that
    /// determines resolution order.
    #[must_use]
    pub fn dependency(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::FromStatus { resource_id, .. } => Some(resource_id),
        }
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod token_tests;
