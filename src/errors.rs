// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error taxonomy for the AGA reconciliation core.
//!
//! This module mirrors the provider's own exception families so that callers can
//! pattern-match on the same shape the AWS Global Accelerator API exposes, plus a
//! composite [`ReconcileError`] that synthesizers and the stack deployer actually
//! propagate.

use thiserror::Error;

/// Errors surfaced directly by the provider SDK client.
///
/// These map 1:1 onto the AGA exception taxonomy referenced in the external
/// interface: `AcceleratorNotFoundException`, `ListenerNotFoundException`,
/// `EndpointGroupNotFoundException`, `LimitExceededException`, plus a catch-all
/// for anything else the transport returns.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The accelerator ARN referenced does not exist in the provider.
    #[error("accelerator '{arn}' not found")]
    AcceleratorNotFound {
        /// The ARN that was looked up.
        arn: String,
    },

    /// The listener ARN referenced does not exist in the provider.
    #[error("listener '{arn}' not found")]
    ListenerNotFound {
        /// The ARN that was looked up.
        arn: String,
    },

    /// The endpoint group ARN referenced does not exist in the provider.
    #[error("endpoint group '{arn}' not found")]
    EndpointGroupNotFound {
        /// The ARN that was looked up.
        arn: String,
    },

    /// A resource was not found in the resource-groups tagging API, as opposed to
    /// the resource simply carrying no tags.
    #[error("resource '{arn}' not found in the tagging index")]
    TaggingResourceNotFound {
        /// The ARN that was looked up.
        arn: String,
    },

    /// The provider rejected an operation because a quota would be exceeded.
    #[error("limit exceeded during {operation} for '{arn}': {reason}")]
    LimitExceeded {
        /// The operation being attempted (e.g. `"create_listener"`).
        operation: String,
        /// The ARN the operation was scoped to.
        arn: String,
        /// The provider's explanation of the limit.
        reason: String,
    },

    /// Any other SDK-level failure (transport error, throttling, unrecognized
    /// response, ...), wrapped with the operation that was being attempted.
    #[error("{operation} failed for '{arn}': {reason}")]
    Other {
        /// The operation being attempted.
        operation: String,
        /// The ARN the operation was scoped to, or the literal string `"<new>"`
        /// if the operation was a create.
        arn: String,
        /// The provider's explanation of the failure.
        reason: String,
    },
}

impl ProviderError {
    /// Returns `true` if this is one of the three `*NotFound` variants.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AcceleratorNotFound { .. }
                | Self::ListenerNotFound { .. }
                | Self::EndpointGroupNotFound { .. }
        )
    }

    /// Returns `true` if this is [`ProviderError::LimitExceeded`].
    #[must_use]
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. })
    }
}

/// Composite error type returned by the stack deployer and its synthesizers.
///
/// This is the primary error type propagated out of [`crate::deployer::StackDeployer::deploy`].
/// It distinguishes provider-level failures from reconciliation-core failures
/// (dependency resolution, cancellation) so a caller can decide how to back off.
#[derive(Error, Debug, Clone)]
pub enum ReconcileError {
    /// The provider rejected or failed an operation.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A [`crate::token::StringToken`] referenced a resource or field that was
    /// never written, or a dependency cycle was detected while resolving
    /// resolution order.
    #[error("failed to resolve token: {0}")]
    TokenResolution(String),

    /// The stack contained a resource that violates a data-model invariant
    /// (e.g. a port range with `from_port > to_port`).
    #[error("invalid resource spec: {0}")]
    InvalidSpec(String),

    /// The surrounding scheduler cancelled the reconciliation.
    #[error("reconciliation cancelled")]
    Cancelled,
}

impl ReconcileError {
    /// Returns `true` if retrying the reconcile without operator intervention is
    /// expected to make progress.
    ///
    /// Not-found-on-delete and not-found-on-describe are handled internally by
    /// the synthesizers and never reach this type as errors, so every variant
    /// that does surface here is non-transient from the core's point of view:
    /// either the spec itself is invalid, the provider is refusing on a quota a
    /// human must raise, or the caller asked us to stop.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Provider(ProviderError::Other { .. }) => true,
            Self::Provider(_) | Self::TokenResolution(_) | Self::InvalidSpec(_) | Self::Cancelled => {
                false
            }
        }
    }

    /// Returns a short, stable reason code for status reporting.
    ///
    /// The out-of-scope status writer is expected to turn this into a
    /// Kubernetes condition reason; this core only guarantees the string is
    /// stable across versions.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Provider(ProviderError::AcceleratorNotFound { .. }) => "AcceleratorNotFound",
            Self::Provider(ProviderError::ListenerNotFound { .. }) => "ListenerNotFound",
            Self::Provider(ProviderError::EndpointGroupNotFound { .. }) => "EndpointGroupNotFound",
            Self::Provider(ProviderError::TaggingResourceNotFound { .. }) => {
                "TaggingResourceNotFound"
            }
            Self::Provider(ProviderError::LimitExceeded { .. }) => "LimitExceeded",
            Self::Provider(ProviderError::Other { .. }) => "ProviderError",
            Self::TokenResolution(_) => "TokenResolutionFailed",
            Self::InvalidSpec(_) => "InvalidSpec",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
