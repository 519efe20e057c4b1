// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the AGA reconciliation core.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Resource Kind Constants
// ============================================================================

/// Kind tag for the accelerator resource
pub const KIND_ACCELERATOR: &str = "Accelerator";

/// Kind tag for the listener resource
pub const KIND_LISTENER: &str = "Listener";

/// Kind tag for the endpoint group resource
pub const KIND_ENDPOINT_GROUP: &str = "EndpointGroup";

// ============================================================================
// Port Range Constants
// ============================================================================

/// Minimum valid port number for a listener port range
pub const MIN_PORT: u16 = 1;

/// Maximum valid port number for a listener port range
pub const MAX_PORT: u16 = 65535;

// ============================================================================
// Listener Similarity Matching Constants
//
// These thresholds are load-bearing: changing them changes which desired/observed
// pairs match, which changes idempotence behavior across reconciles. They are
// intentionally not part of `ReconcilerConfig`.
// ============================================================================

/// Score awarded when both listeners in a candidate pair share the same protocol
pub const SIMILARITY_PROTOCOL_MATCH_SCORE: u32 = 40;

/// Maximum score contribution from the Jaccard similarity of the two port sets
pub const SIMILARITY_PORT_JACCARD_MAX_SCORE: u32 = 100;

/// Score awarded when both listeners have a non-empty, agreeing client affinity
pub const SIMILARITY_CLIENT_AFFINITY_MATCH_SCORE: u32 = 10;

/// Minimum score for a candidate pair to be considered a similarity match.
///
/// Pairs scoring strictly below this threshold are discarded before the
/// greedy descending-score matching pass runs.
pub const SIMILARITY_MATCH_THRESHOLD: u32 = 15;

// ============================================================================
// Tagging Constants
// ============================================================================

/// Tag key identifying the cluster that owns a tracked resource
pub const TAG_CLUSTER_KEY: &str = "aga.k8s.aws/cluster";

/// Tag key identifying the stack (`namespace/name`) that owns a tracked resource
pub const TAG_STACK_KEY: &str = "aga.k8s.aws/stack";

/// Tag key identifying the stable resource id within the stack
pub const TAG_RESOURCE_ID_KEY: &str = "aga.k8s.aws/resource-id";

/// Time-to-live for a cached tag read, after which it is treated as stale
pub const TAG_CACHE_TTL_SECS: u64 = 20 * 60;

// ============================================================================
// Endpoint Group Constants
// ============================================================================

/// Default traffic-dial-percentage a newly observed endpoint group carries
/// when the provider assigns one without an explicit value.
pub const DEFAULT_TRAFFIC_DIAL_PERCENTAGE: f64 = 100.0;

/// Float tolerance used when comparing desired vs. observed traffic-dial-percentage.
pub const TRAFFIC_DIAL_EPSILON: f64 = 0.001;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for the Tokio runtime used by the reconciliation core's
/// own test harness and examples
pub const TOKIO_WORKER_THREADS: usize = 4;
