// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Identity-ambiguous matching between desired and observed listeners.
//!
//! AGA listeners have no caller-assigned identity: the only way to associate
//! a desired [`ListenerSpec`] with an [`ObservedListener`] already sitting on
//! the accelerator is to compare their shape. This module implements the
//! two-phase match: an exact canonical-key pass, then a greedy
//! similarity-scored pass over whatever remains.

use std::collections::{HashMap, HashSet};

use crate::constants::{
    SIMILARITY_CLIENT_AFFINITY_MATCH_SCORE, SIMILARITY_MATCH_THRESHOLD,
    SIMILARITY_PORT_JACCARD_MAX_SCORE, SIMILARITY_PROTOCOL_MATCH_SCORE,
};
use crate::model::{ClientAffinity, ListenerSpec, PortRange, Protocol};
use crate::provider::ObservedListener;

/// A canonical key identifying a listener's protocol and port-range set,
/// invariant under port-range reordering.
#[must_use]
pub fn listener_key(protocol: Protocol, port_ranges: &[PortRange]) -> String {
    let mut sorted: Vec<&PortRange> = port_ranges.iter().collect();
    sorted.sort_by_key(|r| (r.from_port, r.to_port));
    let ranges = sorted
        .iter()
        .map(|r| format!("{}-{}", r.from_port, r.to_port))
        .collect::<Vec<_>>()
        .join(",");
    format!("{protocol:?}:{ranges}")
}

fn expand_ports(ranges: &[PortRange]) -> HashSet<u16> {
    let mut ports = HashSet::new();
    for range in ranges {
        for port in range.from_port..=range.to_port {
            ports.insert(port);
        }
    }
    ports
}

/// Jaccard similarity of two port-range sets, scaled onto
/// `[0, SIMILARITY_PORT_JACCARD_MAX_SCORE]`.
///
/// Two empty sets are treated as a perfect match rather than undefined, since
/// a listener spec is never actually built with zero port ranges (validated
/// upstream) but the degenerate case should still behave sanely in isolation.
#[must_use]
pub fn port_jaccard_score(a: &[PortRange], b: &[PortRange]) -> u32 {
    let set_a = expand_ports(a);
    let set_b = expand_ports(b);
    if set_a.is_empty() && set_b.is_empty() {
        return SIMILARITY_PORT_JACCARD_MAX_SCORE;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0
    } else {
        (SIMILARITY_PORT_JACCARD_MAX_SCORE as usize * intersection / union) as u32
    }
}

/// Weighted similarity score between a desired spec and an observed listener.
#[must_use]
pub fn similarity_score(desired: &ListenerSpec, observed: &ObservedListener) -> u32 {
    let mut score = 0;
    if desired.protocol == observed.protocol {
        score += SIMILARITY_PROTOCOL_MATCH_SCORE;
    }
    score += port_jaccard_score(&desired.port_ranges, &observed.port_ranges);
    let both_have_affinity = desired.client_affinity.is_set() && observed.client_affinity.is_set();
    if both_have_affinity && desired.client_affinity == observed.client_affinity {
        score += SIMILARITY_CLIENT_AFFINITY_MATCH_SCORE;
    }
    score
}

/// The result of matching a set of desired listener specs against observed
/// listeners, expressed as indices into the two input slices.
#[derive(Debug, Clone, Default)]
pub struct ListenerMatch {
    /// `(desired_index, observed_index)` pairs that were matched, in the
    /// order they were decided (exact matches first).
    pub pairs: Vec<(usize, usize)>,
    /// Indices into `desired` that found no match.
    pub unmatched_desired: Vec<usize>,
    /// Indices into `observed` that found no match.
    pub unmatched_observed: Vec<usize>,
}

/// Matches desired listener specs against observed listeners.
///
/// Phase one pairs entries whose canonical [`listener_key`] is identical.
/// Phase two scores every remaining desired/observed pair by
/// [`similarity_score`], discards anything below
/// `SIMILARITY_MATCH_THRESHOLD`, and greedily accepts matches in descending
/// score order.
#[must_use]
pub fn match_listeners(desired: &[ListenerSpec], observed: &[ObservedListener]) -> ListenerMatch {
    let mut matched_desired = vec![false; desired.len()];
    let mut matched_observed = vec![false; observed.len()];
    let mut pairs = Vec::new();

    let mut observed_by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, listener) in observed.iter().enumerate() {
        observed_by_key
            .entry(listener_key(listener.protocol, &listener.port_ranges))
            .or_default()
            .push(index);
    }

    for (d_index, spec) in desired.iter().enumerate() {
        let key = listener_key(spec.protocol, &spec.port_ranges);
        if let Some(bucket) = observed_by_key.get_mut(&key) {
            if let Some(o_index) = bucket.pop() {
                matched_desired[d_index] = true;
                matched_observed[o_index] = true;
                pairs.push((d_index, o_index));
            }
        }
    }

    let mut candidates = Vec::new();
    for (d_index, spec) in desired.iter().enumerate() {
        if matched_desired[d_index] {
            continue;
        }
        for (o_index, listener) in observed.iter().enumerate() {
            if matched_observed[o_index] {
                continue;
            }
            let score = similarity_score(spec, listener);
            if score >= SIMILARITY_MATCH_THRESHOLD {
                candidates.push((score, d_index, o_index));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, d_index, o_index) in candidates {
        if !matched_desired[d_index] && !matched_observed[o_index] {
            matched_desired[d_index] = true;
            matched_observed[o_index] = true;
            pairs.push((d_index, o_index));
        }
    }

    let unmatched_desired = (0..desired.len()).filter(|i| !matched_desired[*i]).collect();
    let unmatched_observed = (0..observed.len()).filter(|i| !matched_observed[*i]).collect();

    ListenerMatch {
        pairs,
        unmatched_desired,
        unmatched_observed,
    }
}

/// Whether an unmatched observed listener conflicts with any matched desired
/// spec: same protocol and at least one overlapping port.
///
/// Conflicting listeners must be deleted before the matched pairs are
/// updated, since the provider enforces port uniqueness per protocol per
/// accelerator.
#[must_use]
pub fn conflicts_with_any(candidate: &ObservedListener, desired_specs: &[&ListenerSpec]) -> bool {
    desired_specs.iter().any(|spec| {
        spec.protocol == candidate.protocol
            && spec
                .port_ranges
                .iter()
                .any(|d| candidate.port_ranges.iter().any(|o| d.overlaps(o)))
    })
}

#[cfg(test)]
#[path = "matching_tests.rs"]
mod matching_tests;
