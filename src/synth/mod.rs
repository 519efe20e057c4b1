// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! One synthesizer per resource layer: accelerator, listener, endpoint group.
//!
//! Each synthesizer's `synthesize` converges its layer's desired resources
//! against observed provider state; `post_synthesize` runs afterward, in
//! reverse layer order, to perform deletions that must wait for every layer
//! above them to finish first (notably accelerator teardown, which must wait
//! for its listeners to be gone).

pub mod accelerator;
pub mod endpoint_group;
pub mod listener;

pub use accelerator::AcceleratorSynthesizer;
pub use endpoint_group::EndpointGroupSynthesizer;
pub use listener::ListenerSynthesizer;
