// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # aga-reconciler - AWS Global Accelerator reconciliation core
//!
//! `aga-reconciler` is the reconciliation core for a Kubernetes-style
//! controller that manages AWS Global Accelerator (AGA) resources:
//! accelerators, listeners, and endpoint groups. It is a library, not a
//! controller — the custom-resource API surface, admission/validation, the
//! scheduler that triggers reconciliation, and the concrete AWS SDK client
//! are all out of scope and left to the embedding binary.
//!
//! ## Overview
//!
//! - [`model`] — desired-state spec/status types for every AGA resource layer
//! - [`stack`] — the in-memory resource graph one reconcile operates on
//! - [`token`] — lazy cross-resource references between specs
//! - [`provider`] — the async trait describing the AGA + tagging API surface
//! - [`matching`] — identity-ambiguous listener matching (exact, then similarity)
//! - [`tagging`] — tag-cache-backed tag reconciliation
//! - [`synth`] — one synthesizer per resource layer
//! - [`deployer`] — orchestrates a full forward/reverse reconcile pass
//! - [`context`] — shared state threaded through a reconciler instance
//! - [`config`] — reconciler tunables
//! - [`errors`] — the provider and reconcile error taxonomies
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use aga_reconciler::config::ReconcilerConfig;
//! use aga_reconciler::context::Context;
//! use aga_reconciler::deployer::StackDeployer;
//! use aga_reconciler::provider::mock::InMemoryProvider;
//! use aga_reconciler::stack::Stack;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(InMemoryProvider::new());
//! let ctx = Arc::new(Context::new(provider, ReconcilerConfig::new("my-cluster")));
//! let deployer = StackDeployer::new(ctx);
//!
//! let mut stack = Stack::new("default", "my-accelerator");
//! deployer
//!     .deploy(&mut stack, &tokio_util::sync::CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod deployer;
pub mod errors;
pub mod matching;
pub mod model;
pub mod provider;
pub mod stack;
pub mod synth;
pub mod tagging;
pub mod token;
