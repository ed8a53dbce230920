// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Inference Relay Core
//!
//! Completion pipeline for asynchronous inference: routes finished outputs
//! and error payloads into the owning user's area, and archives each
//! notification batch to a bronze/silver audit trail.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain rules, handlers, storage adapters and the HTTP surface

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod metrics;
pub mod presentation;

pub use domain::*;
