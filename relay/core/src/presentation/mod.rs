// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`inference-relay-core`)
//!
//! HTTP surface that translates invocations into handler calls. **No
//! business logic lives here**; all real work is delegated to
//! `crate::application`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Batch invocation endpoints and health |

pub mod api;
