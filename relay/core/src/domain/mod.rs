// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Pure types and rules: notification decoding, object locations, routing
//! decisions, archive keys and rows, the object store port, configuration.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** No I/O; every adapter depends inward on these types

pub mod archive;
pub mod config;
pub mod literal;
pub mod location;
pub mod notification;
pub mod routing;
pub mod storage;
