// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod clock;
pub mod scratch;
pub mod storage;

pub use clock::LoadClock;
pub use scratch::{ScratchFile, ScratchSpace};
pub use storage::{create_object_store, InMemoryObjectStore, LocalObjectStore, S3ObjectStore};
