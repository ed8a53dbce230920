// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the inference relay CLI

pub mod config;
pub mod invoke;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::invoke::InvokeArgs;
pub use self::serve::ServeArgs;
