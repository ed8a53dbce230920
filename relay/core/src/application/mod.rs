// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application Layer
//!
//! The two batch handlers invoked by the notification transport.

pub mod archiver;
pub mod output_router;

pub use archiver::{ArchiveError, ArchiveReport, NotificationArchiver, RecordError};
pub use output_router::{MessageFailure, OutputRouter, RouteOutcome, RouterError, RouterReport};
