// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Load Clock
//!
//! Issues the [`LoadTimestamp`] that keys each archived batch. Values are
//! strictly increasing within one process: if the wall clock has not moved
//! past the previous value, the previous value plus one microsecond is
//! issued instead. Two processes may still collide.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::archive::LoadTimestamp;

type MicrosSource = Box<dyn Fn() -> i64 + Send + Sync>;

pub struct LoadClock {
    source: MicrosSource,
    last: AtomicI64,
}

impl LoadClock {
    /// Clock backed by the system wall clock
    pub fn system() -> Self {
        Self::with_source(|| Utc::now().timestamp_micros())
    }

    /// Clock backed by an arbitrary microsecond source
    pub fn with_source<F>(source: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        Self {
            source: Box::new(source),
            last: AtomicI64::new(i64::MIN),
        }
    }

    pub fn next(&self) -> LoadTimestamp {
        let now = (self.source)();
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let candidate = if now > last { now } else { last + 1 };
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return LoadTimestamp::from_micros(candidate),
                Err(actual) => last = actual,
            }
        }
    }
}

impl Default for LoadClock {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for LoadClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadClock")
            .field("last", &self.last.load(Ordering::Relaxed))
            .finish()
    }
}
