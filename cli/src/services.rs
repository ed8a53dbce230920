// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Service wiring shared by the one-shot commands and the HTTP host.

use anyhow::{Context, Result};
use std::sync::Arc;

use inference_relay_core::application::archiver::NotificationArchiver;
use inference_relay_core::application::output_router::OutputRouter;
use inference_relay_core::domain::config::RelayConfig;
use inference_relay_core::domain::storage::ObjectStore;
use inference_relay_core::infrastructure::clock::LoadClock;
use inference_relay_core::infrastructure::scratch::ScratchSpace;
use inference_relay_core::infrastructure::storage::create_object_store;
use inference_relay_core::presentation::api::AppState;

pub struct RelayServices {
    pub store: Arc<dyn ObjectStore>,
    pub router: OutputRouter,
    pub archiver: NotificationArchiver,
}

impl RelayServices {
    /// Build the object store from configuration and wire both handlers to it.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let store = create_object_store(&config.storage).with_context(|| {
            format!("Failed to initialize {:?} object store", config.storage.backend)
        })?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: &RelayConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            router: OutputRouter::new(store.clone()),
            archiver: NotificationArchiver::new(
                store.clone(),
                config.archive.bucket.clone(),
                ScratchSpace::new(config.scratch_dir()),
                Arc::new(LoadClock::system()),
            ),
            store,
        }
    }

    pub fn into_app_state(self) -> Arc<AppState> {
        Arc::new(AppState {
            router: self.router,
            archiver: self.archiver,
            store: self.store,
        })
    }
}
