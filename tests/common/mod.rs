//! Common test utilities, fixtures, and mocks
//! Each integration test binary uses a different subset of these helpers.
#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use std::sync::{Arc, Once};

use rusty_jukebox::commands::music::utils::music_manager::MusicManager;
use tracing::Level;

static INIT: Once = Once::new();

/// Initialize tracing for tests
pub fn init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// A manager driving the given backend
pub fn manager(backend: mocks::MockBackend) -> Arc<MusicManager> {
    init();
    Arc::new(MusicManager::new(Arc::new(backend)))
}
