// ABOUTME: Test support utilities.
// ABOUTME: Preloaded fake backends and tracing setup for integration tests.

use cricheck::fixtures;
use cricheck::runtime::FakeBackend;
use std::sync::{Arc, Once};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("cricheck=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A fake backend whose registry serves every suite fixture.
#[allow(dead_code)]
pub fn preloaded_backend() -> Arc<FakeBackend> {
    Arc::new(FakeBackend::with_catalog(fixtures::fake_catalog()))
}
