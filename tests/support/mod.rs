pub mod fixtures;
pub mod mock_immich;

pub use mock_immich::MockImmichApi;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
