//! Process-wide tracing setup shared by binaries and integration tests.

/// Tracing configuration (filters, formatter).
pub mod tracing;

/// Initialize process-wide structured logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}
