//! Process-wide tracing setup shared by Warden binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize tracing with `RUST_LOG` filtering (default `info`) in the given
/// output format.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}
