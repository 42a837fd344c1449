//! User-facing progress output.
//!
//! Progress lines are written to an [`Output`] passed into each component,
//! separate from `tracing` diagnostics. Hosts decide where the lines go.

use std::sync::Arc;

/// Write-only sink for human-readable status lines.
pub trait Output: Send + Sync {
	fn output(&self, message: &str);
}

/// Shared handle to an output sink.
pub type SharedOutput = Arc<dyn Output>;

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutput;

impl Output for NullOutput {
	fn output(&self, _message: &str) {}
}
