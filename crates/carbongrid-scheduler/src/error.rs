//! Engine error types.

use thiserror::Error;

use crate::platform::PlatformError;

/// Errors surfaced by the placement engine. Per-unit problems (no
/// admissible host, bind conflicts) are outcomes, not errors; only
/// platform-level failures propagate.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}
