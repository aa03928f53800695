//! Error types for room impulse response synthesis.

use thiserror::Error;

/// Error type for roomrir operations.
///
/// Engine validation failures are reported before any computation starts.
/// Degenerate images (zero distance, non-finite gain) are never surfaced
/// here, they are skipped inside the synthesis loop.
#[derive(Debug, Error)]
pub enum RirError {
    /// A numeric input is out of its valid range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter (e.g. "sample_rate").
        name: &'static str,
        /// What is wrong with the value.
        reason: String,
    },

    /// A microphone or speaker lies outside the room box.
    #[error("{entity} '{name}' at {position} is outside the room")]
    PositionOutsideRoom {
        /// "microphone" or "speaker".
        entity: &'static str,
        /// Entity name.
        name: String,
        /// Offending position, formatted.
        position: String,
    },

    /// A scene needs at least one microphone and one speaker.
    #[error("scene needs at least one microphone and one speaker")]
    EmptyScene,

    /// An index does not refer to an existing entity.
    #[error("{entity} index {index} out of range (have {len})")]
    IndexOutOfRange {
        entity: &'static str,
        index: usize,
        len: usize,
    },

    /// WAV encoding or decoding failed.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Scene file (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RirError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result alias for roomrir operations.
pub type Result<T> = std::result::Result<T, RirError>;

/// Checks that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(RirError::invalid(name, format!("must be finite, got {value}")));
    }
    if value <= 0.0 {
        return Err(RirError::invalid(name, format!("must be > 0, got {value}")));
    }
    Ok(())
}
