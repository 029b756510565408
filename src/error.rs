//! Error taxonomy shared by the controller and its stages.
//!
//! Validation errors ([`SegmentationError::InvalidState`],
//! [`SegmentationError::InvalidArgument`]) are returned synchronously before any
//! work starts. [`SegmentationError::Cancelled`] and
//! [`SegmentationError::TimedOut`] abort an in-flight run. Numerical and
//! structural anomalies that a run can recover from are not errors; see
//! [`crate::diagnostics::Anomaly`].

use thiserror::Error;

/// Why a command was rejected by the controller state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidState {
    /// A segmentation run is already in flight.
    AlreadyRunning,
    /// No image has been opened yet.
    NoImage,
}

impl std::fmt::Display for InvalidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "a segmentation run is already in flight"),
            Self::NoImage => write!(f, "no image is loaded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentationError {
    #[error("invalid state: {0}")]
    InvalidState(InvalidState),
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
    #[error("segmentation cancelled")]
    Cancelled,
    #[error("segmentation timed out after {elapsed_ms} ms")]
    TimedOut { elapsed_ms: u64 },
}

impl SegmentationError {
    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SegmentationError> = std::result::Result<T, E>;
