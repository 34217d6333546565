//! Error types for tracking sessions and their collaborators.

use std::path::PathBuf;

use thiserror::Error;

use crate::tracker::TrajectoryResult;

/// Failure reported by a single-object tracker adapter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdapterError {
    #[error("tracker updated before initialize")]
    NotInitialized,
    #[error("could not seed tracker: {0}")]
    InitFailure(String),
}

/// Failure reported by a frame source.
#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("frame unavailable: {0}")]
    Missing(String),
}

/// Session-level error.
///
/// Track-local failures never show up here; they are recorded as a
/// `Lost` status in the trajectory instead.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("frame source failed at frame {frame_index}: {reason}")]
    FrameSource {
        frame_index: usize,
        reason: String,
        /// Everything tracked up to the last successfully processed frame.
        partial: Box<TrajectoryResult>,
    },
    #[error("overlay output failed: {0}")]
    Output(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl TrackingError {
    /// HTTP status class an API layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Partial trajectory carried by a frame-source failure, if any.
    pub fn partial_result(&self) -> Option<&TrajectoryResult> {
        match self {
            Self::FrameSource { partial, .. } => Some(&**partial),
            _ => None,
        }
    }
}
