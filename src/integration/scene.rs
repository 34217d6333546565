//! Client interface to the scene-splitting service.
//!
//! The service cuts an uploaded video into scenes before annotation. It is
//! reached through [`SceneSplitter`]; [`split_with_retry`] adds the timeout
//! and retry policy around any implementation.

use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One scene of a video, as reported by the splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub index: usize,
    pub start_frame: usize,
    pub end_frame: usize,
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SceneSplitError {
    #[error("scene splitter timed out after {0:?}")]
    Timeout(Duration),
    #[error("scene splitter unavailable: {0}")]
    Unavailable(String),
    #[error("scene splitter rejected the video: {0}")]
    Rejected(String),
}

impl SceneSplitError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SceneSplitError::Rejected(_))
    }
}

/// Splits a video file into scenes.
pub trait SceneSplitter {
    /// `threshold` is the scene-change sensitivity; a call taking longer
    /// than `timeout` must fail with [`SceneSplitError::Timeout`].
    fn split(
        &self,
        video: &Path,
        threshold: f32,
        timeout: Duration,
    ) -> Result<Vec<Scene>, SceneSplitError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Per-attempt timeout handed to the splitter
    pub timeout: Duration,
    pub threshold: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            timeout: Duration::from_secs(120),
            threshold: 0.5,
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Call `splitter`, retrying transient failures with exponential backoff.
pub fn split_with_retry<S: SceneSplitter + ?Sized>(
    splitter: &S,
    video: &Path,
    policy: &RetryPolicy,
) -> Result<Vec<Scene>, SceneSplitError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match splitter.split(video, policy.threshold, policy.timeout) {
            Ok(scenes) => {
                info!("{}: {} scenes", video.display(), scenes.len());
                return Ok(scenes);
            }
            Err(e) if e.is_transient() && attempt < attempts => {
                let wait = policy.backoff(attempt);
                warn!("scene split attempt {attempt}/{attempts} failed: {e}; retrying in {wait:?}");
                thread::sleep(wait);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
