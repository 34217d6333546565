//! TrackingPipeline for running a full track request.

use log::info;

use crate::error::TrackingError;
use crate::tracker::{
    Annotation, CancelToken, FrameObserver, FrameSource, TrackerBackend, TrackerConfig,
    TrackingSession, TrajectoryResult, parse_annotations,
};

use super::TrajectoryStore;

/// End-to-end tracking for one video at a time.
///
/// Builds one adapter per annotation from the configured backend, runs a
/// [`TrackingSession`], hands every frame to an observer (usually a
/// [`TrajectoryRecorder`](super::TrajectoryRecorder)) and persists the
/// complete result in a [`TrajectoryStore`].
pub struct TrackingPipeline<T: TrajectoryStore> {
    config: TrackerConfig,
    store: T,
}

impl<T: TrajectoryStore> TrackingPipeline<T> {
    /// Create a new tracking pipeline with the given store and tracker config.
    pub fn new(store: T, config: TrackerConfig) -> Self {
        Self { config, store }
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(store: T) -> Self {
        Self::new(store, TrackerConfig::default())
    }

    /// Track `annotations` over the frames of `source`.
    ///
    /// A complete result replaces any stored result for `video_id`.
    pub fn track<S, O>(
        &mut self,
        video_id: &str,
        source: &mut S,
        annotations: &[Annotation],
        observer: &mut O,
    ) -> Result<TrajectoryResult, TrackingError>
    where
        S: FrameSource + ?Sized,
        O: FrameObserver + ?Sized,
    {
        self.track_cancellable(video_id, source, annotations, observer, CancelToken::new())
    }

    /// Like [`track`](Self::track), stopping early once `cancel` is set.
    ///
    /// A cancelled run returns its partial result without storing it.
    pub fn track_cancellable<S, O>(
        &mut self,
        video_id: &str,
        source: &mut S,
        annotations: &[Annotation],
        observer: &mut O,
        cancel: CancelToken,
    ) -> Result<TrajectoryResult, TrackingError>
    where
        S: FrameSource + ?Sized,
        O: FrameObserver + ?Sized,
    {
        self.run(video_id, source, annotations, self.config.backend, observer, cancel)
    }

    /// Same as [`track`](Self::track) with the annotations given as a JSON payload.
    pub fn track_json<S, O>(
        &mut self,
        video_id: &str,
        source: &mut S,
        annotations_json: &str,
        observer: &mut O,
    ) -> Result<TrajectoryResult, TrackingError>
    where
        S: FrameSource + ?Sized,
        O: FrameObserver + ?Sized,
    {
        let annotations = parse_annotations(annotations_json)?;
        self.track(video_id, source, &annotations, observer)
    }

    /// Handle a track request naming its own tracker, e.g. `"CSRT"`.
    ///
    /// An unknown `tracker_type` or a malformed payload fails with
    /// `InvalidInput` before any frame is read.
    pub fn track_request<S, O>(
        &mut self,
        video_id: &str,
        source: &mut S,
        annotations_json: &str,
        tracker_type: &str,
        observer: &mut O,
    ) -> Result<TrajectoryResult, TrackingError>
    where
        S: FrameSource + ?Sized,
        O: FrameObserver + ?Sized,
    {
        let backend: TrackerBackend = tracker_type.parse()?;
        let annotations = parse_annotations(annotations_json)?;
        self.run(video_id, source, &annotations, backend, observer, CancelToken::new())
    }

    fn run<S, O>(
        &mut self,
        video_id: &str,
        source: &mut S,
        annotations: &[Annotation],
        backend: TrackerBackend,
        observer: &mut O,
        cancel: CancelToken,
    ) -> Result<TrajectoryResult, TrackingError>
    where
        S: FrameSource + ?Sized,
        O: FrameObserver + ?Sized,
    {
        let config = TrackerConfig {
            backend,
            ..self.config.clone()
        };
        let session = TrackingSession::new(video_id, config)?.with_cancel_token(cancel);
        let correlation = &self.config.correlation;

        let result = session.run(source, annotations, |_| backend.create(correlation), observer)?;

        if result.complete {
            self.store.save(&result)?;
            info!("video {video_id}: trajectory stored ({} frames)", result.frames_processed);
        } else {
            info!("video {video_id}: partial trajectory not stored");
        }
        Ok(result)
    }

    /// Stored trajectory for `video_id`.
    pub fn trajectory(&self, video_id: &str) -> Result<TrajectoryResult, TrackingError> {
        self.store
            .load(video_id)?
            .ok_or_else(|| TrackingError::NotFound(format!("no trajectory for video {video_id}")))
    }

    /// Get a reference to the tracker configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &T {
        &self.store
    }

    /// Get a mutable reference to the underlying store.
    pub fn store_mut(&mut self) -> &mut T {
        &mut self.store
    }
}
