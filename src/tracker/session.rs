//! Tracking session: drives every track over one frame sequence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info};
use rayon::prelude::*;

use crate::error::TrackingError;
use crate::tracker::adapter::TrackerAdapter;
use crate::tracker::annotation::{Annotation, fit_to_frame, validate_annotations};
use crate::tracker::config::TrackerConfig;
use crate::tracker::frame::{Frame, FrameSource};
use crate::tracker::track::{Track, TrackEntry};
use crate::tracker::trajectory::{TrackTrajectory, TrajectoryResult};

/// Shared flag requesting a running session to stop at the next frame boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Entry of one track for the frame being reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEntry<'a> {
    pub track_id: &'a str,
    pub entry: TrackEntry,
}

/// Receives every processed frame together with all track entries for it,
/// in annotation order.
pub trait FrameObserver {
    fn on_frame(&mut self, frame: &Frame, entries: &[FrameEntry<'_>]) -> Result<(), TrackingError>;
}

impl FrameObserver for () {
    fn on_frame(&mut self, _frame: &Frame, _entries: &[FrameEntry<'_>]) -> Result<(), TrackingError> {
        Ok(())
    }
}

/// One tracking run over a video's frames.
///
/// Frames are processed strictly in order; within a frame, active tracks
/// are updated on a bounded worker pool when `workers > 1`. Each track
/// writes only its own history, so the output does not depend on
/// scheduling.
#[derive(Debug)]
pub struct TrackingSession {
    video_id: String,
    config: TrackerConfig,
    cancel: CancelToken,
    pool: Option<rayon::ThreadPool>,
}

impl TrackingSession {
    pub fn new(video_id: impl Into<String>, config: TrackerConfig) -> Result<Self, TrackingError> {
        config.validate()?;
        let pool = if config.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .thread_name(|i| format!("track-worker-{i}"))
                .build()
                .map_err(|e| TrackingError::Config(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            video_id: video_id.into(),
            config,
            cancel: CancelToken::new(),
            pool,
        })
    }

    /// Use an externally owned cancellation flag.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Track every annotation over the frames of `source`.
    ///
    /// `make_adapter` builds one fresh adapter per annotation. Returns the
    /// complete result, or a partial one (`complete == false`) when
    /// cancelled. Input problems fail with `InvalidInput` before any
    /// tracker is initialized; a frame source failure returns the partial
    /// result inside the error.
    pub fn run<A, S, F, O>(
        self,
        source: &mut S,
        annotations: &[Annotation],
        mut make_adapter: F,
        observer: &mut O,
    ) -> Result<TrajectoryResult, TrackingError>
    where
        A: TrackerAdapter,
        S: FrameSource + ?Sized,
        F: FnMut(&Annotation) -> A,
        O: FrameObserver + ?Sized,
    {
        validate_annotations(annotations)?;

        let first = match source.next_image() {
            None => {
                return Err(TrackingError::InvalidInput("frame sequence is empty".into()));
            }
            Some(Err(e)) => {
                error!("video {}: first frame unavailable: {e}", self.video_id);
                return Err(TrackingError::FrameSource {
                    frame_index: 0,
                    reason: e.to_string(),
                    partial: Box::new(TrajectoryResult::new(self.video_id.clone())),
                });
            }
            Some(Ok(image)) => Frame::new(0, image),
        };

        let fitted = fit_to_frame(annotations, first.width(), first.height(), self.config.bounds)?;

        info!(
            "video {}: tracking {} objects with {} backend on {}x{} frames",
            self.video_id,
            fitted.len(),
            self.config.backend,
            first.width(),
            first.height()
        );

        let mut tracks: Vec<Track<A>> = fitted
            .iter()
            .map(|a| Track::start(a.id.clone(), make_adapter(a), &first, a.bbox))
            .collect();
        notify(observer, &first, &tracks)?;

        let mut processed = 1;
        let complete = loop {
            if self.cancel.is_cancelled() {
                info!("video {}: cancelled after {processed} frames", self.video_id);
                break false;
            }

            let image = match source.next_image() {
                None => break true,
                Some(Ok(image)) => image,
                Some(Err(e)) => {
                    error!("video {}: frame {processed} unavailable: {e}", self.video_id);
                    let partial = self.finish(tracks, processed, false);
                    return Err(TrackingError::FrameSource {
                        frame_index: processed,
                        reason: e.to_string(),
                        partial: Box::new(partial),
                    });
                }
            };

            let frame = Frame::new(processed, image);
            self.step(&mut tracks, &frame);
            processed += 1;
            notify(observer, &frame, &tracks)?;
        };

        let result = self.finish(tracks, processed, complete);
        debug!(
            "video {}: {} frames, {} tracks still active",
            result.video_id,
            processed,
            result
                .tracks()
                .iter()
                .filter(|t| t.entries.last().is_some_and(|e| e.status.is_active()))
                .count()
        );
        Ok(result)
    }

    fn step<A: TrackerAdapter>(&self, tracks: &mut [Track<A>], frame: &Frame) {
        let min_confidence = self.config.min_confidence;
        match &self.pool {
            Some(pool) => pool.install(|| {
                tracks.par_iter_mut().for_each(|track| {
                    track.advance(frame, min_confidence);
                })
            }),
            None => {
                for track in tracks.iter_mut() {
                    track.advance(frame, min_confidence);
                }
            }
        }
    }

    fn finish<A>(&self, tracks: Vec<Track<A>>, processed: usize, complete: bool) -> TrajectoryResult {
        let trajectories = tracks
            .into_iter()
            .map(|track| {
                let (id, entries) = track.into_history();
                TrackTrajectory { id, entries }
            })
            .collect();
        TrajectoryResult::from_tracks(self.video_id.clone(), processed, complete, trajectories)
    }
}

fn notify<A, O: FrameObserver + ?Sized>(
    observer: &mut O,
    frame: &Frame,
    tracks: &[Track<A>],
) -> Result<(), TrackingError> {
    let entries: Vec<FrameEntry<'_>> = tracks
        .iter()
        .filter_map(|track| {
            track.last_entry().map(|entry| FrameEntry {
                track_id: track.id(),
                entry: *entry,
            })
        })
        .collect();
    observer.on_frame(frame, &entries)
}
