//! Multi-object visual tracking over the frames of a scene.
//!
//! Each user-drawn box on the first frame becomes an independent [`Track`]
//! driven by a single-object [`TrackerAdapter`]. A [`TrackingSession`]
//! advances every track frame by frame, records loss of track, and produces
//! a dense [`TrajectoryResult`]. The [`integration`] module connects the
//! session to frame sources, overlay rendering and trajectory storage.

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::{AdapterError, FrameSourceError, TrackingError};
pub use integration::{
    AnnotationBuilder, DirectoryFrames, DirectorySink, FrameSink, JsonFileStore, MemoryFrames,
    MemorySink, MemoryStore, OverlayStyle, TrackingPipeline, TrajectoryRecorder, TrajectoryStore,
};
pub use tracker::{
    AdapterUpdate, Annotation, BoundsPolicy, CancelToken, CorrelationConfig, CorrelationTracker,
    Frame, FrameEntry, FrameObserver, FrameSource, Rect, Track, TrackEntry, TrackStatus,
    TrackerAdapter, TrackerBackend, TrackerConfig, TrackingSession, TrajectoryResult,
    parse_annotations, parse_annotations_file,
};
