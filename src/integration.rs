//! Collaborators around the tracking core.
//!
//! Frame sources, overlay recording for the review video, trajectory
//! persistence, annotation helpers and the scene-splitting client, tied
//! together by [`TrackingPipeline`].

mod builder;
mod frames;
mod pipeline;
mod recorder;
pub mod scene;
pub mod selection;
mod store;

pub use builder::AnnotationBuilder;
pub use frames::{DirectoryFrames, MemoryFrames};
pub use pipeline::TrackingPipeline;
pub use recorder::{
    DirectorySink, FrameSink, MemorySink, OverlayStyle, TrajectoryRecorder, frame_stride,
    render_overlay,
};
pub use store::{JsonFileStore, MemoryStore, TrajectoryStore};
