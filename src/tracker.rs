mod adapter;
mod annotation;
mod config;
mod correlation;
mod frame;
mod kalman_filter;
mod rect;
mod session;
mod track;
mod track_state;
mod trajectory;

pub use adapter::{AdapterUpdate, TrackerAdapter};
pub use annotation::{
    Annotation, fit_to_frame, parse_annotations, parse_annotations_file, validate_annotations,
};
pub use config::{BoundsPolicy, TrackerBackend, TrackerConfig};
pub use correlation::{CorrelationConfig, CorrelationTracker};
pub use frame::{Frame, FrameSource};
pub use kalman_filter::KalmanFilter;
pub use rect::Rect;
pub use session::{CancelToken, FrameEntry, FrameObserver, TrackingSession};
pub use track::{Track, TrackEntry};
pub use track_state::TrackStatus;
pub use trajectory::{TrackTrajectory, TrajectoryResult};
