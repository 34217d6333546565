//! Uniform contract for single-object visual trackers.

use crate::error::AdapterError;
use crate::tracker::frame::Frame;
use crate::tracker::rect::Rect;

/// Outcome of one `update` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdapterUpdate {
    /// Whether the target was confidently relocated
    pub success: bool,
    /// New box when `success`, otherwise the last known box
    pub bbox: Rect,
    /// Match confidence in [0, 1]
    pub confidence: f32,
}

impl AdapterUpdate {
    pub fn found(bbox: Rect, confidence: f32) -> Self {
        Self {
            success: true,
            bbox,
            confidence,
        }
    }

    pub fn missed(bbox: Rect) -> Self {
        Self {
            success: false,
            bbox,
            confidence: 0.0,
        }
    }
}

/// A single-object tracker driven one consecutive frame at a time.
///
/// Implement this trait to plug any tracking algorithm into a
/// [`TrackingSession`](crate::tracker::TrackingSession).
///
/// # Example
///
/// ```ignore
/// use scenetrack::{AdapterError, AdapterUpdate, Frame, Rect, TrackerAdapter};
///
/// struct StaticTracker {
///     bbox: Option<Rect>,
/// }
///
/// impl TrackerAdapter for StaticTracker {
///     fn initialize(&mut self, _frame: &Frame, bbox: Rect) -> Result<(), AdapterError> {
///         self.bbox = Some(bbox);
///         Ok(())
///     }
///
///     fn update(&mut self, _frame: &Frame) -> Result<AdapterUpdate, AdapterError> {
///         let bbox = self.bbox.ok_or(AdapterError::NotInitialized)?;
///         Ok(AdapterUpdate::found(bbox, 1.0))
///     }
/// }
/// ```
pub trait TrackerAdapter: Send {
    /// Seed the internal model from the pixels under `bbox` on `frame`.
    ///
    /// Fails when `bbox` has a non-positive extent or lies outside the frame.
    fn initialize(&mut self, frame: &Frame, bbox: Rect) -> Result<(), AdapterError>;

    /// Relocate the target on the next frame of the sequence.
    ///
    /// Returns [`AdapterError::NotInitialized`] when called before `initialize`.
    fn update(&mut self, frame: &Frame) -> Result<AdapterUpdate, AdapterError>;
}

impl<T: TrackerAdapter + ?Sized> TrackerAdapter for Box<T> {
    fn initialize(&mut self, frame: &Frame, bbox: Rect) -> Result<(), AdapterError> {
        (**self).initialize(frame, bbox)
    }

    fn update(&mut self, frame: &Frame) -> Result<AdapterUpdate, AdapterError> {
        (**self).update(frame)
    }
}
