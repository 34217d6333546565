//! Single annotated object followed across a scene.

use log::{info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::tracker::adapter::{AdapterUpdate, TrackerAdapter};
use crate::tracker::frame::Frame;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackStatus;

/// One per-frame record of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub frame_index: usize,
    #[serde(flatten)]
    pub bbox: Rect,
    pub status: TrackStatus,
    pub confidence: f32,
}

impl TrackEntry {
    pub fn active(frame_index: usize, bbox: Rect, confidence: f32) -> Self {
        Self {
            frame_index,
            bbox,
            status: TrackStatus::Active,
            confidence,
        }
    }

    pub fn lost(frame_index: usize, bbox: Rect) -> Self {
        Self {
            frame_index,
            bbox,
            status: TrackStatus::Lost,
            confidence: 0.0,
        }
    }
}

/// Single object track.
///
/// Owns its tracker adapter and a dense, append-only history with exactly
/// one entry per frame processed. Once lost, the box is frozen and the
/// adapter is no longer consulted.
#[derive(Debug)]
pub struct Track<A> {
    id: String,
    status: TrackStatus,
    bbox: Rect,
    history: Vec<TrackEntry>,
    adapter: A,
}

impl<A: TrackerAdapter> Track<A> {
    /// Seed `adapter` on the first frame and record the initial entry.
    ///
    /// An adapter that cannot be seeded leaves the track lost from the
    /// first frame, frozen at the requested box.
    pub fn start(id: impl Into<String>, mut adapter: A, frame: &Frame, bbox: Rect) -> Self {
        let id = id.into();
        let entry = match adapter.initialize(frame, bbox) {
            Ok(()) => TrackEntry::active(frame.index(), bbox, 1.0),
            Err(e) => {
                warn!("track '{id}' could not be initialized: {e}");
                TrackEntry::lost(frame.index(), bbox)
            }
        };

        Self {
            id,
            status: entry.status,
            bbox,
            history: vec![entry],
            adapter,
        }
    }

    /// Consume the next frame and append its entry.
    ///
    /// A failed update, an adapter error, a non-finite box, or a confidence
    /// below `min_confidence` all mark the track lost.
    pub fn advance(&mut self, frame: &Frame, min_confidence: f32) -> TrackEntry {
        let index = frame.index();
        let entry = match self.status {
            TrackStatus::Lost => TrackEntry::lost(index, self.bbox),
            TrackStatus::Active => match self.adapter.update(frame) {
                Ok(update)
                    if update.success
                        && update.confidence >= min_confidence
                        && update.bbox.is_valid() =>
                {
                    self.bbox = update.bbox;
                    TrackEntry::active(index, update.bbox, update.confidence.min(1.0))
                }
                Ok(update) => {
                    self.mark_lost(index, &loss_reason(&update, min_confidence));
                    TrackEntry::lost(index, self.bbox)
                }
                Err(e) => {
                    self.mark_lost(index, &e.to_string());
                    TrackEntry::lost(index, self.bbox)
                }
            },
        };

        trace!("track '{}' frame {}: {:?}", self.id, index, entry.status);
        self.history.push(entry);
        entry
    }

    fn mark_lost(&mut self, frame_index: usize, reason: &str) {
        info!(
            "track '{}' lost at frame {} ({}), frozen at {:?}",
            self.id,
            frame_index,
            reason,
            self.bbox.to_tlwh()
        );
        self.status = TrackStatus::Lost;
    }
}

fn loss_reason(update: &AdapterUpdate, min_confidence: f32) -> String {
    if !update.success {
        "target not found".to_string()
    } else if !update.bbox.is_valid() {
        format!("unusable box {:?}", update.bbox.to_tlwh())
    } else {
        format!(
            "confidence {:.3} below {:.3}",
            update.confidence, min_confidence
        )
    }
}

impl<A> Track<A> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    /// Last known box; frozen once the track is lost.
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    pub fn history(&self) -> &[TrackEntry] {
        &self.history
    }

    /// Most recent entry. Every track has at least its initial one.
    pub fn last_entry(&self) -> Option<&TrackEntry> {
        self.history.last()
    }

    pub fn into_history(self) -> (String, Vec<TrackEntry>) {
        (self.id, self.history)
    }
}
