//! Trajectory Result document produced by a tracking session.

use serde::{Deserialize, Serialize};

use crate::error::TrackingError;
use crate::tracker::track::TrackEntry;

/// Full per-frame history of one track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackTrajectory {
    pub id: String,
    pub entries: Vec<TrackEntry>,
}

/// Per-track trajectories for one video, in annotation order.
///
/// Serialises as `{"video_id", "frames_processed", "complete", "tracks"}`
/// where `tracks` is an object keyed by track id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryResult {
    pub video_id: String,
    pub frames_processed: usize,
    /// False when the run was cancelled or cut short by a frame source failure
    pub complete: bool,
    #[serde(with = "ordered_tracks")]
    tracks: Vec<TrackTrajectory>,
}

impl TrajectoryResult {
    /// Empty, incomplete result.
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            frames_processed: 0,
            complete: false,
            tracks: Vec::new(),
        }
    }

    pub(crate) fn from_tracks(
        video_id: impl Into<String>,
        frames_processed: usize,
        complete: bool,
        tracks: Vec<TrackTrajectory>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            frames_processed,
            complete,
            tracks,
        }
    }

    /// History of track `id`, if present.
    pub fn get(&self, id: &str) -> Option<&[TrackEntry]> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.entries.as_slice())
    }

    pub fn tracks(&self) -> &[TrackTrajectory] {
        &self.tracks
    }

    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn to_json(&self) -> Result<String, TrackingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, TrackingError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Serialises the track list as a JSON object while keeping annotation order.
mod ordered_tracks {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};

    use super::TrackTrajectory;
    use crate::tracker::track::TrackEntry;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(
        tracks: &Vec<TrackTrajectory>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(tracks.iter().map(|t| (&t.id, &t.entries)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<TrackTrajectory>, D::Error> {
        deserializer.deserialize_map(TracksVisitor)
    }

    struct TracksVisitor;

    impl<'de> Visitor<'de> for TracksVisitor {
        type Value = Vec<TrackTrajectory>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from track id to per-frame entries")
        }

        fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
            let mut tracks = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, entries)) = map.next_entry::<String, Vec<TrackEntry>>()? {
                tracks.push(TrackTrajectory { id, entries });
            }
            Ok(tracks)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::rect::Rect;

    #[test]
    fn test_document_shape() {
        let bbox = Rect::new(10.0, 10.0, 20.0, 20.0);
        let result = TrajectoryResult::from_tracks(
            "vid-1",
            2,
            true,
            vec![
                TrackTrajectory {
                    id: "zeta".into(),
                    entries: vec![TrackEntry::active(0, bbox, 1.0), TrackEntry::lost(1, bbox)],
                },
                TrackTrajectory {
                    id: "alpha".into(),
                    entries: vec![TrackEntry::active(0, bbox, 1.0), TrackEntry::active(1, bbox, 0.5)],
                },
            ],
        );

        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(value["video_id"], "vid-1");
        assert_eq!(value["complete"], true);
        let lost = &value["tracks"]["zeta"][1];
        assert_eq!(lost["frame_index"], 1);
        assert_eq!(lost["x"], 10.0);
        assert_eq!(lost["width"], 20.0);
        assert_eq!(lost["status"], "lost");
        assert_eq!(lost["confidence"], 0.0);

        let parsed = TrajectoryResult::from_json(&result.to_json().unwrap()).unwrap();
        assert_eq!(parsed.track_ids().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(parsed, result);
    }
}
