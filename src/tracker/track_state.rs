/// Track status enumeration for the per-object tracking lifecycle.
///
/// The only transition is `Active` to `Lost`; a lost track never recovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    /// Object is being followed
    #[default]
    Active,
    /// Tracking failed; the box is frozen at its last good value
    Lost,
}

impl TrackStatus {
    pub fn is_active(self) -> bool {
        self == TrackStatus::Active
    }
}
