//! Persistence of trajectory documents, keyed by video id.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::TrackingError;
use crate::tracker::TrajectoryResult;

/// Holds at most one current trajectory document per video id.
pub trait TrajectoryStore {
    /// Store `result`, replacing any earlier document for the same video.
    fn save(&mut self, result: &TrajectoryResult) -> Result<(), TrackingError>;

    fn load(&self, video_id: &str) -> Result<Option<TrajectoryResult>, TrackingError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<String, TrajectoryResult>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl TrajectoryStore for MemoryStore {
    fn save(&mut self, result: &TrajectoryResult) -> Result<(), TrackingError> {
        self.documents.insert(result.video_id.clone(), result.clone());
        Ok(())
    }

    fn load(&self, video_id: &str) -> Result<Option<TrajectoryResult>, TrackingError> {
        Ok(self.documents.get(video_id).cloned())
    }
}

/// One `<video_id>.json` document per video under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, TrackingError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn document_path(&self, video_id: &str) -> Result<PathBuf, TrackingError> {
        let unsafe_id = video_id.is_empty()
            || video_id == "."
            || video_id.contains("..")
            || video_id.contains(['/', '\\']);
        if unsafe_id {
            return Err(TrackingError::InvalidInput(format!(
                "video id '{video_id}' is not usable as a document name"
            )));
        }
        Ok(self.root.join(format!("{video_id}.json")))
    }
}

impl TrajectoryStore for JsonFileStore {
    fn save(&mut self, result: &TrajectoryResult) -> Result<(), TrackingError> {
        let path = self.document_path(&result.video_id)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, result.to_json()?)?;
        fs::rename(&staging, &path)?;
        debug!("trajectory for {} written to {}", result.video_id, path.display());
        Ok(())
    }

    fn load(&self, video_id: &str) -> Result<Option<TrajectoryResult>, TrackingError> {
        let path = self.document_path(video_id)?;
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(TrajectoryResult::from_json(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
