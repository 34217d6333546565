//! Frame sources fed by the external frame-extraction step.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::debug;

use crate::error::FrameSourceError;
use crate::tracker::FrameSource;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Frames already decoded in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFrames {
    images: VecDeque<RgbImage>,
}

impl MemoryFrames {
    pub fn new(images: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            images: images.into_iter().collect(),
        }
    }
}

impl FrameSource for MemoryFrames {
    fn next_image(&mut self) -> Option<Result<RgbImage, FrameSourceError>> {
        self.images.pop_front().map(Ok)
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.images.len())
    }
}

/// Image files of one scene in a directory, ordered by file name.
///
/// Digit runs in names compare by value, so `frame_2.jpg` comes before
/// `frame_10.jpg` whether or not the extractor zero-pads. Files are
/// decoded lazily, one per call.
#[derive(Debug, Clone)]
pub struct DirectoryFrames {
    paths: VecDeque<PathBuf>,
}

impl DirectoryFrames {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FrameSourceError> {
        let dir = dir.as_ref();
        let io_err = |source| FrameSourceError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort_by_cached_key(|path| natural_key(path));
        debug!("{} frame files in {}", paths.len(), dir.display());

        Ok(Self {
            paths: paths.into(),
        })
    }

    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
}

impl FrameSource for DirectoryFrames {
    fn next_image(&mut self) -> Option<Result<RgbImage, FrameSourceError>> {
        let path = self.paths.pop_front()?;
        let decoded = image::open(&path)
            .map(|image| image.into_rgb8())
            .map_err(|source| match source {
                image::ImageError::IoError(source) => FrameSourceError::Io { path, source },
                source => FrameSourceError::Decode { path, source },
            });
        Some(decoded)
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.paths.len())
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NameChunk {
    /// Digit run without leading zeros, ordered by length first
    Number(usize, String),
    Text(String),
}

fn natural_key(path: &Path) -> Vec<NameChunk> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut chunks = Vec::new();
    let mut rest = name.as_str();
    while let Some(first) = rest.chars().next() {
        let digits = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        chunks.push(if digits {
            let value = run.trim_start_matches('0');
            NameChunk::Number(value.len(), value.to_string())
        } else {
            NameChunk::Text(run.to_string())
        });
        rest = tail;
    }
    chunks
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
