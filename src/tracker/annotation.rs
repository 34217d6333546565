//! User-drawn initial boxes and their validation.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TrackingError;
use crate::tracker::config::BoundsPolicy;
use crate::tracker::rect::Rect;

/// An object to track: identifier plus its box on frame 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(alias = "label")]
    pub id: String,
    #[serde(flatten)]
    pub bbox: Rect,
}

impl Annotation {
    pub fn new(id: impl Into<String>, bbox: Rect) -> Self {
        Self {
            id: id.into(),
            bbox,
        }
    }
}

/// Parse a JSON annotation payload: `[{"id": .., "x": .., "y": .., "width": .., "height": ..}]`.
///
/// `label` is accepted in place of `id`.
pub fn parse_annotations(json: &str) -> Result<Vec<Annotation>, TrackingError> {
    serde_json::from_str(json)
        .map_err(|e| TrackingError::InvalidInput(format!("malformed annotation payload: {e}")))
}

/// Read and parse an annotation payload from a JSON file.
pub fn parse_annotations_file(path: impl AsRef<Path>) -> Result<Vec<Annotation>, TrackingError> {
    parse_annotations(&fs::read_to_string(path)?)
}

/// Structural checks that need no frame: non-empty set, unique non-empty
/// ids, finite boxes with positive extent.
pub fn validate_annotations(annotations: &[Annotation]) -> Result<(), TrackingError> {
    if annotations.is_empty() {
        return Err(TrackingError::InvalidInput("annotation set is empty".into()));
    }

    let mut seen = HashSet::with_capacity(annotations.len());
    for annotation in annotations {
        if annotation.id.trim().is_empty() {
            return Err(TrackingError::InvalidInput("annotation with empty id".into()));
        }
        if !seen.insert(annotation.id.as_str()) {
            return Err(TrackingError::InvalidInput(format!(
                "duplicate annotation id '{}'",
                annotation.id
            )));
        }
        if !annotation.bbox.is_valid() {
            return Err(TrackingError::InvalidInput(format!(
                "annotation '{}' has a non-positive or non-finite box {:?}",
                annotation.id,
                annotation.bbox.to_tlwh()
            )));
        }
    }
    Ok(())
}

/// Check every box against the dimensions of frame 0, clipping or rejecting
/// according to `policy`. Returns the boxes tracking should start from.
pub fn fit_to_frame(
    annotations: &[Annotation],
    width: u32,
    height: u32,
    policy: BoundsPolicy,
) -> Result<Vec<Annotation>, TrackingError> {
    annotations
        .iter()
        .map(|annotation| {
            let fitted = match policy {
                BoundsPolicy::Reject => annotation
                    .bbox
                    .fits_within(width, height)
                    .then_some(annotation.bbox),
                BoundsPolicy::Clamp => annotation.bbox.clamp_to(width, height),
            };
            fitted
                .map(|bbox| Annotation::new(annotation.id.clone(), bbox))
                .ok_or_else(|| {
                    TrackingError::InvalidInput(format!(
                        "annotation '{}' box {:?} lies outside the {}x{} frame",
                        annotation.id,
                        annotation.bbox.to_tlwh(),
                        width,
                        height
                    ))
                })
        })
        .collect()
}
