//! Point-and-click object selection.
//!
//! Candidate regions (e.g. bounding boxes of foreground contours) are shown
//! to the user; a click is resolved to a region by a pure hit test and turned
//! into an annotation. No selection state outlives the request.

use crate::tracker::{Annotation, Rect};

/// A click on frame 0, naming the track it should create.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

/// Index of the smallest region containing the point.
///
/// Nested regions resolve to the innermost one; equal areas resolve to the
/// first listed.
pub fn hit_test(regions: &[Rect], x: f32, y: f32) -> Option<usize> {
    regions
        .iter()
        .enumerate()
        .filter(|(_, region)| region.is_valid() && region.contains(x, y))
        .fold(None, |best: Option<(usize, f32)>, (i, region)| match best {
            Some((_, area)) if area <= region.area() => best,
            _ => Some((i, region.area())),
        })
        .map(|(i, _)| i)
}

/// Resolve a click into an annotation over the selected region.
pub fn select_region(regions: &[Rect], request: &SelectionRequest) -> Option<Annotation> {
    hit_test(regions, request.x, request.y)
        .map(|i| Annotation::new(request.id.clone(), regions[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_prefers_innermost() {
        let regions = [
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(10.0, 10.0, 20.0, 20.0),
            Rect::new(60.0, 60.0, 10.0, 10.0),
        ];
        assert_eq!(hit_test(&regions, 15.0, 15.0), Some(1));
        assert_eq!(hit_test(&regions, 50.0, 50.0), Some(0));
        assert_eq!(hit_test(&regions, 150.0, 50.0), None);
    }

    #[test]
    fn test_select_region() {
        let regions = [Rect::new(5.0, 5.0, 10.0, 10.0)];
        let request = SelectionRequest {
            id: "ball".into(),
            x: 7.0,
            y: 8.0,
        };
        let annotation = select_region(&regions, &request).unwrap();
        assert_eq!(annotation, Annotation::new("ball", regions[0]));
    }
}
