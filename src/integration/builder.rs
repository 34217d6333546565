//! Builder for creating Annotation objects from various box formats.

use crate::tracker::{Annotation, Rect};

/// Builder for creating `Annotation` objects from various input formats.
#[derive(Debug, Clone, Default)]
pub struct AnnotationBuilder {
    id: String,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl AnnotationBuilder {
    /// Create a new annotation builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the track identifier (the label drawn in the annotation UI).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.x1 = x;
        self.y1 = y;
        self.x2 = x + w;
        self.y2 = y + h;
        self
    }

    /// Build the final `Annotation`.
    pub fn build(self) -> Annotation {
        Annotation::new(self.id, Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_builder() {
        let annotation = AnnotationBuilder::new()
            .id("obj1")
            .tlbr(10.0, 20.0, 50.0, 80.0)
            .build();
        assert_eq!(annotation.id, "obj1");
        assert_eq!(annotation.bbox, Rect::new(10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn test_tlwh_matches_center_format() {
        let a = AnnotationBuilder::new().tlwh(10.0, 10.0, 20.0, 20.0).build();
        let b = AnnotationBuilder::new().xywh(20.0, 20.0, 20.0, 20.0).build();
        assert_eq!(a.bbox, b.bbox);
    }
}
