/// Axis-aligned bounding box in pixel coordinates.
///
/// Stored as TLWH: Top-Left X, Top-Left Y, Width, Height. Conversions to
/// TLBR (Top-Left, Bottom-Right) are provided for rendering and clipping.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when every coordinate is finite and the extent is strictly positive.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.to_tlwh().iter().all(|v| v.is_finite()) && self.width > 0.0 && self.height > 0.0
    }

    /// Whether the box lies fully inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let [x1, y1, x2, y2] = self.to_tlbr();
        x1 >= 0.0 && y1 >= 0.0 && x2 <= width as f32 && y2 <= height as f32
    }

    /// Clip the box to a `width` x `height` image.
    ///
    /// Returns `None` when nothing of the box remains inside the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        let [x1, y1, x2, y2] = self.to_tlbr();
        let x1 = x1.max(0.0);
        let y1 = y1.max(0.0);
        let x2 = x2.min(width as f32);
        let y2 = y2.min(height as f32);
        let clipped = Rect::from_tlbr(x1, y1, x2, y2);
        clipped.is_valid().then_some(clipped)
    }

    /// Whether the point lies inside the box (edges inclusive).
    #[inline]
    pub fn contains(&self, px: f32, py: f32) -> bool {
        let [x1, y1, x2, y2] = self.to_tlbr();
        px >= x1 && px <= x2 && py >= y1 && py <= y2
    }
}
