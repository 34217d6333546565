//! Decoded video frame shared read-only by every track.

use image::{GrayImage, RgbImage};

use crate::error::FrameSourceError;

/// One zero-based-indexed image of a scene.
///
/// The grayscale plane is computed once on construction so that trackers
/// sharing the frame do not each convert it.
#[derive(Debug, Clone)]
pub struct Frame {
    index: usize,
    rgb: RgbImage,
    luma: GrayImage,
}

impl Frame {
    pub fn new(index: usize, rgb: RgbImage) -> Self {
        let luma = image::imageops::grayscale(&rgb);
        Self { index, rgb, luma }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn luma(&self) -> &GrayImage {
        &self.luma
    }
}

/// Ordered supply of decoded images for one scene.
///
/// Images are handed out once, in order; the session assigns frame indices.
pub trait FrameSource {
    /// Next image, `None` once the sequence is exhausted.
    fn next_image(&mut self) -> Option<Result<RgbImage, FrameSourceError>>;

    /// Number of images still to come, when known.
    fn remaining(&self) -> Option<usize> {
        None
    }
}
