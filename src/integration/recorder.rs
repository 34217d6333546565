//! Overlay rendering for the reduced-rate review video.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use log::debug;

use crate::error::TrackingError;
use crate::tracker::{Frame, FrameEntry, FrameObserver, TrackStatus};

/// Colours and line width of the box overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub active: Rgb<u8>,
    pub lost: Rgb<u8>,
    pub thickness: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            active: Rgb([0, 0, 255]),
            lost: Rgb([255, 0, 0]),
            thickness: 2,
        }
    }
}

/// Copy of `frame` with one rectangle per track entry.
pub fn render_overlay(frame: &Frame, entries: &[FrameEntry<'_>], style: &OverlayStyle) -> RgbImage {
    let mut canvas = frame.rgb().clone();
    for FrameEntry { entry, .. } in entries {
        let color = match entry.status {
            TrackStatus::Active => style.active,
            TrackStatus::Lost => style.lost,
        };
        let [x, y, w, h] = entry.bbox.to_tlwh();
        let (x, y) = (x.round() as i32, y.round() as i32);
        let (w, h) = (w.round() as i64, h.round() as i64);
        for t in 0..style.thickness.max(1) as i64 {
            let (tw, th) = (w - 2 * t, h - 2 * t);
            if tw < 1 || th < 1 {
                break;
            }
            let rect = imageproc::rect::Rect::at(x + t as i32, y + t as i32).of_size(tw as u32, th as u32);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }
    canvas
}

/// Number of source frames per output frame: `trunc(source / target)`, at least 1.
pub fn frame_stride(source_fps: f64, target_fps: f64) -> usize {
    if !(source_fps.is_finite() && target_fps.is_finite()) || target_fps <= 0.0 {
        return 1;
    }
    ((source_fps / target_fps).trunc() as usize).max(1)
}

/// Consumer of overlay frames, typically the external video encoder.
pub trait FrameSink {
    /// Receive output frame number `output_index` (dense, starting at 0).
    fn write_frame(&mut self, output_index: usize, image: &RgbImage) -> Result<(), TrackingError>;

    /// Called once after the last frame.
    fn finish(&mut self) -> Result<(), TrackingError> {
        Ok(())
    }
}

/// Keeps rendered frames in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<RgbImage>,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, _output_index: usize, image: &RgbImage) -> Result<(), TrackingError> {
        self.frames.push(image.clone());
        Ok(())
    }
}

/// Writes `frame_000000.png`, `frame_000001.png`, ... for an external encoder.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, TrackingError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSink for DirectorySink {
    fn write_frame(&mut self, output_index: usize, image: &RgbImage) -> Result<(), TrackingError> {
        let path = self.dir.join(format!("frame_{output_index:06}.png"));
        image
            .save(&path)
            .map_err(|e| TrackingError::Output(format!("{}: {e}", path.display())))
    }
}

/// Renders every `stride`-th processed frame and hands it to a sink.
///
/// Holds no state beyond the output counter; the trajectory itself is never
/// touched.
#[derive(Debug)]
pub struct TrajectoryRecorder<K> {
    sink: K,
    stride: usize,
    style: OverlayStyle,
    written: usize,
}

impl<K: FrameSink> TrajectoryRecorder<K> {
    pub fn new(sink: K, stride: usize) -> Self {
        Self {
            sink,
            stride: stride.max(1),
            style: OverlayStyle::default(),
            written: 0,
        }
    }

    /// Resample from `source_fps` down to `target_fps`.
    pub fn with_rates(sink: K, source_fps: f64, target_fps: f64) -> Self {
        Self::new(sink, frame_stride(source_fps, target_fps))
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(&mut self) -> Result<(), TrackingError> {
        debug!("overlay recorder wrote {} frames", self.written);
        self.sink.finish()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }
}

impl<K: FrameSink> FrameObserver for TrajectoryRecorder<K> {
    fn on_frame(&mut self, frame: &Frame, entries: &[FrameEntry<'_>]) -> Result<(), TrackingError> {
        if frame.index() % self.stride != 0 {
            return Ok(());
        }
        let overlay = render_overlay(frame, entries, &self.style);
        self.sink.write_frame(self.written, &overlay)?;
        self.written += 1;
        Ok(())
    }
}
