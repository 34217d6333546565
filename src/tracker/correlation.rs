//! Template tracker scoring candidates by zero-mean normalised
//! cross-correlation, with optional Kalman motion prediction.

use image::GrayImage;
use ndarray::{Array1, Array2, ArrayView2, Zip, s};
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, TrackingError};
use crate::tracker::adapter::{AdapterUpdate, TrackerAdapter};
use crate::tracker::frame::Frame;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::rect::Rect;

const VARIANCE_EPS: f32 = 1e-3;
const SCORE_EPS: f32 = 1e-6;

/// Search and model-adaptation parameters for [`CorrelationTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Search radius as a fraction of the larger box side
    pub search_padding: f32,
    pub min_search_radius: u32,
    pub max_search_radius: u32,
    /// Template blending factor applied after each successful match
    pub learning_rate: f32,
    /// Peaks below this report the target as not found
    pub min_peak: f32,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            search_padding: 0.5,
            min_search_radius: 8,
            max_search_radius: 64,
            learning_rate: 0.1,
            min_peak: 0.2,
        }
    }
}

impl CorrelationConfig {
    pub fn validate(&self) -> Result<(), TrackingError> {
        if !(self.search_padding.is_finite() && self.search_padding >= 0.0) {
            return Err(TrackingError::Config(format!(
                "search_padding {} must be finite and non-negative",
                self.search_padding
            )));
        }
        if self.min_search_radius > self.max_search_radius {
            return Err(TrackingError::Config(format!(
                "min_search_radius {} exceeds max_search_radius {}",
                self.min_search_radius, self.max_search_radius
            )));
        }
        for (name, value) in [("learning_rate", self.learning_rate), ("min_peak", self.min_peak)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrackingError::Config(format!("{name} {value} outside [0, 1]")));
            }
        }
        Ok(())
    }

    fn search_radius(&self, width: u32, height: u32) -> i64 {
        let upper = self.max_search_radius.max(self.min_search_radius);
        let scaled = (width.max(height) as f32 * self.search_padding.max(0.0)).ceil() as u32;
        scaled.clamp(self.min_search_radius, upper) as i64
    }
}

#[derive(Debug, Clone)]
struct Template {
    pixels: Array2<f32>,
    deviation: Array2<f32>,
    mean: f32,
    norm: f32,
    x: i64,
    y: i64,
}

impl Template {
    fn new(pixels: Array2<f32>, x: i64, y: i64) -> Self {
        let mean = pixels.mean().unwrap_or(0.0);
        let deviation = pixels.mapv(|v| v - mean);
        let norm = deviation.iter().map(|d| d * d).sum::<f32>().sqrt();
        Self {
            pixels,
            deviation,
            mean,
            norm,
            x,
            y,
        }
    }

    fn width(&self) -> u32 {
        self.pixels.ncols() as u32
    }

    fn height(&self) -> u32 {
        self.pixels.nrows() as u32
    }

    fn bbox(&self) -> Rect {
        Rect::new(
            self.x as f32,
            self.y as f32,
            self.width() as f32,
            self.height() as f32,
        )
    }

    fn score(&self, window: ArrayView2<'_, f32>) -> f32 {
        if self.norm * self.norm <= VARIANCE_EPS {
            let n = window.len().max(1) as f32;
            let mad = window.iter().map(|v| (v - self.mean).abs()).sum::<f32>() / n;
            return 1.0 - mad / 255.0;
        }

        let window_mean = window.mean().unwrap_or(0.0);
        let mut cross = 0.0f32;
        let mut window_var = 0.0f32;
        Zip::from(&self.deviation).and(&window).for_each(|&t, &w| {
            let d = w - window_mean;
            cross += t * d;
            window_var += d * d;
        });

        if window_var <= VARIANCE_EPS {
            return 0.0;
        }
        cross / (self.norm * window_var.sqrt())
    }

    fn adapt(&mut self, window: ArrayView2<'_, f32>, learning_rate: f32, x: i64, y: i64) {
        let rate = learning_rate.clamp(0.0, 1.0);
        let blended = &self.pixels * (1.0 - rate) + &window * rate;
        *self = Template::new(blended, x, y);
    }
}

#[derive(Debug, Clone)]
struct Motion {
    filter: KalmanFilter,
    mean: Array1<f64>,
    covariance: Array2<f64>,
}

impl Motion {
    fn new(center: (f32, f32)) -> Self {
        let filter = KalmanFilter::new();
        let (mean, covariance) = filter.initiate([center.0 as f64, center.1 as f64]);
        Self {
            filter,
            mean,
            covariance,
        }
    }

    fn predict(&mut self) -> (f32, f32) {
        let (mean, covariance) = self.filter.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
        (self.mean[0] as f32, self.mean[1] as f32)
    }

    fn correct(&mut self, center: (f32, f32)) {
        let (mean, covariance) = self.filter.update(
            &self.mean,
            &self.covariance,
            [center.0 as f64, center.1 as f64],
        );
        self.mean = mean;
        self.covariance = covariance;
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    x: i64,
    y: i64,
    score: f32,
    dist2: i64,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        self.score > other.score + SCORE_EPS
            || ((self.score - other.score).abs() <= SCORE_EPS && self.dist2 < other.dist2)
    }
}

/// Single-object tracker matching a grayscale template inside a bounded
/// neighbourhood of the previous (or predicted) position.
#[derive(Debug, Clone)]
pub struct CorrelationTracker {
    config: CorrelationConfig,
    predictive: bool,
    template: Option<Template>,
    /// Requested box relative to the template origin; reported boxes keep
    /// its sub-pixel offset and size.
    anchor: Option<Rect>,
    motion: Option<Motion>,
}

impl CorrelationTracker {
    /// Search around the previous box position.
    pub fn new(config: CorrelationConfig) -> Self {
        Self {
            config,
            predictive: false,
            template: None,
            anchor: None,
            motion: None,
        }
    }

    /// Search around a constant-velocity prediction of the box center.
    pub fn predictive(config: CorrelationConfig) -> Self {
        Self {
            predictive: true,
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    fn search(&self, luma: &GrayImage, template: &Template, centre: (i64, i64)) -> Option<Candidate> {
        let (tw, th) = (template.width() as i64, template.height() as i64);
        let max_x = luma.width() as i64 - tw;
        let max_y = luma.height() as i64 - th;
        if max_x < 0 || max_y < 0 {
            return None;
        }

        let radius = self.config.search_radius(template.width(), template.height());
        let cx = centre.0.clamp(0, max_x);
        let cy = centre.1.clamp(0, max_y);
        let (x_lo, x_hi) = ((cx - radius).max(0), (cx + radius).min(max_x));
        let (y_lo, y_hi) = ((cy - radius).max(0), (cy + radius).min(max_y));

        let region = luma_patch(
            luma,
            x_lo as u32,
            y_lo as u32,
            (x_hi - x_lo + tw) as u32,
            (y_hi - y_lo + th) as u32,
        );

        let evaluate = |x: i64, y: i64| {
            let (ox, oy) = ((x - x_lo) as usize, (y - y_lo) as usize);
            let window = region.slice(s![oy..oy + th as usize, ox..ox + tw as usize]);
            Candidate {
                x,
                y,
                score: template.score(window),
                dist2: (x - cx).pow(2) + (y - cy).pow(2),
            }
        };

        let step = (radius / 8).max(1);
        let mut best: Option<Candidate> = None;
        for y in (y_lo..=y_hi).step_by(step as usize) {
            for x in (x_lo..=x_hi).step_by(step as usize) {
                keep_best(&mut best, evaluate(x, y));
            }
        }

        if step > 1 {
            let coarse = best?;
            let reach = step - 1;
            for y in (coarse.y - reach).max(y_lo)..=(coarse.y + reach).min(y_hi) {
                for x in (coarse.x - reach).max(x_lo)..=(coarse.x + reach).min(x_hi) {
                    keep_best(&mut best, evaluate(x, y));
                }
            }
        }
        best
    }
}

fn keep_best(best: &mut Option<Candidate>, candidate: Candidate) {
    if best.as_ref().is_none_or(|current| candidate.beats(current)) {
        *best = Some(candidate);
    }
}

impl TrackerAdapter for CorrelationTracker {
    fn initialize(&mut self, frame: &Frame, bbox: Rect) -> Result<(), AdapterError> {
        if !bbox.is_valid() {
            return Err(AdapterError::InitFailure(format!(
                "box {:?} has a non-positive extent",
                bbox.to_tlwh()
            )));
        }
        if !bbox.fits_within(frame.width(), frame.height()) {
            return Err(AdapterError::InitFailure(format!(
                "box {:?} exceeds the {}x{} frame",
                bbox.to_tlwh(),
                frame.width(),
                frame.height()
            )));
        }

        let x = bbox.x.round() as u32;
        let y = bbox.y.round() as u32;
        let w = (bbox.width.round() as u32)
            .max(1)
            .min(frame.width().saturating_sub(x));
        let h = (bbox.height.round() as u32)
            .max(1)
            .min(frame.height().saturating_sub(y));
        if w == 0 || h == 0 {
            return Err(AdapterError::InitFailure(format!(
                "box {:?} covers no whole pixel",
                bbox.to_tlwh()
            )));
        }

        let template = Template::new(luma_patch(frame.luma(), x, y, w, h), x as i64, y as i64);
        self.motion = self
            .predictive
            .then(|| Motion::new(template.bbox().center()));
        self.template = Some(template);
        self.anchor = Some(Rect::new(
            bbox.x - x as f32,
            bbox.y - y as f32,
            bbox.width,
            bbox.height,
        ));
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Result<AdapterUpdate, AdapterError> {
        let template = self.template.as_ref().ok_or(AdapterError::NotInitialized)?;
        let anchor = self.anchor.ok_or(AdapterError::NotInitialized)?;
        let place = |x: i64, y: i64| {
            Rect::new(x as f32 + anchor.x, y as f32 + anchor.y, anchor.width, anchor.height)
        };
        let last = template.bbox();
        let reported = place(template.x, template.y);

        let centre = match self.motion.as_mut() {
            Some(motion) => {
                let (px, py) = motion.predict();
                (
                    (px - last.width / 2.0).round() as i64,
                    (py - last.height / 2.0).round() as i64,
                )
            }
            None => (template.x, template.y),
        };

        let Some(best) = self.search(frame.luma(), template, centre) else {
            return Ok(AdapterUpdate::missed(reported));
        };

        let confidence = best.score.clamp(0.0, 1.0);
        if confidence < self.config.min_peak {
            return Ok(AdapterUpdate {
                success: false,
                bbox: reported,
                confidence,
            });
        }

        let window = luma_patch(
            frame.luma(),
            best.x as u32,
            best.y as u32,
            template.width(),
            template.height(),
        );
        let learning_rate = self.config.learning_rate;
        if let Some(template) = self.template.as_mut() {
            template.adapt(window.view(), learning_rate, best.x, best.y);
        }

        if let Some(motion) = self.motion.as_mut() {
            let matched = Rect::new(best.x as f32, best.y as f32, last.width, last.height);
            motion.correct(matched.center());
        }
        Ok(AdapterUpdate::found(place(best.x, best.y), confidence))
    }
}

/// Copy a `w` x `h` grayscale region into a row-major float array.
fn luma_patch(luma: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> Array2<f32> {
    Array2::from_shape_fn((h as usize, w as usize), |(r, c)| {
        luma.get_pixel(x + c as u32, y + r as u32)[0] as f32
    })
}
