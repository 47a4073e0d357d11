//! Depth-map synthesis from a raster image.
//!
//! Converts an RGBA buffer into a normalized relief depth map plus derived
//! normal and height maps. Synthesis runs a fixed four-level box pyramid:
//! each level is tone-curved, contrast-boosted, and unsharp-masked at its own
//! scale, then the levels are blended back at full resolution with optional
//! edge preservation. Deterministic for identical inputs; pyramid levels
//! compute in parallel.

use crate::error::{EngraveError, EngraveResult};
use crate::power_map::PowerProfileMapper;
use crate::session::CancelToken;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use rayon::prelude::*;
use reliefkit_core::{DepthMap, RasterImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Fixed downsample factors of the synthesis pyramid.
pub const PYRAMID_SCALES: [u32; 4] = [1, 2, 4, 8];

/// Depth transfer curve applied per pyramid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthCurve {
    /// Identity mapping
    Linear,
    /// `v²`, compresses shallow tones
    Exponential,
    /// `ln(v(e-1)+1)`, expands shallow tones
    Logarithmic,
    /// Piecewise-linear over user control points
    Custom,
}

impl Default for DepthCurve {
    fn default() -> Self {
        Self::Linear
    }
}

/// One control point of a custom depth curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

/// Depth-map synthesis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthMapSettings {
    /// Contrast adjustment in percent (-100..100).
    pub contrast: f32,
    /// Brightness adjustment in percent (-100..100).
    pub brightness: f32,
    /// Gamma correction; luminance is raised to `1/gamma`.
    pub gamma: f32,
    /// Full-resolution sharpening strength in percent (0..100).
    pub sharpness: f32,
    /// Depth of the untouched surface in millimeters.
    pub base_depth_mm: f32,
    /// Deepest cut in millimeters; scales the height map.
    pub max_depth_mm: f32,
    /// Shallowest cut in millimeters.
    pub min_depth_mm: f32,
    /// Depth transfer curve.
    pub depth_curve: DepthCurve,
    /// Control points for [`DepthCurve::Custom`], required and sorted by x.
    pub custom_curve: Option<Vec<CurvePoint>>,
    /// Discrete relief layers; 0 or 1 keeps the map continuous.
    pub layers: u32,
    /// Pyramid blend weight in [0, 1]: 0 keeps only the finest level, 1
    /// blends all levels evenly.
    pub layer_blending: f32,
    /// Final smoothing strength in percent (0..100).
    pub smoothing: f32,
    /// Per-level detail boost in percent (0..100) for unsharp masking.
    pub detail_boost: f32,
    /// Edge-bias strength in percent (0..100) used when `preserve_edges`.
    pub edge_enhancement: f32,
    /// Bias the blend toward the least-smoothed level at high-gradient
    /// pixels.
    pub preserve_edges: bool,
    /// Gradient scale of the derived normal map.
    pub normal_strength: f32,
    /// Engrave dark areas deep instead of light areas.
    pub invert: bool,
}

impl Default for DepthMapSettings {
    fn default() -> Self {
        Self {
            contrast: 0.0,
            brightness: 0.0,
            gamma: 1.0,
            sharpness: 0.0,
            base_depth_mm: 0.0,
            max_depth_mm: 1.0,
            min_depth_mm: 0.0,
            depth_curve: DepthCurve::default(),
            custom_curve: None,
            layers: 0,
            layer_blending: 0.5,
            smoothing: 0.0,
            detail_boost: 30.0,
            edge_enhancement: 50.0,
            preserve_edges: true,
            normal_strength: 1.0,
            invert: false,
        }
    }
}

impl DepthMapSettings {
    /// Validate ranges and the custom curve. Runs before any buffer
    /// allocation.
    pub fn validate(&self) -> EngraveResult<()> {
        if self.gamma <= 0.0 {
            return Err(EngraveError::InvalidInput(format!(
                "gamma must be positive, got {}",
                self.gamma
            )));
        }
        for (name, value) in [("contrast", self.contrast), ("brightness", self.brightness)] {
            if !(-100.0..=100.0).contains(&value) {
                return Err(EngraveError::InvalidInput(format!(
                    "{} must lie in -100..100, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("sharpness", self.sharpness),
            ("smoothing", self.smoothing),
            ("detail_boost", self.detail_boost),
            ("edge_enhancement", self.edge_enhancement),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(EngraveError::InvalidInput(format!(
                    "{} must lie in 0..100, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.layer_blending) {
            return Err(EngraveError::InvalidInput(format!(
                "layer_blending must lie in 0..1, got {}",
                self.layer_blending
            )));
        }
        if self.min_depth_mm > self.base_depth_mm || self.base_depth_mm > self.max_depth_mm {
            return Err(EngraveError::InvalidInput(format!(
                "depth bounds must satisfy min <= base <= max, got {} <= {} <= {}",
                self.min_depth_mm, self.base_depth_mm, self.max_depth_mm
            )));
        }
        if self.depth_curve == DepthCurve::Custom {
            let points = self.custom_curve.as_ref().ok_or_else(|| {
                EngraveError::InvalidInput(
                    "custom depth curve selected but no control points supplied".to_string(),
                )
            })?;
            if points.len() < 2 {
                return Err(EngraveError::InvalidInput(format!(
                    "custom curve needs at least 2 control points, got {}",
                    points.len()
                )));
            }
            if points.windows(2).any(|w| w[1].x < w[0].x) {
                return Err(EngraveError::InvalidInput(
                    "custom curve control points must be sorted by x".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Piecewise-linear interpolation over a sorted control-point sequence.
///
/// Inputs left of the first point clamp to its y, right of the last point to
/// its y. Evaluation at a control point returns that point's y exactly.
pub fn interpolate_curve(points: &[CurvePoint], x: f32) -> f32 {
    debug_assert!(points.len() >= 2);
    if x <= points[0].x {
        return points[0].y;
    }
    if let Some(last) = points.last() {
        if x >= last.x {
            return last.y;
        }
    }
    for w in points.windows(2) {
        if x >= w[0].x && x <= w[1].x {
            if x == w[0].x {
                return w[0].y;
            }
            if x == w[1].x {
                return w[1].y;
            }
            let dx = w[1].x - w[0].x;
            if dx <= f32::EPSILON {
                return w[1].y;
            }
            let t = (x - w[0].x) / dx;
            return w[0].y + t * (w[1].y - w[0].y);
        }
    }
    points[points.len() - 1].y
}

/// Depth-map synthesis entry point.
#[derive(Debug)]
pub struct DepthMapGenerator;

impl DepthMapGenerator {
    /// Generate a depth map from an image.
    pub fn generate(image: &RasterImage, settings: &DepthMapSettings) -> EngraveResult<DepthMap> {
        Self::generate_with_cancel(image, settings, &CancelToken::new())
    }

    /// Generate a depth map, checking `token` between pipeline stages.
    pub fn generate_with_cancel(
        image: &RasterImage,
        settings: &DepthMapSettings,
        token: &CancelToken,
    ) -> EngraveResult<DepthMap> {
        settings.validate()?;
        if image.width == 0 || image.height == 0 {
            return Err(EngraveError::InvalidInput(format!(
                "image has zero dimension: {}x{}",
                image.width, image.height
            )));
        }

        let (w, h) = (image.width, image.height);
        debug!(width = w, height = h, curve = ?settings.depth_curve, "generating depth map");

        let lum = luminance_buffer(image, settings);
        token.checkpoint()?;

        let levels = PYRAMID_SCALES
            .par_iter()
            .map(|&scale| process_level(&lum, w, h, scale, settings, token))
            .collect::<EngraveResult<Vec<Vec<f32>>>>()?;
        token.checkpoint()?;

        let mut depth = blend_levels(&levels, w, h, settings);

        if settings.sharpness > 0.0 {
            let sigma = ((w as f32 * 0.02).floor().max(1.0)) / 3.0;
            depth = unsharp_mask(&depth, w, h, sigma, settings.sharpness);
        }
        if settings.smoothing > 0.0 {
            let sigma = settings.smoothing / 100.0 * ((w as f32 * 0.01).max(1.0));
            depth = gaussian_blur(&depth, w, h, sigma);
        }
        if settings.layers >= 2 {
            quantize_layers(&mut depth, settings.layers);
        }
        for v in &mut depth {
            *v = v.clamp(0.0, 1.0);
        }
        token.checkpoint()?;

        let normals = normal_buffer(&depth, w, h, settings.normal_strength);
        let heights: Vec<f32> = depth.iter().map(|v| v * settings.max_depth_mm).collect();

        DepthMap::new(w, h, depth, normals, heights)
            .map_err(|e| EngraveError::InvalidInput(e.to_string()))
    }
}

/// Tone-mapped luminance of every pixel, in [0, 1].
fn luminance_buffer(image: &RasterImage, settings: &DepthMapSettings) -> Vec<f32> {
    let mut out = Vec::with_capacity(image.pixel_count());
    for y in 0..image.height {
        for x in 0..image.width {
            let [r, g, b, _] = image.rgba(x, y);
            let mut lum = 0.299 * (r as f32 / 255.0)
                + 0.587 * (g as f32 / 255.0)
                + 0.114 * (b as f32 / 255.0);
            if settings.invert {
                lum = 1.0 - lum;
            }
            out.push(PowerProfileMapper::tone_map(
                lum,
                settings.contrast,
                settings.brightness,
                settings.gamma,
            ));
        }
    }
    out
}

/// Process one pyramid level and return it upsampled to full resolution.
fn process_level(
    lum: &[f32],
    w: u32,
    h: u32,
    scale: u32,
    settings: &DepthMapSettings,
    token: &CancelToken,
) -> EngraveResult<Vec<f32>> {
    token.checkpoint()?;

    let sw = w.div_ceil(scale);
    let sh = h.div_ceil(scale);
    let mut level = box_downsample(lum, w, h, scale, sw, sh);

    for v in &mut level {
        let curved = apply_depth_curve(*v, settings);
        *v = apply_contrast(curved, settings.contrast);
    }
    token.checkpoint()?;

    if settings.detail_boost > 0.0 {
        let sigma = ((sw as f32 * 0.02).floor().max(1.0)) / 3.0;
        level = unsharp_mask(&level, sw, sh, sigma, settings.detail_boost);
    }

    if scale == 1 {
        return Ok(level);
    }
    let buf = GrayF32::from_raw(sw, sh, level).expect("level buffer matches dimensions");
    let up = imageops::resize(&buf, w, h, FilterType::Triangle);
    Ok(up.into_raw())
}

/// Box-average `scale`-sided pixel blocks.
fn box_downsample(src: &[f32], w: u32, h: u32, scale: u32, sw: u32, sh: u32) -> Vec<f32> {
    if scale == 1 {
        return src.to_vec();
    }
    let mut out = Vec::with_capacity(sw as usize * sh as usize);
    for by in 0..sh {
        for bx in 0..sw {
            let x0 = bx * scale;
            let y0 = by * scale;
            let x1 = (x0 + scale).min(w);
            let y1 = (y0 + scale).min(h);
            let mut sum = 0.0;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += src[y as usize * w as usize + x as usize];
                }
            }
            out.push(sum / ((x1 - x0) * (y1 - y0)) as f32);
        }
    }
    out
}

#[inline]
fn apply_contrast(v: f32, contrast: f32) -> f32 {
    (0.5 + (v - 0.5) * (1.0 + contrast / 100.0)).clamp(0.0, 1.0)
}

#[inline]
fn apply_depth_curve(v: f32, settings: &DepthMapSettings) -> f32 {
    let v = v.clamp(0.0, 1.0);
    match settings.depth_curve {
        DepthCurve::Linear => v,
        DepthCurve::Exponential => v * v,
        DepthCurve::Logarithmic => (v * (std::f32::consts::E - 1.0) + 1.0).ln(),
        DepthCurve::Custom => {
            // Presence validated up front
            let points = settings.custom_curve.as_deref().unwrap_or(&[]);
            if points.len() < 2 {
                v
            } else {
                interpolate_curve(points, v)
            }
        }
    }
}

/// Gaussian blur through `image::imageops`.
fn gaussian_blur(buf: &[f32], w: u32, h: u32, sigma: f32) -> Vec<f32> {
    let img = GrayF32::from_raw(w, h, buf.to_vec()).expect("buffer matches dimensions");
    imageops::blur(&img, sigma.max(0.01)).into_raw()
}

/// Unsharp mask: add back `(original - blurred) * amount/100`.
fn unsharp_mask(buf: &[f32], w: u32, h: u32, sigma: f32, amount: f32) -> Vec<f32> {
    let blurred = gaussian_blur(buf, w, h, sigma);
    buf.iter()
        .zip(blurred.iter())
        .map(|(v, b)| (v + (v - b) * amount / 100.0).clamp(0.0, 1.0))
        .collect()
}

/// Blend the upsampled pyramid levels, optionally biased toward the finest
/// level at edges.
fn blend_levels(levels: &[Vec<f32>], w: u32, h: u32, settings: &DepthMapSettings) -> Vec<f32> {
    let t = settings.layer_blending.clamp(0.0, 1.0);
    let weights: Vec<f32> = (0..levels.len()).map(|i| t.powi(i as i32)).collect();
    let total: f32 = weights.iter().sum();

    let count = w as usize * h as usize;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let mut acc = 0.0;
        for (level, weight) in levels.iter().zip(weights.iter()) {
            acc += level[i] * weight;
        }
        out.push(acc / total);
    }

    if settings.preserve_edges {
        let finest = &levels[0];
        let gain = 4.0 * (1.0 + settings.edge_enhancement / 100.0);
        for y in 0..h as usize {
            for x in 0..w as usize {
                let i = y * w as usize + x;
                let gx = sample(finest, w, h, x as i64 + 1, y as i64)
                    - sample(finest, w, h, x as i64 - 1, y as i64);
                let gy = sample(finest, w, h, x as i64, y as i64 + 1)
                    - sample(finest, w, h, x as i64, y as i64 - 1);
                let edge = ((gx * gx + gy * gy).sqrt() * gain).clamp(0.0, 1.0);
                out[i] = out[i] * (1.0 - edge) + finest[i] * edge;
            }
        }
    }
    out
}

/// Snap depth values onto `layers` discrete relief levels.
fn quantize_layers(depth: &mut [f32], layers: u32) {
    let steps = (layers - 1) as f32;
    for v in depth.iter_mut() {
        *v = (*v * steps).round() / steps;
    }
}

#[inline]
fn sample(buf: &[f32], w: u32, h: u32, x: i64, y: i64) -> f32 {
    let x = x.clamp(0, w as i64 - 1) as usize;
    let y = y.clamp(0, h as i64 - 1) as usize;
    buf[y * w as usize + x]
}

/// Unit surface normals from finite-difference depth gradients.
fn normal_buffer(depth: &[f32], w: u32, h: u32, strength: f32) -> Vec<[f32; 3]> {
    let mut out = Vec::with_capacity(depth.len());
    for y in 0..h as usize {
        for x in 0..w as usize {
            let gx = (sample(depth, w, h, x as i64 + 1, y as i64)
                - sample(depth, w, h, x as i64 - 1, y as i64))
                * 0.5
                * strength;
            let gy = (sample(depth, w, h, x as i64, y as i64 + 1)
                - sample(depth, w, h, x as i64, y as i64 - 1))
                * 0.5
                * strength;
            let len = (gx * gx + gy * gy + 1.0).sqrt();
            out.push([-gx / len, -gy / len, 1.0 / len]);
        }
    }
    out
}
