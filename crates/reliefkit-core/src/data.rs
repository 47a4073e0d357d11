//! Shared data model for the engraving engine.
//!
//! These are the buffers that cross the engine boundary: the raster image
//! supplied by an image-loading collaborator, the depth/normal/height maps
//! produced by depth-map synthesis, and the motion passes handed to preview
//! and export collaborators. All of them are immutable once constructed.

use crate::error::{DataError, DataResult};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// An owned RGBA pixel buffer.
///
/// The engine never loads files itself; callers decode an image up front and
/// hand over the raw bytes (4 per pixel, row-major).
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create a raster image from raw RGBA bytes.
    ///
    /// Fails if either dimension is zero or the buffer length does not match
    /// `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> DataResult<Self> {
        if width == 0 || height == 0 {
            return Err(DataError::InvalidDimensions(format!(
                "{}x{} image",
                width, height
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(DataError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a raster image from a decoded [`DynamicImage`].
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        }
    }

    /// RGBA bytes of the pixel at `(x, y)`.
    #[inline]
    pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Number of pixels in the buffer.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Normalized depth map plus derived normal and height buffers.
///
/// `depth` holds per-pixel material-removal depth in `[0, 1]`, `normals`
/// holds unit surface normals, and `heights` holds `depth` scaled into
/// millimeters (`[0, max_depth]`). Produced once per request and shared
/// read-only across pass workers.
#[derive(Debug, Clone)]
pub struct DepthMap {
    pub width: u32,
    pub height: u32,
    pub depth: Vec<f32>,
    pub normals: Vec<[f32; 3]>,
    pub heights: Vec<f32>,
}

impl DepthMap {
    /// Assemble a depth map from its three buffers, validating sizes.
    pub fn new(
        width: u32,
        height: u32,
        depth: Vec<f32>,
        normals: Vec<[f32; 3]>,
        heights: Vec<f32>,
    ) -> DataResult<Self> {
        if width == 0 || height == 0 {
            return Err(DataError::InvalidDimensions(format!(
                "{}x{} depth map",
                width, height
            )));
        }
        let expected = width as usize * height as usize;
        for len in [depth.len(), normals.len(), heights.len()] {
            if len != expected {
                return Err(DataError::BufferSizeMismatch {
                    expected,
                    actual: len,
                });
            }
        }
        Ok(Self {
            width,
            height,
            depth,
            normals,
            heights,
        })
    }

    /// Normalized depth at `(x, y)`.
    #[inline]
    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[y as usize * self.width as usize + x as usize]
    }

    /// Height in millimeters at `(x, y)`.
    #[inline]
    pub fn height_at(&self, x: u32, y: u32) -> f32 {
        self.heights[y as usize * self.width as usize + x as usize]
    }

    /// Unit surface normal at `(x, y)`.
    #[inline]
    pub fn normal_at(&self, x: u32, y: u32) -> [f32; 3] {
        self.normals[y as usize * self.width as usize + x as usize]
    }

    /// Largest height value in millimeters, i.e. the deepest cut the map
    /// asks for.
    pub fn max_height_mm(&self) -> f32 {
        self.heights.iter().copied().fold(0.0, f32::max)
    }
}

/// A single laser motion point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionPoint {
    /// X coordinate in millimeters.
    pub x: f32,
    /// Y coordinate in millimeters.
    pub y: f32,
    /// Z coordinate in millimeters (negative below the material surface).
    pub z: f32,
    /// Commanded laser power for this point (% of profile max).
    pub power: f32,
}

/// One complete engraving sweep at a fixed target depth, power, and speed.
///
/// Passes are produced in increasing depth order and are immutable once
/// returned; ownership transfers to the caller (typically the export or
/// preview layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pass {
    /// 1-based pass index.
    pub index: u32,
    /// Cumulative target depth in millimeters.
    pub target_depth: f32,
    /// Commanded power (% of profile max).
    pub power: f32,
    /// Commanded traverse speed in mm/s.
    pub speed: f32,
    /// Beam focus offset in millimeters.
    pub focus_offset: f32,
    /// Ordered motion points for this sweep.
    pub points: Vec<MotionPoint>,
}

impl Pass {
    /// Total cutting distance over the pass's point sequence.
    pub fn cut_length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|w| {
                let dx = w[1].x - w[0].x;
                let dy = w[1].y - w[0].y;
                (dx * dx + dy * dy).sqrt()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_image_rejects_zero_dimensions() {
        assert!(RasterImage::from_rgba(0, 4, vec![]).is_err());
        assert!(RasterImage::from_rgba(4, 0, vec![]).is_err());
    }

    #[test]
    fn test_raster_image_rejects_short_buffer() {
        let err = RasterImage::from_rgba(2, 2, vec![0u8; 8]).unwrap_err();
        assert!(matches!(err, DataError::BufferSizeMismatch { .. }));
    }

    #[test]
    fn test_raster_image_pixel_access() {
        let mut pixels = vec![0u8; 2 * 2 * 4];
        // Pixel (1, 1) set to opaque red
        pixels[12..16].copy_from_slice(&[255, 0, 0, 255]);
        let img = RasterImage::from_rgba(2, 2, pixels).unwrap();
        assert_eq!(img.rgba(1, 1), [255, 0, 0, 255]);
        assert_eq!(img.rgba(0, 0), [0, 0, 0, 0]);
        assert_eq!(img.pixel_count(), 4);
    }

    #[test]
    fn test_raster_image_from_decoded_image() {
        let img = DynamicImage::new_rgb8(3, 2);
        let raster = RasterImage::from_image(&img);
        assert_eq!(raster.width, 3);
        assert_eq!(raster.height, 2);
        assert_eq!(raster.pixels.len(), 3 * 2 * 4);
        // RGB expands to opaque RGBA
        assert_eq!(raster.rgba(0, 0)[3], 255);
    }

    #[test]
    fn test_depth_map_buffer_validation() {
        let err = DepthMap::new(2, 2, vec![0.0; 3], vec![[0.0; 3]; 4], vec![0.0; 4]).unwrap_err();
        assert!(matches!(err, DataError::BufferSizeMismatch { .. }));

        let map = DepthMap::new(
            2,
            2,
            vec![0.25; 4],
            vec![[0.0, 0.0, 1.0]; 4],
            vec![0.5; 4],
        )
        .unwrap();
        assert_eq!(map.depth_at(1, 0), 0.25);
        assert_eq!(map.max_height_mm(), 0.5);
    }

    #[test]
    fn test_pass_cut_length() {
        let pass = Pass {
            index: 1,
            target_depth: 0.5,
            power: 40.0,
            speed: 100.0,
            focus_offset: 0.0,
            points: vec![
                MotionPoint {
                    x: 0.0,
                    y: 0.0,
                    z: -0.5,
                    power: 40.0,
                },
                MotionPoint {
                    x: 3.0,
                    y: 4.0,
                    z: -0.5,
                    power: 40.0,
                },
            ],
        };
        assert!((pass.cut_length() - 5.0).abs() < 1e-6);
    }
}
