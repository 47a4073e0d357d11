//! Path-generation strategies for a single pass.
//!
//! Each strategy covers the pass's active region: the pixels whose required
//! depth exceeds the layer threshold, i.e. material not yet fully removed at
//! this layer. Coordinates are produced in millimeters; the depth map is
//! sampled in pixel space at `pixels_per_mm` resolution.

use crate::error::EngraveResult;
use crate::planner::{PathDirection, ToolpathSettings, ToolpathStrategy};
use crate::session::CancelToken;
use reliefkit_core::{BoxedIterator, DepthMap, MotionPoint};
use std::collections::HashMap;

/// An ordered run of motion points cut without lifting the beam.
pub type Polyline = Vec<MotionPoint>;

/// Read-only view of one pass over the shared depth map.
pub struct PassContext<'a> {
    pub map: &'a DepthMap,
    /// Cumulative target depth of this pass in millimeters.
    pub target_depth: f32,
    /// Active-region threshold in millimeters (`target - depth_per_pass`).
    pub threshold_mm: f32,
    /// Commanded power for every point of this pass.
    pub power: f32,
    /// Sampling resolution.
    pub pixels_per_mm: f32,
    /// Derive z from the height map instead of the flat pass depth.
    pub adaptive_z: bool,
    /// Beam-compensation erosion radius in pixels.
    pub erode_px: f32,
    /// Cancellation flag, checked between rows/rings.
    pub token: &'a CancelToken,
}

impl<'a> PassContext<'a> {
    /// Whether the pixel still needs material removed at this layer,
    /// shrunk by the tool-compensation radius.
    pub fn active(&self, x: i64, y: i64) -> bool {
        if !self.raw_active(x, y) {
            return false;
        }
        let r = self.erode_px;
        if r < 1.0 {
            return true;
        }
        let ri = r.ceil() as i64;
        for dy in -ri..=ri {
            for dx in -ri..=ri {
                if (dx * dx + dy * dy) as f32 <= r * r && !self.raw_active(x + dx, y + dy) {
                    return false;
                }
            }
        }
        true
    }

    #[inline]
    fn raw_active(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.map.width as i64 || y >= self.map.height as i64 {
            return false;
        }
        self.map.height_at(x as u32, y as u32) > self.threshold_mm
    }

    /// Required height at a pixel, with out-of-bounds reading below any
    /// threshold.
    #[inline]
    fn height_or_floor(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.map.width as i64 || y >= self.map.height as i64 {
            return self.threshold_mm - 1.0;
        }
        self.map.height_at(x as u32, y as u32)
    }

    /// Motion point at a pixel-space position.
    pub fn point(&self, x_px: f32, y_px: f32) -> MotionPoint {
        let xi = (x_px.round() as i64).clamp(0, self.map.width as i64 - 1);
        let yi = (y_px.round() as i64).clamp(0, self.map.height as i64 - 1);
        let z = if self.adaptive_z {
            -self
                .map
                .height_at(xi as u32, yi as u32)
                .min(self.target_depth)
        } else {
            -self.target_depth
        };
        MotionPoint {
            x: x_px / self.pixels_per_mm,
            y: y_px / self.pixels_per_mm,
            z,
            power: self.power,
        }
    }

    /// Normalized depth-gradient magnitude at a pixel.
    fn gradient(&self, x: i64, y: i64) -> f32 {
        let gx = (self.height_or_floor(x + 1, y) - self.height_or_floor(x - 1, y)) * 0.5;
        let gy = (self.height_or_floor(x, y + 1) - self.height_or_floor(x, y - 1)) * 0.5;
        let max_h = self.map.max_height_mm().max(f32::EPSILON);
        ((gx * gx + gy * gy).sqrt() / max_h).clamp(0.0, 1.0)
    }
}

/// Generate the path for one pass with the given raster orientation.
pub fn generate(
    strategy: ToolpathStrategy,
    ctx: &PassContext<'_>,
    settings: &ToolpathSettings,
    angle_deg: f32,
) -> EngraveResult<Vec<Polyline>> {
    let mut paths = match strategy {
        ToolpathStrategy::Contour => contour_loops(ctx)?,
        ToolpathStrategy::Spiral => spiral_path(ctx, settings)?,
        ToolpathStrategy::Hybrid => {
            let mut out = contour_loops(ctx)?;
            out.extend(spiral_path(ctx, settings)?);
            out
        }
        ToolpathStrategy::Adaptive => adaptive_raster(ctx, settings, angle_deg)?,
    };
    if settings.smoothing_factor > 0.0 {
        for path in &mut paths {
            smooth_polyline(path, settings.smoothing_factor.clamp(0.0, 1.0));
        }
    }
    Ok(paths)
}

/// Snap near-axis trigonometry so axis-aligned rasters sample exactly.
fn unit_vectors(angle_deg: f32) -> ((f32, f32), (f32, f32)) {
    let rad = angle_deg.to_radians();
    let (mut sin, mut cos) = rad.sin_cos();
    if sin.abs() < 1e-6 {
        sin = 0.0;
        cos = cos.signum();
    }
    if cos.abs() < 1e-6 {
        cos = 0.0;
        sin = sin.signum();
    }
    ((cos, sin), (-sin, cos))
}

/// Raster scan lines at an arbitrary orientation, with gradient-adaptive row
/// advance and per-point height-map z.
fn adaptive_raster(
    ctx: &PassContext<'_>,
    settings: &ToolpathSettings,
    angle_deg: f32,
) -> EngraveResult<Vec<Polyline>> {
    let (dir, norm) = unit_vectors(angle_deg);
    let w = ctx.map.width as f32;
    let h = ctx.map.height as f32;

    // Project the image corners onto the scan axes
    let corners = [(0.0, 0.0), (w - 1.0, 0.0), (0.0, h - 1.0), (w - 1.0, h - 1.0)];
    let (mut s_min, mut s_max) = (f32::MAX, f32::MIN);
    let (mut t_min, mut t_max) = (f32::MAX, f32::MIN);
    for (cx, cy) in corners {
        let s = cx * dir.0 + cy * dir.1;
        let t = cx * norm.0 + cy * norm.1;
        s_min = s_min.min(s);
        s_max = s_max.max(s);
        t_min = t_min.min(t);
        t_max = t_max.max(t);
    }

    let base_row_step = (settings.line_spacing * ctx.pixels_per_mm).max(1.0);
    let sample_step = (settings.stepover * ctx.pixels_per_mm).max(1.0);
    let bidirectional = settings.direction == PathDirection::Bidirectional;

    let mut out = Vec::new();
    let mut t = t_min;
    let mut forward = true;
    while t <= t_max + 1e-3 {
        ctx.token.checkpoint()?;
        let steps = ((s_max - s_min) / sample_step).floor() as i64;
        let range: BoxedIterator<i64> = if forward || !bidirectional {
            Box::new(0..=steps)
        } else {
            Box::new((0..=steps).rev())
        };

        let mut run: Polyline = Vec::new();
        let mut row_gradient: f32 = 0.0;
        for i in range {
            let s = s_min + i as f32 * sample_step;
            let px = s * dir.0 + t * norm.0;
            let py = s * dir.1 + t * norm.1;
            let xi = px.round() as i64;
            let yi = py.round() as i64;
            row_gradient = row_gradient.max(ctx.gradient(xi, yi));
            if ctx.active(xi, yi) {
                run.push(ctx.point(px, py));
            } else if !run.is_empty() {
                out.push(std::mem::take(&mut run));
            }
        }
        if !run.is_empty() {
            out.push(run);
        }

        // Tighter rows where the relief is steep
        t += base_row_step / (1.0 + 3.0 * row_gradient);
        if bidirectional {
            forward = !forward;
        }
    }
    Ok(out)
}

/// Iso-depth closed loops via marching squares over the active threshold.
fn contour_loops(ctx: &PassContext<'_>) -> EngraveResult<Vec<Polyline>> {
    let thr = ctx.threshold_mm.max(f32::EPSILON);
    let w = ctx.map.width as i64;
    let h = ctx.map.height as i64;

    let value = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            thr - 1.0
        } else {
            ctx.map.height_at(x as u32, y as u32)
        }
    };

    let interp = |xa: i64, ya: i64, xb: i64, yb: i64| -> (f32, f32) {
        let va = value(xa, ya);
        let vb = value(xb, yb);
        let t = if (vb - va).abs() <= f32::EPSILON {
            0.5
        } else {
            ((thr - va) / (vb - va)).clamp(0.0, 1.0)
        };
        (
            xa as f32 + t * (xb - xa) as f32,
            ya as f32 + t * (yb - ya) as f32,
        )
    };

    // One cell ring of padding so fully-active regions still close their
    // perimeter loop.
    let mut segments: Vec<((f32, f32), (f32, f32))> = Vec::new();
    for y in -1..h {
        ctx.token.checkpoint()?;
        for x in -1..w {
            let tl = value(x, y) > thr;
            let tr = value(x + 1, y) > thr;
            let br = value(x + 1, y + 1) > thr;
            let bl = value(x, y + 1) > thr;
            let case =
                (tl as usize) | ((tr as usize) << 1) | ((br as usize) << 2) | ((bl as usize) << 3);
            if case == 0 || case == 15 {
                continue;
            }

            let top = || interp(x, y, x + 1, y);
            let right = || interp(x + 1, y, x + 1, y + 1);
            let bottom = || interp(x, y + 1, x + 1, y + 1);
            let left = || interp(x, y, x, y + 1);

            match case {
                1 | 14 => segments.push((left(), top())),
                2 | 13 => segments.push((top(), right())),
                3 | 12 => segments.push((left(), right())),
                4 | 11 => segments.push((right(), bottom())),
                6 | 9 => segments.push((top(), bottom())),
                7 | 8 => segments.push((left(), bottom())),
                5 => {
                    segments.push((left(), top()));
                    segments.push((right(), bottom()));
                }
                10 => {
                    segments.push((top(), right()));
                    segments.push((left(), bottom()));
                }
                _ => unreachable!(),
            }
        }
    }

    Ok(chain_segments(ctx, segments))
}

/// Chain marching-squares segments into closed loops.
///
/// Segments are undirected; the walk continues through whichever unused
/// segment shares an endpoint with the cursor.
fn chain_segments(
    ctx: &PassContext<'_>,
    segments: Vec<((f32, f32), (f32, f32))>,
) -> Vec<Polyline> {
    let key = |p: (f32, f32)| -> (i64, i64) {
        ((p.0 * 1024.0).round() as i64, (p.1 * 1024.0).round() as i64)
    };

    let mut by_endpoint: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_endpoint.entry(key(seg.0)).or_default().push(i);
        by_endpoint.entry(key(seg.1)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut loops = Vec::new();

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let origin = segments[start_idx].0;
        let mut points = vec![segments[start_idx].0, segments[start_idx].1];
        let mut cursor = segments[start_idx].1;

        while key(cursor) != key(origin) {
            let Some(candidates) = by_endpoint.get(&key(cursor)) else {
                break;
            };
            let Some(&next) = candidates.iter().find(|&&i| !used[i]) else {
                break;
            };
            used[next] = true;
            let (a, b) = segments[next];
            cursor = if key(a) == key(cursor) { b } else { a };
            points.push(cursor);
        }

        if points.len() >= 3 {
            loops.push(points.into_iter().map(|(x, y)| ctx.point(x, y)).collect());
        }
    }
    loops
}

/// A single continuous inward rectangular spiral over the active region's
/// bounding box, split where it leaves the region.
fn spiral_path(ctx: &PassContext<'_>, settings: &ToolpathSettings) -> EngraveResult<Vec<Polyline>> {
    let Some((mut x0, mut y0, mut x1, mut y1)) = active_bounds(ctx) else {
        return Ok(Vec::new());
    };

    let inset = (settings.line_spacing * ctx.pixels_per_mm).max(1.0);
    let sample_step = (settings.stepover * ctx.pixels_per_mm).max(1.0);

    let mut out = Vec::new();
    let mut run: Polyline = Vec::new();

    let emit = |px: f32, py: f32, run: &mut Polyline, out: &mut Vec<Polyline>| {
        if ctx.active(px.round() as i64, py.round() as i64) {
            run.push(ctx.point(px, py));
        } else if !run.is_empty() {
            out.push(std::mem::take(run));
        }
    };

    while x0 <= x1 && y0 <= y1 {
        ctx.token.checkpoint()?;
        let mut s = x0;
        while s <= x1 {
            emit(s, y0, &mut run, &mut out);
            s += sample_step;
        }
        let mut s = y0 + inset;
        while s <= y1 {
            emit(x1, s, &mut run, &mut out);
            s += sample_step;
        }
        if y1 > y0 {
            let mut s = x1 - inset;
            while s >= x0 {
                emit(s, y1, &mut run, &mut out);
                s -= sample_step;
            }
        }
        if x1 > x0 {
            let mut s = y1 - inset;
            while s >= y0 + inset {
                emit(x0, s, &mut run, &mut out);
                s -= sample_step;
            }
        }
        x0 += inset;
        y0 += inset;
        x1 -= inset;
        y1 -= inset;
    }

    if !run.is_empty() {
        out.push(run);
    }
    Ok(out)
}

/// Pixel bounding box of the active region.
fn active_bounds(ctx: &PassContext<'_>) -> Option<(f32, f32, f32, f32)> {
    let mut bounds: Option<(i64, i64, i64, i64)> = None;
    for y in 0..ctx.map.height as i64 {
        for x in 0..ctx.map.width as i64 {
            if ctx.raw_active(x, y) {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
    }
    bounds.map(|(x0, y0, x1, y1)| (x0 as f32, y0 as f32, x1 as f32, y1 as f32))
}

/// In-place endpoint-preserving moving-average smoothing.
fn smooth_polyline(path: &mut Polyline, factor: f32) {
    if path.len() < 3 {
        return;
    }
    let original = path.clone();
    for i in 1..path.len() - 1 {
        let avg_x = (original[i - 1].x + original[i].x + original[i + 1].x) / 3.0;
        let avg_y = (original[i - 1].y + original[i].y + original[i + 1].y) / 3.0;
        path[i].x = original[i].x + (avg_x - original[i].x) * factor;
        path[i].y = original[i].y + (avg_y - original[i].y) * factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ToolpathSettings;
    use reliefkit_core::DepthMap;

    fn uniform_map(w: u32, h: u32, height_mm: f32) -> DepthMap {
        let count = (w * h) as usize;
        DepthMap::new(
            w,
            h,
            vec![1.0; count],
            vec![[0.0, 0.0, 1.0]; count],
            vec![height_mm; count],
        )
        .unwrap()
    }

    fn ctx<'a>(
        map: &'a DepthMap,
        token: &'a CancelToken,
        target: f32,
        threshold: f32,
    ) -> PassContext<'a> {
        PassContext {
            map,
            target_depth: target,
            threshold_mm: threshold,
            power: 50.0,
            pixels_per_mm: 1.0,
            adaptive_z: false,
            erode_px: 0.0,
            token,
        }
    }

    #[test]
    fn test_adaptive_raster_covers_uniform_region() {
        let map = uniform_map(8, 8, 1.0);
        let token = CancelToken::new();
        let settings = ToolpathSettings::default();
        let c = ctx(&map, &token, 0.5, 0.0);
        let paths = adaptive_raster(&c, &settings, 0.0).unwrap();
        assert!(!paths.is_empty());
        let total: usize = paths.iter().map(|p| p.len()).sum();
        assert!(total >= 8, "expected full rows of points, got {}", total);
        for p in paths.iter().flat_map(|p| p.iter()) {
            assert_eq!(p.z, -0.5);
            assert_eq!(p.power, 50.0);
        }
    }

    #[test]
    fn test_axis_aligned_rasters_match_on_square_region() {
        let map = uniform_map(10, 10, 1.0);
        let token = CancelToken::new();
        let settings = ToolpathSettings::default();
        let c = ctx(&map, &token, 0.5, 0.0);
        let horizontal: usize = adaptive_raster(&c, &settings, 0.0)
            .unwrap()
            .iter()
            .map(|p| p.len())
            .sum();
        let vertical: usize = adaptive_raster(&c, &settings, 90.0)
            .unwrap()
            .iter()
            .map(|p| p.len())
            .sum();
        assert_eq!(horizontal, vertical);
    }

    #[test]
    fn test_contour_produces_closed_perimeter_loop() {
        let map = uniform_map(6, 6, 1.0);
        let token = CancelToken::new();
        let c = ctx(&map, &token, 0.5, 0.0);
        let loops = contour_loops(&c).unwrap();
        assert_eq!(loops.len(), 1, "uniform region has a single perimeter loop");
        assert!(loops[0].len() >= 4);
    }

    #[test]
    fn test_empty_region_yields_no_paths() {
        let map = uniform_map(6, 6, 0.2);
        let token = CancelToken::new();
        let settings = ToolpathSettings::default();
        // Threshold above every height: nothing left to cut
        let c = ctx(&map, &token, 1.0, 0.5);
        assert!(adaptive_raster(&c, &settings, 0.0).unwrap().is_empty());
        assert!(contour_loops(&c).unwrap().is_empty());
        assert!(spiral_path(&c, &settings).unwrap().is_empty());
    }

    #[test]
    fn test_spiral_is_mostly_continuous_on_uniform_region() {
        let map = uniform_map(12, 12, 1.0);
        let token = CancelToken::new();
        let settings = ToolpathSettings::default();
        let c = ctx(&map, &token, 0.5, 0.0);
        let paths = spiral_path(&c, &settings).unwrap();
        assert_eq!(paths.len(), 1, "uniform region spirals without lifting");
        assert!(paths[0].len() > 12);
    }

    #[test]
    fn test_cancelled_token_stops_generation() {
        let map = uniform_map(8, 8, 1.0);
        let token = CancelToken::new();
        token.cancel();
        let settings = ToolpathSettings::default();
        let c = ctx(&map, &token, 0.5, 0.0);
        assert!(adaptive_raster(&c, &settings, 0.0).is_err());
        assert!(contour_loops(&c).is_err());
        assert!(spiral_path(&c, &settings).is_err());
    }

    #[test]
    fn test_unidirectional_rows_share_direction() {
        let map = uniform_map(8, 8, 1.0);
        let token = CancelToken::new();
        let mut settings = ToolpathSettings::default();
        settings.direction = PathDirection::Unidirectional;
        let c = ctx(&map, &token, 0.5, 0.0);
        let paths = adaptive_raster(&c, &settings, 0.0).unwrap();
        for row in &paths {
            if row.len() >= 2 {
                assert!(row.last().unwrap().x >= row[0].x);
            }
        }
    }

    #[test]
    fn test_smoothing_preserves_endpoints() {
        let mut path: Polyline = vec![
            MotionPoint { x: 0.0, y: 0.0, z: -0.5, power: 50.0 },
            MotionPoint { x: 1.0, y: 5.0, z: -0.5, power: 50.0 },
            MotionPoint { x: 2.0, y: 0.0, z: -0.5, power: 50.0 },
        ];
        smooth_polyline(&mut path, 1.0);
        assert_eq!(path[0].x, 0.0);
        assert_eq!(path[2].x, 2.0);
        assert!(path[1].y < 5.0, "interior point pulled toward neighbors");
    }
}
