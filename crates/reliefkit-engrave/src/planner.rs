//! Progressive multi-layer toolpath planning.
//!
//! Turns a depth map and a laser profile into an ordered list of passes.
//! Each pass deepens the cut by one layer: target depth steps linearly,
//! power ramps up, speed decays geometrically, and the per-pass geometry is
//! produced by the selected strategy over the not-yet-removed region.
//! Passes compute in parallel on the rayon pool but are always returned
//! sorted by pass index.

use crate::depth_map::DepthMapSettings;
use crate::error::{EngraveError, EngraveResult, ParameterError, ParameterResult};
use crate::optimizer;
use crate::session::CancelToken;
use crate::strategy::{self, PassContext};
use rayon::prelude::*;
use reliefkit_core::{DepthMap, Pass};
use reliefkit_profiles::LaserProfile;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info};

/// Pass geometry strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolpathStrategy {
    /// Iso-depth contour loops
    Contour,
    /// Single continuous inward spiral
    Spiral,
    /// Contour perimeter plus spiral infill
    Hybrid,
    /// Gradient-adaptive raster with height-map z
    Adaptive,
}

impl Default for ToolpathStrategy {
    fn default() -> Self {
        Self::Adaptive
    }
}

impl std::fmt::Display for ToolpathStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contour => write!(f, "contour"),
            Self::Spiral => write!(f, "spiral"),
            Self::Hybrid => write!(f, "hybrid"),
            Self::Adaptive => write!(f, "adaptive"),
        }
    }
}

/// Scan travel direction across adjacent raster lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathDirection {
    /// Adjacent lines reverse travel direction (serpentine).
    Bidirectional,
    /// Every line travels the same direction with retraced returns.
    Unidirectional,
}

impl Default for PathDirection {
    fn default() -> Self {
        Self::Bidirectional
    }
}

/// Travel-optimization effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// Fewest reorder iterations
    Speed,
    /// Most reorder iterations
    Quality,
    /// Middle ground
    Balanced,
}

impl Default for OptimizationLevel {
    fn default() -> Self {
        Self::Balanced
    }
}

/// Per-pass power progression: starts at `initial` and climbs by
/// `increment` each pass, clamped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerRamp {
    pub initial: f32,
    pub increment: f32,
    pub max: f32,
}

impl Default for PowerRamp {
    fn default() -> Self {
        Self {
            initial: 30.0,
            increment: 5.0,
            max: 90.0,
        }
    }
}

/// Per-pass speed progression: geometric decay from `initial` by
/// `reduction` each pass, floored at `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedProfile {
    pub initial: f32,
    pub reduction: f32,
    pub min: f32,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            initial: 300.0,
            reduction: 0.9,
            min: 50.0,
        }
    }
}

/// Toolpath planning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolpathSettings {
    pub strategy: ToolpathStrategy,
    pub direction: PathDirection,
    /// Spacing between adjacent scan lines in millimeters.
    pub line_spacing: f32,
    /// Raster orientation in degrees.
    pub angle: f32,
    /// Point pitch along a scan line in millimeters.
    pub stepover: f32,
    /// Beam-radius compensation in millimeters; shrinks the active region.
    pub tool_compensation: f32,
    /// Path smoothing strength in [0, 1].
    pub smoothing_factor: f32,
    pub optimization_level: OptimizationLevel,
    /// Add a rotated reinforcement path to every pass.
    pub crosshatch: bool,
    /// Rotation of the reinforcement path in degrees.
    pub crosshatch_angle: f32,
    /// Material removed per pass in millimeters; sets the active-region
    /// threshold.
    pub depth_per_pass: f32,
    /// Hard cap on the number of passes.
    pub max_passes: u32,
    /// Number of depth layers the engraving is divided into.
    pub pass_layers: u32,
    pub power_ramp: PowerRamp,
    pub speed_profile: SpeedProfile,
    /// Depth-map sampling resolution in pixels per millimeter.
    pub pixels_per_mm: f32,
}

impl Default for ToolpathSettings {
    fn default() -> Self {
        Self {
            strategy: ToolpathStrategy::default(),
            direction: PathDirection::default(),
            line_spacing: 0.1,
            angle: 0.0,
            stepover: 0.1,
            tool_compensation: 0.0,
            smoothing_factor: 0.0,
            optimization_level: OptimizationLevel::default(),
            crosshatch: false,
            crosshatch_angle: 90.0,
            depth_per_pass: 0.5,
            max_passes: 10,
            pass_layers: 4,
            power_ramp: PowerRamp::default(),
            speed_profile: SpeedProfile::default(),
            pixels_per_mm: 10.0,
        }
    }
}

impl ToolpathSettings {
    /// Validate against the depth settings the map was produced with. Runs
    /// before any worker dispatch.
    pub fn validate(&self, depth: &DepthMapSettings) -> ParameterResult<()> {
        if depth.max_depth_mm <= 0.0 {
            return Err(ParameterError::OutOfRange {
                name: "max_depth_mm".to_string(),
                value: depth.max_depth_mm as f64,
                min: 0.0,
                max: 1000.0,
            });
        }
        if self.pass_layers < 1 {
            return Err(ParameterError::InvalidValue {
                name: "pass_layers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_passes < 1 {
            return Err(ParameterError::InvalidValue {
                name: "max_passes".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.depth_per_pass <= 0.0 {
            return Err(ParameterError::OutOfRange {
                name: "depth_per_pass".to_string(),
                value: self.depth_per_pass as f64,
                min: 0.0,
                max: 100.0,
            });
        }
        if self.power_ramp.initial > self.power_ramp.max {
            return Err(ParameterError::Incompatible(format!(
                "power ramp initial {} exceeds max {}",
                self.power_ramp.initial, self.power_ramp.max
            )));
        }
        if self.power_ramp.increment < 0.0 {
            return Err(ParameterError::OutOfRange {
                name: "power_ramp.increment".to_string(),
                value: self.power_ramp.increment as f64,
                min: 0.0,
                max: 100.0,
            });
        }
        if self.speed_profile.initial < self.speed_profile.min {
            return Err(ParameterError::Incompatible(format!(
                "speed profile initial {} below min {}",
                self.speed_profile.initial, self.speed_profile.min
            )));
        }
        if !(0.0..=1.0).contains(&self.speed_profile.reduction)
            || self.speed_profile.reduction == 0.0
        {
            return Err(ParameterError::OutOfRange {
                name: "speed_profile.reduction".to_string(),
                value: self.speed_profile.reduction as f64,
                min: 0.0,
                max: 1.0,
            });
        }
        for (name, value) in [
            ("line_spacing", self.line_spacing),
            ("stepover", self.stepover),
            ("pixels_per_mm", self.pixels_per_mm),
        ] {
            if value <= 0.0 {
                return Err(ParameterError::OutOfRange {
                    name: name.to_string(),
                    value: value as f64,
                    min: 0.0,
                    max: 1000.0,
                });
            }
        }
        if self.tool_compensation < 0.0 {
            return Err(ParameterError::OutOfRange {
                name: "tool_compensation".to_string(),
                value: self.tool_compensation as f64,
                min: 0.0,
                max: 100.0,
            });
        }
        if !(0.0..=1.0).contains(&self.smoothing_factor) {
            return Err(ParameterError::OutOfRange {
                name: "smoothing_factor".to_string(),
                value: self.smoothing_factor as f64,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

struct PassSpec {
    index: u32,
    target_depth: f32,
    power: f32,
    speed: f32,
    focus_offset: f32,
}

/// Multi-pass toolpath planning entry point.
#[derive(Debug)]
pub struct ToolpathPlanner;

impl ToolpathPlanner {
    /// Plan the ordered pass list for a depth map.
    pub fn plan(
        depth_map: &DepthMap,
        laser: &LaserProfile,
        depth_settings: &DepthMapSettings,
        toolpath_settings: &ToolpathSettings,
    ) -> EngraveResult<Vec<Pass>> {
        Self::plan_with_cancel(
            depth_map,
            laser,
            depth_settings,
            toolpath_settings,
            &CancelToken::new(),
        )
    }

    /// Plan the ordered pass list, checking `token` as passes compute.
    ///
    /// Cancellation aborts in-flight workers promptly and yields
    /// [`EngraveError::Cancelled`] instead of a partial pass list.
    pub fn plan_with_cancel(
        depth_map: &DepthMap,
        laser: &LaserProfile,
        depth_settings: &DepthMapSettings,
        toolpath_settings: &ToolpathSettings,
        token: &CancelToken,
    ) -> EngraveResult<Vec<Pass>> {
        toolpath_settings.validate(depth_settings)?;
        token.checkpoint()?;

        let pass_count = toolpath_settings
            .pass_layers
            .min(toolpath_settings.max_passes);
        let depth_step = depth_settings.max_depth_mm / toolpath_settings.pass_layers as f32;

        let specs: Vec<PassSpec> = (0..pass_count)
            .map(|p| {
                let ramp = &toolpath_settings.power_ramp;
                let speed = &toolpath_settings.speed_profile;
                let target_depth = (p + 1) as f32 * depth_step;
                PassSpec {
                    index: p + 1,
                    target_depth,
                    power: (ramp.initial + ramp.increment * p as f32)
                        .min(ramp.max)
                        .min(laser.max_power)
                        .max(laser.min_power),
                    speed: (speed.initial * speed.reduction.powi(p as i32)).max(speed.min),
                    focus_offset: target_depth * laser.focus_factor,
                }
            })
            .collect();

        info!(
            passes = pass_count,
            strategy = %toolpath_settings.strategy,
            max_depth = depth_settings.max_depth_mm,
            crosshatch = toolpath_settings.crosshatch,
            "planning toolpath"
        );

        let results: Vec<EngraveResult<Pass>> = specs
            .par_iter()
            .map(|spec| Self::build_pass(depth_map, spec, toolpath_settings, token))
            .collect();

        if token.is_cancelled() {
            return Err(EngraveError::Cancelled);
        }
        let mut passes = results.into_iter().collect::<EngraveResult<Vec<Pass>>>()?;
        passes.sort_by_key(|p| p.index);
        Ok(passes)
    }

    fn build_pass(
        depth_map: &DepthMap,
        spec: &PassSpec,
        settings: &ToolpathSettings,
        token: &CancelToken,
    ) -> EngraveResult<Pass> {
        token.checkpoint()?;

        let ctx = PassContext {
            map: depth_map,
            target_depth: spec.target_depth,
            threshold_mm: spec.target_depth - settings.depth_per_pass,
            power: spec.power,
            pixels_per_mm: settings.pixels_per_mm,
            adaptive_z: settings.strategy == ToolpathStrategy::Adaptive,
            erode_px: settings.tool_compensation * settings.pixels_per_mm,
            token,
        };

        // A geometry panic must abort the whole plan with one error, never a
        // truncated toolpath.
        let generated = catch_unwind(AssertUnwindSafe(
            || -> EngraveResult<Vec<strategy::Polyline>> {
                let mut primary =
                    strategy::generate(settings.strategy, &ctx, settings, settings.angle)?;
                primary = optimizer::optimize(primary, settings.optimization_level);

                if settings.crosshatch {
                    let mut reinforcement = strategy::generate(
                        settings.strategy,
                        &ctx,
                        settings,
                        settings.angle + settings.crosshatch_angle,
                    )?;
                    reinforcement =
                        optimizer::optimize(reinforcement, settings.optimization_level);
                    // Concatenated after the primary path, never interleaved
                    primary.extend(reinforcement);
                }
                Ok(primary)
            },
        ))
        .map_err(|_| {
            EngraveError::GenerationFailed(format!(
                "path generation panicked on pass {}",
                spec.index
            ))
        })??;
        token.checkpoint()?;

        let points: Vec<_> = generated.into_iter().flatten().collect();
        debug!(
            pass = spec.index,
            points = points.len(),
            power = spec.power,
            speed = spec.speed,
            "pass generated"
        );

        Ok(Pass {
            index: spec.index,
            target_depth: spec.target_depth,
            power: spec.power,
            speed: spec.speed,
            focus_offset: spec.focus_offset,
            points,
        })
    }

    /// Rough wall-clock estimate for a planned pass list, in seconds.
    pub fn estimate_time(passes: &[Pass]) -> f32 {
        let cutting: f32 = passes
            .iter()
            .map(|p| p.cut_length() / p.speed.max(f32::EPSILON))
            .sum();
        // Fixed repositioning overhead per pass
        cutting + passes.len() as f32 * 0.5
    }
}
