//! Depth/grayscale sample to laser power, speed, and focus mapping.
//!
//! A depth sample in [0, 1] goes through the same tonal chain as the depth
//! map (gamma, then contrast, then brightness), is quantized into the
//! profile's 256-entry lookup curves, and the looked-up value is rescaled
//! into the commanded range. Registry lookup (and its `ProfileNotFound`) is
//! the caller's guard, not this module's.

use crate::error::{EngraveError, EngraveResult};
use reliefkit_profiles::{LaserProfile, MaterialProfile};

/// Tonal adjustments and power bounds applied during mapping.
#[derive(Debug, Clone, Copy)]
pub struct PowerMapOptions {
    /// Contrast adjustment in percent, same formula as depth-map synthesis.
    pub contrast: f32,
    /// Brightness adjustment in percent.
    pub brightness: f32,
    /// Gamma; samples are raised to `1/gamma`.
    pub gamma: f32,
    /// Lower commanded-power bound in percent.
    pub min_power: f32,
    /// Upper commanded-power bound in percent.
    pub max_power: f32,
}

impl Default for PowerMapOptions {
    fn default() -> Self {
        Self {
            contrast: 0.0,
            brightness: 0.0,
            gamma: 1.0,
            min_power: 0.0,
            max_power: 100.0,
        }
    }
}

/// Optical constants of the material being engraved.
#[derive(Debug, Clone, Copy)]
pub struct MaterialOptics {
    /// Effective refractive index at the working wavelength.
    pub refractive_index: f32,
    /// Stock thickness in millimeters.
    pub thickness_mm: f32,
}

impl From<&MaterialProfile> for MaterialOptics {
    fn from(profile: &MaterialProfile) -> Self {
        Self {
            refractive_index: profile.refractive_index,
            thickness_mm: profile.thickness_mm,
        }
    }
}

/// Maps depth samples through a laser profile's lookup curves.
#[derive(Debug)]
pub struct PowerProfileMapper;

impl PowerProfileMapper {
    /// Apply the tonal chain to a normalized sample: gamma, then contrast,
    /// then brightness, clamped to [0, 1].
    #[inline]
    pub fn tone_map(value: f32, contrast: f32, brightness: f32, gamma: f32) -> f32 {
        let v = value.clamp(0.0, 1.0).powf(1.0 / gamma);
        let v = 0.5 + (v - 0.5) * (1.0 + contrast / 100.0);
        (v + brightness / 100.0).clamp(0.0, 1.0)
    }

    /// Commanded power (%) for a depth/grayscale sample in [0, 1].
    ///
    /// The result always lies inside the intersection of the option bounds
    /// and the profile's own power limits.
    pub fn power_for(profile: &LaserProfile, depth_or_gray: f32, opts: &PowerMapOptions) -> f32 {
        let v = Self::tone_map(depth_or_gray, opts.contrast, opts.brightness, opts.gamma);
        let curve = profile.power_curve_at(v);
        let lo = opts.min_power.max(profile.min_power);
        let hi = opts.max_power.min(profile.max_power);
        (lo + curve * (hi - lo)).clamp(lo, hi)
    }

    /// Commanded traverse speed (mm/s) for a depth sample in [0, 1].
    ///
    /// The profile's non-increasing speed curve scales `initial` down toward
    /// deeper samples; the result never drops below `min`.
    pub fn speed_for(profile: &LaserProfile, depth_or_gray: f32, min: f32, initial: f32) -> f32 {
        let curve = profile.speed_curve_at(depth_or_gray.clamp(0.0, 1.0));
        (initial * curve).max(min)
    }

    /// Beam focus offset compensating for material optics at a given depth.
    pub fn focus_offset_for(depth: f32, material: &MaterialOptics) -> EngraveResult<f32> {
        if material.refractive_index <= 0.0 {
            return Err(EngraveError::InvalidMaterial(format!(
                "refractive index must be positive, got {}",
                material.refractive_index
            )));
        }
        Ok(depth * (1.0 - 1.0 / material.refractive_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_map_identity() {
        assert!((PowerProfileMapper::tone_map(0.5, 0.0, 0.0, 1.0) - 0.5).abs() < 1e-6);
        assert_eq!(PowerProfileMapper::tone_map(-0.5, 0.0, 0.0, 1.0), 0.0);
        assert_eq!(PowerProfileMapper::tone_map(1.5, 0.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_tone_map_contrast_pivots_on_midpoint() {
        // Midpoint is the contrast pivot
        assert!((PowerProfileMapper::tone_map(0.5, 50.0, 0.0, 1.0) - 0.5).abs() < 1e-6);
        // Values above the pivot move up, below move down
        assert!(PowerProfileMapper::tone_map(0.75, 50.0, 0.0, 1.0) > 0.75);
        assert!(PowerProfileMapper::tone_map(0.25, 50.0, 0.0, 1.0) < 0.25);
    }

    #[test]
    fn test_power_stays_within_profile_bounds() {
        let mut profile = LaserProfile::default();
        profile.min_power = 15.0;
        profile.max_power = 85.0;

        let opts = PowerMapOptions {
            min_power: 0.0,
            max_power: 100.0,
            ..Default::default()
        };

        for sample in [0.0, 0.1, 0.5, 0.9, 1.0] {
            let power = PowerProfileMapper::power_for(&profile, sample, &opts);
            assert!(power >= 15.0 && power <= 85.0, "power {} out of bounds", power);
        }
    }

    #[test]
    fn test_power_rescales_into_option_range() {
        let profile = LaserProfile::default();
        let opts = PowerMapOptions {
            min_power: 20.0,
            max_power: 60.0,
            ..Default::default()
        };

        assert!((PowerProfileMapper::power_for(&profile, 0.0, &opts) - 20.0).abs() < 1e-4);
        assert!((PowerProfileMapper::power_for(&profile, 1.0, &opts) - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_speed_floor() {
        let mut profile = LaserProfile::default();
        profile.speed_curve = reliefkit_profiles::catalog::speed_decay_curve(0.1);
        let speed = PowerProfileMapper::speed_for(&profile, 1.0, 50.0, 200.0);
        assert_eq!(speed, 50.0);

        let speed = PowerProfileMapper::speed_for(&profile, 0.0, 50.0, 200.0);
        assert_eq!(speed, 200.0);
    }

    #[test]
    fn test_focus_offset() {
        let optics = MaterialOptics {
            refractive_index: 2.0,
            thickness_mm: 3.0,
        };
        let offset = PowerProfileMapper::focus_offset_for(1.5, &optics).unwrap();
        assert!((offset - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_focus_offset_rejects_nonphysical_index() {
        let optics = MaterialOptics {
            refractive_index: 0.0,
            thickness_mm: 3.0,
        };
        let err = PowerProfileMapper::focus_offset_for(1.0, &optics).unwrap_err();
        assert!(matches!(err, EngraveError::InvalidMaterial(_)));
    }
}
