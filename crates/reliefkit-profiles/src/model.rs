//! Profile data model: laser sources and engraving materials.

use crate::error::{ProfileError, ProfileResult};
use serde::{Deserialize, Serialize};

/// Number of entries in a power or speed lookup curve.
pub const CURVE_LEN: usize = 256;

/// Laser source family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaserType {
    /// Fiber laser (typically 1064 nm, metal marking/engraving)
    Fiber,
    /// CO2 laser (typically 10600 nm, organics)
    Co2,
    /// Diode laser (typically 450 nm, hobby-class)
    Diode,
}

impl Default for LaserType {
    fn default() -> Self {
        Self::Fiber
    }
}

impl std::fmt::Display for LaserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fiber => write!(f, "Fiber"),
            Self::Co2 => write!(f, "CO2"),
            Self::Diode => write!(f, "Diode"),
        }
    }
}

/// Assist gas fed through the nozzle during engraving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistGas {
    /// Compressed air
    Air,
    /// Nitrogen (oxide-free edges)
    Nitrogen,
    /// Oxygen (faster cutting of mild steel)
    Oxygen,
}

impl std::fmt::Display for AssistGas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Air => write!(f, "Air"),
            Self::Nitrogen => write!(f, "Nitrogen"),
            Self::Oxygen => write!(f, "Oxygen"),
        }
    }
}

/// MOPA pulse-shape settings for sources that expose waveform selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MopaSettings {
    /// Waveform slot on the source controller.
    pub waveform: u8,
    /// Pulse duration in nanoseconds.
    pub pulse_width_ns: f32,
}

/// A laser source profile.
///
/// Carries the physical limits and the 256-entry power/speed lookup curves
/// the engine maps depth samples through. Immutable once registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserProfile {
    pub name: String,
    pub laser_type: LaserType,
    /// Rated output power in watts.
    pub rated_power_w: f32,
    /// Emission wavelength in nanometers.
    pub wavelength_nm: f32,
    /// Minimum usable power in percent of rated power.
    pub min_power: f32,
    /// Maximum usable power in percent of rated power.
    pub max_power: f32,
    /// Focal height above the material surface in millimeters.
    pub focus_height_mm: f32,
    /// Beam diameter at focus in millimeters.
    pub beam_diameter_mm: f32,
    /// Per-depth focus compensation factor applied by the planner.
    pub focus_factor: f32,
    /// 256-entry monotonic non-decreasing power lookup curve over [0, 1].
    pub power_curve: Vec<f32>,
    /// 256-entry monotonic non-increasing speed lookup curve over [0, 1].
    pub speed_curve: Vec<f32>,
    /// Pulse repetition rate in kilohertz.
    pub pulse_frequency_khz: f32,
    /// Pulse width in nanoseconds.
    pub pulse_width_ns: f32,
    pub assist_gas: Option<AssistGas>,
    pub mopa: Option<MopaSettings>,
}

impl Default for LaserProfile {
    fn default() -> Self {
        Self {
            name: "New Laser".to_string(),
            laser_type: LaserType::default(),
            rated_power_w: 50.0,
            wavelength_nm: 1064.0,
            min_power: 0.0,
            max_power: 100.0,
            focus_height_mm: 0.0,
            beam_diameter_mm: 0.05,
            focus_factor: 0.33,
            power_curve: identity_curve(),
            speed_curve: unity_curve(),
            pulse_frequency_khz: 30.0,
            pulse_width_ns: 200.0,
            assist_gas: None,
            mopa: None,
        }
    }
}

impl LaserProfile {
    /// Validate physical limits and lookup curves.
    pub fn validate(&self) -> ProfileResult<()> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::InvalidProfile("name is empty".to_string()));
        }
        if self.rated_power_w <= 0.0 {
            return Err(ProfileError::InvalidProfile(
                "rated power must be positive".to_string(),
            ));
        }
        if self.min_power < 0.0 || self.max_power > 100.0 || self.min_power > self.max_power {
            return Err(ProfileError::InvalidProfile(format!(
                "power bounds {}..{} out of order",
                self.min_power, self.max_power
            )));
        }
        if self.beam_diameter_mm <= 0.0 {
            return Err(ProfileError::InvalidProfile(
                "beam diameter must be positive".to_string(),
            ));
        }
        validate_curve(&self.name, "power", &self.power_curve, Monotonic::NonDecreasing)?;
        validate_curve(&self.name, "speed", &self.speed_curve, Monotonic::NonIncreasing)?;
        Ok(())
    }

    /// Look up the power-curve entry for a normalized input in [0, 1].
    #[inline]
    pub fn power_curve_at(&self, value: f32) -> f32 {
        curve_at(&self.power_curve, value)
    }

    /// Look up the speed-curve entry for a normalized input in [0, 1].
    #[inline]
    pub fn speed_curve_at(&self, value: f32) -> f32 {
        curve_at(&self.speed_curve, value)
    }
}

#[inline]
fn curve_at(curve: &[f32], value: f32) -> f32 {
    let idx = (value.clamp(0.0, 1.0) * 255.0).floor() as usize;
    curve[idx.min(CURVE_LEN - 1)]
}

enum Monotonic {
    NonDecreasing,
    NonIncreasing,
}

fn validate_curve(
    profile: &str,
    which: &str,
    curve: &[f32],
    direction: Monotonic,
) -> ProfileResult<()> {
    if curve.len() != CURVE_LEN {
        return Err(ProfileError::InvalidCurve {
            name: profile.to_string(),
            reason: format!("{} curve must have {} entries, got {}", which, CURVE_LEN, curve.len()),
        });
    }
    let ok = match direction {
        Monotonic::NonDecreasing => curve.windows(2).all(|w| w[1] >= w[0]),
        Monotonic::NonIncreasing => curve.windows(2).all(|w| w[1] <= w[0]),
    };
    if !ok {
        let dir = match direction {
            Monotonic::NonDecreasing => "non-decreasing",
            Monotonic::NonIncreasing => "non-increasing",
        };
        return Err(ProfileError::InvalidCurve {
            name: profile.to_string(),
            reason: format!("{} curve must be {}", which, dir),
        });
    }
    Ok(())
}

/// The identity lookup curve: entry `i` maps to `i / 255`.
pub fn identity_curve() -> Vec<f32> {
    (0..CURVE_LEN).map(|i| i as f32 / 255.0).collect()
}

/// A flat curve of all ones (full-speed baseline).
pub fn unity_curve() -> Vec<f32> {
    vec![1.0; CURVE_LEN]
}

/// Material families the default catalog distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    MildSteel,
    StainlessSteel,
    AnodizedAluminum,
    Brass,
    Titanium,
    Wood,
    Acrylic,
    Leather,
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MildSteel => write!(f, "Mild Steel"),
            Self::StainlessSteel => write!(f, "Stainless Steel"),
            Self::AnodizedAluminum => write!(f, "Anodized Aluminum"),
            Self::Brass => write!(f, "Brass"),
            Self::Titanium => write!(f, "Titanium"),
            Self::Wood => write!(f, "Wood"),
            Self::Acrylic => write!(f, "Acrylic"),
            Self::Leather => write!(f, "Leather"),
        }
    }
}

/// Nominal engraving parameters for one material at one thickness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialProfile {
    pub name: String,
    pub kind: MaterialKind,
    /// Stock thickness in millimeters.
    pub thickness_mm: f32,
    /// Nominal power in percent.
    pub nominal_power: f32,
    /// Nominal traverse speed in mm/s.
    pub nominal_speed: f32,
    /// Recommended pass count at the nominal settings.
    pub passes: u32,
    /// Z offset from the focus height in millimeters.
    pub z_offset_mm: f32,
    /// Effective refractive index used for focus compensation.
    pub refractive_index: f32,
}

impl Default for MaterialProfile {
    fn default() -> Self {
        Self {
            name: "New Material".to_string(),
            kind: MaterialKind::MildSteel,
            thickness_mm: 1.0,
            nominal_power: 60.0,
            nominal_speed: 200.0,
            passes: 1,
            z_offset_mm: 0.0,
            refractive_index: 1.5,
        }
    }
}

impl MaterialProfile {
    /// Validate physical constants.
    pub fn validate(&self) -> ProfileResult<()> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::InvalidProfile("name is empty".to_string()));
        }
        if self.thickness_mm <= 0.0 {
            return Err(ProfileError::InvalidProfile(
                "thickness must be positive".to_string(),
            ));
        }
        if self.refractive_index <= 0.0 {
            return Err(ProfileError::InvalidProfile(
                "refractive index must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
