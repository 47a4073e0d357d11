//! Static default catalog of laser and material profiles.
//!
//! The catalog is hard-coded Rust data rather than a shipped data file so a
//! registry is usable the moment it is constructed. Power/speed response
//! curves are generated from two monotonic families: a gamma-shaped power
//! response and a linear speed decay.

use crate::model::{
    AssistGas, LaserProfile, LaserType, MaterialKind, MaterialProfile, MopaSettings, CURVE_LEN,
};

/// A monotonic non-decreasing power response `t^exponent` over 256 entries.
pub fn power_response_curve(exponent: f32) -> Vec<f32> {
    (0..CURVE_LEN)
        .map(|i| (i as f32 / (CURVE_LEN - 1) as f32).powf(exponent))
        .collect()
}

/// A monotonic non-increasing speed decay from 1.0 down to `floor`.
pub fn speed_decay_curve(floor: f32) -> Vec<f32> {
    let floor = floor.clamp(0.0, 1.0);
    (0..CURVE_LEN)
        .map(|i| 1.0 - (1.0 - floor) * (i as f32 / (CURVE_LEN - 1) as f32))
        .collect()
}

/// The fixed default laser catalog: named fiber profiles spanning 50–200 W
/// plus one CO2 and one diode reference entry.
pub fn default_laser_profiles() -> Vec<LaserProfile> {
    let mut out = Vec::new();

    // Raycus-class 50 W fiber marker
    {
        let mut p = LaserProfile::default();
        p.name = "fiber-50w".to_string();
        p.laser_type = LaserType::Fiber;
        p.rated_power_w = 50.0;
        p.wavelength_nm = 1064.0;
        p.min_power = 10.0;
        p.max_power = 95.0;
        p.focus_height_mm = 170.0;
        p.beam_diameter_mm = 0.05;
        p.pulse_frequency_khz = 30.0;
        p.pulse_width_ns = 120.0;
        p.power_curve = power_response_curve(1.2);
        p.speed_curve = speed_decay_curve(0.25);
        out.push(p);
    }

    // 100 W deep-engraving fiber source
    {
        let mut p = LaserProfile::default();
        p.name = "fiber-100w".to_string();
        p.laser_type = LaserType::Fiber;
        p.rated_power_w = 100.0;
        p.wavelength_nm = 1064.0;
        p.min_power = 5.0;
        p.max_power = 100.0;
        p.focus_height_mm = 210.0;
        p.beam_diameter_mm = 0.06;
        p.pulse_frequency_khz = 50.0;
        p.pulse_width_ns = 200.0;
        p.assist_gas = Some(AssistGas::Air);
        p.power_curve = power_response_curve(1.1);
        p.speed_curve = speed_decay_curve(0.2);
        out.push(p);
    }

    // 150 W MOPA source with waveform selection
    {
        let mut p = LaserProfile::default();
        p.name = "fiber-150w-mopa".to_string();
        p.laser_type = LaserType::Fiber;
        p.rated_power_w = 150.0;
        p.wavelength_nm = 1064.0;
        p.min_power = 5.0;
        p.max_power = 100.0;
        p.focus_height_mm = 210.0;
        p.beam_diameter_mm = 0.08;
        p.pulse_frequency_khz = 100.0;
        p.pulse_width_ns = 350.0;
        p.assist_gas = Some(AssistGas::Nitrogen);
        p.mopa = Some(MopaSettings {
            waveform: 4,
            pulse_width_ns: 350.0,
        });
        p.power_curve = power_response_curve(1.0);
        p.speed_curve = speed_decay_curve(0.2);
        out.push(p);
    }

    // 200 W industrial deep-relief source
    {
        let mut p = LaserProfile::default();
        p.name = "fiber-200w".to_string();
        p.laser_type = LaserType::Fiber;
        p.rated_power_w = 200.0;
        p.wavelength_nm = 1064.0;
        p.min_power = 5.0;
        p.max_power = 100.0;
        p.focus_height_mm = 250.0;
        p.beam_diameter_mm = 0.1;
        p.pulse_frequency_khz = 60.0;
        p.pulse_width_ns = 240.0;
        p.assist_gas = Some(AssistGas::Oxygen);
        p.power_curve = power_response_curve(0.9);
        p.speed_curve = speed_decay_curve(0.15);
        out.push(p);
    }

    // CO2 reference entry for organics
    {
        let mut p = LaserProfile::default();
        p.name = "co2-60w".to_string();
        p.laser_type = LaserType::Co2;
        p.rated_power_w = 60.0;
        p.wavelength_nm = 10600.0;
        p.min_power = 8.0;
        p.max_power = 90.0;
        p.focus_height_mm = 50.8;
        p.beam_diameter_mm = 0.15;
        p.pulse_frequency_khz = 20.0;
        p.pulse_width_ns = 0.0;
        p.power_curve = power_response_curve(1.4);
        p.speed_curve = speed_decay_curve(0.3);
        out.push(p);
    }

    // Hobby-class diode entry
    {
        let mut p = LaserProfile::default();
        p.name = "diode-10w".to_string();
        p.laser_type = LaserType::Diode;
        p.rated_power_w = 10.0;
        p.wavelength_nm = 450.0;
        p.min_power = 0.0;
        p.max_power = 100.0;
        p.focus_height_mm = 30.0;
        p.beam_diameter_mm = 0.08;
        p.pulse_frequency_khz = 0.0;
        p.pulse_width_ns = 0.0;
        p.power_curve = power_response_curve(1.0);
        p.speed_curve = speed_decay_curve(0.4);
        out.push(p);
    }

    out
}

/// Starter material set paired with the default lasers.
pub fn default_material_profiles() -> Vec<MaterialProfile> {
    let mut out = Vec::new();

    {
        let mut m = MaterialProfile::default();
        m.name = "mild steel 2mm".to_string();
        m.kind = MaterialKind::MildSteel;
        m.thickness_mm = 2.0;
        m.nominal_power = 80.0;
        m.nominal_speed = 150.0;
        m.passes = 6;
        m.refractive_index = 2.9;
        out.push(m);
    }

    {
        let mut m = MaterialProfile::default();
        m.name = "stainless 1mm".to_string();
        m.kind = MaterialKind::StainlessSteel;
        m.thickness_mm = 1.0;
        m.nominal_power = 75.0;
        m.nominal_speed = 180.0;
        m.passes = 4;
        m.refractive_index = 2.75;
        out.push(m);
    }

    {
        let mut m = MaterialProfile::default();
        m.name = "anodized aluminum 1mm".to_string();
        m.kind = MaterialKind::AnodizedAluminum;
        m.thickness_mm = 1.0;
        m.nominal_power = 45.0;
        m.nominal_speed = 350.0;
        m.passes = 1;
        m.refractive_index = 1.77;
        out.push(m);
    }

    {
        let mut m = MaterialProfile::default();
        m.name = "brass 3mm".to_string();
        m.kind = MaterialKind::Brass;
        m.thickness_mm = 3.0;
        m.nominal_power = 85.0;
        m.nominal_speed = 120.0;
        m.passes = 8;
        m.z_offset_mm = -0.05;
        m.refractive_index = 1.18;
        out.push(m);
    }

    {
        let mut m = MaterialProfile::default();
        m.name = "walnut 6mm".to_string();
        m.kind = MaterialKind::Wood;
        m.thickness_mm = 6.0;
        m.nominal_power = 55.0;
        m.nominal_speed = 400.0;
        m.passes = 2;
        m.refractive_index = 1.47;
        out.push(m);
    }

    {
        let mut m = MaterialProfile::default();
        m.name = "cast acrylic 3mm".to_string();
        m.kind = MaterialKind::Acrylic;
        m.thickness_mm = 3.0;
        m.nominal_power = 40.0;
        m.nominal_speed = 300.0;
        m.passes = 1;
        m.refractive_index = 1.49;
        out.push(m);
    }

    out
}
