//! End-to-end pipeline test over the facade crate: profile interchange from
//! disk, registry assembly, depth-map synthesis, and multi-pass planning.

use reliefkit::profiles::{export_laser, import_into};
use reliefkit::{
    DepthMapSettings, EngraveSession, LaserProfile, ProfileRegistry, RasterImage, ToolpathSettings,
};
use std::fs;
use std::sync::Arc;

fn checker_image(w: u32, h: u32) -> RasterImage {
    let mut pixels = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let v = if (x / 4 + y / 4) % 2 == 0 { 230 } else { 40 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    RasterImage::from_rgba(w, h, pixels).unwrap()
}

#[test]
fn test_full_pipeline_with_imported_profile() {
    let dir = tempfile::tempdir().unwrap();
    let profile_path = dir.path().join("workshop-fiber.json");

    // Export a customized profile to disk, then import it into a fresh
    // registry the way a settings UI would.
    let mut profile = LaserProfile::default();
    profile.name = "workshop-fiber".to_string();
    profile.rated_power_w = 120.0;
    profile.max_power = 92.0;
    fs::write(&profile_path, export_laser(&profile).unwrap()).unwrap();

    let registry = Arc::new(ProfileRegistry::with_default_catalog());
    let document = fs::read_to_string(&profile_path).unwrap();
    import_into(&registry, &document).unwrap();

    let session = EngraveSession::new(registry);
    let image = checker_image(32, 32);
    let depth_settings = DepthMapSettings {
        max_depth_mm: 1.5,
        ..Default::default()
    };
    let mut toolpath_settings = ToolpathSettings::default();
    toolpath_settings.pass_layers = 3;

    let passes = session
        .plan(&image, "workshop-fiber", &depth_settings, &toolpath_settings)
        .unwrap();

    assert_eq!(passes.len(), 3);
    assert!((passes.last().unwrap().target_depth - 1.5).abs() < 1e-5);
    for pass in &passes {
        // Imported profile caps commanded power at 92%
        assert!(pass.power <= 92.0);
        assert!(!pass.points.is_empty());
        for point in &pass.points {
            assert!(point.z <= 0.0);
            assert!(point.z >= -1.5 - 1e-5);
        }
    }
}

#[test]
fn test_depth_map_feeds_preview_consumers() {
    let registry = Arc::new(ProfileRegistry::with_default_catalog());
    let session = EngraveSession::new(registry);
    let image = checker_image(24, 24);

    let map = session
        .generate_depth_map(&image, &DepthMapSettings::default())
        .unwrap();

    assert_eq!(map.depth.len(), 24 * 24);
    assert_eq!(map.normals.len(), map.depth.len());
    assert_eq!(map.heights.len(), map.depth.len());
    assert!(map.depth.iter().all(|&d| (0.0..=1.0).contains(&d)));
}
