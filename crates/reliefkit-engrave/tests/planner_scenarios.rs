use reliefkit_core::RasterImage;
use reliefkit_engrave::{
    DepthMapGenerator, DepthMapSettings, PowerRamp, ToolpathPlanner, ToolpathSettings,
    ToolpathStrategy,
};
use reliefkit_profiles::LaserProfile;

fn white_image(w: u32, h: u32) -> RasterImage {
    RasterImage::from_rgba(w, h, vec![255u8; (w * h * 4) as usize]).unwrap()
}

fn gradient_image(w: u32, h: u32) -> RasterImage {
    let mut pixels = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let v = ((x + y) * 255 / (w + h - 2)) as u8;
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    RasterImage::from_rgba(w, h, pixels).unwrap()
}

#[test]
fn test_uniform_white_ramp_scenario() {
    // 4x4 uniform white, max_depth 2.0, 4 layers, ramp {40, +3, cap 95}
    let image = white_image(4, 4);
    let depth_settings = DepthMapSettings {
        max_depth_mm: 2.0,
        ..Default::default()
    };
    let mut toolpath = ToolpathSettings::default();
    toolpath.pass_layers = 4;
    toolpath.power_ramp = PowerRamp {
        initial: 40.0,
        increment: 3.0,
        max: 95.0,
    };

    let map = DepthMapGenerator::generate(&image, &depth_settings).unwrap();
    let passes =
        ToolpathPlanner::plan(&map, &LaserProfile::default(), &depth_settings, &toolpath).unwrap();

    assert_eq!(passes.len(), 4);
    let powers: Vec<f32> = passes.iter().map(|p| p.power).collect();
    assert_eq!(powers, vec![40.0, 43.0, 46.0, 49.0]);

    let depths: Vec<f32> = passes.iter().map(|p| p.target_depth).collect();
    for (actual, expected) in depths.iter().zip([0.5, 1.0, 1.5, 2.0]) {
        assert!((actual - expected).abs() < 1e-5, "depth {} != {}", actual, expected);
    }
}

#[test]
fn test_crosshatch_doubles_point_count() {
    let image = gradient_image(24, 24);
    let depth_settings = DepthMapSettings {
        max_depth_mm: 1.0,
        ..Default::default()
    };

    for strategy in [ToolpathStrategy::Contour, ToolpathStrategy::Spiral] {
        let mut plain = ToolpathSettings::default();
        plain.strategy = strategy;
        plain.pass_layers = 2;
        plain.crosshatch = false;

        let mut hatched = plain.clone();
        hatched.crosshatch = true;
        hatched.crosshatch_angle = 90.0;

        let map = DepthMapGenerator::generate(&image, &depth_settings).unwrap();
        let laser = LaserProfile::default();
        let without =
            ToolpathPlanner::plan(&map, &laser, &depth_settings, &plain).unwrap();
        let with = ToolpathPlanner::plan(&map, &laser, &depth_settings, &hatched).unwrap();

        for (a, b) in without.iter().zip(with.iter()) {
            assert_eq!(
                b.points.len(),
                a.points.len() * 2,
                "{} pass {} should double with crosshatch",
                strategy,
                a.index
            );
        }
    }
}

#[test]
fn test_depth_and_height_ranges_hold_end_to_end() {
    let image = gradient_image(48, 48);
    let depth_settings = DepthMapSettings {
        contrast: 25.0,
        gamma: 1.8,
        detail_boost: 60.0,
        max_depth_mm: 3.0,
        ..Default::default()
    };
    let map = DepthMapGenerator::generate(&image, &depth_settings).unwrap();
    assert!(map.depth.iter().all(|&d| (0.0..=1.0).contains(&d)));
    assert!(map.heights.iter().all(|&h| (0.0..=3.0).contains(&h)));
}

#[test]
fn test_pipeline_is_deterministic() {
    let image = gradient_image(32, 32);
    let depth_settings = DepthMapSettings {
        max_depth_mm: 2.0,
        preserve_edges: true,
        ..Default::default()
    };
    let mut toolpath = ToolpathSettings::default();
    toolpath.pass_layers = 5;
    toolpath.crosshatch = true;

    let laser = LaserProfile::default();
    let run = || {
        let map = DepthMapGenerator::generate(&image, &depth_settings).unwrap();
        ToolpathPlanner::plan(&map, &laser, &depth_settings, &toolpath).unwrap()
    };
    let a = run();
    let b = run();

    assert_eq!(a.len(), b.len());
    for (pa, pb) in a.iter().zip(b.iter()) {
        assert_eq!(pa.points, pb.points);
        assert_eq!(pa.speed, pb.speed);
        assert_eq!(pa.focus_offset, pb.focus_offset);
    }
}

#[test]
fn test_passes_cover_every_strategy() {
    let image = gradient_image(24, 24);
    let depth_settings = DepthMapSettings {
        max_depth_mm: 1.0,
        ..Default::default()
    };
    let map = DepthMapGenerator::generate(&image, &depth_settings).unwrap();
    let laser = LaserProfile::default();

    for strategy in [
        ToolpathStrategy::Contour,
        ToolpathStrategy::Spiral,
        ToolpathStrategy::Hybrid,
        ToolpathStrategy::Adaptive,
    ] {
        let mut toolpath = ToolpathSettings::default();
        toolpath.strategy = strategy;
        toolpath.pass_layers = 2;
        let passes =
            ToolpathPlanner::plan(&map, &laser, &depth_settings, &toolpath).unwrap();
        assert_eq!(passes.len(), 2);
        assert!(
            !passes[0].points.is_empty(),
            "{} produced an empty first pass",
            strategy
        );
    }
}

#[test]
fn test_estimate_time_positive_for_nonempty_plan() {
    let image = white_image(16, 16);
    let depth_settings = DepthMapSettings {
        max_depth_mm: 1.0,
        ..Default::default()
    };
    let map = DepthMapGenerator::generate(&image, &depth_settings).unwrap();
    let passes = ToolpathPlanner::plan(
        &map,
        &LaserProfile::default(),
        &depth_settings,
        &ToolpathSettings::default(),
    )
    .unwrap();
    assert!(ToolpathPlanner::estimate_time(&passes) > 0.0);
}
