mod common;

use anyhow::Result;
use common::*;
use smilescan::detection::landmarks::MOUTH_MESH_INDICES;
use smilescan::{DiscountPolicy, build_standard_pipeline, score_to_discount};
use tempfile::TempDir;

#[test]
fn test_twelve_tooth_smile() -> Result<()> {
    let img = smile_image();
    let analysis = smilescan::analyze(&img, None)?;

    assert_eq!(analysis.metrics.teeth_count, 12);
    assert_eq!(analysis.metrics.gap_count, 0);
    assert!(analysis.metrics.symmetry_score >= 0.9);
    assert!(analysis.score >= 85, "score {}", analysis.score);
    assert_eq!(analysis.confidence, Confidence::Normal);
    assert_eq!(analysis.lip_box_source, LipBoxSource::None);
    assert!(!analysis.nothing_detected());

    // Rows are 12 px apart: 0.25 * 12 = 3 points off.
    assert!((analysis.metrics.bite_score - 12.0).abs() < 1e-4);
    assert_eq!(analysis.score, 97);
    Ok(())
}

#[test]
fn test_candidates_ordered_left_to_right() -> Result<()> {
    let analysis = smilescan::analyze(&smile_image(), None)?;

    let xs: Vec<f32> = analysis.candidates.iter().map(|c| c.component.center_x()).collect();
    assert!(xs.windows(2).all(|w| w[0] <= w[1]), "not sorted: {xs:?}");
    for c in &analysis.candidates {
        assert_eq!(c.component.area, TOOTH_WIDTH * TOOTH_HEIGHT);
        assert_eq!(c.bbox().width(), TOOTH_WIDTH);
        assert_eq!(c.bbox().height(), TOOTH_HEIGHT);
    }
    Ok(())
}

#[test]
fn test_dark_gap_lowers_score() -> Result<()> {
    let baseline = smilescan::analyze(&smile_image(), None)?;
    let gapped = smilescan::analyze(&smile_image_with_gap(2), None)?;

    assert_eq!(gapped.metrics.teeth_count, 12);
    assert_eq!(gapped.metrics.gap_count, baseline.metrics.gap_count + 1);
    assert!(gapped.score < baseline.score);
    assert_eq!(gapped.score, 89);

    // The gap strip sits between the third and fourth top-row teeth.
    let gap = &gapped.gaps[0];
    assert_eq!(gap.strip.min_x, tooth_x(2) + TOOTH_WIDTH);
    assert_eq!(gap.strip.max_x, tooth_x(3) - 1);
    assert!(gap.dark_fraction > 0.99);
    Ok(())
}

#[test]
fn test_portrait_lip_box_from_color() -> Result<()> {
    let analysis = smilescan::analyze(&portrait_smile_image(), None)?;

    // 1. Skin stays out of the lip mask, so the box is the lip block only
    assert_eq!(analysis.lip_box_source, LipBoxSource::Color);
    assert_eq!(analysis.lip_box, Some(BoundingBox::new(80, 60, 319, 179)));

    // 2. One-pixel separators are too narrow to count as gaps
    assert_eq!(analysis.metrics.teeth_count, 16);
    assert_eq!(analysis.metrics.gap_count, 0);
    assert!(analysis.metrics.symmetry_score > 0.95);
    Ok(())
}

#[test]
fn test_repeated_runs_are_identical() -> Result<()> {
    let img = smile_image_with_gap(1);
    let scanner = SmileScanner::default();

    let first = scanner.analyze(&img, None)?;
    let second = scanner.analyze(&img, None)?;

    assert_eq!(first.score, second.score);
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.candidates, second.candidates);
    assert_eq!(first.gaps, second.gaps);
    assert_eq!(first.tooth_labels, second.tooth_labels);
    assert_eq!(first.overlay, second.overlay);
    Ok(())
}

#[test]
fn test_scanner_shared_between_threads() -> Result<()> {
    let img = smile_image();
    let scanner = SmileScanner::default();
    let expected = scanner.analyze(&img, None)?;

    let scores: Vec<u8> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| scanner.analyze(&img, None).map(|a| a.score)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect::<smilescan::Result<Vec<u8>>>()
    })?;

    assert!(scores.iter().all(|&s| s == expected.score));
    Ok(())
}

#[test]
fn test_empty_image_is_rejected() {
    let img = blank_image(0, 0);
    let result = smilescan::analyze(&img, None);
    assert!(matches!(result, Err(ScanError::EmptyImage)));
}

#[test]
fn test_no_teeth_is_low_confidence() -> Result<()> {
    let analysis = smilescan::analyze(&blank_image(80, 50), None)?;

    assert_eq!(analysis.metrics.teeth_count, 0);
    assert_eq!(analysis.confidence, Confidence::Low);
    assert!(analysis.nothing_detected());
    assert!(analysis.candidates.is_empty());
    assert!(analysis.score <= 100);
    assert_eq!(analysis.overlay.dimensions(), (80, 50));
    Ok(())
}

#[test]
fn test_landmarks_gate_candidates() -> Result<()> {
    let img = smile_image();
    let landmarks = top_row_landmarks();
    let analysis = smilescan::analyze(&img, Some(&landmarks))?;

    // 1. Lip box comes straight from the landmark extent
    assert_eq!(analysis.lip_box_source, LipBoxSource::Landmarks);
    assert_eq!(analysis.lip_box, Some(BoundingBox::new(20, 10, 80, 25)));
    assert!(analysis.landmarks_supplied);

    // 2. Only the top row has centroids inside the box
    assert_eq!(analysis.metrics.teeth_count, 6);
    assert_eq!(analysis.metrics.bite_score, 0.0);

    // 3. The lip line is not flat, so alignment costs something
    assert!(analysis.metrics.alignment_deviation > 0.0);

    // 4. Six of twelve mouth points are given
    assert_eq!(analysis.metrics.missing_landmarks, 0.5);
    Ok(())
}

#[test]
fn test_face_mesh_landmarks() -> Result<()> {
    let img = smile_image();
    let mut mesh = vec![Point::new(0.0, 0.0); 468];
    for (k, &index) in MOUTH_MESH_INDICES.iter().enumerate() {
        let x = 20.0 + 6.0 * k.min(10) as f32;
        let y = if k == 0 || k >= 10 { 10.0 } else { 25.0 };
        mesh[index] = Point::new(x, y);
    }
    let landmarks = MouthLandmarks::from_face_mesh(&mesh);
    let analysis = smilescan::analyze(&img, Some(&landmarks))?;

    assert_eq!(analysis.lip_box, Some(BoundingBox::new(20, 10, 80, 25)));
    assert_eq!(analysis.metrics.missing_landmarks, 0.0);
    assert_eq!(analysis.metrics.teeth_count, 6);

    // A complete outline scores higher than the same smile with half the points.
    let partial = smilescan::analyze(&img, Some(&top_row_landmarks()))?;
    assert!(analysis.score > partial.score);
    Ok(())
}

#[test]
fn test_landmarks_outside_image_fail() {
    let img = smile_image();
    let landmarks = MouthLandmarks::new(vec![Point::new(500.0, 500.0), Point::new(600.0, 520.0)]);
    let result = smilescan::analyze(&img, Some(&landmarks));
    assert!(matches!(result, Err(ScanError::InvalidInput(_))));
}

#[test]
fn test_pipeline_steps_and_partial_run() -> Result<()> {
    let pipeline = build_standard_pipeline(&ScanConfig::default(), false);
    assert_eq!(
        pipeline.step_names(),
        vec![
            "Pixel Classification",
            "Component Labelling",
            "Lip Location",
            "Tooth Filtering",
            "Geometric Scoring",
            "Overlay Rendering",
        ]
    );

    let img = smile_image();
    let session = pipeline.run_partial(&img, None, 2)?;
    assert!(session.masks.is_some());
    assert_eq!(session.components.len(), 12);
    assert!(session.report.is_none());

    // Stopping before scoring leaves nothing to report.
    assert!(session.into_analysis().is_err());
    Ok(())
}

#[test]
fn test_debug_output_layout() -> Result<()> {
    let temp = TempDir::new()?;
    let debug_dir = temp.path().join("debug");
    let scanner = SmileScanner::default().with_debug(debug_dir.clone());

    scanner.analyze(&smile_image(), None)?;

    let run = debug_dir.join("run_001");
    let expected = [
        "00_input/input.png",
        "01_pixel_classification/tooth.png",
        "01_pixel_classification/lip.png",
        "01_pixel_classification/dark.png",
        "04_tooth_filtering/candidates.png",
        "06_overlay_rendering/overlay.png",
    ];
    for path in expected {
        assert!(run.join(path).exists(), "missing {path}");
    }
    assert!(!run.join("02_component_labelling").exists());
    Ok(())
}

#[test]
fn test_debug_scanner_is_reusable() -> Result<()> {
    let temp = TempDir::new()?;
    let debug_dir = temp.path().join("debug");

    // 1. A leftover run from an earlier process is left alone
    std::fs::create_dir_all(debug_dir.join("run_002"))?;
    std::fs::write(debug_dir.join("run_002").join("keep.txt"), "old")?;

    // 2. Three runs on one scanner each get their own directory
    let scanner = SmileScanner::default().with_debug(debug_dir.clone());
    for _ in 0..3 {
        scanner.analyze(&smile_image(), None)?;
    }

    for run in ["run_001", "run_003", "run_004"] {
        assert!(debug_dir.join(run).join("00_input/input.png").exists(), "missing {run}");
    }
    assert!(!debug_dir.join("run_002").join("00_input").exists());
    Ok(())
}

#[test]
fn test_config_file_roundtrip() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("scan.json");
    std::fs::write(&path, r#"{ "discount": { "factor": 0.5, "min_percent": 5, "max_percent": 20 } }"#)?;

    let config = ScanConfig::from_json_file(&path)?;
    assert_eq!(config.discount.max_percent, 20);
    assert_eq!(config.scoring, ScanConfig::default().scoring);

    let scanner = SmileScanner::new(config)?;
    let analysis = scanner.analyze(&smile_image(), None)?;
    let discount = scanner.discount(&analysis);
    assert!((5..=20).contains(&discount));
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = ScanConfig {
        discount: DiscountPolicy {
            factor: 1.0,
            min_percent: 50,
            max_percent: 10,
        },
        ..ScanConfig::default()
    };
    assert!(SmileScanner::new(config).is_err());
}

#[test]
fn test_discount_follows_score() -> Result<()> {
    let good = smilescan::analyze(&smile_image(), None)?;
    let gapped = smilescan::analyze(&smile_image_with_gap(2), None)?;

    let good_discount = score_to_discount(good.score);
    let gapped_discount = score_to_discount(gapped.score);
    assert!(good_discount <= gapped_discount);
    assert!((10..=40).contains(&good_discount));
    assert!((10..=40).contains(&gapped_discount));
    Ok(())
}
