use image::ImageReader;
use smilescan::Pipeline;
use smilescan::detection::classify::PixelClassifier;
use smilescan::detection::filter::FilterConfig;
use smilescan::detection::scoring::{GeometricScorer, ScoringConfig};
use smilescan::detection::steps::*;
use smilescan::overlay::OverlayRenderer;
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image_path>", args[0]);
        std::process::exit(1);
    }

    let image_path = &args[1];
    let img = ImageReader::open(image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_rgb8();

    println!("Loaded image: {}x{}", img.width(), img.height());

    // Example 1: Stricter tooth color, looser shape filter
    println!("\n=== Custom Pipeline ===");
    let classifier = PixelClassifier {
        tooth_min_lightness: 0.7,
        tooth_max_saturation: 0.25,
        ..PixelClassifier::default()
    };
    let filter = FilterConfig {
        max_aspect: 2.0,
        ..FilterConfig::default()
    };
    let pipeline = Pipeline::new()
        .with_verbose(true)
        .add_step_boxed(Box::new(ClassifyStep { classifier }))
        .add_step_boxed(Box::new(LabelStep))
        .add_step_boxed(Box::new(LipLocateStep { filter: filter.clone() }))
        .add_step_boxed(Box::new(ToothFilterStep { config: filter }))
        .add_step_boxed(Box::new(ScoreStep {
            scorer: GeometricScorer::new(ScoringConfig::default()),
        }))
        .add_step_boxed(Box::new(OverlayStep {
            renderer: OverlayRenderer::default(),
        }));

    let analysis = pipeline.run(&img, None)?.into_analysis()?;
    println!("{analysis}");
    for (i, c) in analysis.candidates.iter().take(10).enumerate() {
        let b = c.bbox();
        println!(
            "  {}: ({}, {}) {}x{} ratio={:.2}",
            i + 1,
            b.min_x,
            b.min_y,
            b.width(),
            b.height(),
            c.brightness_ratio()
        );
    }

    // Example 2: Stop after labelling (partial execution for debugging)
    println!("\n=== Partial Pipeline (Stop After Labelling) ===");
    let session = pipeline.run_partial(&img, None, 2)?;
    println!("Tooth-colored regions: {}", session.components.len());

    Ok(())
}
