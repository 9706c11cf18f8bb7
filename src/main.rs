use clap::Parser;
use image::ImageReader;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use smilescan::{MouthLandmarks, Point, ScanConfig, SmileAnalysis, SmileScanner};

#[derive(Parser)]
#[command(name = "smilescan")]
#[command(author, version, about = "Score a smile photo and derive a discount")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// JSON array of mouth landmark points, e.g. [{"x": 10, "y": 20}, ...]
    #[arg(long, value_name = "FILE")]
    landmarks: Option<PathBuf>,

    /// Landmark coordinates are normalized to [0, 1]
    #[arg(long, requires = "landmarks")]
    normalized: bool,

    /// Landmarks file holds a full 468-point face mesh; the mouth outline is picked from it
    #[arg(long, requires = "landmarks")]
    face_mesh: bool,

    /// JSON scanner configuration (missing fields use defaults)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the overlay image here
    #[arg(short, long, value_name = "FILE")]
    overlay: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Save debug outputs under DIR/run_NNN
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output<'a> {
    image: String,
    width: u32,
    height: u32,
    discount_percent: u8,
    inconclusive: bool,
    #[serde(flatten)]
    analysis: &'a SmileAnalysis,
}

fn init_logging(verbose: bool) {
    let mut filter = EnvFilter::from_default_env();
    let directive = if verbose { "smilescan=debug" } else { "smilescan=info" };
    if let Ok(d) = directive.parse() {
        filter = filter.add_directive(d);
    }
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    info!(path = ?args.image_path, "loading image");
    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_rgb8();
    info!(width = img.width(), height = img.height(), "image loaded");

    let config = match &args.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::default(),
    };

    let landmarks = match &args.landmarks {
        Some(path) => {
            let points: Vec<Point> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            let landmarks = if args.normalized {
                MouthLandmarks::from_normalized(&points, img.width(), img.height())
            } else {
                MouthLandmarks::new(points)
            };
            Some(if args.face_mesh {
                MouthLandmarks::from_face_mesh(&landmarks.points)
            } else {
                landmarks
            })
        }
        None => None,
    };

    let mut scanner = SmileScanner::new(config)?.with_verbose(args.verbose);
    if let Some(debug_dir) = args.debug_out.clone() {
        scanner = scanner.with_debug(debug_dir);
    }

    let analysis = scanner.analyze(&img, landmarks.as_ref())?;
    let discount = scanner.discount(&analysis);

    if let Some(path) = &args.overlay {
        analysis
            .overlay
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to save overlay: {}", e))?;
        info!(path = ?path, "overlay written");
    }

    if args.json {
        let output = Output {
            image: args.image_path.display().to_string(),
            width: img.width(),
            height: img.height(),
            discount_percent: discount,
            inconclusive: analysis.nothing_detected(),
            analysis: &analysis,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\n=== Smile Scan Results ===");
    println!("Smile score: {}/100", analysis.score);
    println!("Discount: {}%", discount);
    println!("Teeth detected: {}", analysis.metrics.teeth_count);
    println!("Gaps: {}", analysis.metrics.gap_count);
    println!("Symmetry: {:.2}", analysis.metrics.symmetry_score);
    println!("Bite spread: {:.1} px", analysis.metrics.bite_score);
    println!("Inner/outline ratio: {:.2}", analysis.metrics.inner_outline_ratio);
    if analysis.landmarks_supplied {
        println!("Lip-line deviation: {:.3}", analysis.metrics.alignment_deviation);
        println!("Outline asymmetry: {:.3}", analysis.metrics.landmark_symmetry_deviation);
        println!("Spacing deviation: {:.3}", analysis.metrics.spacing_deviation);
        println!("Missing landmarks: {:.0}%", analysis.metrics.missing_landmarks * 100.0);
    }

    if analysis.nothing_detected() {
        println!("\nNo teeth detected. Try a closer, well-lit photo with the teeth visible.");
    } else if args.verbose {
        println!("\nTooth candidates (left to right):");
        for (i, c) in analysis.candidates.iter().enumerate() {
            let b = c.bbox();
            println!(
                "  {:2}: ({}, {})-({}, {}) area={} ratio={:.2}",
                i + 1,
                b.min_x,
                b.min_y,
                b.max_x,
                b.max_y,
                c.component.area,
                c.brightness_ratio()
            );
        }
    }

    Ok(())
}
