//! # smilescan
//!
//! Heuristic smile scoring from a single photo.
//!
//! The analysis classifies pixels by HSL thresholds into tooth, lip and dark
//! masks, labels 4-connected tooth regions, drops regions with implausible
//! size or shape, and scores the survivors on symmetry, inter-tooth gaps,
//! vertical spread and brightness. The score maps to a bounded discount.
//!
//! ```no_run
//! let img = image::open("smile.jpg").unwrap().to_rgb8();
//! let analysis = smilescan::analyze(&img, None).unwrap();
//! println!("{analysis}, discount {}%", smilescan::score_to_discount(analysis.score));
//! ```

pub mod color;
pub mod config;
pub mod detection;
pub mod discount;
mod error;
pub mod models;
pub mod overlay;
pub mod pipeline;

use image::RgbImage;

pub use config::ScanConfig;
pub use detection::landmarks::MouthLandmarks;
pub use detection::{SmileScanner, build_standard_pipeline};
pub use discount::{DiscountPolicy, score_to_discount};
pub use error::{Result, ScanError};
pub use models::{
    BoundingBox, Component, Confidence, GapRegion, LabelImage, LipBoxSource, Metrics, Point,
    SmileAnalysis, ToothCandidate,
};
pub use pipeline::{AnalysisSession, Pipeline, PipelineContext, PipelineStep};

/// Analyze one image with the default configuration.
pub fn analyze(image: &RgbImage, landmarks: Option<&MouthLandmarks>) -> Result<SmileAnalysis> {
    SmileScanner::default().analyze(image, landmarks)
}

/// Build an RGB image from a flat RGB or RGBA buffer; alpha is dropped.
pub fn rgb_image_from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        return Err(ScanError::EmptyImage);
    }
    let expected = width as usize * height as usize * channels as usize;
    match channels {
        3 | 4 if data.len() == expected => {}
        3 | 4 => {
            return Err(ScanError::InvalidInput(format!(
                "buffer holds {} bytes, expected {expected} for {width}x{height}x{channels}",
                data.len()
            )));
        }
        _ => {
            return Err(ScanError::InvalidInput(format!(
                "unsupported channel count {channels}, expected 3 or 4"
            )));
        }
    }

    if channels == 3 {
        return RgbImage::from_raw(width, height, data)
            .ok_or_else(|| ScanError::InvalidInput("buffer does not match dimensions".into()));
    }

    let rgb: Vec<u8> = data.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect();
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ScanError::InvalidInput("buffer does not match dimensions".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_rgba_drops_alpha() {
        let img = rgb_image_from_raw(2, 1, 4, vec![1, 2, 3, 255, 4, 5, 6, 0]).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(img.get_pixel(1, 0).0, [4, 5, 6]);
    }

    #[test]
    fn raw_buffer_validation() {
        assert!(matches!(rgb_image_from_raw(0, 4, 3, vec![]), Err(ScanError::EmptyImage)));
        assert!(matches!(
            rgb_image_from_raw(2, 2, 3, vec![0; 11]),
            Err(ScanError::InvalidInput(_))
        ));
        assert!(matches!(
            rgb_image_from_raw(2, 2, 2, vec![0; 8]),
            Err(ScanError::InvalidInput(_))
        ));
    }
}
