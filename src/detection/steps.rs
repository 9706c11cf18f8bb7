use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::detection::classify::{FOREGROUND, PixelClassifier, foreground_count};
use crate::detection::components::label_components;
use crate::detection::filter::{ComponentFilter, FilterConfig};
use crate::detection::scoring::{GeometricScorer, ScoringInput};
use crate::error::Result;
use crate::models::LipBoxSource;
use crate::overlay::OverlayRenderer;
use crate::pipeline::{AnalysisSession, PipelineContext, PipelineStep, mask_image};

/// Split the image into tooth, lip and dark masks
pub struct ClassifyStep {
    pub classifier: PixelClassifier,
}

impl PipelineStep for ClassifyStep {
    fn process(&self, session: &mut AnalysisSession<'_>, _context: &PipelineContext) -> Result<()> {
        let masks = self.classifier.classify(session.image)?;
        debug!(
            mean_lightness = masks.mean_lightness,
            tooth_threshold = masks.tooth_threshold,
            tooth = foreground_count(&masks.tooth),
            lip = foreground_count(&masks.lip),
            dark = foreground_count(&masks.dark),
            "classified pixels"
        );
        session.masks = Some(masks);
        Ok(())
    }

    fn name(&self) -> &str {
        "Pixel Classification"
    }

    fn debug_images(&self, session: &AnalysisSession<'_>) -> Vec<(String, DynamicImage)> {
        match &session.masks {
            Some(m) => vec![
                ("tooth".to_string(), mask_image(&m.tooth)),
                ("lip".to_string(), mask_image(&m.lip)),
                ("dark".to_string(), mask_image(&m.dark)),
            ],
            None => Vec::new(),
        }
    }
}

/// Label 4-connected regions of the tooth mask
pub struct LabelStep;

impl PipelineStep for LabelStep {
    fn process(&self, session: &mut AnalysisSession<'_>, _context: &PipelineContext) -> Result<()> {
        let masks = session.require_masks(self.name())?;
        let labelling = label_components(&masks.tooth)?;
        debug!(components = labelling.components.len(), "labelled tooth mask");
        session.tooth_labels = Some(labelling.labels);
        session.components = labelling.components;
        Ok(())
    }

    fn name(&self) -> &str {
        "Component Labelling"
    }
}

/// Find the lip box from landmarks, or else from the largest lip-colored region
pub struct LipLocateStep {
    pub filter: FilterConfig,
}

impl PipelineStep for LipLocateStep {
    fn process(&self, session: &mut AnalysisSession<'_>, _context: &PipelineContext) -> Result<()> {
        let (width, height) = session.dimensions();

        if let Some(landmarks) = session.landmarks {
            session.lip_box = Some(landmarks.lip_box(width, height)?);
            session.lip_box_source = LipBoxSource::Landmarks;
            debug!(lip_box = ?session.lip_box, "lip box from landmarks");
            return Ok(());
        }

        let masks = session.require_masks(self.name())?;
        let min_area = ComponentFilter::for_image(width, height, &self.filter).min_area;
        let lips = label_components(&masks.lip)?;
        let largest = lips
            .components
            .iter()
            .filter(|c| c.area >= min_area)
            .max_by_key(|c| c.area);

        match largest {
            Some(region) => {
                session.lip_box = Some(region.bbox);
                session.lip_box_source = LipBoxSource::Color;
                debug!(lip_box = ?region.bbox, area = region.area, "lip box from color");
            }
            None => {
                session.lip_box = None;
                session.lip_box_source = LipBoxSource::None;
                debug!(regions = lips.components.len(), "no lip region large enough");
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "Lip Location"
    }
}

/// Keep tooth-sized, tooth-shaped components
pub struct ToothFilterStep {
    pub config: FilterConfig,
}

impl PipelineStep for ToothFilterStep {
    fn process(&self, session: &mut AnalysisSession<'_>, _context: &PipelineContext) -> Result<()> {
        let (width, height) = session.dimensions();
        let filter = ComponentFilter::for_image(width, height, &self.config);
        let mut survivors = filter.filter(&session.components);

        // Landmarks are trusted to bound the mouth; color-derived boxes are not.
        if let (LipBoxSource::Landmarks, Some(lip)) = (session.lip_box_source, session.lip_box) {
            survivors.retain(|c| lip.contains(c.center_x(), c.center_y()));
        }

        debug!(
            min_area = filter.min_area,
            max_area = filter.max_area,
            kept = survivors.len(),
            of = session.components.len(),
            "filtered tooth components"
        );
        session.survivors = survivors;
        Ok(())
    }

    fn name(&self) -> &str {
        "Tooth Filtering"
    }

    fn debug_images(&self, session: &AnalysisSession<'_>) -> Vec<(String, DynamicImage)> {
        let Some(labels) = &session.tooth_labels else {
            return Vec::new();
        };
        let kept: Vec<u32> = session.survivors.iter().map(|c| c.label).collect();
        let mask = GrayImage::from_fn(labels.width(), labels.height(), |x, y| {
            let label = labels.get_pixel(x, y)[0];
            if label != 0 && kept.contains(&label) {
                Luma([FOREGROUND])
            } else {
                Luma([0])
            }
        });
        vec![("candidates".to_string(), mask_image(&mask))]
    }
}

/// Measure candidate brightness and compute metrics and score
pub struct ScoreStep {
    pub scorer: GeometricScorer,
}

impl PipelineStep for ScoreStep {
    fn process(&self, session: &mut AnalysisSession<'_>, _context: &PipelineContext) -> Result<()> {
        let (width, height) = session.dimensions();
        let masks = session.require_masks(self.name())?;
        let labels = session.require_labels(self.name())?;

        let candidates = self.scorer.measure(&session.survivors, labels, &masks.lightness)?;
        let report = self.scorer.score(&ScoringInput {
            candidates: &candidates,
            width,
            height,
            dark: &masks.dark,
            landmarks: session.landmarks,
        })?;

        session.candidates = candidates;
        session.report = Some(report);
        Ok(())
    }

    fn name(&self) -> &str {
        "Geometric Scoring"
    }
}

/// Draw the segmentation result over the input image
pub struct OverlayStep {
    pub renderer: OverlayRenderer,
}

impl PipelineStep for OverlayStep {
    fn process(&self, session: &mut AnalysisSession<'_>, _context: &PipelineContext) -> Result<()> {
        let report = session.require_report(self.name())?;
        let overlay = self.renderer.render(
            session.image,
            session.lip_box.as_ref(),
            &report.ordered,
            &report.gaps,
            Some(report.score),
        );
        session.overlay = Some(overlay);
        Ok(())
    }

    fn name(&self) -> &str {
        "Overlay Rendering"
    }

    fn debug_images(&self, session: &AnalysisSession<'_>) -> Vec<(String, DynamicImage)> {
        match &session.overlay {
            Some(overlay) => vec![("overlay".to_string(), DynamicImage::ImageRgb8(overlay.clone()))],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::landmarks::MouthLandmarks;
    use crate::models::Point;
    use image::{Rgb, RgbImage};

    fn lips_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(40, 30, Rgb([20, 20, 20]));
        for y in 8..20 {
            for x in 6..34 {
                img.put_pixel(x, y, Rgb([170, 50, 70]));
            }
        }
        img
    }

    #[test]
    fn lip_box_from_color() {
        let img = lips_image();
        let mut session = AnalysisSession::new(&img, None);
        let ctx = PipelineContext::default();
        ClassifyStep {
            classifier: PixelClassifier::default(),
        }
        .process(&mut session, &ctx)
        .unwrap();
        LipLocateStep {
            filter: FilterConfig::default(),
        }
        .process(&mut session, &ctx)
        .unwrap();

        assert_eq!(session.lip_box_source, LipBoxSource::Color);
        let lip = session.lip_box.unwrap();
        assert_eq!((lip.min_x, lip.min_y, lip.max_x, lip.max_y), (6, 8, 33, 19));
    }

    #[test]
    fn landmarks_override_color() {
        let img = lips_image();
        let landmarks = MouthLandmarks::new(vec![Point::new(10.0, 10.0), Point::new(20.0, 15.0)]);
        let mut session = AnalysisSession::new(&img, Some(&landmarks));
        let ctx = PipelineContext::default();
        LipLocateStep {
            filter: FilterConfig::default(),
        }
        .process(&mut session, &ctx)
        .unwrap();

        assert_eq!(session.lip_box_source, LipBoxSource::Landmarks);
        let lip = session.lip_box.unwrap();
        assert_eq!((lip.min_x, lip.min_y, lip.max_x, lip.max_y), (10, 10, 20, 15));
    }

    #[test]
    fn steps_out_of_order_fail() {
        let img = lips_image();
        let mut session = AnalysisSession::new(&img, None);
        let ctx = PipelineContext::default();
        assert!(LabelStep.process(&mut session, &ctx).is_err());
    }
}
