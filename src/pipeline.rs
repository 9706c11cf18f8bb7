use std::path::PathBuf;
use std::sync::Arc;

use image::{DynamicImage, GrayImage, RgbImage};
use tracing::info;

use crate::detection::classify::ClassMasks;
use crate::detection::landmarks::MouthLandmarks;
use crate::detection::scoring::ScoreReport;
use crate::error::{Result, ScanError};
use crate::models::{
    BoundingBox, Component, LabelImage, LipBoxSource, SmileAnalysis, ToothCandidate,
};

/// State for one analysis run. Every buffer here belongs to the run; steps
/// fill the fields in order and nothing is shared between runs.
pub struct AnalysisSession<'a> {
    /// The caller's image, read-only for the whole run.
    pub image: &'a RgbImage,

    pub landmarks: Option<&'a MouthLandmarks>,

    pub masks: Option<ClassMasks>,

    /// Tooth-mask labelling and every component found in it.
    pub tooth_labels: Option<LabelImage>,
    pub components: Vec<Component>,

    /// Components that passed the filter, in discovery order.
    pub survivors: Vec<Component>,

    /// Survivors with their brightness counts.
    pub candidates: Vec<ToothCandidate>,

    pub lip_box: Option<BoundingBox>,
    pub lip_box_source: LipBoxSource,

    pub report: Option<ScoreReport>,

    pub overlay: Option<RgbImage>,
}

impl<'a> AnalysisSession<'a> {
    pub fn new(image: &'a RgbImage, landmarks: Option<&'a MouthLandmarks>) -> Self {
        Self {
            image,
            landmarks,
            masks: None,
            tooth_labels: None,
            components: Vec::new(),
            survivors: Vec::new(),
            candidates: Vec::new(),
            lip_box: None,
            lip_box_source: LipBoxSource::None,
            report: None,
            overlay: None,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Masks from the classification step, or an error naming the step
    /// that needed them.
    pub fn require_masks(&self, step: &str) -> Result<&ClassMasks> {
        self.masks
            .as_ref()
            .ok_or_else(|| ScanError::invalid(format!("{step} needs pixel classification to run first")))
    }

    pub fn require_labels(&self, step: &str) -> Result<&LabelImage> {
        self.tooth_labels
            .as_ref()
            .ok_or_else(|| ScanError::invalid(format!("{step} needs component labelling to run first")))
    }

    pub fn require_report(&self, step: &str) -> Result<&ScoreReport> {
        self.report
            .as_ref()
            .ok_or_else(|| ScanError::invalid(format!("{step} needs scoring to run first")))
    }

    /// Package a completed session.
    pub fn into_analysis(self) -> Result<SmileAnalysis> {
        let (width, height) = self.dimensions();
        let report = self
            .report
            .ok_or_else(|| ScanError::invalid("pipeline finished without a score"))?;
        Ok(SmileAnalysis {
            score: report.score,
            metrics: report.metrics,
            confidence: report.confidence,
            lip_box: self.lip_box,
            lip_box_source: self.lip_box_source,
            candidates: report.ordered,
            gaps: report.gaps,
            landmarks_supplied: self.landmarks.is_some(),
            tooth_labels: self
                .tooth_labels
                .unwrap_or_else(|| LabelImage::new(width, height)),
            overlay: self.overlay.unwrap_or_else(|| self.image.clone()),
        })
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Advance the session by one stage.
    fn process(&self, session: &mut AnalysisSession<'_>, context: &PipelineContext) -> Result<()>;

    /// Human-readable name for this step (used in verbose output and debug
    /// directory names)
    fn name(&self) -> &str;

    /// Images worth saving after this step ran, as `(file stem, image)`.
    fn debug_images(&self, _session: &AnalysisSession<'_>) -> Vec<(String, DynamicImage)> {
        Vec::new()
    }
}

/// Composable pipeline builder
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(ScanError::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step over a fresh session.
    pub fn run<'a>(
        &self,
        image: &'a RgbImage,
        landmarks: Option<&'a MouthLandmarks>,
    ) -> Result<AnalysisSession<'a>> {
        self.run_partial(image, landmarks, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial<'a>(
        &self,
        image: &'a RgbImage,
        landmarks: Option<&'a MouthLandmarks>,
        num_steps: usize,
    ) -> Result<AnalysisSession<'a>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::EmptyImage);
        }

        self.save_input(image)?;

        let mut session = AnalysisSession::new(image, landmarks);

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            if self.context.verbose {
                info!(step = step.name(), index = step_idx + 1, "running step");
            }

            step.process(&mut session, &self.context)?;
            self.save_step_output(step_idx, step.as_ref(), &session)?;
        }

        Ok(session)
    }

    fn save_input(&self, image: &RgbImage) -> Result<()> {
        let Some(debug_config) = self.context.debug.as_ref() else {
            return Ok(());
        };
        let input_dir = debug_config.output_dir.join("00_input");
        std::fs::create_dir_all(&input_dir)?;
        image.save(input_dir.join("input.png"))?;
        if self.context.verbose {
            info!("saved 00_input/input.png");
        }
        Ok(())
    }

    fn save_step_output(
        &self,
        step_idx: usize,
        step: &dyn PipelineStep,
        session: &AnalysisSession<'_>,
    ) -> Result<()> {
        let Some(debug_config) = self.context.debug.as_ref() else {
            return Ok(());
        };
        let images = step.debug_images(session);
        if images.is_empty() {
            return Ok(());
        }

        let step_dir_name = format!(
            "{:02}_{}",
            step_idx + 1,
            step.name().to_lowercase().replace(' ', "_")
        );
        let step_dir = debug_config.output_dir.join(&step_dir_name);
        std::fs::create_dir_all(&step_dir)?;

        for (stem, image) in &images {
            image.save(step_dir.join(format!("{stem}.png")))?;
        }

        if self.context.verbose {
            info!(count = images.len(), dir = %step_dir_name, "saved debug images");
        }
        Ok(())
    }
}

/// Grey-scale rendering of a mask for debug output.
pub fn mask_image(mask: &GrayImage) -> DynamicImage {
    DynamicImage::ImageLuma8(mask.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn with_debug_creates_missing_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("dump");
        let pipeline = Pipeline::new().with_debug(dir.clone()).unwrap();

        assert!(dir.is_dir());
        let debug = pipeline.context.debug.as_ref().unwrap();
        assert_eq!(debug.output_dir, dir);
    }

    #[test]
    fn with_debug_rejects_populated_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("leftover.png"), b"x").unwrap();

        let result = Pipeline::new().with_debug(temp.path().to_path_buf());
        assert!(matches!(result, Err(ScanError::DebugDirNotEmpty(_))));
    }

    #[test]
    fn input_is_dumped_only_with_debug() {
        let temp = TempDir::new().unwrap();
        let image = RgbImage::new(4, 4);

        Pipeline::new().run(&image, None).unwrap();
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);

        let dir = temp.path().join("dump");
        Pipeline::new().with_debug(dir.clone()).unwrap().run(&image, None).unwrap();
        assert!(dir.join("00_input").join("input.png").exists());
    }
}
