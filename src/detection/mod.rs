pub mod classify;
pub mod components;
pub mod filter;
pub mod landmarks;
pub mod scoring;
pub mod steps;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::RgbImage;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::detection::landmarks::MouthLandmarks;
use crate::detection::scoring::GeometricScorer;
use crate::error::Result;
use crate::models::{Confidence, SmileAnalysis};
use crate::pipeline::Pipeline;

/// Main smile analysis orchestrator
pub struct SmileScanner {
    pub config: ScanConfig,
    pub verbose: bool,
    pub debug_dir: Option<PathBuf>,
    debug_runs: AtomicUsize,
}

impl SmileScanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            verbose: false,
            debug_dir: None,
            debug_runs: AtomicUsize::new(0),
        })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Dump intermediate images under `dir`, one `run_NNN` subdirectory
    /// per analysis. Numbers already present on disk are skipped.
    pub fn with_debug(mut self, dir: PathBuf) -> Self {
        self.debug_dir = Some(dir);
        self
    }

    /// Standard pipeline for one run, with a fresh debug directory if
    /// dumps are enabled.
    pub fn pipeline(&self) -> Result<Pipeline> {
        let pipeline = build_standard_pipeline(&self.config, self.verbose);
        match &self.debug_dir {
            Some(root) => pipeline.with_debug(self.next_run_dir(root)),
            None => Ok(pipeline),
        }
    }

    fn next_run_dir(&self, root: &Path) -> PathBuf {
        loop {
            let run = self.debug_runs.fetch_add(1, Ordering::Relaxed) + 1;
            let dir = root.join(format!("run_{run:03}"));
            if !dir.exists() {
                return dir;
            }
        }
    }

    /// Run the full analysis on one image.
    pub fn analyze(&self, image: &RgbImage, landmarks: Option<&MouthLandmarks>) -> Result<SmileAnalysis> {
        let session = self.pipeline()?.run(image, landmarks)?;
        let analysis = session.into_analysis()?;

        if analysis.confidence == Confidence::Low {
            warn!(
                landmarks = analysis.landmarks_supplied,
                "no tooth candidates survived filtering; result is inconclusive"
            );
        }
        info!(
            score = analysis.score,
            teeth = analysis.metrics.teeth_count,
            gaps = analysis.metrics.gap_count,
            "smile analysis complete"
        );

        Ok(analysis)
    }

    pub fn discount(&self, analysis: &SmileAnalysis) -> u8 {
        self.config.discount.discount(analysis.score)
    }
}

impl Default for SmileScanner {
    fn default() -> Self {
        Self {
            config: ScanConfig::default(),
            verbose: false,
            debug_dir: None,
            debug_runs: AtomicUsize::new(0),
        }
    }
}

/// Build the standard six-stage analysis pipeline
pub fn build_standard_pipeline(config: &ScanConfig, verbose: bool) -> Pipeline {
    use crate::detection::steps::*;

    Pipeline::new()
        .with_verbose(verbose)
        .add_step(Arc::new(ClassifyStep {
            classifier: config.classifier.clone(),
        }))
        .add_step(Arc::new(LabelStep))
        .add_step(Arc::new(LipLocateStep {
            filter: config.filter.clone(),
        }))
        .add_step(Arc::new(ToothFilterStep {
            config: config.filter.clone(),
        }))
        .add_step(Arc::new(ScoreStep {
            scorer: GeometricScorer::new(config.scoring.clone()),
        }))
        .add_step(Arc::new(OverlayStep {
            renderer: config.overlay.clone(),
        }))
}
