//! Geometric metrics over tooth candidates and the weighted smile score.
//!
//! Every penalty term is monotone in its metric and capped on its own, so
//! no single metric can drive the score outside `[0, 100]` and the final
//! clamp only matters when several terms add up.

use std::cmp::Ordering;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detection::classify::{FOREGROUND, LightnessPlane};
use crate::detection::landmarks::MouthLandmarks;
use crate::error::{Result, ScanError};
use crate::models::{
    BoundingBox, Component, Confidence, GapRegion, LabelImage, Metrics, ToothCandidate,
};

/// Symmetry reported when fewer than two candidates leave nothing to pair.
/// It marks "unknown", not "balanced" or "lopsided".
pub const NEUTRAL_SYMMETRY: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub gap_weight: f32,
    pub gap_cap: usize,
    pub symmetry_weight: f32,
    pub symmetry_scale: f32,
    pub bite_weight: f32,
    pub bite_cap: f32,
    pub ratio_weight: f32,
    pub ideal_ratio: f32,
    pub alignment_weight: f32,
    pub alignment_cap: f32,
    pub landmark_symmetry_weight: f32,
    pub landmark_symmetry_cap: f32,
    pub spacing_weight: f32,
    pub spacing_cap: f32,
    pub missing_weight: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            gap_weight: 8.0,
            gap_cap: 5,
            symmetry_weight: 1.0,
            symmetry_scale: 0.4,
            bite_weight: 0.25,
            bite_cap: 40.0,
            ratio_weight: 40.0,
            ideal_ratio: 1.0,
            alignment_weight: 20.0,
            alignment_cap: 1.0,
            landmark_symmetry_weight: 20.0,
            landmark_symmetry_cap: 1.0,
            spacing_weight: 15.0,
            spacing_cap: 1.0,
            missing_weight: 25.0,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("gap_weight", self.gap_weight),
            ("symmetry_weight", self.symmetry_weight),
            ("symmetry_scale", self.symmetry_scale),
            ("bite_weight", self.bite_weight),
            ("bite_cap", self.bite_cap),
            ("ratio_weight", self.ratio_weight),
            ("ideal_ratio", self.ideal_ratio),
            ("alignment_weight", self.alignment_weight),
            ("alignment_cap", self.alignment_cap),
            ("landmark_symmetry_weight", self.landmark_symmetry_weight),
            ("landmark_symmetry_cap", self.landmark_symmetry_cap),
            ("spacing_weight", self.spacing_weight),
            ("spacing_cap", self.spacing_cap),
            ("missing_weight", self.missing_weight),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ScanError::invalid(format!(
                    "scoring weight {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Combine metrics into a score in `[0, 100]`.
    pub fn combine(&self, m: &Metrics) -> u8 {
        let gap = self.gap_weight * m.gap_count.min(self.gap_cap) as f32;
        let symmetry =
            self.symmetry_weight * (1.0 - m.symmetry_score.clamp(0.0, 1.0)) * 100.0 * self.symmetry_scale;
        let bite = self.bite_weight * m.bite_score.max(0.0).min(self.bite_cap);
        let ratio = self.ratio_weight * (self.ideal_ratio - m.inner_outline_ratio).max(0.0).min(self.ideal_ratio);
        let alignment = self.alignment_weight * m.alignment_deviation.max(0.0).min(self.alignment_cap);
        let outline_symmetry =
            self.landmark_symmetry_weight * m.landmark_symmetry_deviation.max(0.0).min(self.landmark_symmetry_cap);
        let spacing = self.spacing_weight * m.spacing_deviation.max(0.0).min(self.spacing_cap);
        let missing = self.missing_weight * m.missing_landmarks.max(0.0).min(1.0);

        let score = 100.0 - gap - symmetry - bite - ratio - alignment - outline_symmetry - spacing - missing;
        score.clamp(0.0, 100.0).round() as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// Lightness at which a tooth pixel counts as inner-bright.
    pub inner_min_lightness: f32,
    /// Lower edge of the outline band, which ends at `inner_min_lightness`.
    pub outline_min_lightness: f32,
    /// Vertical overlap, as a fraction of the shorter box, for two
    /// candidates to count as the same row.
    pub min_row_overlap: f32,
    pub gap_dark_fraction: f32,
    pub min_gap_width: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            inner_min_lightness: 0.9,
            outline_min_lightness: 0.7,
            min_row_overlap: 0.25,
            gap_dark_fraction: 0.35,
            min_gap_width: 2,
        }
    }
}

pub struct ScoringInput<'a> {
    pub candidates: &'a [ToothCandidate],
    pub width: u32,
    pub height: u32,
    pub dark: &'a GrayImage,
    pub landmarks: Option<&'a MouthLandmarks>,
}

#[derive(Debug, Clone)]
pub struct ScoreReport {
    pub metrics: Metrics,
    pub score: u8,
    pub confidence: Confidence,
    /// Candidates sorted left to right.
    pub ordered: Vec<ToothCandidate>,
    pub gaps: Vec<GapRegion>,
}

#[derive(Debug, Clone, Default)]
pub struct GeometricScorer {
    pub config: ScoringConfig,
}

impl GeometricScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Attach inner/outline pixel counts to filtered components.
    pub fn measure(
        &self,
        components: &[Component],
        labels: &LabelImage,
        lightness: &LightnessPlane,
    ) -> Result<Vec<ToothCandidate>> {
        if labels.dimensions() != lightness.dimensions() {
            return Err(ScanError::invalid(format!(
                "label grid is {:?} but lightness plane is {:?}",
                labels.dimensions(),
                lightness.dimensions()
            )));
        }

        let inner_min = self.config.inner_min_lightness;
        let outline_min = self.config.outline_min_lightness;

        Ok(components
            .iter()
            .map(|component| {
                let b = component.bbox;
                let mut inner_pixels = 0;
                let mut outline_pixels = 0;
                for y in b.min_y..=b.max_y {
                    for x in b.min_x..=b.max_x {
                        if labels.get_pixel(x, y)[0] != component.label {
                            continue;
                        }
                        let l = lightness.get_pixel(x, y)[0];
                        if l >= inner_min {
                            inner_pixels += 1;
                        } else if l >= outline_min {
                            outline_pixels += 1;
                        }
                    }
                }
                ToothCandidate {
                    component: component.clone(),
                    inner_pixels,
                    outline_pixels,
                }
            })
            .collect())
    }

    pub fn score(&self, input: &ScoringInput<'_>) -> Result<ScoreReport> {
        if input.width == 0 || input.height == 0 {
            return Err(ScanError::EmptyImage);
        }
        if input.dark.dimensions() != (input.width, input.height) {
            return Err(ScanError::invalid(format!(
                "dark mask is {:?} but image is {}x{}",
                input.dark.dimensions(),
                input.width,
                input.height
            )));
        }

        let ordered = sort_left_to_right(input.candidates);
        let gaps = detect_gaps(&ordered, input.dark, &self.config);

        let metrics = Metrics {
            teeth_count: ordered.len(),
            symmetry_score: symmetry(&ordered, input.width),
            gap_count: gaps.len(),
            bite_score: bite_spread(&ordered),
            inner_outline_ratio: inner_outline_ratio(&ordered),
            alignment_deviation: input.landmarks.map_or(0.0, MouthLandmarks::alignment_deviation),
            landmark_symmetry_deviation: input.landmarks.map_or(0.0, MouthLandmarks::symmetry_deviation),
            spacing_deviation: input.landmarks.map_or(0.0, MouthLandmarks::spacing_deviation),
            missing_landmarks: input.landmarks.map_or(0.0, MouthLandmarks::missing_fraction),
        };
        let score = self.config.weights.combine(&metrics);
        let confidence = if ordered.is_empty() {
            Confidence::Low
        } else {
            Confidence::Normal
        };

        debug!(
            teeth = metrics.teeth_count,
            symmetry = metrics.symmetry_score,
            gaps = metrics.gap_count,
            bite = metrics.bite_score,
            ratio = metrics.inner_outline_ratio,
            alignment = metrics.alignment_deviation,
            missing_landmarks = metrics.missing_landmarks,
            score,
            "scored tooth candidates"
        );

        Ok(ScoreReport {
            metrics,
            score,
            confidence,
            ordered,
            gaps,
        })
    }
}

/// Stable sort by centroid x; ties keep discovery order.
pub fn sort_left_to_right(candidates: &[ToothCandidate]) -> Vec<ToothCandidate> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| {
        a.component
            .center_x()
            .partial_cmp(&b.component.center_x())
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

/// Mirror-pair balance about the vertical centerline, in `[0, 1]`.
pub fn symmetry(sorted: &[ToothCandidate], width: u32) -> f32 {
    let n = sorted.len();
    if n < 2 {
        return NEUTRAL_SYMMETRY;
    }

    let center = (width as f32 - 1.0) / 2.0;
    let half_width = (width as f32 / 2.0).max(1.0);
    let pairs = n / 2;

    let total: f32 = (0..pairs)
        .map(|i| {
            let left = (sorted[i].component.center_x() - center).abs();
            let right = (sorted[n - 1 - i].component.center_x() - center).abs();
            let normalized = ((left - right).abs() / half_width).min(1.0);
            1.0 - normalized
        })
        .sum();

    (total / pairs as f32).clamp(0.0, 1.0)
}

/// Dark strips between same-row neighbours.
pub fn detect_gaps(sorted: &[ToothCandidate], dark: &GrayImage, config: &ScoringConfig) -> Vec<GapRegion> {
    let mut gaps = Vec::new();

    for (i, a) in sorted.iter().enumerate() {
        let neighbour = sorted[i + 1..]
            .iter()
            .find_map(|b| same_row_overlap(a.bbox(), b.bbox(), config.min_row_overlap).map(|rows| (b, rows)));
        let Some((b, (top, bottom))) = neighbour else {
            continue;
        };

        let (left, right) = (a.bbox(), b.bbox());
        if right.min_x <= left.max_x + 1 {
            continue;
        }
        let strip = BoundingBox::new(left.max_x + 1, top, right.min_x - 1, bottom);
        if strip.width() < config.min_gap_width {
            continue;
        }

        let mut dark_pixels = 0u32;
        for y in strip.min_y..=strip.max_y {
            for x in strip.min_x..=strip.max_x {
                if dark.get_pixel(x, y)[0] == FOREGROUND {
                    dark_pixels += 1;
                }
            }
        }
        let dark_fraction = dark_pixels as f32 / strip.area() as f32;

        if dark_fraction > config.gap_dark_fraction {
            gaps.push(GapRegion {
                strip,
                dark_fraction,
                left_label: a.component.label,
                right_label: b.component.label,
            });
        }
    }

    gaps
}

fn same_row_overlap(a: &BoundingBox, b: &BoundingBox, min_fraction: f32) -> Option<(u32, u32)> {
    let (top, bottom) = a.vertical_overlap(b)?;
    let rows = (bottom - top + 1) as f32;
    let shorter = a.height().min(b.height()) as f32;
    (rows >= min_fraction * shorter).then_some((top, bottom))
}

/// Vertical spread of candidate centroids.
pub fn bite_spread(candidates: &[ToothCandidate]) -> f32 {
    let ys = candidates.iter().map(|c| c.component.center_y());
    let (min, max) = ys.fold((f32::MAX, f32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if candidates.is_empty() { 0.0 } else { max - min }
}

pub fn inner_outline_ratio(candidates: &[ToothCandidate]) -> f32 {
    let inner: u64 = candidates.iter().map(|c| c.inner_pixels as u64).sum();
    let outline: u64 = candidates.iter().map(|c| c.outline_pixels as u64).sum();
    inner as f32 / (outline as f32 + 1.0)
}
