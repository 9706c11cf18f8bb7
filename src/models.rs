use std::fmt;

use image::{ImageBuffer, Luma, RgbImage};
use serde::{Deserialize, Serialize};

/// Per-pixel component ids: 0 is background, 1..=N are components.
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Axis-aligned box with inclusive pixel corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub const fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn area(&self) -> u32 {
        self.width() * self.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x as f32 && x <= self.max_x as f32 && y >= self.min_y as f32 && y <= self.max_y as f32
    }

    /// Rows shared by both boxes, as an inclusive `(top, bottom)` range.
    pub fn vertical_overlap(&self, other: &BoundingBox) -> Option<(u32, u32)> {
        let top = self.min_y.max(other.min_y);
        let bottom = self.max_y.min(other.max_y);
        (top <= bottom).then_some((top, bottom))
    }
}

/// A maximal 4-connected foreground region of a mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub label: u32,
    pub bbox: BoundingBox,
    pub area: u32,
    pub centroid: (f32, f32),
}

impl Component {
    pub fn aspect_ratio(&self) -> f32 {
        self.bbox.aspect_ratio()
    }

    pub fn center_x(&self) -> f32 {
        self.centroid.0
    }

    pub fn center_y(&self) -> f32 {
        self.centroid.1
    }
}

/// A component that passed the tooth filter, with its brightness profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToothCandidate {
    pub component: Component,
    /// Member pixels at or above the inner-bright lightness.
    pub inner_pixels: u32,
    /// Member pixels in the outline lightness band.
    pub outline_pixels: u32,
}

impl ToothCandidate {
    pub fn bbox(&self) -> &BoundingBox {
        &self.component.bbox
    }

    pub fn brightness_ratio(&self) -> f32 {
        self.inner_pixels as f32 / (self.outline_pixels as f32 + 1.0)
    }
}

/// A dark strip between two same-row tooth candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapRegion {
    pub strip: BoundingBox,
    pub dark_fraction: f32,
    pub left_label: u32,
    pub right_label: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub teeth_count: usize,
    pub symmetry_score: f32,
    pub gap_count: usize,
    pub bite_score: f32,
    pub inner_outline_ratio: f32,
    /// Lip-line unevenness from landmarks, 0 when none were supplied.
    pub alignment_deviation: f32,
    /// Left/right mismatch of the landmark outline, 0 without landmarks.
    pub landmark_symmetry_deviation: f32,
    /// Unevenness of the landmark spacing, 0 without landmarks.
    pub spacing_deviation: f32,
    /// Share of expected mouth landmarks that are absent, 0 without landmarks.
    pub missing_landmarks: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LipBoxSource {
    None,
    Color,
    Landmarks,
}

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Result of one smile analysis.
#[derive(Debug, Clone, Serialize)]
pub struct SmileAnalysis {
    pub score: u8,
    pub metrics: Metrics,
    pub confidence: Confidence,
    pub lip_box: Option<BoundingBox>,
    pub lip_box_source: LipBoxSource,
    pub candidates: Vec<ToothCandidate>,
    pub gaps: Vec<GapRegion>,
    pub landmarks_supplied: bool,
    #[serde(skip)]
    pub tooth_labels: LabelImage,
    #[serde(skip)]
    pub overlay: RgbImage,
}

impl SmileAnalysis {
    /// No tooth survived filtering and no landmarks were given.
    pub fn nothing_detected(&self) -> bool {
        self.candidates.is_empty() && !self.landmarks_supplied
    }
}

impl fmt::Display for SmileAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "score {} | teeth {} | gaps {} | symmetry {:.2} | bite {:.1} | confidence {:?}",
            self.score,
            self.metrics.teeth_count,
            self.metrics.gap_count,
            self.metrics.symmetry_score,
            self.metrics.bite_score,
            self.confidence,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_dimensions_are_inclusive() {
        let b = BoundingBox::new(2, 3, 7, 12);
        assert_eq!(b.width(), 6);
        assert_eq!(b.height(), 10);
        assert_eq!(b.area(), 60);
        assert!((b.aspect_ratio() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn vertical_overlap() {
        let a = BoundingBox::new(0, 10, 5, 19);
        let b = BoundingBox::new(8, 15, 12, 30);
        let c = BoundingBox::new(8, 25, 12, 30);
        assert_eq!(a.vertical_overlap(&b), Some((15, 19)));
        assert_eq!(a.vertical_overlap(&c), None);
    }
}
