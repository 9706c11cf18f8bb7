//! Mouth landmarks supplied by an external face-landmark detector.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::models::{BoundingBox, Point};

/// Face-mesh indices of the mouth outline (468-point mesh layout), in
/// outline order starting at the left corner.
pub const MOUTH_MESH_INDICES: [usize; 12] = [61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 308];

/// Number of outline points a complete mouth has.
pub const MOUTH_LANDMARK_COUNT: usize = MOUTH_MESH_INDICES.len();

/// Ordered mouth outline points in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MouthLandmarks {
    pub points: Vec<Point>,
}

impl MouthLandmarks {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Scale `[0, 1]` coordinates to a `width` x `height` image.
    pub fn from_normalized(points: &[Point], width: u32, height: u32) -> Self {
        let points = points
            .iter()
            .map(|p| Point::new(p.x * width as f32, p.y * height as f32))
            .collect();
        Self { points }
    }

    pub fn validate(&self) -> Result<()> {
        if self.points.is_empty() {
            return Err(ScanError::invalid("landmark list is empty"));
        }
        if let Some(p) = self.points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(ScanError::invalid(format!(
                "landmark ({}, {}) is not finite",
                p.x, p.y
            )));
        }
        Ok(())
    }

    /// Bounding box of the points clamped to the image.
    pub fn lip_box(&self, width: u32, height: u32) -> Result<BoundingBox> {
        self.validate()?;
        if width == 0 || height == 0 {
            return Err(ScanError::EmptyImage);
        }

        let (min_x, min_y, max_x, max_y) = self.extent();
        let right = (width - 1) as f32;
        let bottom = (height - 1) as f32;
        if max_x < 0.0 || max_y < 0.0 || min_x > right || min_y > bottom {
            return Err(ScanError::invalid(format!(
                "landmarks lie outside the {width}x{height} image"
            )));
        }

        Ok(BoundingBox::new(
            min_x.max(0.0).floor() as u32,
            min_y.max(0.0).floor() as u32,
            max_x.min(right).ceil() as u32,
            max_y.min(bottom).ceil() as u32,
        ))
    }

    /// Pick the mouth outline out of a full face mesh. Indices the mesh
    /// does not reach are skipped, which shows up as missing landmarks.
    pub fn from_face_mesh(mesh: &[Point]) -> Self {
        let points = MOUTH_MESH_INDICES
            .iter()
            .filter_map(|&i| mesh.get(i).copied())
            .collect();
        Self { points }
    }

    /// Mean absolute vertical deviation of the points, relative to the
    /// width they span.
    pub fn alignment_deviation(&self) -> f32 {
        let Some(span) = self.span() else {
            return 0.0;
        };

        let n = self.points.len() as f32;
        let mean_y = self.points.iter().map(|p| p.y).sum::<f32>() / n;
        let deviation = self.points.iter().map(|p| (p.y - mean_y).abs()).sum::<f32>() / n;
        deviation / span
    }

    /// Left half of the outline against the mirrored right half.
    ///
    /// Point `i` of the first half pairs with point `i` counted from the end
    /// of the second half; each pair is mirrored about the horizontal centre
    /// of the points. Mean horizontal mismatch, relative to the span.
    pub fn symmetry_deviation(&self) -> f32 {
        let Some(span) = self.span() else {
            return 0.0;
        };
        let (min_x, _, max_x, _) = self.extent();
        let center = (min_x + max_x) / 2.0;

        let (left, right) = self.points.split_at(self.points.len() / 2);
        if left.is_empty() {
            return 0.0;
        }
        let mismatch: f32 = left
            .iter()
            .zip(right.iter().rev())
            .map(|(l, r)| (l.x + r.x - 2.0 * center).abs())
            .sum();
        mismatch / left.len() as f32 / span
    }

    /// Mean absolute deviation of the distances between consecutive
    /// points, relative to the span. Evenly spaced outlines give 0.
    pub fn spacing_deviation(&self) -> f32 {
        let Some(span) = self.span() else {
            return 0.0;
        };
        let distances: Vec<f32> = self
            .points
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .collect();
        if distances.is_empty() {
            return 0.0;
        }

        let n = distances.len() as f32;
        let mean = distances.iter().sum::<f32>() / n;
        let deviation = distances.iter().map(|d| (d - mean).abs()).sum::<f32>() / n;
        deviation / span
    }

    /// Share of the expected mouth landmarks that are absent, in `[0, 1]`.
    pub fn missing_fraction(&self) -> f32 {
        let present = self.points.len().min(MOUTH_LANDMARK_COUNT);
        (MOUTH_LANDMARK_COUNT - present) as f32 / MOUTH_LANDMARK_COUNT as f32
    }

    /// Horizontal extent of the points, `None` when it is degenerate.
    fn span(&self) -> Option<f32> {
        if self.points.is_empty() {
            return None;
        }
        let (min_x, _, max_x, _) = self.extent();
        let span = max_x - min_x;
        (span > f32::EPSILON).then_some(span)
    }

    fn extent(&self) -> (f32, f32, f32, f32) {
        self.points.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        )
    }
}
