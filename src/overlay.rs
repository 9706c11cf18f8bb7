use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::color::Hsl;
use crate::models::{BoundingBox, GapRegion, ToothCandidate};

/// Draws the segmentation result over a copy of the input image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayRenderer {
    pub lip_color: [u8; 3],
    pub gap_color: [u8; 3],
    pub gap_alpha: f32,
    pub tooth_fill_alpha: f32,
    pub score_bar: bool,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            lip_color: [255, 0, 255],
            gap_color: [255, 220, 0],
            gap_alpha: 0.5,
            tooth_fill_alpha: 0.3,
            score_bar: true,
        }
    }
}

impl OverlayRenderer {
    pub fn render(
        &self,
        image: &RgbImage,
        lip_box: Option<&BoundingBox>,
        candidates: &[ToothCandidate],
        gaps: &[GapRegion],
        score: Option<u8>,
    ) -> RgbImage {
        let mut canvas = image.clone();

        for gap in gaps {
            shade(&mut canvas, &gap.strip, Rgb(self.gap_color), self.gap_alpha);
        }

        for candidate in candidates {
            let color = ratio_color(candidate.brightness_ratio());
            shade(&mut canvas, candidate.bbox(), color, self.tooth_fill_alpha);
            draw_hollow_rect_mut(&mut canvas, to_rect(candidate.bbox()), color);
        }

        if let Some(lip) = lip_box {
            draw_hollow_rect_mut(&mut canvas, to_rect(lip), Rgb(self.lip_color));
        }

        if let (true, Some(score)) = (self.score_bar, score) {
            draw_score_bar(&mut canvas, score);
        }

        canvas
    }
}

/// Red at ratio 0, approaching green as inner-bright pixels dominate.
pub fn ratio_color(ratio: f32) -> Rgb<u8> {
    let r = ratio.max(0.0);
    let t = r / (r + 1.0);
    Hsl::new(120.0 * t, 1.0, 0.5).to_rgb()
}

fn to_rect(b: &BoundingBox) -> Rect {
    Rect::at(b.min_x as i32, b.min_y as i32).of_size(b.width(), b.height())
}

/// Alpha-blend a solid color over a box, clipped to the canvas.
fn shade(canvas: &mut RgbImage, b: &BoundingBox, color: Rgb<u8>, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    let max_x = b.max_x.min(canvas.width().saturating_sub(1));
    let max_y = b.max_y.min(canvas.height().saturating_sub(1));
    for y in b.min_y..=max_y {
        for x in b.min_x..=max_x {
            let px = canvas.get_pixel_mut(x, y);
            for c in 0..3 {
                let blended = px[c] as f32 * (1.0 - alpha) + color[c] as f32 * alpha;
                px[c] = blended.round() as u8;
            }
        }
    }
}

fn draw_score_bar(canvas: &mut RgbImage, score: u8) {
    let (width, height) = canvas.dimensions();
    let bar_height = (height / 40).max(2).min(height);
    let bar_width = (width as u64 * score.min(100) as u64 / 100) as u32;
    if bar_width == 0 || bar_height == 0 {
        return;
    }
    let color = Hsl::new(1.2 * score.min(100) as f32, 1.0, 0.5).to_rgb();
    let rect = Rect::at(0, (height - bar_height) as i32).of_size(bar_width, bar_height);
    draw_filled_rect_mut(canvas, rect, color);
}
