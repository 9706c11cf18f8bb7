use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::color::Hsl;
use crate::error::{Result, ScanError};

pub const FOREGROUND: u8 = 255;

/// Per-pixel HSL lightness, same dimensions as the source image.
pub type LightnessPlane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Color thresholds for the tooth, lip and dark classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelClassifier {
    pub tooth_min_lightness: f32,
    /// Multiplier on the mean image lightness; the larger of the two floors wins.
    pub tooth_mean_factor: f32,
    pub tooth_max_saturation: f32,
    /// Lip hues wrap through red: `h >= lip_hue_from || h <= lip_hue_to`.
    pub lip_hue_from: f32,
    pub lip_hue_to: f32,
    pub lip_min_saturation: f32,
    pub lip_min_lightness: f32,
    pub lip_max_lightness: f32,
    pub dark_max_lightness: f32,
}

impl Default for PixelClassifier {
    fn default() -> Self {
        Self {
            tooth_min_lightness: 0.6,
            tooth_mean_factor: 1.0,
            tooth_max_saturation: 0.35,
            lip_hue_from: 260.0,
            lip_hue_to: 40.0,
            lip_min_saturation: 0.25,
            lip_min_lightness: 0.08,
            lip_max_lightness: 0.85,
            dark_max_lightness: 0.2,
        }
    }
}

/// Output of one classification pass.
#[derive(Debug, Clone)]
pub struct ClassMasks {
    pub tooth: GrayImage,
    pub lip: GrayImage,
    pub dark: GrayImage,
    pub lightness: LightnessPlane,
    pub mean_lightness: f32,
    /// Lightness a pixel must exceed to count as tooth.
    pub tooth_threshold: f32,
}

impl PixelClassifier {
    pub fn tooth_threshold(&self, mean_lightness: f32) -> f32 {
        self.tooth_min_lightness.max(mean_lightness * self.tooth_mean_factor)
    }

    pub fn is_tooth(&self, hsl: &Hsl, threshold: f32) -> bool {
        hsl.l > threshold && hsl.s < self.tooth_max_saturation
    }

    pub fn is_lip(&self, hsl: &Hsl) -> bool {
        let hue_ok = hsl.h >= self.lip_hue_from || hsl.h <= self.lip_hue_to;
        hue_ok
            && hsl.s > self.lip_min_saturation
            && hsl.l > self.lip_min_lightness
            && hsl.l < self.lip_max_lightness
    }

    pub fn is_dark(&self, hsl: &Hsl) -> bool {
        hsl.l < self.dark_max_lightness
    }

    /// Build the three class masks for an image.
    pub fn classify(&self, image: &RgbImage) -> Result<ClassMasks> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::EmptyImage);
        }

        // First pass: HSL per pixel, accumulating mean lightness.
        let hsl: Vec<Hsl> = image.pixels().map(Hsl::from_pixel).collect();
        let total: f64 = hsl.iter().map(|p| p.l as f64).sum();
        let mean_lightness = (total / hsl.len() as f64) as f32;
        let tooth_threshold = self.tooth_threshold(mean_lightness);

        let mut tooth = GrayImage::new(width, height);
        let mut lip = GrayImage::new(width, height);
        let mut dark = GrayImage::new(width, height);
        let mut lightness = LightnessPlane::new(width, height);

        for (i, p) in hsl.iter().enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;
            lightness.put_pixel(x, y, Luma([p.l]));
            if self.is_tooth(p, tooth_threshold) {
                tooth.put_pixel(x, y, Luma([FOREGROUND]));
            }
            if self.is_lip(p) {
                lip.put_pixel(x, y, Luma([FOREGROUND]));
            }
            if self.is_dark(p) {
                dark.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }

        Ok(ClassMasks {
            tooth,
            lip,
            dark,
            lightness,
            mean_lightness,
            tooth_threshold,
        })
    }
}

/// Count of foreground pixels in a mask.
pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] == FOREGROUND).count()
}
