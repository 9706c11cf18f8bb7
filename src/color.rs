//! HSL conversion used by the pixel classifier and the overlay palette.

use image::Rgb;
use palette::{FromColor, Hsl as PaletteHsl, Srgb};

/// A color in HSL space.
///
/// `h` is in degrees `[0, 360)`, `s` and `l` are in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    /// Convert an 8-bit sRGB triple. Achromatic inputs get `h = 0, s = 0`.
    #[inline]
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let rgb: Srgb<f32> = Srgb::new(r, g, b).into_format();
        let hsl: PaletteHsl = PaletteHsl::from_color(rgb);

        if hsl.saturation.abs() < 1e-6 {
            return Self::new(0.0, 0.0, hsl.lightness);
        }
        Self::new(hsl.hue.into_positive_degrees(), hsl.saturation, hsl.lightness)
    }

    pub fn from_pixel(p: &Rgb<u8>) -> Self {
        Self::from_rgb(p[0], p[1], p[2])
    }

    /// Convert back to an 8-bit sRGB pixel.
    pub fn to_rgb(&self) -> Rgb<u8> {
        let hsl: PaletteHsl = PaletteHsl::new(self.h.rem_euclid(360.0), self.s.clamp(0.0, 1.0), self.l.clamp(0.0, 1.0));
        let rgb: Srgb = Srgb::from_color(hsl);
        let rgb: Srgb<u8> = rgb.into_format();
        Rgb([rgb.red, rgb.green, rgb.blue])
    }
}
