use image::{Rgb, RgbImage};
use smilescan::{MouthLandmarks, Point};

/// Near-white enamel: lightness ~0.95, saturation 0.
pub const TOOTH: Rgb<u8> = Rgb([242, 242, 242]);
/// Mid-grey between teeth: neither tooth, lip nor dark.
pub const SEPARATOR: Rgb<u8> = Rgb([115, 115, 115]);
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

pub const SMILE_WIDTH: u32 = 100;
pub const SMILE_HEIGHT: u32 = 60;
pub const TOOTH_WIDTH: u32 = 6;
pub const TOOTH_HEIGHT: u32 = 10;
pub const SEPARATOR_WIDTH: u32 = 2;
pub const TEETH_PER_ROW: u32 = 6;
pub const ROW_TOPS: [u32; 2] = [15, 27];

/// Left edge of the first tooth; the rows are centred on the image.
pub fn first_tooth_x() -> u32 {
    let row_width = TEETH_PER_ROW * TOOTH_WIDTH + (TEETH_PER_ROW - 1) * SEPARATOR_WIDTH;
    (SMILE_WIDTH - row_width) / 2
}

pub fn tooth_x(index: u32) -> u32 {
    first_tooth_x() + index * (TOOTH_WIDTH + SEPARATOR_WIDTH)
}

fn fill(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, color);
        }
    }
}

/// 100x60 black image with two mirrored rows of six 6x10 white teeth,
/// separated by grey strips.
pub fn smile_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(SMILE_WIDTH, SMILE_HEIGHT, BACKGROUND);
    let row_width = tooth_x(TEETH_PER_ROW - 1) + TOOTH_WIDTH - first_tooth_x();

    for top in ROW_TOPS {
        fill(&mut img, first_tooth_x(), top, row_width, TOOTH_HEIGHT, SEPARATOR);
        for i in 0..TEETH_PER_ROW {
            fill(&mut img, tooth_x(i), top, TOOTH_WIDTH, TOOTH_HEIGHT, TOOTH);
        }
    }
    img
}

/// `smile_image` with the top-row strip right of tooth `after` turned dark.
pub fn smile_image_with_gap(after: u32) -> RgbImage {
    let mut img = smile_image();
    let x = tooth_x(after) + TOOTH_WIDTH;
    fill(&mut img, x, ROW_TOPS[0], SEPARATOR_WIDTH, TOOTH_HEIGHT, BACKGROUND);
    img
}

pub fn blank_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, BACKGROUND)
}

/// Mouth outline around the top row only.
pub fn top_row_landmarks() -> MouthLandmarks {
    MouthLandmarks::new(vec![
        Point::new(20.0, 10.0),
        Point::new(50.0, 12.0),
        Point::new(80.0, 10.0),
        Point::new(80.0, 25.0),
        Point::new(50.0, 25.0),
        Point::new(20.0, 25.0),
    ])
}

pub const PALE_SKIN: Rgb<u8> = Rgb([240, 220, 210]);
pub const LIP: Rgb<u8> = Rgb([170, 50, 70]);

/// 400x240 face crop: pale skin, a lip block at (80, 60)-(319, 179), a dark
/// mouth opening and two rows of eight 20x30 teeth one pixel apart.
pub fn portrait_smile_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(400, 240, PALE_SKIN);
    fill(&mut img, 80, 60, 240, 120, LIP);
    fill(&mut img, 104, 84, 192, 72, Rgb([15, 10, 10]));
    for top in [88, 122] {
        for i in 0..8 {
            fill(&mut img, 116 + i * 21, top, 20, 30, Rgb([240, 238, 230]));
        }
    }
    img
}
