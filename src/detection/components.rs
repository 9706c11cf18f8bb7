use image::{GrayImage, Luma};

use crate::detection::classify::FOREGROUND;
use crate::error::{Result, ScanError};
use crate::models::{BoundingBox, Component, LabelImage};

/// Label grid plus one component record per label, in label order.
#[derive(Debug, Clone)]
pub struct Labelling {
    pub labels: LabelImage,
    pub components: Vec<Component>,
}

/// Running totals for the component currently being filled.
struct Accumulator {
    area: u32,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    sum_x: u64,
    sum_y: u64,
}

impl Accumulator {
    fn new(x: u32, y: u32) -> Self {
        Self {
            area: 0,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            sum_x: 0,
            sum_y: 0,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.area += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.sum_x += x as u64;
        self.sum_y += y as u64;
    }

    fn finish(self, label: u32) -> Component {
        let area = self.area as f64;
        Component {
            label,
            bbox: BoundingBox::new(self.min_x, self.min_y, self.max_x, self.max_y),
            area: self.area,
            centroid: ((self.sum_x as f64 / area) as f32, (self.sum_y as f64 / area) as f32),
        }
    }
}

/// Find 4-connected foreground components in a binary mask.
///
/// Seeds are taken in raster order, so label ids are stable for a given
/// mask. The outermost one-pixel frame is treated as background. The fill
/// uses an explicit stack and touches every foreground pixel once.
pub fn label_components(mask: &GrayImage) -> Result<Labelling> {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return Err(ScanError::EmptyImage);
    }

    let mut labels = LabelImage::new(width, height);
    let mut components = Vec::new();
    let mut stack: Vec<(u32, u32)> = Vec::new();

    if width < 3 || height < 3 {
        return Ok(Labelling { labels, components });
    }

    let inside = |x: u32, y: u32| x >= 1 && y >= 1 && x < width - 1 && y < height - 1;
    let is_foreground = |x: u32, y: u32| mask.get_pixel(x, y)[0] == FOREGROUND;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            if !is_foreground(x, y) || labels.get_pixel(x, y)[0] != 0 {
                continue;
            }

            let label = components.len() as u32 + 1;
            let mut acc = Accumulator::new(x, y);
            labels.put_pixel(x, y, Luma([label]));
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                acc.add(cx, cy);

                // Up, down, left, right only.
                let neighbours = [
                    (cx, cy.wrapping_sub(1)),
                    (cx, cy + 1),
                    (cx.wrapping_sub(1), cy),
                    (cx + 1, cy),
                ];
                for (nx, ny) in neighbours {
                    if inside(nx, ny) && is_foreground(nx, ny) && labels.get_pixel(nx, ny)[0] == 0 {
                        labels.put_pixel(nx, ny, Luma([label]));
                        stack.push((nx, ny));
                    }
                }
            }

            components.push(acc.finish(label));
        }
    }

    Ok(Labelling { labels, components })
}
