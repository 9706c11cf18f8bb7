use serde::{Deserialize, Serialize};

use crate::models::Component;

/// Size gates that scale with the image, plus a fixed aspect-ratio band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum area as a fraction of the image pixel count.
    pub min_area_fraction: f32,
    /// Absolute floor for the minimum area, in pixels.
    pub min_area_floor: u32,
    /// Maximum area as a fraction of the image pixel count.
    pub max_area_fraction: f32,
    pub min_aspect: f32,
    pub max_aspect: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_area_fraction: 0.00005,
            min_area_floor: 60,
            max_area_fraction: 0.05,
            min_aspect: 0.2,
            max_aspect: 1.5,
        }
    }
}

/// Concrete gates for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentFilter {
    pub min_area: u32,
    pub max_area: u32,
    pub min_aspect: f32,
    pub max_aspect: f32,
}

impl ComponentFilter {
    pub fn for_image(width: u32, height: u32, config: &FilterConfig) -> Self {
        let pixels = width as f64 * height as f64;
        let min_area = ((config.min_area_fraction as f64 * pixels).round() as u32).max(config.min_area_floor);
        let max_area = ((config.max_area_fraction as f64 * pixels).round() as u32).max(min_area);
        Self {
            min_area,
            max_area,
            min_aspect: config.min_aspect,
            max_aspect: config.max_aspect,
        }
    }

    pub fn accepts(&self, component: &Component) -> bool {
        let aspect = component.aspect_ratio();
        component.area >= self.min_area
            && component.area <= self.max_area
            && aspect >= self.min_aspect
            && aspect <= self.max_aspect
    }

    /// Keep plausible tooth components, preserving discovery order.
    pub fn filter(&self, components: &[Component]) -> Vec<Component> {
        components.iter().filter(|c| self.accepts(c)).cloned().collect()
    }
}
