use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detection::classify::PixelClassifier;
use crate::detection::filter::FilterConfig;
use crate::detection::scoring::ScoringConfig;
use crate::discount::DiscountPolicy;
use crate::error::{Result, ScanError};
use crate::overlay::OverlayRenderer;

/// Every tunable of the scanner. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub classifier: PixelClassifier,
    pub filter: FilterConfig,
    pub scoring: ScoringConfig,
    pub overlay: OverlayRenderer,
    pub discount: DiscountPolicy,
}

impl ScanConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        let unit_values = [
            ("classifier.tooth_min_lightness", c.tooth_min_lightness),
            ("classifier.tooth_max_saturation", c.tooth_max_saturation),
            ("classifier.lip_min_saturation", c.lip_min_saturation),
            ("classifier.lip_min_lightness", c.lip_min_lightness),
            ("classifier.lip_max_lightness", c.lip_max_lightness),
            ("classifier.dark_max_lightness", c.dark_max_lightness),
            ("scoring.inner_min_lightness", self.scoring.inner_min_lightness),
            ("scoring.outline_min_lightness", self.scoring.outline_min_lightness),
            ("scoring.min_row_overlap", self.scoring.min_row_overlap),
            ("scoring.gap_dark_fraction", self.scoring.gap_dark_fraction),
        ];
        for (name, value) in unit_values {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScanError::invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if !c.tooth_mean_factor.is_finite() || c.tooth_mean_factor < 0.0 {
            return Err(ScanError::invalid("classifier.tooth_mean_factor must be finite and non-negative"));
        }
        if self.scoring.outline_min_lightness > self.scoring.inner_min_lightness {
            return Err(ScanError::invalid(
                "scoring.outline_min_lightness must not exceed scoring.inner_min_lightness",
            ));
        }

        let f = &self.filter;
        if !(f.min_aspect.is_finite() && f.max_aspect.is_finite()) || f.min_aspect > f.max_aspect {
            return Err(ScanError::invalid(format!(
                "filter aspect range [{}, {}] is invalid",
                f.min_aspect, f.max_aspect
            )));
        }
        if !(f.min_area_fraction >= 0.0 && f.max_area_fraction >= 0.0) {
            return Err(ScanError::invalid("filter area fractions must be non-negative"));
        }

        self.scoring.weights.validate()?;
        self.discount.validate()
    }
}
