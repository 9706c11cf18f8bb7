use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Linear score-to-discount rule: a lower smile score earns a larger
/// discount, bounded to `[min_percent, max_percent]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountPolicy {
    pub factor: f32,
    pub min_percent: u8,
    pub max_percent: u8,
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self {
            factor: 1.0,
            min_percent: 10,
            max_percent: 40,
        }
    }
}

impl DiscountPolicy {
    pub fn validate(&self) -> Result<()> {
        if !self.factor.is_finite() || self.factor < 0.0 {
            return Err(ScanError::invalid(format!(
                "discount factor must be finite and non-negative, got {}",
                self.factor
            )));
        }
        if self.min_percent > self.max_percent {
            return Err(ScanError::invalid(format!(
                "discount bounds are inverted: {} > {}",
                self.min_percent, self.max_percent
            )));
        }
        Ok(())
    }

    /// Discount for `score`. Inverted bounds act as if given in order.
    pub fn discount(&self, score: u8) -> u8 {
        let deficit = 100 - score.min(100);
        let raw = (deficit as f32 * self.factor).round();
        let lo = self.min_percent.min(self.max_percent) as f32;
        let hi = self.max_percent.max(self.min_percent) as f32;
        raw.max(lo).min(hi) as u8
    }
}

/// Discount for a score under the default policy.
pub fn score_to_discount(score: u8) -> u8 {
    DiscountPolicy::default().discount(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_bounds() {
        assert_eq!(score_to_discount(100), 10);
        assert_eq!(score_to_discount(95), 10);
        assert_eq!(score_to_discount(75), 25);
        assert_eq!(score_to_discount(60), 40);
        assert_eq!(score_to_discount(0), 40);
        assert_eq!(score_to_discount(255), 10);
    }

    #[test]
    fn non_increasing_in_score() {
        let policy = DiscountPolicy {
            factor: 0.7,
            min_percent: 0,
            max_percent: 50,
        };
        let mut previous = u8::MAX;
        for score in 0..=100u8 {
            let d = policy.discount(score);
            assert!(d <= previous);
            assert!(d <= 50);
            previous = d;
        }
    }

    #[test]
    fn validation() {
        assert!(DiscountPolicy::default().validate().is_ok());
        let inverted = DiscountPolicy {
            min_percent: 50,
            max_percent: 10,
            ..DiscountPolicy::default()
        };
        assert!(inverted.validate().is_err());
        let negative = DiscountPolicy {
            factor: -1.0,
            ..DiscountPolicy::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn inverted_bounds_still_clamp() {
        let inverted = DiscountPolicy {
            min_percent: 40,
            max_percent: 10,
            ..DiscountPolicy::default()
        };
        assert_eq!(inverted.discount(100), 10);
        assert_eq!(inverted.discount(0), 40);
        assert_eq!(inverted.discount(75), DiscountPolicy::default().discount(75));
    }
}
