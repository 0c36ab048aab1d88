//! Min/max statistics used to normalize field values.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::normalization;

/// Value range of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStatistics {
    pub min: f32,
    pub max: f32,
}

impl FieldStatistics {
    /// Computes min/max with a single scan. Non-finite values are ignored.
    ///
    /// Returns `None` when there is no finite value.
    pub fn from_values(values: &[f32]) -> Option<Self> {
        let (min, max) = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            None
        } else {
            Some(Self { min, max })
        }
    }

    /// Computes min/max over the Euclidean norms of `vectors`.
    pub fn from_magnitudes(vectors: &[Vec3]) -> Option<Self> {
        let lengths: Vec<f32> = vectors.iter().map(|v| v.length()).collect();
        Self::from_values(&lengths)
    }

    /// Width of the range.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.max - self.min
    }

    /// True when every value was the same.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Maps `value` into `[0, 1]` relative to this range; `0` for a degenerate range.
    #[must_use]
    pub fn normalize(&self, value: f32) -> f32 {
        normalization::normalize(value, self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_basic_range() {
        let stats = FieldStatistics::from_values(&[3.0, -1.0, 2.0]).unwrap();
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.range(), 4.0);
    }

    #[test]
    fn test_empty_and_non_finite() {
        assert!(FieldStatistics::from_values(&[]).is_none());
        assert!(FieldStatistics::from_values(&[f32::NAN, f32::INFINITY]).is_none());
        let stats = FieldStatistics::from_values(&[f32::NAN, 2.0]).unwrap();
        assert_eq!((stats.min, stats.max), (2.0, 2.0));
    }

    #[test]
    fn test_magnitudes() {
        let stats =
            FieldStatistics::from_magnitudes(&[Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0)])
                .unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 2.0);
    }

    #[test]
    fn test_degenerate_does_not_divide_by_zero() {
        let stats = FieldStatistics::from_values(&[5.0, 5.0, 5.0]).unwrap();
        assert!(stats.is_degenerate());
        assert_eq!(stats.normalize(5.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_bounds_contain_all_values(values in proptest::collection::vec(-1.0e6_f32..1.0e6, 1..64)) {
            let stats = FieldStatistics::from_values(&values).unwrap();
            for v in &values {
                prop_assert!(stats.min <= *v && *v <= stats.max);
            }
            prop_assert!(values.contains(&stats.min));
            prop_assert!(values.contains(&stats.max));
        }
    }
}
