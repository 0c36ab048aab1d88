//! Colormap evaluation.
//!
//! Each ramp is a fixed table of 11 control colors spaced `0.1` apart. A value
//! is clamped to `[0, 1]` and linearly interpolated between the two bracketing
//! control points. The tables are immutable statics and safe to share between
//! threads.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of control colors per ramp.
pub const CONTROL_POINTS: usize = 11;

/// A named color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorRamp {
    #[default]
    Viridis,
    Magma,
    Plasma,
    Inferno,
}

impl ColorRamp {
    /// All supported ramps.
    pub const ALL: [ColorRamp; 4] = [
        ColorRamp::Viridis,
        ColorRamp::Magma,
        ColorRamp::Plasma,
        ColorRamp::Inferno,
    ];

    /// Returns the lowercase ramp name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ColorRamp::Viridis => "viridis",
            ColorRamp::Magma => "magma",
            ColorRamp::Plasma => "plasma",
            ColorRamp::Inferno => "inferno",
        }
    }

    /// Looks a ramp up by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|ramp| ramp.name().eq_ignore_ascii_case(name))
    }

    /// Looks a ramp up by name, falling back to viridis for unknown names.
    pub fn resolve(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            log::warn!("unknown colormap '{name}', using viridis");
            ColorRamp::Viridis
        })
    }

    /// Returns the control colors of this ramp.
    #[must_use]
    pub fn colors(self) -> &'static [Vec3; CONTROL_POINTS] {
        match self {
            ColorRamp::Viridis => &VIRIDIS,
            ColorRamp::Magma => &MAGMA,
            ColorRamp::Plasma => &PLASMA,
            ColorRamp::Inferno => &INFERNO,
        }
    }

    /// Samples the ramp at `t`. Values outside `[0, 1]` are clamped and NaN
    /// maps to the first control color.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sample(self, t: f32) -> Vec3 {
        let colors = self.colors();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let segments = (CONTROL_POINTS - 1) as f32;
        let scaled = t * segments;
        // t == 1.0 stays in the last bracket
        let idx = (scaled.floor() as usize).min(CONTROL_POINTS - 2);
        let frac = scaled - idx as f32;

        colors[idx].lerp(colors[idx + 1], frac)
    }
}

/// Evaluates the ramp called `ramp_id` at `t`.
///
/// Unknown ramp names fall back to viridis with a warning.
#[must_use]
pub fn evaluate(ramp_id: &str, t: f32) -> Vec3 {
    ColorRamp::resolve(ramp_id).sample(t)
}

static VIRIDIS: [Vec3; CONTROL_POINTS] = [
    Vec3::new(0.267, 0.005, 0.329),
    Vec3::new(0.283, 0.141, 0.458),
    Vec3::new(0.254, 0.265, 0.530),
    Vec3::new(0.207, 0.372, 0.553),
    Vec3::new(0.164, 0.471, 0.558),
    Vec3::new(0.128, 0.567, 0.551),
    Vec3::new(0.135, 0.659, 0.518),
    Vec3::new(0.267, 0.749, 0.441),
    Vec3::new(0.478, 0.821, 0.318),
    Vec3::new(0.741, 0.873, 0.150),
    Vec3::new(0.993, 0.906, 0.144),
];

static MAGMA: [Vec3; CONTROL_POINTS] = [
    Vec3::new(0.0015, 0.0005, 0.0139),
    Vec3::new(0.063, 0.027, 0.145),
    Vec3::new(0.236, 0.054, 0.239),
    Vec3::new(0.387, 0.094, 0.325),
    Vec3::new(0.533, 0.165, 0.376),
    Vec3::new(0.678, 0.290, 0.388),
    Vec3::new(0.804, 0.431, 0.383),
    Vec3::new(0.906, 0.588, 0.376),
    Vec3::new(0.976, 0.751, 0.478),
    Vec3::new(0.984, 0.894, 0.706),
    Vec3::new(0.987, 0.991, 0.749),
];

static PLASMA: [Vec3; CONTROL_POINTS] = [
    Vec3::new(0.050, 0.030, 0.527),
    Vec3::new(0.303, 0.039, 0.674),
    Vec3::new(0.503, 0.020, 0.702),
    Vec3::new(0.678, 0.051, 0.596),
    Vec3::new(0.829, 0.158, 0.459),
    Vec3::new(0.954, 0.317, 0.317),
    Vec3::new(0.991, 0.498, 0.189),
    Vec3::new(0.940, 0.682, 0.150),
    Vec3::new(0.828, 0.854, 0.231),
    Vec3::new(0.739, 0.974, 0.443),
    Vec3::new(0.940, 0.975, 0.600),
];

static INFERNO: [Vec3; CONTROL_POINTS] = [
    Vec3::new(0.001, 0.000, 0.014),
    Vec3::new(0.067, 0.016, 0.172),
    Vec3::new(0.223, 0.033, 0.373),
    Vec3::new(0.416, 0.057, 0.502),
    Vec3::new(0.626, 0.127, 0.474),
    Vec3::new(0.796, 0.254, 0.374),
    Vec3::new(0.902, 0.427, 0.286),
    Vec3::new(0.973, 0.627, 0.202),
    Vec3::new(0.988, 0.816, 0.144),
    Vec3::new(0.989, 0.957, 0.208),
    Vec3::new(0.998, 0.998, 0.858),
];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_endpoints_match_table() {
        for ramp in ColorRamp::ALL {
            let colors = ramp.colors();
            assert!(close(ramp.sample(0.0), colors[0]));
            assert!(close(ramp.sample(1.0), colors[CONTROL_POINTS - 1]));
        }
    }

    #[test]
    fn test_midpoint_interpolates() {
        let expected = VIRIDIS[0].lerp(VIRIDIS[1], 0.5);
        assert!(close(ColorRamp::Viridis.sample(0.05), expected));
    }

    #[test]
    fn test_top_bracket_uses_last_two_points() {
        let expected = PLASMA[9].lerp(PLASMA[10], 0.5);
        assert!(close(ColorRamp::Plasma.sample(0.95), expected));
    }

    #[test]
    fn test_bracket_boundaries_agree() {
        for ramp in ColorRamp::ALL {
            let colors = ramp.colors();
            for i in 1..CONTROL_POINTS - 1 {
                let from_lower = colors[i - 1].lerp(colors[i], 1.0);
                let from_upper = colors[i].lerp(colors[i + 1], 0.0);
                assert!(close(from_lower, from_upper));
            }
            let below = ramp.sample(0.1 - 1e-6);
            let above = ramp.sample(0.1 + 1e-6);
            assert!(close(below, above), "{ramp:?} jumps at 0.1");
            assert!(close(ramp.sample(0.1), colors[1]));
        }
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(ColorRamp::from_name("Magma"), Some(ColorRamp::Magma));
        assert_eq!(ColorRamp::from_name(" inferno "), Some(ColorRamp::Inferno));
        assert_eq!(ColorRamp::from_name("cividis"), None);
        assert_eq!(ColorRamp::resolve("cividis"), ColorRamp::Viridis);
    }

    #[test]
    fn test_unknown_name_evaluates_as_viridis() {
        assert!(close(evaluate("jet", 0.3), ColorRamp::Viridis.sample(0.3)));
    }

    #[test]
    fn test_nan_maps_to_first_color() {
        assert!(close(ColorRamp::Magma.sample(f32::NAN), MAGMA[0]));
    }

    proptest! {
        #[test]
        fn prop_clamps_below_zero(t in -1.0e6_f32..0.0) {
            for ramp in ColorRamp::ALL {
                prop_assert!(close(ramp.sample(t), ramp.sample(0.0)));
            }
        }

        #[test]
        fn prop_clamps_above_one(t in 1.0_f32..1.0e6) {
            for ramp in ColorRamp::ALL {
                prop_assert!(close(ramp.sample(t), ramp.sample(1.0)));
            }
        }

        #[test]
        fn prop_continuous(t in 0.0_f32..0.999) {
            // Steepest segment (inferno, blue, 0.9..1.0) moves 0.65 per 0.1.
            for ramp in ColorRamp::ALL {
                let a = ramp.sample(t);
                let b = ramp.sample(t + 1e-3);
                prop_assert!((a - b).abs().max_element() < 1e-2);
            }
        }

        #[test]
        fn prop_stays_in_unit_cube(t in -2.0_f32..2.0) {
            for ramp in ColorRamp::ALL {
                let c = ramp.sample(t);
                prop_assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
            }
        }
    }
}
