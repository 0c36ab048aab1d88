//! Configuration options for field visualization.

use serde::{Deserialize, Serialize};

use crate::color_map::ColorRamp;
use crate::error::Result;
use crate::field::{ColorChannel, GlyphStyle};

/// Instance count above which vector glyphs are resolved on the GPU.
pub const DEFAULT_GPU_INSTANCE_THRESHOLD: usize = 20_000;

/// Tunables of the visualization core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationOptions {
    /// Vector fields with more instances than this take the GPU-deferred path.
    pub gpu_instance_threshold: usize,

    /// Glyph length used when a request gives no `min_length`.
    pub default_min_length: f32,

    /// Glyph length used when a request gives no `max_length`.
    pub default_max_length: f32,

    /// Ramp used when a request names none.
    pub default_ramp: ColorRamp,

    /// Color channel used when a request names none.
    pub default_channel: ColorChannel,
}

impl Default for VisualizationOptions {
    fn default() -> Self {
        Self {
            gpu_instance_threshold: DEFAULT_GPU_INSTANCE_THRESHOLD,
            default_min_length: 0.1,
            default_max_length: 1.0,
            default_ramp: ColorRamp::Viridis,
            default_channel: ColorChannel::Magnitude,
        }
    }
}

impl VisualizationOptions {
    /// Parses options from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_gpu_instance_threshold(mut self, threshold: usize) -> Self {
        self.gpu_instance_threshold = threshold;
        self
    }

    pub fn with_length_range(mut self, min_length: f32, max_length: f32) -> Self {
        self.default_min_length = min_length;
        self.default_max_length = max_length;
        self
    }

    pub fn with_default_ramp(mut self, ramp: ColorRamp) -> Self {
        self.default_ramp = ramp;
        self
    }

    pub fn with_default_channel(mut self, channel: ColorChannel) -> Self {
        self.default_channel = channel;
        self
    }

    /// Glyph style built from the defaults.
    #[must_use]
    pub fn glyph_style(&self) -> GlyphStyle {
        GlyphStyle {
            min_length: self.default_min_length,
            max_length: self.default_max_length,
            channel: self.default_channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = VisualizationOptions::default();
        assert_eq!(options.gpu_instance_threshold, 20_000);
        assert_eq!(options.glyph_style(), GlyphStyle::default());
        assert_eq!(options.default_ramp, ColorRamp::Viridis);
    }

    #[test]
    fn test_from_json_partial() {
        let options =
            VisualizationOptions::from_json(r#"{"gpu_instance_threshold": 10, "default_ramp": "magma"}"#)
                .unwrap();
        assert_eq!(options.gpu_instance_threshold, 10);
        assert_eq!(options.default_ramp, ColorRamp::Magma);
        assert_eq!(options.default_max_length, 1.0);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(VisualizationOptions::from_json("{").is_err());
        assert!(VisualizationOptions::from_json(r#"{"default_channel": 3}"#).is_err());
    }

    #[test]
    fn test_builder() {
        let options = VisualizationOptions::default()
            .with_gpu_instance_threshold(0)
            .with_length_range(0.5, 2.0)
            .with_default_channel(ColorChannel::Z)
            .with_default_ramp(ColorRamp::Inferno);
        let style = options.glyph_style();
        assert_eq!(style.min_length, 0.5);
        assert_eq!(style.max_length, 2.0);
        assert_eq!(style.channel, ColorChannel::Z);
        assert_eq!(options.default_ramp, ColorRamp::Inferno);
    }
}
