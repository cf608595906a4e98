use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Runtime settings for the game loop.
///
/// Every field has a default, so a config file only needs to list the values
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Fixed simulation rate. One step lasts `1 / steps_per_second` seconds.
    pub steps_per_second: u32,
    /// Upper bound on the wall time accumulated in a single frame.
    pub max_frame_delta_secs: f32,
    /// RGBA color used to clear the render target before each frame.
    pub clear_color: [f32; 4],
    /// Viewport width before the first resize arrives.
    pub width: u32,
    /// Viewport height before the first resize arrives.
    pub height: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            steps_per_second: 60,
            max_frame_delta_secs: 0.25,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            width: 1280,
            height: 720,
        }
    }
}

impl LoopConfig {
    /// Parse a config from JSON. Missing fields fall back to the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Load a config from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read loop config {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Override the fixed simulation rate.
    #[must_use]
    pub fn with_steps_per_second(mut self, steps: u32) -> Self {
        self.steps_per_second = steps;
        self
    }

    /// Override the per-frame delta clamp.
    #[must_use]
    pub fn with_max_frame_delta(mut self, seconds: f32) -> Self {
        self.max_frame_delta_secs = seconds;
        self
    }

    /// Override the clear color.
    #[must_use]
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Override the initial viewport size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Duration of one simulation step.
    pub fn fixed_step(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.steps_per_second.max(1)))
    }

    /// Clamp ceiling for a single frame's wall delta. Values too large for a
    /// `Duration` (including infinity) mean no clamp.
    pub fn max_frame_delta(&self) -> Duration {
        Duration::try_from_secs_f32(self.max_frame_delta_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    fn validated(self) -> Result<Self> {
        anyhow::ensure!(self.steps_per_second > 0, "steps_per_second must be positive");
        anyhow::ensure!(
            self.max_frame_delta_secs.is_finite() && self.max_frame_delta_secs > 0.0,
            "max_frame_delta_secs must be a positive number"
        );
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoopConfig::default();
        assert_eq!(config.fixed_step(), Duration::from_secs_f64(1.0 / 60.0));
        assert_eq!(config.max_frame_delta(), Duration::from_millis(250));
        assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LoopConfig::from_json(r#"{ "steps_per_second": 30, "width": 640 }"#).unwrap();
        assert_eq!(config.steps_per_second, 30);
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 720);
        assert_eq!(config.max_frame_delta_secs, 0.25);
    }

    #[test]
    fn test_unbounded_frame_delta() {
        let config = LoopConfig::default().with_max_frame_delta(f32::INFINITY);
        assert_eq!(config.max_frame_delta(), Duration::MAX);

        let config = LoopConfig::default().with_max_frame_delta(-2.0);
        assert_eq!(config.max_frame_delta(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(LoopConfig::from_json(r#"{ "steps_per_second": 0 }"#).is_err());
        assert!(LoopConfig::from_json(r#"{ "max_frame_delta_secs": -1.0 }"#).is_err());
        assert!(LoopConfig::from_json("not json").is_err());
    }
}
