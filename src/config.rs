use tokio::time::Duration;

use crate::layout::LayoutGeometry;

/// Runtime knobs for a session, read from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Autoplay tick interval
    pub autoplay_interval_ms: u64,
    /// Delay between preview path steps
    pub step_delay_ms: u64,
    /// Start with reduced motion on
    pub reduced_motion: bool,
    pub layout_width: f64,
    pub layout_height: f64,
    pub layout_padding: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: 6000,
            step_delay_ms: 500,
            reduced_motion: false,
            layout_width: 800.0,
            layout_height: 240.0,
            layout_padding: 60.0,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            autoplay_interval_ms: std::env::var("AUTOPLAY_INTERVAL_MS").ok().and_then(|v| v.parse::<u64>().ok()).filter(|v| *v > 0).unwrap_or(d.autoplay_interval_ms),
            step_delay_ms: std::env::var("STEP_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.step_delay_ms),
            reduced_motion: std::env::var("REDUCED_MOTION").ok().map(|v| parse_flag(&v)).unwrap_or(d.reduced_motion),
            layout_width: std::env::var("LAYOUT_WIDTH").ok().and_then(|v| v.parse().ok()).unwrap_or(d.layout_width),
            layout_height: std::env::var("LAYOUT_HEIGHT").ok().and_then(|v| v.parse().ok()).unwrap_or(d.layout_height),
            layout_padding: std::env::var("LAYOUT_PADDING").ok().and_then(|v| v.parse().ok()).unwrap_or(d.layout_padding),
        }
    }

    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn layout(&self) -> LayoutGeometry {
        LayoutGeometry::new(self.layout_width, self.layout_height, self.layout_padding)
    }
}

pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.autoplay_interval(), Duration::from_millis(6000));
        assert_eq!(cfg.step_delay(), Duration::from_millis(500));
        assert!(!cfg.reduced_motion);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(""));
    }
}
