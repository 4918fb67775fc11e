//! Tunable timing and layout parameters.
//!
//! The settle delay and the debounce window are coupled to whatever
//! smooth-scroll animation the scroll container performs, so they are
//! configuration rather than constants.
//!
//! ```rust
//! use bubbletea_scrollback::config::Config;
//!
//! let config = Config::from_toml_str("debounce_ms = 200\noverscan = 5").unwrap();
//! assert_eq!(config.debounce_ms, 200);
//! assert_eq!(config.overscan, 5);
//! assert_eq!(config.settle_delay_ms, 500);
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default bottom-proximity threshold, in container units (pixels).
pub const DEFAULT_THRESHOLD: f64 = 50.0;
/// Default user-scroll debounce window.
pub const DEFAULT_DEBOUNCE_MS: u64 = 150;
/// Default grace period after a programmatic scroll.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
/// Default length of one deferred frame.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Viewport configuration.
///
/// Every field has a default, so a TOML document only needs the keys it
/// wants to override.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Distance from the bottom under which the viewport counts as "at bottom".
    pub threshold: f64,
    /// Quiet period after the last scroll event before the user is considered
    /// done scrolling.
    pub debounce_ms: u64,
    /// Time after a programmatic scroll during which scroll events are not
    /// trusted as user intent. Must outlast the smooth-scroll animation.
    pub settle_delay_ms: u64,
    /// Length of one render/layout frame.
    pub frame_interval_ms: u64,
    /// Frames to wait after growth before reading the new bottom.
    pub layout_frames: u8,
    /// Frames a smooth scroll animation takes to reach its target.
    pub smooth_scroll_frames: u8,
    /// Size assumed for an item that has not been measured yet.
    pub estimate_size: f64,
    /// Space between adjacent items.
    pub gap: f64,
    /// Items rendered beyond each edge of the visible range.
    pub overscan: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            layout_frames: 2,
            smooth_scroll_frames: 12,
            estimate_size: 80.0,
            gap: 0.0,
            overscan: 3,
        }
    }
}

impl Config {
    /// Preset for terminal surfaces, where one unit is one row.
    pub fn terminal() -> Self {
        Self {
            threshold: 1.0,
            estimate_size: 3.0,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that every value is usable by the state machine.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if !self.estimate_size.is_finite() || self.estimate_size <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "estimate_size must be positive, got {}",
                self.estimate_size
            )));
        }
        if !self.gap.is_finite() || self.gap < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "gap must be a non-negative number, got {}",
                self.gap
            )));
        }
        if self.layout_frames == 0 {
            return Err(Error::InvalidConfig(
                "layout_frames must be at least 1".to_string(),
            ));
        }
        if self.settle_delay() <= self.smooth_scroll_duration() {
            return Err(Error::InvalidConfig(format!(
                "settle_delay_ms ({}) must exceed the smooth scroll animation ({}ms)",
                self.settle_delay_ms,
                self.smooth_scroll_duration().as_millis()
            )));
        }
        Ok(())
    }

    /// User-scroll debounce window.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Grace period after a programmatic scroll.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Length of one deferred frame.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Total length of a smooth scroll animation.
    pub fn smooth_scroll_duration(&self) -> Duration {
        self.frame_interval() * u32::from(self.smooth_scroll_frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::terminal().validate().is_ok());
        assert_eq!(Config::default().debounce(), Duration::from_millis(150));
        assert_eq!(Config::default().settle_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_terminal_preset_uses_rows() {
        let default = Config::default();
        let terminal = Config::terminal();
        assert_eq!(default.estimate_size, 80.0);
        assert_eq!(default.threshold, DEFAULT_THRESHOLD);
        assert_eq!(terminal.estimate_size, 3.0);
        assert_eq!(terminal.threshold, 1.0);
        assert_eq!(terminal.overscan, default.overscan);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("threshold = 10.0\ngap = 2.0").unwrap();
        assert_eq!(config.threshold, 10.0);
        assert_eq!(config.gap, 2.0);
        assert_eq!(config.layout_frames, 2);
    }

    #[test]
    fn test_unknown_key_is_a_parse_error() {
        let err = Config::from_toml_str("treshold = 10.0").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_settle_delay_must_outlast_animation() {
        let err = Config::from_toml_str("settle_delay_ms = 100").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("settle_delay_ms"));
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let config = Config {
            estimate_size: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            gap: -1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            layout_frames: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_ms = 90").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.debounce_ms, 90);

        let missing = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(missing, Error::Io { .. }));
    }
}
