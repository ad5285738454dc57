//! Configuration for the GazeLab system
//!
//! Every section and key is optional in the TOML file; missing values fall
//! back to the product defaults.

use crate::error::{LabError, Result};
use crate::types::{TrackingMethod, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Environment override for the gaze feed listen address.
pub const GAZE_UDP_ADDR_ENV: &str = "GAZELAB_GAZE_UDP_ADDR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub calibration: CalibrationConfig,
    pub recording: RecordingConfig,
    pub aggregation: AggregationConfig,
    pub heatmap: HeatmapConfig,
    pub feed: FeedConfig,
    pub viewport: ViewportConfig,
}

/// Pacing and conversion for the calibration/validation flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Pause between a point acknowledgement and the next marker (ms)
    pub point_delay_ms: u64,
    /// Time a validation marker is shown before sampling a prediction (ms)
    pub dwell_ms: u64,
    /// How long final metrics stay on screen before completion (ms)
    pub completion_display_ms: u64,
    /// Screen pixel to centimetre conversion factor
    pub px_to_cm: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            point_delay_ms: 300,
            dwell_ms: 2000,
            completion_display_ms: 5000,
            px_to_cm: 0.026,
        }
    }
}

impl CalibrationConfig {
    pub fn point_delay(&self) -> Duration {
        Duration::from_millis(self.point_delay_ms)
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn completion_display(&self) -> Duration {
        Duration::from_millis(self.completion_display_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Length of one usability task (ms)
    pub duration_ms: u64,
    pub tracking_method: TrackingMethod,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            duration_ms: 60_000,
            tracking_method: TrackingMethod::Mouse,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Grid cell used to build heatmap points (px)
    pub heatmap_cell_px: u32,
    /// Grid cell used to rank hotspots (px)
    pub hotspot_cell_px: u32,
    /// Number of hotspots to report
    pub hotspot_top_n: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            heatmap_cell_px: 20,
            hotspot_cell_px: 100,
            hotspot_top_n: 5,
        }
    }
}

/// Rendering options handed to a heatmap renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeatmapConfig {
    pub radius: u32,
    pub max_opacity: f64,
    pub min_opacity: f64,
    pub blur: f64,
    /// Colour stops keyed by offset (`"0.25" = "cyan"`), the shape heatmap renderers take
    pub gradient: BTreeMap<String, String>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            radius: 40,
            max_opacity: 0.6,
            min_opacity: 0.0,
            blur: 0.75,
            gradient: [
                ("0.0", "blue"),
                ("0.25", "cyan"),
                ("0.5", "lime"),
                ("0.75", "yellow"),
                ("1.0", "red"),
            ]
            .into_iter()
            .map(|(offset, color)| (offset.to_string(), color.to_string()))
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Address the UDP gaze listener binds to
    pub udp_addr: Option<SocketAddr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl ViewportConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

impl LabConfig {
    /// Load and validate a config file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LabConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with every pacing delay removed.
    pub fn instant() -> Self {
        let mut config = Self::default();
        config.calibration.point_delay_ms = 0;
        config.calibration.dwell_ms = 0;
        config.calibration.completion_display_ms = 0;
        config
    }

    pub fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var(GAZE_UDP_ADDR_ENV) {
            match raw.parse::<SocketAddr>() {
                Ok(addr) => {
                    log::info!("Gaze feed address overridden via {GAZE_UDP_ADDR_ENV}={addr}");
                    self.feed.udp_addr = Some(addr);
                }
                Err(e) => log::warn!("Ignoring {GAZE_UDP_ADDR_ENV}={raw}: {e}"),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.aggregation.heatmap_cell_px == 0 || self.aggregation.hotspot_cell_px == 0 {
            return Err(LabError::InvalidConfig("grid cell size must be non-zero".into()));
        }
        if self.aggregation.hotspot_top_n == 0 {
            return Err(LabError::InvalidConfig("hotspot_top_n must be non-zero".into()));
        }
        if self.recording.duration_ms == 0 {
            return Err(LabError::InvalidConfig("recording duration must be non-zero".into()));
        }
        if self.calibration.px_to_cm.is_nan() || self.calibration.px_to_cm <= 0.0 {
            return Err(LabError::InvalidConfig("px_to_cm must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = LabConfig::from_toml_str("").unwrap();
        assert_eq!(config.calibration.dwell_ms, 2000);
        assert_eq!(config.aggregation.heatmap_cell_px, 20);
        assert_eq!(config.aggregation.hotspot_cell_px, 100);
        assert_eq!(config.recording.duration_ms, 60_000);
        assert_eq!(config.heatmap.gradient.len(), 5);
        assert!(config.feed.udp_addr.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = LabConfig::from_toml_str(
            r#"
            [calibration]
            dwell_ms = 10

            [feed]
            udp_addr = "127.0.0.1:5005"
            "#,
        )
        .unwrap();
        assert_eq!(config.calibration.dwell_ms, 10);
        assert_eq!(config.calibration.point_delay_ms, 300);
        assert_eq!(config.feed.udp_addr, Some("127.0.0.1:5005".parse().unwrap()));
    }

    #[test]
    fn gradient_is_keyed_by_offset() {
        let json = serde_json::to_value(HeatmapConfig::default()).unwrap();
        assert_eq!(json["gradient"]["0.25"], "cyan");
        assert_eq!(json["gradient"]["1.0"], "red");
        assert_eq!(json["maxOpacity"], 0.6);

        let config = LabConfig::from_toml_str("[heatmap.gradient]\n\"0.0\" = \"black\"\n\"1.0\" = \"white\"\n").unwrap();
        assert_eq!(config.heatmap.gradient.len(), 2);
        assert_eq!(config.heatmap.gradient["0.0"], "black");
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        let err = LabConfig::from_toml_str("[aggregation]\nhotspot_cell_px = 0\n").unwrap_err();
        assert!(matches!(err, LabError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = LabConfig::from_toml_str("[calibration\n").unwrap_err();
        assert!(matches!(err, LabError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[recording]\nduration_ms = 1500").unwrap();
        let config = LabConfig::load(file.path()).unwrap();
        assert_eq!(config.recording.duration_ms, 1500);
    }

    #[test]
    fn instant_removes_delays() {
        let config = LabConfig::instant();
        assert_eq!(config.calibration.point_delay(), Duration::ZERO);
        assert_eq!(config.calibration.dwell(), Duration::ZERO);
        assert_eq!(config.calibration.completion_display(), Duration::ZERO);
    }
}
