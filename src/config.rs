use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::error::{GestureError, GestureResult};
use crate::types::hand;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub stream: StreamConfig,
    pub image: ImageConfig,
    pub classifier: ClassifierConfig,
    pub session: SessionConfig,
    pub templates: TemplateConfig,
    pub detector: DetectorConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub url: String,
    pub chunk_size: usize,
    pub read_timeout_secs: f32,
    /// Camera boards serve self-signed certificates
    pub accept_invalid_certs: bool,
    /// 0 = reconnect forever
    pub max_reconnects: u32,
    pub reconnect_delay_ms: u64,
    pub max_buffered_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Width used to scale normalized landmarks to pixels
    pub width: u32,
    /// Height used to scale normalized landmarks to pixels
    pub height: u32,
    pub detector_input_width: u32,
    pub detector_input_height: u32,
    /// The camera board is mounted sideways
    pub rotate_clockwise: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Palm, fingertips and finger bases
    pub node_subset: Vec<usize>,
    pub tolerance: f32,
    pub landmark_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub debounce_secs: f32,
    pub reset_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub data_path: PathBuf,
    pub names_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub python: PathBuf,
    pub script: PathBuf,
    pub min_confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Command key (e.g. "smart_home.thumb_up") to trigger URL. Empty URL = no-op.
    pub endpoints: HashMap<String, String>,
    pub http_timeout_secs: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "https://192.168.4.1/stream".to_string(),
            chunk_size: 4096,
            read_timeout_secs: 2.0,
            accept_invalid_certs: true,
            max_reconnects: 0,
            reconnect_delay_ms: 1000,
            max_buffered_bytes: 8 * 1024 * 1024,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            detector_input_width: 480,
            detector_input_height: 640,
            rotate_clockwise: true,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            node_subset: vec![
                hand::WRIST,
                hand::THUMB_TIP,
                hand::INDEX_FINGER_MCP,
                hand::MIDDLE_FINGER_MCP,
                hand::RING_FINGER_MCP,
                hand::PINKY_MCP,
                hand::INDEX_FINGER_TIP,
                hand::MIDDLE_FINGER_TIP,
                hand::RING_FINGER_TIP,
                hand::PINKY_TIP,
            ],
            tolerance: 20.0,
            landmark_count: hand::LANDMARK_COUNT,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_secs: 4.0,
            reset_label: "Stop".to_string(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("aggregate_gesture_data/gesture_data.csv"),
            names_path: PathBuf::from("aggregate_gesture_data/gesture_names.csv"),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from(".venv/bin/python"),
            script: PathBuf::from("hand_detect.py"),
            min_confidence: 0.5,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let keys = [
            "smart_home.thumb_up",
            "smart_home.thumb_down",
            "smart_home.go",
            "smart_home.rock",
            "presentation.start",
            "presentation.next",
            "presentation.previous",
            "presentation.exit",
            "media.play",
            "media.pause",
            "media.next_track",
            "media.volume_up",
            "media.volume_down",
        ];
        Self {
            endpoints: keys.iter().map(|k| (k.to_string(), String::new())).collect(),
            http_timeout_secs: 5.0,
        }
    }
}

impl StreamConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs_f32(self.read_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl SessionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_secs_f32(self.debounce_secs)
    }
}

impl DispatchConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs_f32(self.http_timeout_secs)
    }
}

impl AppConfig {
    pub const PATH: &'static str = "gesture_config.json";

    /// Load from `path`. A missing file yields defaults, which are written back so the
    /// file lists every field. A file that exists but does not parse is rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: AppConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            config
        } else {
            warn!("Configuration file not found. Creating default at {}", path.display());
            let config = Self::default();
            config.save(path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> GestureResult<()> {
        let c = &self.classifier;
        if c.landmark_count <= hand::MIDDLE_FINGER_MCP {
            return Err(GestureError::Configuration(format!(
                "landmark_count {} leaves no palm reference (needs > {})",
                c.landmark_count,
                hand::MIDDLE_FINGER_MCP
            )));
        }
        if c.node_subset.is_empty() {
            return Err(GestureError::Configuration("node_subset is empty".into()));
        }
        if let Some(bad) = c.node_subset.iter().find(|&&i| i >= c.landmark_count) {
            return Err(GestureError::Configuration(format!(
                "node_subset index {} out of range for {} landmarks",
                bad, c.landmark_count
            )));
        }
        if !(c.tolerance > 0.0) {
            return Err(GestureError::Configuration(format!(
                "tolerance must be positive, got {}",
                c.tolerance
            )));
        }
        check_seconds("session.debounce_secs", self.session.debounce_secs)?;
        check_seconds("stream.read_timeout_secs", self.stream.read_timeout_secs)?;
        check_seconds("dispatch.http_timeout_secs", self.dispatch.http_timeout_secs)?;
        if self.stream.chunk_size == 0 {
            return Err(GestureError::Configuration("chunk_size must be non-zero".into()));
        }
        let img = &self.image;
        if img.width == 0
            || img.height == 0
            || img.detector_input_width == 0
            || img.detector_input_height == 0
        {
            return Err(GestureError::Configuration("image dimensions must be non-zero".into()));
        }
        Ok(())
    }
}

/// Durations are stored as float seconds; reject anything `Duration` cannot hold.
fn check_seconds(field: &str, secs: f32) -> GestureResult<()> {
    match Duration::try_from_secs_f32(secs) {
        Ok(d) if !d.is_zero() => Ok(()),
        _ => Err(GestureError::Configuration(format!(
            "{} must be a positive number of seconds, got {}",
            field, secs
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.classifier.node_subset, vec![0, 4, 5, 9, 13, 17, 8, 12, 16, 20]);
        assert_eq!(config.session.debounce(), Duration::from_secs(4));
        assert_eq!(config.stream.chunk_size, 4096);
    }

    #[test]
    fn partial_json_fills_missing_fields() {
        let json = r#"{ "classifier": { "tolerance": 12.5 }, "session": { "reset_label": "Halt" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.classifier.tolerance, 12.5);
        assert_eq!(config.classifier.landmark_count, 21);
        assert_eq!(config.session.reset_label, "Halt");
        assert_eq!(config.session.debounce_secs, 4.0);
        assert_eq!(config.image.width, 1280);
    }

    #[test]
    fn rejects_out_of_range_subset() {
        let mut config = AppConfig::default();
        config.classifier.node_subset.push(21);
        assert!(matches!(config.validate(), Err(GestureError::Configuration(_))));
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let mut config = AppConfig::default();
        config.classifier.tolerance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unrepresentable_durations() {
        let mut config = AppConfig::default();
        config.dispatch.http_timeout_secs = -1.0;
        assert!(matches!(config.validate(), Err(GestureError::Configuration(_))));

        let mut config = AppConfig::default();
        config.session.debounce_secs = 1e20;
        assert!(matches!(config.validate(), Err(GestureError::Configuration(_))));

        let mut config = AppConfig::default();
        config.stream.read_timeout_secs = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.session.debounce_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_rejects_negative_timeout_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, r#"{ "dispatch": { "http_timeout_secs": -1.0 } }"#).unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn load_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let config = AppConfig::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.classifier.tolerance, 20.0);

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded.classifier.node_subset, config.classifier.node_subset);
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
