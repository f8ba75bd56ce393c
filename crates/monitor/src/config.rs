//! Monitor configuration
//!
//! Layered with the `config` crate: built-in defaults for the chosen preset,
//! then an optional TOML file, then `ATTENTION_MONITOR__*` environment
//! variables (e.g. `ATTENTION_MONITOR__CAMERA__FPS=15`).

use std::path::Path;

use attention::AttentionConfig;
use clap::ValueEnum;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ATTENTION_MONITOR";

/// Starting point for the attention thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    #[default]
    Standard,
    /// Tighter gaze band and pose limits, shorter alert grace
    Strict,
    /// Wider gaze band and pose limits, longer alert grace
    Lenient,
}

impl Preset {
    pub fn attention_config(self) -> AttentionConfig {
        match self {
            Preset::Standard => AttentionConfig::default(),
            Preset::Strict => AttentionConfig::strict(),
            Preset::Lenient => AttentionConfig::lenient(),
        }
    }
}

/// Frame source properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate, used to timestamp trace records without `t`
    pub fps: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit log lines as JSON
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub camera: CameraConfig,
    pub attention: AttentionConfig,
    /// Frames between terminal status lines
    pub status_interval: u64,
    pub log: LogConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            attention: AttentionConfig::default(),
            status_interval: 3,
            log: LogConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from a preset, an optional file and the process environment
    pub fn load(path: Option<&Path>, preset: Preset) -> Result<Self, ConfigError> {
        Self::load_with(path, preset, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    fn load_with(
        path: Option<&Path>,
        preset: Preset,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let base = Self {
            attention: preset.attention_config(),
            ..Self::default()
        };
        let mut builder = Config::builder().add_source(Config::try_from(&base)?);
        if let Some(path) = path {
            let name = path
                .to_str()
                .ok_or_else(|| ConfigError::Message(format!("non UTF-8 path: {}", path.display())))?;
            builder = builder.add_source(File::new(name, FileFormat::Toml).required(true));
        }

        let loaded: Self = builder.add_source(env).build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.camera.fps.is_finite() && self.camera.fps > 0.0) {
            return Err(ConfigError::Message(format!(
                "camera.fps must be positive, got {}",
                self.camera.fps
            )));
        }
        if self.status_interval == 0 {
            return Err(ConfigError::Message(
                "status_interval must be at least 1".into(),
            ));
        }
        self.attention_config()
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))
    }

    /// Attention settings with the frame size taken from the camera
    pub fn attention_config(&self) -> AttentionConfig {
        let mut attention = self.attention.clone();
        attention.frame.width = self.camera.width;
        attention.frame.height = self.camera.height;
        attention
    }
}
