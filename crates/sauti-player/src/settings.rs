//! Player settings: file-based configuration with environment overrides

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Persistent player configuration.
///
/// Every field has a default matching the service's own, so a missing or
/// partial config file always yields a usable value. Values can also be
/// overridden through `SAUTI_`-prefixed environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the TTS service
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Voice selection mode: "predefined" or "clone"
    #[serde(default = "default_voice_mode")]
    pub voice_mode: String,

    /// Predefined voice name
    #[serde(default)]
    pub predefined_voice: Option<String>,

    /// Reference audio filename for voice cloning
    #[serde(default)]
    pub reference_audio: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Emotion exaggeration factor
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f32,

    /// Classifier-free guidance weight
    #[serde(default = "default_cfg_weight")]
    pub cfg_weight: f32,

    /// Playback speed factor applied by the service
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f32,

    /// Generation seed, 0 for random
    #[serde(default)]
    pub seed: u32,

    /// Language code
    #[serde(default = "default_language")]
    pub language: String,

    /// Whether the service should split long text into chunks
    #[serde(default = "default_split_text")]
    pub split_text: bool,

    /// Characters per chunk when splitting
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Audio container format requested from the service
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Whether the live level meter is drawn while streaming
    #[serde(default = "default_meter")]
    pub meter: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            voice_mode: default_voice_mode(),
            predefined_voice: None,
            reference_audio: None,
            temperature: default_temperature(),
            exaggeration: default_exaggeration(),
            cfg_weight: default_cfg_weight(),
            speed_factor: default_speed_factor(),
            seed: 0,
            language: default_language(),
            split_text: default_split_text(),
            chunk_size: default_chunk_size(),
            output_format: default_output_format(),
            meter: default_meter(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:8004".to_string()
}

fn default_voice_mode() -> String {
    "predefined".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_exaggeration() -> f32 {
    0.5
}

fn default_cfg_weight() -> f32 {
    0.5
}

fn default_speed_factor() -> f32 {
    1.0
}

fn default_language() -> String {
    "en".to_string()
}

fn default_split_text() -> bool {
    true
}

fn default_chunk_size() -> u32 {
    120
}

fn default_output_format() -> String {
    "wav".to_string()
}

fn default_meter() -> bool {
    true
}

impl Settings {
    /// Platform config file location.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sauti").join("config.toml"))
    }

    /// Load from the platform config file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path().as_deref())
    }

    /// Load from an explicit file, if given, plus the environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(Environment::with_prefix("SAUTI"))
            .build()
            .context("Failed to assemble configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Write a config file holding the defaults.
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let body = toml::to_string_pretty(&Settings::default())
            .context("Failed to serialize default settings")?;
        fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
