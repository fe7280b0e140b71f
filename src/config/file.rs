//! TOML configuration file loading
//!
//! Supports `~/.config/kopi/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct KopiConfigFile {
    /// Directory for the order database
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Explicit database file, overrides `data_dir`
    #[serde(default)]
    pub database: Option<String>,

    /// Menu TOML replacing the built-in menu
    #[serde(default)]
    pub menu: Option<String>,

    /// Number of past orders shown by `history`
    #[serde(default)]
    pub history_limit: Option<usize>,

    #[serde(default)]
    pub voice: VoiceFileConfig,

    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Voice input/output configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    pub enabled: Option<bool>,

    /// "whisper" or "deepgram"
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: Option<String>,

    /// "openai" or "elevenlabs"
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    pub deepgram: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `KopiConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> KopiConfigFile {
    config_file_path().map_or_else(KopiConfigFile::default, |p| load_config_file_from(&p))
}

/// Load a config file from an explicit path, falling back to defaults
pub fn load_config_file_from(path: &Path) -> KopiConfigFile {
    if !path.exists() {
        return KopiConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                KopiConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            KopiConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/kopi/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("kopi").join("config.toml"))
}
