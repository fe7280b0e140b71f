//! Configuration management for the Kopi ordering terminal
//!
//! Every value resolves as environment > config file > default.

pub mod file;

use std::path::PathBuf;

use crate::menu::MenuCatalog;
use crate::voice::{SpeechToText, SttProvider, TextToSpeech, TtsProvider};
use crate::{Error, Result};

use file::KopiConfigFile;

/// Database file name inside the data directory
const DB_FILE: &str = "coffee_orders.db";

/// Orders listed by `history` unless overridden
const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Kopi configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory
    pub data_dir: PathBuf,

    /// Order history database
    pub db_path: PathBuf,

    /// Menu file; the built-in menu is used when unset
    pub menu_path: Option<PathBuf>,

    /// Number of past orders to list
    pub history_limit: usize,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice input and output configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Microphone capture and speech recognition
    pub input_enabled: bool,

    /// Spoken confirmations
    pub output_enabled: bool,

    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1", "eleven_monolingual_v1")
    pub tts_model: String,

    /// TTS voice (`OpenAI` voice name or ElevenLabs voice id)
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is not recognized
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is not recognized
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();
        let config = Self::from_sources(fc, |key| std::env::var(key).ok(), disable_voice)?;

        std::fs::create_dir_all(&config.data_dir).ok();
        Ok(config)
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is not recognized
    pub fn from_sources<F>(fc: KopiConfigFile, env: F, disable_voice: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
            deepgram: env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
        }
        .without_blanks();

        // ~/.local/share/kopi on Linux
        let data_dir = env("KOPI_DATA_DIR")
            .or(fc.data_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                directories::BaseDirs::new()
                    .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("kopi"))
            });

        let db_path = env("KOPI_DB_PATH")
            .or(fc.database)
            .map_or_else(|| data_dir.join(DB_FILE), PathBuf::from);

        let menu_path = env("KOPI_MENU").or(fc.menu).map(PathBuf::from);

        let history_limit = fc.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(1);

        let voice = VoiceConfig::resolve(fc.voice, &env, &api_keys, disable_voice)?;

        Ok(Self {
            data_dir,
            db_path,
            menu_path,
            history_limit,
            voice,
            api_keys,
        })
    }

    /// Load the menu file, or the built-in menu
    ///
    /// # Errors
    ///
    /// Returns error if the menu file cannot be read or is invalid
    pub fn load_catalog(&self) -> Result<MenuCatalog> {
        match &self.menu_path {
            Some(path) => MenuCatalog::load(path),
            None => MenuCatalog::embedded(),
        }
    }

    /// Build the configured STT client
    ///
    /// # Errors
    ///
    /// Returns error if the provider's API key is missing
    pub fn speech_to_text(&self) -> Result<SpeechToText> {
        let model = self.voice.stt_model.clone();
        match self.voice.stt_provider {
            SttProvider::Whisper => {
                SpeechToText::new_whisper(self.api_keys.openai.clone().unwrap_or_default(), model)
            }
            SttProvider::Deepgram => {
                SpeechToText::new_deepgram(self.api_keys.deepgram.clone().unwrap_or_default(), model)
            }
        }
    }

    /// Build the configured TTS client
    ///
    /// # Errors
    ///
    /// Returns error if the provider's API key is missing
    pub fn text_to_speech(&self) -> Result<TextToSpeech> {
        let voice = &self.voice;
        match voice.tts_provider {
            TtsProvider::OpenAI => TextToSpeech::new_openai(
                self.api_keys.openai.clone().unwrap_or_default(),
                voice.tts_voice.clone(),
                voice.tts_speed,
                voice.tts_model.clone(),
            ),
            TtsProvider::ElevenLabs => TextToSpeech::new_elevenlabs(
                self.api_keys.elevenlabs.clone().unwrap_or_default(),
                voice.tts_voice.clone(),
                voice.tts_model.clone(),
            ),
        }
    }
}

impl VoiceConfig {
    fn resolve<F>(
        fc: file::VoiceFileConfig,
        env: &F,
        keys: &ApiKeys,
        disable_voice: bool,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let stt_provider = match fc.stt_provider.as_deref() {
            Some(name) => parse_stt_provider(name)?,
            None if keys.openai.is_none() && keys.deepgram.is_some() => SttProvider::Deepgram,
            None => SttProvider::Whisper,
        };

        let tts_provider = match fc.tts_provider.as_deref() {
            Some(name) => parse_tts_provider(name)?,
            None if keys.openai.is_none() && keys.elevenlabs.is_some() => TtsProvider::ElevenLabs,
            None => TtsProvider::OpenAI,
        };

        let stt_key = match stt_provider {
            SttProvider::Whisper => keys.openai.is_some(),
            SttProvider::Deepgram => keys.deepgram.is_some(),
        };
        let tts_key = match tts_provider {
            TtsProvider::OpenAI => keys.openai.is_some(),
            TtsProvider::ElevenLabs => keys.elevenlabs.is_some(),
        };

        let enabled = !disable_voice && fc.enabled.unwrap_or(true);
        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        } else if enabled && !stt_key {
            tracing::warn!(provider = ?stt_provider, "no STT API key, voice input disabled");
        }

        let stt_model = env("KOPI_STT_MODEL").or(fc.stt_model).unwrap_or_else(|| {
            match stt_provider {
                SttProvider::Whisper => "whisper-1",
                SttProvider::Deepgram => "nova-2",
            }
            .to_string()
        });

        let tts_model = env("KOPI_TTS_MODEL").or(fc.tts_model).unwrap_or_else(|| {
            match tts_provider {
                TtsProvider::OpenAI => "tts-1",
                TtsProvider::ElevenLabs => "eleven_monolingual_v1",
            }
            .to_string()
        });

        let tts_voice = fc.tts_voice.unwrap_or_else(|| {
            match tts_provider {
                TtsProvider::OpenAI => "alloy",
                // "Rachel"
                TtsProvider::ElevenLabs => "21m00Tcm4TlvDq8ikWAM",
            }
            .to_string()
        });

        Ok(Self {
            input_enabled: enabled && stt_key,
            output_enabled: enabled && tts_key,
            stt_provider,
            stt_model,
            tts_provider,
            tts_model,
            tts_voice,
            tts_speed: fc.tts_speed.unwrap_or(1.0),
        })
    }
}

impl ApiKeys {
    /// Treat empty keys as absent
    fn without_blanks(self) -> Self {
        let keep = |k: Option<String>| k.filter(|v| !v.trim().is_empty());
        Self {
            openai: keep(self.openai),
            elevenlabs: keep(self.elevenlabs),
            deepgram: keep(self.deepgram),
        }
    }
}

fn parse_stt_provider(name: &str) -> Result<SttProvider> {
    match name.to_lowercase().as_str() {
        "whisper" | "openai" => Ok(SttProvider::Whisper),
        "deepgram" => Ok(SttProvider::Deepgram),
        other => Err(Error::Config(format!("unknown STT provider: {other}"))),
    }
}

fn parse_tts_provider(name: &str) -> Result<TtsProvider> {
    match name.to_lowercase().as_str() {
        "openai" => Ok(TtsProvider::OpenAI),
        "elevenlabs" => Ok(TtsProvider::ElevenLabs),
        other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_keys() {
        let config = Config::from_sources(KopiConfigFile::default(), env(&[]), false).unwrap();

        assert!(!config.voice.input_enabled);
        assert!(!config.voice.output_enabled);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(config.db_path.ends_with(DB_FILE));
        assert!(config.menu_path.is_none());
        assert_eq!(config.voice.stt_model, "whisper-1");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut fc = KopiConfigFile::default();
        fc.database = Some("/from/file.db".to_string());
        fc.voice.stt_model = Some("file-model".to_string());
        fc.api_keys.openai = Some("file-key".to_string());

        let config = Config::from_sources(
            fc,
            env(&[
                ("KOPI_DB_PATH", "/from/env.db"),
                ("OPENAI_API_KEY", "env-key"),
            ]),
            false,
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/from/env.db"));
        assert_eq!(config.voice.stt_model, "file-model");
        assert_eq!(config.api_keys.openai.as_deref(), Some("env-key"));
        assert!(config.voice.input_enabled);
        assert!(config.voice.output_enabled);
    }

    #[test]
    fn test_disable_voice_wins() {
        let config =
            Config::from_sources(KopiConfigFile::default(), env(&[("OPENAI_API_KEY", "k")]), true)
                .unwrap();
        assert!(!config.voice.input_enabled);
        assert!(!config.voice.output_enabled);
    }

    #[test]
    fn test_provider_follows_available_key() {
        let config = Config::from_sources(
            KopiConfigFile::default(),
            env(&[("DEEPGRAM_API_KEY", "dg"), ("ELEVENLABS_API_KEY", "el")]),
            false,
        )
        .unwrap();

        assert_eq!(config.voice.stt_provider, SttProvider::Deepgram);
        assert_eq!(config.voice.tts_provider, TtsProvider::ElevenLabs);
        assert_eq!(config.voice.stt_model, "nova-2");
        assert!(config.voice.input_enabled);
        assert!(config.text_to_speech().is_ok());
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config =
            Config::from_sources(KopiConfigFile::default(), env(&[("OPENAI_API_KEY", " ")]), false)
                .unwrap();
        assert!(config.api_keys.openai.is_none());
        assert!(config.speech_to_text().is_err());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let mut fc = KopiConfigFile::default();
        fc.voice.tts_provider = Some("espeak".to_string());
        assert!(Config::from_sources(fc, env(&[]), false).is_err());
    }

    #[test]
    fn test_embedded_catalog_by_default() {
        let config = Config::from_sources(KopiConfigFile::default(), env(&[]), false).unwrap();
        let catalog = config.load_catalog().unwrap();
        assert!(catalog.item("latte").is_some());
    }
}
