//! Text-to-speech (TTS) processing
//!
//! Blocking, like the STT clients: runs on the synthesis worker thread.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::{Error, Result, SynthesisError};

/// Upper bound on one synthesis round trip
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    OpenAI,
    ElevenLabs,
}

/// Synthesizes speech from text
#[derive(Debug, Clone)]
pub struct TextToSpeech {
    api_key: String,
    voice: String,
    speed: f64,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String, voice: String, speed: f64, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            api_key,
            voice,
            speed: speed.clamp(0.25, 4.0),
            model,
            provider: TtsProvider::OpenAI,
        })
    }

    /// Create a new TTS instance using ElevenLabs
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: String, voice_id: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            voice: voice_id,
            speed: 1.0,
            model,
            provider: TtsProvider::ElevenLabs,
        })
    }

    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Synthesize text to MP3 audio
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it
    pub fn synthesize(&self, text: &str) -> std::result::Result<Vec<u8>, SynthesisError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SynthesisError::Service(e.to_string()))?;

        tracing::debug!(chars = text.len(), provider = ?self.provider, "synthesizing");

        match self.provider {
            TtsProvider::OpenAI => self.synthesize_openai(&client, text),
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(&client, text),
        }
    }

    /// Synthesize using OpenAI TTS
    fn synthesize_openai(
        &self,
        client: &Client,
        text: &str,
    ) -> std::result::Result<Vec<u8>, SynthesisError> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .map_err(service)?;

        read_audio(response, "OpenAI")
    }

    /// Synthesize using ElevenLabs TTS
    fn synthesize_elevenlabs(
        &self,
        client: &Client,
        text: &str,
    ) -> std::result::Result<Vec<u8>, SynthesisError> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}",
            self.voice
        );

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .map_err(service)?;

        read_audio(response, "ElevenLabs")
    }
}

fn read_audio(
    response: reqwest::blocking::Response,
    provider: &str,
) -> std::result::Result<Vec<u8>, SynthesisError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        return Err(SynthesisError::Service(format!(
            "{provider} TTS error {status}: {body}"
        )));
    }

    Ok(response.bytes().map_err(service)?.to_vec())
}

fn service(e: reqwest::Error) -> SynthesisError {
    SynthesisError::Service(e.to_string())
}
