//! Speech-to-text (STT) processing
//!
//! Blocking HTTP clients; called from the capture worker thread only. The
//! `reqwest::blocking` client is created per request so it never outlives
//! that thread.

use std::time::Duration;

use reqwest::blocking::{Client, multipart};

use crate::{CaptureError, Error, Result};

/// Upper bound on one transcription round trip
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// STT provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SttProvider {
    Whisper,
    Deepgram,
}

/// Transcribes speech to text
#[derive(Debug, Clone)]
pub struct SpeechToText {
    api_key: String,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Create a new STT instance using `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_whisper(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            model,
            provider: SttProvider::Whisper,
        })
    }

    /// Create a new STT instance using Deepgram
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_deepgram(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Deepgram API key required".to_string()));
        }

        Ok(Self {
            api_key,
            model,
            provider: SttProvider::Deepgram,
        })
    }

    #[must_use]
    pub const fn provider(&self) -> SttProvider {
        self.provider
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` if the request fails, `Unintelligible` if the
    /// service heard nothing it could transcribe
    pub fn transcribe(&self, audio: &[u8]) -> std::result::Result<String, CaptureError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(unavailable)?;

        let transcript = match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(&client, audio)?,
            SttProvider::Deepgram => self.transcribe_deepgram(&client, audio)?,
        };

        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(CaptureError::Unintelligible);
        }

        tracing::info!(transcript, "transcription complete");
        Ok(transcript.to_string())
    }

    /// Transcribe using OpenAI Whisper
    fn transcribe_whisper(
        &self,
        client: &Client,
        audio: &[u8],
    ) -> std::result::Result<String, CaptureError> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(unavailable)?,
            )
            .text("model", self.model.clone());

        let response = client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                unavailable(e)
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(CaptureError::ServiceUnavailable(format!(
                "Whisper API error {status}"
            )));
        }

        let result: WhisperResponse = response.json().map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            unavailable(e)
        })?;

        Ok(result.text)
    }

    /// Transcribe using Deepgram
    fn transcribe_deepgram(
        &self,
        client: &Client,
        audio: &[u8],
    ) -> std::result::Result<String, CaptureError> {
        tracing::debug!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let url = format!(
            "https://api.deepgram.com/v1/listen?model={}&punctuate=true",
            self.model
        );

        let response = client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .map_err(|e| {
                tracing::error!(error = %e, "Deepgram request failed");
                unavailable(e)
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(CaptureError::ServiceUnavailable(format!(
                "Deepgram API error {status}"
            )));
        }

        let result: DeepgramResponse = response.json().map_err(|e| {
            tracing::error!(error = %e, "failed to parse Deepgram response");
            unavailable(e)
        })?;

        Ok(result
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|c| c.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default())
    }
}

fn unavailable(e: impl std::fmt::Display) -> CaptureError {
    CaptureError::ServiceUnavailable(e.to_string())
}
