//! Speech recognition capability

use std::time::Duration;

use super::capture::{AudioCapture, RawAudio, samples_to_wav};
use super::stt::SpeechToText;
use crate::CaptureError;

/// Phrases shorter than this are treated as no speech
const MIN_PHRASE: Duration = Duration::from_millis(250);

/// Blocking listen-and-recognize capability
///
/// Both calls block; they run on the capture worker thread.
pub trait SpeechRecognizer: Send + Sync {
    /// Record one phrase
    ///
    /// # Errors
    ///
    /// `Timeout` if speech never started, `ServiceUnavailable` if the audio
    /// device fails
    fn listen(&self, start_timeout: Duration, max_phrase: Duration) -> Result<RawAudio, CaptureError>;

    /// Turn a recorded phrase into text
    ///
    /// # Errors
    ///
    /// `NoSpeech`, `Unintelligible` or `ServiceUnavailable`
    fn recognize(&self, audio: &RawAudio) -> Result<String, CaptureError>;
}

/// Default microphone plus a cloud STT service
pub struct MicrophoneRecognizer {
    stt: SpeechToText,
}

impl MicrophoneRecognizer {
    #[must_use]
    pub const fn new(stt: SpeechToText) -> Self {
        Self { stt }
    }
}

impl SpeechRecognizer for MicrophoneRecognizer {
    fn listen(&self, start_timeout: Duration, max_phrase: Duration) -> Result<RawAudio, CaptureError> {
        // The cpal stream is not Send, so the device is opened on this thread
        let mut capture =
            AudioCapture::new().map_err(|e| CaptureError::ServiceUnavailable(e.to_string()))?;
        let audio = capture.record_phrase(start_timeout, max_phrase)?;
        tracing::debug!(duration_ms = audio.duration().as_millis(), "phrase recorded");
        Ok(audio)
    }

    fn recognize(&self, audio: &RawAudio) -> Result<String, CaptureError> {
        if audio.duration() < MIN_PHRASE {
            return Err(CaptureError::NoSpeech);
        }

        let wav = samples_to_wav(&audio.samples, audio.sample_rate)
            .map_err(|e| CaptureError::ServiceUnavailable(e.to_string()))?;
        self.stt.transcribe(&wav)
    }
}
