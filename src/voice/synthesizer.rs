//! Speech synthesis capability

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::SynthesisError;

/// Blocking text-to-speech capability
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    fn speak(&self, text: &str) -> Result<(), SynthesisError>;
}

/// Cloud TTS played on the default output device
pub struct SpeakerSynthesizer {
    tts: TextToSpeech,
}

impl SpeakerSynthesizer {
    #[must_use]
    pub const fn new(tts: TextToSpeech) -> Self {
        Self { tts }
    }
}

impl SpeechSynthesizer for SpeakerSynthesizer {
    fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        let audio = self.tts.synthesize(text)?;
        let playback = AudioPlayback::new()?;
        playback.play_mp3(&audio)?;
        Ok(())
    }
}

/// Stand-in used when speech output is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSynthesizer;

impl SpeechSynthesizer for LogSynthesizer {
    fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        tracing::info!(text, "speech output disabled");
        Ok(())
    }
}
