//! Utterance endpointing
//!
//! Decides when a spoken phrase starts and ends using frame energy, bounded by
//! a start timeout and a maximum phrase length.

use std::time::Duration;

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum voiced duration for a phrase to count
const MIN_SPEECH: Duration = Duration::from_millis(300);

/// Trailing silence that ends a phrase
const END_SILENCE: Duration = Duration::from_millis(500);

/// State of the endpoint detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// No speech yet
    WaitingForSpeech,
    /// Speech started, accumulating the phrase
    Speaking,
    /// Phrase ended by silence or by the length limit
    Complete,
    /// No speech before the start timeout
    TimedOut,
}

/// Finds one phrase in a stream of audio chunks
pub struct EndpointDetector {
    state: EndpointState,
    start_timeout_samples: usize,
    max_phrase_samples: usize,
    min_speech_samples: usize,
    end_silence_samples: usize,
    waited: usize,
    phrase: Vec<f32>,
    silence_counter: usize,
}

impl EndpointDetector {
    #[must_use]
    pub fn new(sample_rate: u32, start_timeout: Duration, max_phrase: Duration) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let samples = |d: Duration| (d.as_secs_f64() * f64::from(sample_rate)) as usize;

        Self {
            state: EndpointState::WaitingForSpeech,
            start_timeout_samples: samples(start_timeout),
            max_phrase_samples: samples(max_phrase),
            min_speech_samples: samples(MIN_SPEECH),
            end_silence_samples: samples(END_SILENCE),
            waited: 0,
            phrase: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Feed the next chunk of samples and return the resulting state
    pub fn process(&mut self, samples: &[f32]) -> EndpointState {
        if samples.is_empty() {
            return self.state;
        }

        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            EndpointState::WaitingForSpeech => {
                if is_speech {
                    self.state = EndpointState::Speaking;
                    self.phrase.clear();
                    self.phrase.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, waited = self.waited, "speech started");
                } else {
                    self.waited += samples.len();
                    if self.waited >= self.start_timeout_samples {
                        tracing::debug!(waited = self.waited, "no speech before timeout");
                        self.state = EndpointState::TimedOut;
                    }
                }
            }
            EndpointState::Speaking => {
                self.phrase.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.phrase.len() >= self.max_phrase_samples {
                    self.phrase.truncate(self.max_phrase_samples);
                    tracing::debug!(samples = self.phrase.len(), "phrase length limit reached");
                    self.state = EndpointState::Complete;
                } else if self.silence_counter > self.end_silence_samples {
                    let voiced = self.phrase.len() - self.silence_counter;
                    if voiced > self.min_speech_samples {
                        tracing::debug!(samples = self.phrase.len(), "phrase complete");
                        self.state = EndpointState::Complete;
                    } else {
                        // Too short to be a phrase: a click or a cough
                        self.waited += self.phrase.len();
                        self.phrase.clear();
                        self.silence_counter = 0;
                        self.state = if self.waited >= self.start_timeout_samples {
                            EndpointState::TimedOut
                        } else {
                            EndpointState::WaitingForSpeech
                        };
                    }
                }
            }
            EndpointState::Complete | EndpointState::TimedOut => {}
        }

        self.state
    }

    /// Close the phrase at a hard deadline
    ///
    /// Speech in progress becomes a complete phrase; otherwise the detector
    /// times out.
    pub fn force_end(&mut self) -> EndpointState {
        self.state = match self.state {
            EndpointState::Speaking | EndpointState::Complete => EndpointState::Complete,
            EndpointState::WaitingForSpeech | EndpointState::TimedOut => EndpointState::TimedOut,
        };
        self.state
    }

    /// Take the captured phrase
    pub fn take_phrase(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.phrase)
    }

    #[must_use]
    pub const fn state(&self) -> EndpointState {
        self.state
    }

    /// Reset detector to wait for a new phrase
    pub fn reset(&mut self) {
        self.state = EndpointState::WaitingForSpeech;
        self.phrase.clear();
        self.silence_counter = 0;
        self.waited = 0;
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
