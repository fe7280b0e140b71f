//! Voice input and output
//!
//! Device access and cloud STT/TTS live behind two blocking capabilities,
//! [`SpeechRecognizer`] and [`SpeechSynthesizer`]. The coordinators run those
//! on worker threads so the session loop never blocks.

mod capture;
mod endpoint;
mod playback;
mod recognizer;
mod speech_capture;
mod speech_synthesis;
mod stt;
mod synthesizer;
mod tts;

pub use capture::{AudioCapture, RawAudio, SAMPLE_RATE, samples_to_wav};
pub use endpoint::{EndpointDetector, EndpointState, calculate_energy};
pub use playback::AudioPlayback;
pub use recognizer::{MicrophoneRecognizer, SpeechRecognizer};
pub use speech_capture::{LISTEN_TIMEOUT, PHRASE_LIMIT, SpeechCaptureCoordinator, SpeechTurn};
pub use speech_synthesis::SpeechSynthesisCoordinator;
pub use stt::{SpeechToText, SttProvider};
pub use synthesizer::{LogSynthesizer, SpeakerSynthesizer, SpeechSynthesizer};
pub use tts::{TextToSpeech, TtsProvider};
