//! One listen-and-recognize cycle per user gesture
//!
//! [`SpeechCaptureCoordinator::start`] only moves the turn to `Listening`;
//! the blocking worker is launched by [`SpeechCaptureCoordinator::launch_pending`]
//! after the frame showing "Listening" has been built. The worker sends its
//! single result over a channel that the loop drains in
//! [`SpeechCaptureCoordinator::poll`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, error::TryRecvError};

use super::recognizer::SpeechRecognizer;
use crate::CaptureError;

/// How long to wait for speech to start
pub const LISTEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest phrase recorded in one capture
pub const PHRASE_LIMIT: Duration = Duration::from_secs(5);

type CaptureResult = Result<String, CaptureError>;

/// State of the current recognition attempt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpeechTurn {
    #[default]
    Idle,
    Listening,
    Recognized(String),
    Failed(CaptureError),
}

impl SpeechTurn {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Recognized(_) => "recognized",
            Self::Failed(_) => "failed",
        }
    }
}

/// Drives capture workers and tracks the current [`SpeechTurn`]
pub struct SpeechCaptureCoordinator {
    recognizer: Arc<dyn SpeechRecognizer>,
    turn: SpeechTurn,
    armed: bool,
    results: Option<UnboundedReceiver<CaptureResult>>,
    last_transcript: Option<String>,
}

impl SpeechCaptureCoordinator {
    #[must_use]
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer,
            turn: SpeechTurn::Idle,
            armed: false,
            results: None,
            last_transcript: None,
        }
    }

    /// Begin a capture
    ///
    /// Returns `false` (and changes nothing) if a capture is already active.
    pub fn start(&mut self) -> bool {
        if self.is_listening() {
            tracing::debug!("capture already in progress, ignoring request");
            return false;
        }

        self.turn = SpeechTurn::Listening;
        self.armed = true;
        true
    }

    /// Spawn the worker for a capture started earlier in this pass
    ///
    /// Returns `true` if a worker was launched.
    pub fn launch_pending(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.armed = false;

        let (tx, rx) = mpsc::unbounded_channel();
        let recognizer = Arc::clone(&self.recognizer);
        let worker_tx = tx.clone();

        let spawned = std::thread::Builder::new()
            .name("kopi-capture".to_string())
            .spawn(move || {
                let result = recognizer
                    .listen(LISTEN_TIMEOUT, PHRASE_LIMIT)
                    .and_then(|audio| recognizer.recognize(&audio));
                // Receiver may be gone if the session shut down
                let _ = worker_tx.send(result);
            });

        self.results = Some(rx);
        match spawned {
            Ok(_) => {
                tracing::info!("listening");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to start capture worker");
                let _ = tx.send(Err(CaptureError::ServiceUnavailable(e.to_string())));
                false
            }
        }
    }

    /// Collect the worker's result if it has arrived
    ///
    /// On `Some`, the turn is `Recognized` or `Failed`; call [`Self::finish`]
    /// once the result has been handled.
    pub fn poll(&mut self) -> Option<CaptureResult> {
        let rx = self.results.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(CaptureError::ServiceUnavailable(
                "capture worker stopped".to_string(),
            )),
        };
        self.results = None;

        match &result {
            Ok(text) => {
                tracing::info!(transcript = %text, "speech recognized");
                self.last_transcript = Some(text.clone());
                self.turn = SpeechTurn::Recognized(text.clone());
            }
            Err(reason) => {
                tracing::info!(reason = %reason, "capture failed");
                self.turn = SpeechTurn::Failed(reason.clone());
            }
        }

        Some(result)
    }

    /// Return to `Idle` after a result has been handled
    pub fn finish(&mut self) {
        if !self.is_listening() {
            self.turn = SpeechTurn::Idle;
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SpeechTurn {
        &self.turn
    }

    #[must_use]
    pub const fn is_listening(&self) -> bool {
        matches!(self.turn, SpeechTurn::Listening)
    }

    /// A worker is running or about to be launched
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.armed || self.results.is_some()
    }

    #[must_use]
    pub fn last_transcript(&self) -> Option<&str> {
        self.last_transcript.as_deref()
    }
}

impl std::fmt::Debug for SpeechCaptureCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCaptureCoordinator")
            .field("turn", &self.turn)
            .field("armed", &self.armed)
            .field("last_transcript", &self.last_transcript)
            .finish_non_exhaustive()
    }
}
