//! Spoken confirmations without blocking the redraw loop
//!
//! Utterances queue in FIFO order and are spoken one at a time, each on its
//! own worker thread. The worker's only output is a completion flag; the loop
//! notices it in [`SpeechSynthesisCoordinator::poll`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use super::synthesizer::SpeechSynthesizer;

/// Sets the completion flag even if the synthesizer panics
struct DoneOnDrop(Arc<AtomicBool>);

impl Drop for DoneOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// An utterance being spoken
struct SynthesisWorker {
    text: String,
    done: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Serializes utterances through one worker at a time
pub struct SpeechSynthesisCoordinator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    queue: VecDeque<String>,
    active: Option<SynthesisWorker>,
}

impl SpeechSynthesisCoordinator {
    #[must_use]
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            queue: VecDeque::new(),
            active: None,
        }
    }

    /// Queue an utterance; returns immediately
    ///
    /// The worker is started by the next [`Self::poll`].
    pub fn speak(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }
        tracing::debug!(text = %text, queued = self.queue.len(), "speech requested");
        self.queue.push_back(text);
    }

    /// Reap a finished worker and start the next queued utterance
    ///
    /// Returns `true` if the speaking status changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;

        if self
            .active
            .as_ref()
            .is_some_and(|w| w.done.load(Ordering::Acquire))
        {
            if let Some(worker) = self.active.take() {
                if worker.handle.join().is_err() {
                    tracing::warn!(text = %worker.text, "speech worker panicked");
                } else {
                    tracing::trace!(text = %worker.text, "utterance finished");
                }
                changed = true;
            }
        }

        while self.active.is_none() {
            let Some(text) = self.queue.pop_front() else {
                break;
            };
            self.active = self.spawn(text);
            changed = true;
        }

        changed
    }

    fn spawn(&self, text: String) -> Option<SynthesisWorker> {
        let done = Arc::new(AtomicBool::new(false));
        let synthesizer = Arc::clone(&self.synthesizer);
        let guard = DoneOnDrop(Arc::clone(&done));
        let spoken = text.clone();

        let spawned = std::thread::Builder::new()
            .name("kopi-tts".to_string())
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = synthesizer.speak(&spoken) {
                    tracing::warn!(error = %e, "speech synthesis failed");
                }
            });

        match spawned {
            Ok(handle) => Some(SynthesisWorker { text, done, handle }),
            Err(e) => {
                tracing::warn!(error = %e, text = %text, "failed to start speech worker");
                None
            }
        }
    }

    /// Speaking, or about to
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.active.is_some() || !self.queue.is_empty()
    }

    /// Text currently being spoken
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.active.as_ref().map(|w| w.text.as_str())
    }

    /// Utterances waiting behind the current one
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for SpeechSynthesisCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSynthesisCoordinator")
            .field("current", &self.current())
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}
