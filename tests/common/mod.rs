//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use kopi_order::history::{NewOrder, OrderHistoryStore, PersistedOrder};
use kopi_order::voice::{RawAudio, SAMPLE_RATE, SpeechRecognizer, SpeechSynthesizer};
use kopi_order::{
    CaptureError, DbPool, Frame, MenuCatalog, PersistenceError, Session, SqliteOrderStore,
    SynthesisError, db,
};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// The built-in menu
#[must_use]
pub fn catalog() -> Arc<MenuCatalog> {
    Arc::new(MenuCatalog::embedded().expect("embedded menu is valid"))
}

/// Recognizer that returns scripted results in order
#[derive(Default)]
pub struct FakeRecognizer {
    results: Mutex<VecDeque<Result<String, CaptureError>>>,
    /// Held by `listen` until released
    gate: Mutex<Option<std::sync::mpsc::Receiver<()>>>,
    pub listens: Mutex<usize>,
}

impl FakeRecognizer {
    pub fn new(results: Vec<Result<String, CaptureError>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            ..Self::default()
        })
    }

    /// A recognizer whose `listen` blocks until the returned sender fires
    pub fn gated(
        results: Vec<Result<String, CaptureError>>,
    ) -> (Arc<Self>, std::sync::mpsc::Sender<()>) {
        let (tx, rx) = std::sync::mpsc::channel();
        let recognizer = Arc::new(Self {
            results: Mutex::new(results.into()),
            gate: Mutex::new(Some(rx)),
            listens: Mutex::new(0),
        });
        (recognizer, tx)
    }

    pub fn listen_count(&self) -> usize {
        *self.listens.lock().unwrap()
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn listen(&self, _: Duration, _: Duration) -> Result<RawAudio, CaptureError> {
        *self.listens.lock().unwrap() += 1;
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.recv_timeout(Duration::from_secs(5)).ok();
        }
        Ok(RawAudio {
            samples: vec![0.1; SAMPLE_RATE as usize],
            sample_rate: SAMPLE_RATE,
        })
    }

    fn recognize(&self, _: &RawAudio) -> Result<String, CaptureError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(CaptureError::NoSpeech))
    }
}

/// Synthesizer that records what it was asked to say
#[derive(Default)]
pub struct RecordingSynthesizer {
    pub spoken: Mutex<Vec<String>>,
}

impl RecordingSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Store that is always unavailable
pub struct FailingStore;

impl OrderHistoryStore for FailingStore {
    fn append(&self, _: &NewOrder) -> Result<i64, PersistenceError> {
        Err(PersistenceError::Unavailable("disk full".to_string()))
    }

    fn list_recent(&self, _: usize) -> Result<Vec<PersistedOrder>, PersistenceError> {
        Err(PersistenceError::Unavailable("disk full".to_string()))
    }
}

/// A voice-enabled session over an in-memory store
pub fn voice_session(
    recognizer: Arc<FakeRecognizer>,
) -> (Session, Arc<SqliteOrderStore>, Arc<RecordingSynthesizer>) {
    let store = Arc::new(SqliteOrderStore::new(setup_test_db()));
    let synthesizer = RecordingSynthesizer::new();
    let session = Session::new(
        catalog(),
        store.clone(),
        synthesizer.clone(),
        Some(recognizer as Arc<dyn SpeechRecognizer>),
    );
    (session, store, synthesizer)
}

/// A button-only session over an in-memory store
pub fn button_session() -> (Session, Arc<SqliteOrderStore>, Arc<RecordingSynthesizer>) {
    let store = Arc::new(SqliteOrderStore::new(setup_test_db()));
    let synthesizer = RecordingSynthesizer::new();
    let session = Session::new(catalog(), store.clone(), synthesizer.clone(), None);
    (session, store, synthesizer)
}

/// Run passes until the predicate holds on a frame
pub fn pass_until(session: &mut Session, mut done: impl FnMut(&Frame) -> bool) -> Frame {
    for _ in 0..1000 {
        let frame = session.pass(Instant::now());
        if done(&frame) {
            return frame;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("session never reached the expected state");
}
