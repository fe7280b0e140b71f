//! Order session engine
//!
//! A [`Session`] is the context for one user at one terminal. It owns the
//! order, the pending temperature, the notification slot and both voice
//! coordinators. Buttons and keys [`Session::dispatch`] actions; the host
//! loop calls [`Session::pass`] whenever [`Session::needs_pass`] says so (and
//! on a tick while the last frame was `busy`) and draws the returned
//! [`Frame`].
//!
//! One pass runs, in order: queued actions, a finished capture, synthesis
//! status, notification expiry, the frame snapshot, and finally the launch of
//! a capture started in this pass. Launching last is what lets the frame say
//! "listening" before the blocking listen begins.

mod frame;
mod redraw;

pub use frame::{Frame, FrameLine};
pub use redraw::RedrawScheduler;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::CaptureError;
use crate::history::{NewOrder, OrderHistoryStore, PersistedOrder};
use crate::menu::{MenuCatalog, Temperature};
use crate::notification::{NotificationCenter, Severity};
use crate::order::{Command, CommandInterpreter, OrderState, SlotKey};
use crate::voice::{
    SpeechCaptureCoordinator, SpeechRecognizer, SpeechSynthesisCoordinator, SpeechSynthesizer,
};

const UNRECOGNIZED_REPLY: &str = "I didn't understand your order. Please try again.";
const EMPTY_ORDER_REPLY: &str = "Your order is empty";
const CLEARED_REPLY: &str = "Order cleared";

/// A user intent from a button or key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddItem {
        item_id: String,
        temperature: Option<Temperature>,
        add_ons: Vec<String>,
    },
    Decrement(SlotKey),
    Remove(SlotKey),
    /// Sticky temperature used for items that come both ways
    SetTemperature(Option<Temperature>),
    StartCapture,
    CompleteOrder,
    ClearOrder,
}

/// Where a mutation came from; voice-originated results are also spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Button,
    Voice,
}

/// One user's ordering session
pub struct Session {
    catalog: Arc<MenuCatalog>,
    interpreter: CommandInterpreter,
    order: OrderState,
    pending_temperature: Option<Temperature>,
    notifications: NotificationCenter,
    capture: Option<SpeechCaptureCoordinator>,
    speech: SpeechSynthesisCoordinator,
    store: Arc<dyn OrderHistoryStore>,
    actions: VecDeque<Action>,
    redraw: RedrawScheduler,
}

impl Session {
    /// Create a session; `recognizer` is `None` when voice input is off
    #[must_use]
    pub fn new(
        catalog: Arc<MenuCatalog>,
        store: Arc<dyn OrderHistoryStore>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
    ) -> Self {
        Self {
            interpreter: CommandInterpreter::new(&catalog),
            catalog,
            order: OrderState::new(),
            pending_temperature: None,
            notifications: NotificationCenter::new(),
            capture: recognizer.map(SpeechCaptureCoordinator::new),
            speech: SpeechSynthesisCoordinator::new(synthesizer),
            store,
            actions: VecDeque::new(),
            redraw: RedrawScheduler::new(),
        }
    }

    /// Queue an action for the next pass
    pub fn dispatch(&mut self, action: Action) {
        tracing::trace!(?action, "dispatch");
        self.actions.push_back(action);
        self.redraw.request();
    }

    /// Whether the host should run a pass now
    #[must_use]
    pub fn needs_pass(&self) -> bool {
        self.redraw.is_requested() || !self.actions.is_empty()
    }

    /// Run one redraw pass
    pub fn pass(&mut self, now: Instant) -> Frame {
        self.redraw.begin_pass();

        while let Some(action) = self.actions.pop_front() {
            self.apply(action, now);
        }

        let outcome = self
            .capture
            .as_mut()
            .and_then(SpeechCaptureCoordinator::poll);
        if let Some(outcome) = outcome {
            match outcome {
                Ok(text) => self.handle_transcript(&text, now),
                Err(reason) => self.capture_failed(&reason, now),
            }
            if let Some(capture) = self.capture.as_mut() {
                capture.finish();
            }
            self.redraw.request();
        }

        if self.speech.poll() {
            self.redraw.request();
        }

        if self.notifications.expire(now) {
            self.redraw.request();
        }

        let mut frame = self.snapshot(now);

        if let Some(capture) = self.capture.as_mut() {
            capture.launch_pending();
        }

        frame.busy = self.is_busy();
        frame.redraw_requested = self.redraw.end_pass();
        frame
    }

    fn snapshot(&self, now: Instant) -> Frame {
        Frame {
            lines: self
                .order
                .lines()
                .iter()
                .map(|l| FrameLine::new(l, &self.catalog))
                .collect(),
            total: self.order.total(),
            pending_temperature: self.pending_temperature,
            notification: self.notifications.render(now).cloned(),
            capture: self
                .capture
                .as_ref()
                .map(|c| c.state().clone())
                .unwrap_or_default(),
            voice_enabled: self.capture.is_some(),
            last_transcript: self
                .capture
                .as_ref()
                .and_then(|c| c.last_transcript().map(str::to_string)),
            speaking: self.speech.is_speaking(),
            redraw_requested: false,
            busy: false,
        }
    }

    fn is_busy(&self) -> bool {
        self.speech.is_speaking()
            || self.notifications.is_set()
            || self.capture.as_ref().is_some_and(SpeechCaptureCoordinator::is_busy)
    }

    fn apply(&mut self, action: Action, now: Instant) {
        match action {
            Action::AddItem {
                item_id,
                temperature,
                add_ons,
            } => self.add_item(&item_id, temperature, &add_ons, Origin::Button, now),
            Action::Decrement(key) => {
                if let Err(e) = self.order.decrement_slot(&key) {
                    self.notify(e.to_string(), Severity::Error, now);
                }
                self.redraw.request();
            }
            Action::Remove(key) => {
                match self.order.remove_slot(&key) {
                    Ok(line) => tracing::debug!(item = %line.item_id, "line removed"),
                    Err(e) => self.notify(e.to_string(), Severity::Error, now),
                }
                self.redraw.request();
            }
            Action::SetTemperature(temperature) => {
                self.pending_temperature = temperature;
                tracing::debug!(?temperature, "pending temperature set");
                self.redraw.request();
            }
            Action::StartCapture => self.start_capture(now),
            Action::CompleteOrder => self.complete_order(Origin::Button, now),
            Action::ClearOrder => self.clear_order(Origin::Button, now),
        }
    }

    fn start_capture(&mut self, now: Instant) {
        let Some(capture) = self.capture.as_mut() else {
            self.notify("Voice input is disabled", Severity::Error, now);
            self.redraw.request();
            return;
        };

        if capture.start() {
            self.redraw.request();
        }
    }

    fn add_item(
        &mut self,
        item_id: &str,
        temperature: Option<Temperature>,
        add_ons: &[String],
        origin: Origin,
        now: Instant,
    ) {
        let added = self.order.add(
            &self.catalog,
            item_id,
            temperature,
            add_ons,
            self.pending_temperature,
        );

        match added {
            Ok(index) => {
                let label = self
                    .order
                    .lines()
                    .get(index)
                    .map_or_else(|| item_id.to_string(), ToString::to_string);
                tracing::info!(item = item_id, %label, ?origin, "item added");
                self.respond(format!("Added {label} to your order"), Severity::Success, origin, now);
            }
            Err(e) => {
                tracing::debug!(item = item_id, error = %e, "add rejected");
                self.respond(e.to_string(), Severity::Error, origin, now);
            }
        }
        self.redraw.request();
    }

    /// Persist and clear; on store failure the order stays for a retry
    fn complete_order(&mut self, origin: Origin, now: Instant) {
        if self.order.is_empty() {
            self.notify(EMPTY_ORDER_REPLY, Severity::Info, now);
            self.speech.speak(EMPTY_ORDER_REPLY);
            self.redraw.request();
            return;
        }

        let total = self.order.total();
        let new_order = NewOrder {
            items: self.order.to_persisted(),
            total: Some(total),
            completed_at: Utc::now(),
        };

        match self.store.append(&new_order) {
            Ok(order_id) => {
                let summary = self.order.summary();
                self.order.clear();
                tracing::info!(order_id, total = %total, ?origin, "order placed");
                self.notify(format!("Order #{order_id} placed"), Severity::Success, now);
                self.speech
                    .speak(format!("Order placed successfully. You ordered: {summary}"));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save order");
                self.notify(
                    format!("Could not place order: {e}. Please try again."),
                    Severity::Error,
                    now,
                );
            }
        }
        self.redraw.request();
    }

    fn clear_order(&mut self, origin: Origin, now: Instant) {
        self.order.clear();
        self.pending_temperature = None;
        tracing::info!(?origin, "order cleared");
        self.respond(CLEARED_REPLY, Severity::Info, origin, now);
        self.redraw.request();
    }

    fn handle_transcript(&mut self, text: &str, now: Instant) {
        match self.interpreter.interpret(text) {
            Command::AddItem {
                item_id,
                temperature,
            } => self.add_item(&item_id, temperature, &[], Origin::Voice, now),
            Command::CompleteOrder => self.complete_order(Origin::Voice, now),
            Command::ClearOrder => self.clear_order(Origin::Voice, now),
            Command::Unrecognized => {
                tracing::info!(transcript = text, "unrecognized command");
                self.respond(UNRECOGNIZED_REPLY, Severity::Error, Origin::Voice, now);
            }
        }
    }

    fn capture_failed(&mut self, reason: &CaptureError, now: Instant) {
        self.notify(reason.to_string(), Severity::Error, now);
    }

    /// Notify, then speak if the request was spoken
    fn respond(&mut self, message: impl Into<String>, severity: Severity, origin: Origin, now: Instant) {
        let message = message.into();
        if origin == Origin::Voice {
            self.notify(message.clone(), severity, now);
            self.speech.speak(message);
        } else {
            self.notify(message, severity, now);
        }
    }

    fn notify(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        self.notifications.show(message, severity, now);
    }

    /// Most recent completed orders; empty if the store cannot be read
    #[must_use]
    pub fn recent_orders(&self, limit: usize) -> Vec<PersistedOrder> {
        self.store.list_recent(limit).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load order history");
            Vec::new()
        })
    }

    #[must_use]
    pub const fn order(&self) -> &OrderState {
        &self.order
    }

    #[must_use]
    pub const fn pending_temperature(&self) -> Option<Temperature> {
        self.pending_temperature
    }

    #[must_use]
    pub fn catalog(&self) -> &MenuCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn voice_enabled(&self) -> bool {
        self.capture.is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("order", &self.order)
            .field("pending_temperature", &self.pending_temperature)
            .field("capture", &self.capture)
            .field("speech", &self.speech)
            .field("queued_actions", &self.actions.len())
            .finish_non_exhaustive()
    }
}
