//! Session engine integration tests
//!
//! Drives the redraw loop by hand with fake voice capabilities and an
//! in-memory order history.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kopi_order::history::OrderHistoryStore;
use kopi_order::voice::SpeechTurn;
use kopi_order::{Action, CaptureError, Money, Session, Severity, Temperature};

mod common;

use common::{FailingStore, FakeRecognizer, RecordingSynthesizer, button_session, pass_until};

fn add(item_id: &str) -> Action {
    Action::AddItem {
        item_id: item_id.to_string(),
        temperature: None,
        add_ons: Vec::new(),
    }
}

fn notification(session: &mut Session) -> Option<(String, Severity)> {
    session
        .pass(Instant::now())
        .notification
        .map(|n| (n.message, n.severity))
}

#[test]
fn test_complete_order_persists_and_clears() {
    let (mut session, store, synthesizer) = button_session();

    session.dispatch(Action::SetTemperature(Some(Temperature::Hot)));
    session.dispatch(add("latte"));
    session.dispatch(add("latte"));
    session.dispatch(add("mocha"));
    let frame = session.pass(Instant::now());
    assert_eq!(frame.lines.len(), 2);
    assert_eq!(frame.total, Money::from_cents(1100));

    session.dispatch(Action::CompleteOrder);
    let frame = session.pass(Instant::now());
    assert!(frame.lines.is_empty());
    assert_eq!(frame.total, Money::ZERO);
    let shown = frame.notification.unwrap();
    assert_eq!(shown.message, "Order #1 placed");
    assert_eq!(shown.severity, Severity::Success);

    let orders = store.list_recent(5).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total, Some(Money::from_cents(1100)));
    assert_eq!(orders[0].items.len(), 2);
    assert_eq!(orders[0].items[0].item_id, "latte");
    assert_eq!(orders[0].items[0].quantity, 2);
    assert_eq!(orders[0].items[0].temperature, Some(Temperature::Hot));

    pass_until(&mut session, |f| !f.speaking);
    assert_eq!(
        synthesizer.spoken(),
        ["Order placed successfully. You ordered: 2 Hot Latte, 1 Hot Mocha"]
    );

    assert_eq!(session.recent_orders(10).len(), 1);
}

#[test]
fn test_failed_persistence_keeps_order() {
    let synthesizer = RecordingSynthesizer::new();
    let mut session = Session::new(
        common::catalog(),
        Arc::new(FailingStore),
        synthesizer.clone(),
        None,
    );

    session.dispatch(Action::SetTemperature(Some(Temperature::Hot)));
    session.dispatch(add("latte"));
    session.dispatch(add("latte"));
    session.dispatch(add("mocha"));
    session.dispatch(Action::CompleteOrder);

    let frame = session.pass(Instant::now());
    assert_eq!(frame.lines.len(), 2);
    assert_eq!(frame.lines[0].quantity, 2);
    assert_eq!(frame.total, Money::from_cents(1100));

    let shown = frame.notification.unwrap();
    assert_eq!(shown.severity, Severity::Error);
    assert!(shown.message.contains("disk full"));

    // Nothing confirmed aloud
    pass_until(&mut session, |f| !f.speaking);
    assert!(synthesizer.spoken().is_empty());

    assert!(session.recent_orders(10).is_empty());
}

#[test]
fn test_empty_order_is_not_placed() {
    let (mut session, store, _) = button_session();

    session.dispatch(Action::CompleteOrder);
    assert_eq!(
        notification(&mut session),
        Some(("Your order is empty".to_string(), Severity::Info))
    );
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_temperature_required_leaves_order_untouched() {
    let (mut session, _, _) = button_session();

    session.dispatch(add("latte"));
    let (message, severity) = notification(&mut session).unwrap();
    assert_eq!(severity, Severity::Error);
    assert!(message.contains("Latte"));
    assert!(session.order().is_empty());

    // Items without a temperature choice need none
    session.dispatch(add("espresso"));
    assert_eq!(
        notification(&mut session),
        Some((
            "Added Espresso to your order".to_string(),
            Severity::Success
        ))
    );
}

#[test]
fn test_pending_temperature_is_sticky_until_clear() {
    let (mut session, _, _) = button_session();

    session.dispatch(Action::SetTemperature(Some(Temperature::Cold)));
    session.dispatch(add("latte"));
    session.dispatch(add("kopi"));
    let frame = session.pass(Instant::now());
    assert_eq!(frame.lines[0].label, "Cold Latte");
    assert_eq!(frame.lines[1].label, "Cold Kopi");
    assert_eq!(frame.pending_temperature, Some(Temperature::Cold));

    // Explicit temperature wins without changing the default
    session.dispatch(Action::AddItem {
        item_id: "latte".to_string(),
        temperature: Some(Temperature::Hot),
        add_ons: Vec::new(),
    });
    let frame = session.pass(Instant::now());
    assert_eq!(frame.lines[2].label, "Hot Latte");
    assert_eq!(session.pending_temperature(), Some(Temperature::Cold));

    session.dispatch(Action::ClearOrder);
    let frame = session.pass(Instant::now());
    assert!(frame.lines.is_empty());
    assert_eq!(frame.pending_temperature, None);
    assert_eq!(frame.notification.unwrap().message, "Order cleared");
}

#[test]
fn test_add_ons_make_separate_lines() {
    let (mut session, _, _) = button_session();

    session.dispatch(add("espresso"));
    session.dispatch(Action::AddItem {
        item_id: "espresso".to_string(),
        temperature: None,
        add_ons: vec!["extra-shot".to_string()],
    });
    session.dispatch(Action::AddItem {
        item_id: "espresso".to_string(),
        temperature: None,
        add_ons: vec!["extra-shot".to_string()],
    });

    let frame = session.pass(Instant::now());
    assert_eq!(frame.lines.len(), 2);
    assert_eq!(frame.lines[1].quantity, 2);
    assert_eq!(frame.lines[1].add_ons, ["Extra Shot"]);
    // 3.00 + 2 x (3.00 + 0.80)
    assert_eq!(frame.total, Money::from_cents(1060));

    session.dispatch(Action::AddItem {
        item_id: "espresso".to_string(),
        temperature: None,
        add_ons: vec!["sprinkles".to_string()],
    });
    let (_, severity) = notification(&mut session).unwrap();
    assert_eq!(severity, Severity::Error);
    assert_eq!(session.order().len(), 2);
}

#[test]
fn test_decrement_and_remove_by_slot() {
    let (mut session, _, _) = button_session();

    session.dispatch(add("espresso"));
    session.dispatch(add("espresso"));
    session.dispatch(add("cappuccino"));
    let frame = session.pass(Instant::now());
    let espresso = frame.lines[0].key.clone();
    let cappuccino = frame.lines[1].key.clone();

    session.dispatch(Action::Decrement(espresso.clone()));
    let frame = session.pass(Instant::now());
    assert_eq!(frame.lines[0].quantity, 1);

    // Removing the first line does not disturb the key of the second
    session.dispatch(Action::Decrement(espresso.clone()));
    session.dispatch(Action::Remove(cappuccino));
    let frame = session.pass(Instant::now());
    assert!(frame.lines.is_empty());

    session.dispatch(Action::Decrement(espresso));
    let (message, severity) = notification(&mut session).unwrap();
    assert_eq!(severity, Severity::Error);
    assert_eq!(message, "that order line no longer exists");
}

#[test]
fn test_redraw_settles_after_one_extra_pass() {
    let (mut session, _, _) = button_session();

    // Initial pass
    assert!(session.needs_pass());
    let frame = session.pass(Instant::now());
    assert!(!frame.redraw_requested);
    assert!(!session.needs_pass());

    session.dispatch(add("espresso"));
    assert!(session.needs_pass());

    let frame = session.pass(Instant::now());
    assert_eq!(frame.lines.len(), 1);
    assert!(frame.redraw_requested);
    assert!(session.needs_pass());

    let frame = session.pass(Instant::now());
    assert!(!frame.redraw_requested);
    assert!(!session.needs_pass());
}

#[test]
fn test_notification_expires_lazily() {
    let (mut session, _, _) = button_session();
    let start = Instant::now();

    session.dispatch(add("espresso"));
    let frame = session.pass(start);
    assert!(frame.notification.is_some());
    assert!(frame.busy);

    let frame = session.pass(start + Duration::from_millis(2900));
    assert!(frame.notification.is_some());

    let frame = session.pass(start + Duration::from_millis(3100));
    assert!(frame.notification.is_none());
    assert!(frame.redraw_requested);
    assert!(!frame.busy);

    let frame = session.pass(start + Duration::from_millis(3200));
    assert!(!frame.redraw_requested);
}

#[test]
fn test_voice_order_flow() {
    let recognizer = FakeRecognizer::new(vec![Ok("One hot latte please".to_string())]);
    let (mut session, _, synthesizer) = common::voice_session(recognizer);

    session.dispatch(Action::StartCapture);
    let frame = session.pass(Instant::now());
    assert_eq!(frame.capture, SpeechTurn::Listening);
    assert!(frame.busy);

    let frame = pass_until(&mut session, |f| !f.lines.is_empty());
    assert_eq!(frame.lines[0].label, "Hot Latte");
    assert_eq!(frame.capture, SpeechTurn::Idle);
    assert_eq!(frame.last_transcript.as_deref(), Some("One hot latte please"));
    assert_eq!(
        frame.notification.unwrap().message,
        "Added Hot Latte to your order"
    );

    pass_until(&mut session, |f| !f.speaking);
    assert_eq!(synthesizer.spoken(), ["Added Hot Latte to your order"]);
}

#[test]
fn test_listening_is_shown_before_capture_blocks() {
    let (recognizer, release) = FakeRecognizer::gated(vec![Ok("kopi peng".to_string())]);
    let (mut session, _, _) = common::voice_session(recognizer.clone());

    session.dispatch(Action::StartCapture);
    let frame = session.pass(Instant::now());
    assert_eq!(frame.capture, SpeechTurn::Listening);

    // A second request while listening is ignored, not queued
    session.dispatch(Action::StartCapture);
    let frame = session.pass(Instant::now());
    assert_eq!(frame.capture, SpeechTurn::Listening);
    assert!(frame.lines.is_empty());

    release.send(()).unwrap();
    let frame = pass_until(&mut session, |f| !f.lines.is_empty());
    assert_eq!(frame.lines[0].label, "Cold Kopi");
    assert_eq!(recognizer.listen_count(), 1);

    // Capture can start again once idle
    session.dispatch(Action::StartCapture);
    let frame = session.pass(Instant::now());
    assert_eq!(frame.capture, SpeechTurn::Listening);
}

#[test]
fn test_button_actions_while_listening_compose_with_voice_result() {
    let (recognizer, release) = FakeRecognizer::gated(vec![Ok("kopi peng".to_string())]);
    let (mut session, _, _) = common::voice_session(recognizer);

    session.dispatch(Action::StartCapture);
    assert_eq!(session.pass(Instant::now()).capture, SpeechTurn::Listening);

    session.dispatch(add("espresso"));
    let frame = session.pass(Instant::now());
    assert_eq!(frame.capture, SpeechTurn::Listening);
    assert_eq!(frame.lines.len(), 1);

    release.send(()).unwrap();
    let frame = pass_until(&mut session, |f| f.lines.len() == 2);
    let labels: Vec<&str> = frame.lines.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, ["Espresso", "Cold Kopi"]);
    assert_eq!(frame.total, session.order().total());
}

#[test]
fn test_voice_clear_overrides_button_actions_made_while_listening() {
    let (recognizer, release) = FakeRecognizer::gated(vec![Ok("cancel my order".to_string())]);
    let (mut session, _, _) = common::voice_session(recognizer);

    session.dispatch(Action::StartCapture);
    session.pass(Instant::now());
    session.dispatch(add("espresso"));
    assert_eq!(session.pass(Instant::now()).lines.len(), 1);

    release.send(()).unwrap();
    let frame = pass_until(&mut session, |f| f.last_transcript.is_some());
    assert!(frame.lines.is_empty());
    assert!(session.order().is_empty());
    assert_eq!(frame.notification.unwrap().message, "Order cleared");
}

#[test]
fn test_voice_unrecognized_is_spoken() {
    let recognizer = FakeRecognizer::new(vec![Ok("banana".to_string())]);
    let (mut session, _, synthesizer) = common::voice_session(recognizer);

    session.dispatch(Action::StartCapture);
    let frame = pass_until(&mut session, |f| f.last_transcript.is_some());
    let shown = frame.notification.unwrap();
    assert_eq!(shown.message, "I didn't understand your order. Please try again.");
    assert_eq!(shown.severity, Severity::Error);
    assert!(session.order().is_empty());

    pass_until(&mut session, |f| !f.speaking);
    assert_eq!(
        synthesizer.spoken(),
        ["I didn't understand your order. Please try again."]
    );
}

#[test]
fn test_voice_clear_and_complete() {
    let recognizer = FakeRecognizer::new(vec![
        Ok("cancel my order".to_string()),
        Ok("place order".to_string()),
    ]);
    let (mut session, store, synthesizer) = common::voice_session(recognizer);

    session.dispatch(add("espresso"));
    session.dispatch(Action::StartCapture);
    pass_until(&mut session, |f| f.lines.is_empty());

    session.dispatch(add("espresso"));
    session.dispatch(Action::StartCapture);
    pass_until(&mut session, |f| f.lines.is_empty() && f.capture == SpeechTurn::Idle);
    assert_eq!(store.count().unwrap(), 1);

    pass_until(&mut session, |f| !f.speaking);
    assert_eq!(
        synthesizer.spoken(),
        [
            "Order cleared",
            "Order placed successfully. You ordered: 1 Espresso"
        ]
    );
}

#[test]
fn test_capture_failure_is_shown_not_retried() {
    let recognizer = FakeRecognizer::new(vec![Err(CaptureError::Timeout)]);
    let (mut session, _, synthesizer) = common::voice_session(recognizer.clone());

    session.dispatch(Action::StartCapture);
    let frame = pass_until(&mut session, |f| f.notification.is_some());
    assert_eq!(frame.capture, SpeechTurn::Idle);
    assert_eq!(frame.notification.unwrap().severity, Severity::Error);
    assert!(frame.last_transcript.is_none());

    let frame = session.pass(Instant::now());
    assert!(!frame.speaking);
    assert_eq!(recognizer.listen_count(), 1);
    assert!(synthesizer.spoken().is_empty());
}

#[test]
fn test_capture_without_voice_input() {
    let (mut session, _, _) = button_session();
    assert!(!session.voice_enabled());

    session.dispatch(Action::StartCapture);
    let frame = session.pass(Instant::now());
    assert!(!frame.voice_enabled);
    assert_eq!(frame.capture, SpeechTurn::Idle);
    assert_eq!(frame.notification.unwrap().message, "Voice input is disabled");
}
