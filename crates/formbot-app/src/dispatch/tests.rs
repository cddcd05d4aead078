//! Tests for dispatch passes

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::MAX_NAVIGATION;
use crate::engine::Engine;
use crate::engine_event::EngineEvent;
use crate::form::{Form, FormContext};
use crate::test_utils::{Journal, RecordingSubscriber, ScriptedForm, Step};
use formbot_client::test_utils::RecordingClient;
use formbot_core::prelude::*;
use formbot_core::{DeviceId, Message, MessageKind, Update, UpdateKind};

struct Harness {
    engine: Arc<Engine>,
    client: Arc<RecordingClient>,
    subscriber: Arc<RecordingSubscriber>,
}

fn harness(start: ScriptedForm, subscriber: RecordingSubscriber) -> Harness {
    let client = Arc::new(RecordingClient::new());
    let subscriber = Arc::new(subscriber);
    let engine = Engine::builder(client.clone())
        .with_system_call("/start")
        .with_subscriber(subscriber.clone())
        .start_form_with(move || Box::new(start.clone()))
        .build()
        .unwrap();
    Harness {
        engine,
        client,
        subscriber,
    }
}

fn text(device: i64, text: &str) -> Update {
    Update::message(Message::text(device, 1, text))
}

fn action(device: i64, data: &str) -> Update {
    Update::action(Message::callback(device, 2, data))
}

fn attachment(device: i64, kind: MessageKind) -> Update {
    Update::message(Message::attachment(
        device,
        3,
        kind,
        json!({ "caption": "file" }),
    ))
}

fn loop_hooks(form: &str, journal: &Journal) -> Vec<String> {
    journal
        .entries()
        .into_iter()
        .filter(|e| e.starts_with(&format!("{}:", form)))
        .collect()
}

// ─────────────────────────────────────────────────────────
// Session resolution and system calls
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unhandled_start_falls_through_to_default_form() {
    let journal = Journal::new();
    let h = harness(
        ScriptedForm::new("start", &journal),
        RecordingSubscriber::new(),
    );

    let report = h.engine.dispatch(text(42, "/start")).await;

    assert!(!report.failed);
    assert!(!report.system_call_handled);
    assert_eq!(report.iterations, 1);
    assert!(report.rendered);
    assert_eq!(h.subscriber.system_call_count(), 1);
    assert_eq!(
        journal.entries(),
        vec![
            "start:init",
            "start:opened",
            "start:pre_load",
            "start:load_controls",
            "start:load",
            "start:render_controls",
            "start:render",
        ]
    );

    let session = h.engine.session(&DeviceId::from(42)).unwrap();
    let session = session.lock().await;
    assert!(session.is_opened());
    assert_eq!(session.last_message.as_ref().unwrap().raw_data(), "/start");
}

#[tokio::test]
async fn test_session_begins_only_once() {
    let journal = Journal::new();
    let h = harness(
        ScriptedForm::new("start", &journal),
        RecordingSubscriber::new(),
    );

    h.engine.dispatch(text(42, "hi")).await;
    h.engine.dispatch(text(42, "again")).await;

    assert_eq!(h.subscriber.count("session_begins"), 1);
    assert_eq!(journal.count("start:init"), 1);
    assert_eq!(journal.count("start:render"), 2);
}

#[tokio::test]
async fn test_handled_system_call_short_circuits_forms() {
    let journal = Journal::new();
    let h = harness(
        ScriptedForm::new("start", &journal),
        RecordingSubscriber::new().handling_system_calls(),
    );

    let report = h.engine.dispatch(text(42, "/start now")).await;

    assert!(report.system_call_handled);
    assert_eq!(report.iterations, 0);
    assert!(!report.rendered);
    assert!(!journal.contains("start:load"));

    let calls: Vec<_> = h
        .subscriber
        .events()
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::SystemCall {
                command, handled, ..
            } => Some((command, handled)),
            _ => None,
        })
        .collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.token, "/start");
    assert_eq!(calls[0].0.args, vec!["now"]);
    assert!(calls[0].1);
}

#[tokio::test]
async fn test_unrecognized_command_is_not_a_system_call() {
    let journal = Journal::new();
    let h = harness(
        ScriptedForm::new("start", &journal),
        RecordingSubscriber::new().handling_system_calls(),
    );

    let report = h.engine.dispatch(text(42, "/help")).await;

    assert!(!report.system_call_handled);
    assert!(report.rendered);
    assert_eq!(h.subscriber.system_call_count(), 0);
    assert_eq!(h.subscriber.count("system_call"), 0);
}

#[tokio::test]
async fn test_system_call_navigation_without_handling_renders_new_form() {
    let journal = Journal::new();
    let menu = ScriptedForm::new("menu", &journal);
    let h = harness(
        ScriptedForm::new("start", &journal),
        RecordingSubscriber::new().navigating_on_system_call(menu),
    );

    let report = h.engine.dispatch(text(42, "/start")).await;

    assert!(report.rendered);
    assert!(journal.contains("start:closed"));
    assert!(journal.contains("menu:render"));
    assert!(!journal.contains("start:load"));
}

// ─────────────────────────────────────────────────────────
// Navigation loop
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_action_switch_reenters_loop_on_new_form() {
    let journal = Journal::new();
    let b = ScriptedForm::new("b", &journal);
    let a = ScriptedForm::new("a", &journal)
        .on("action", Step::navigate_to(b))
        .on("action", Step::Handle);
    let h = harness(a, RecordingSubscriber::new());

    let report = h.engine.dispatch(action(1, "go")).await;

    assert_eq!(report.iterations, 2);
    assert!(report.rendered);
    assert_eq!(h.subscriber.count("unhandled_call"), 0);
    assert_eq!(
        loop_hooks("a", &journal),
        vec![
            "a:init",
            "a:opened",
            "a:pre_load",
            "a:load_controls",
            "a:load",
            "a:action_controls",
            "a:action",
            "a:closed",
        ]
    );
    assert_eq!(
        loop_hooks("b", &journal),
        vec![
            "b:init",
            "b:opened",
            "b:pre_load",
            "b:load_controls",
            "b:load",
            "b:action_controls",
            "b:action",
            "b:render_controls",
            "b:render",
        ]
    );

    let session = h.engine.session(&DeviceId::from(1)).unwrap();
    assert!(!session.lock().await.form_switched);
}

#[tokio::test]
async fn test_switch_skips_remaining_hooks_of_old_form() {
    let journal = Journal::new();
    let b = ScriptedForm::new("b", &journal);
    let a = ScriptedForm::new("a", &journal).on("pre_load", Step::navigate_to(b));
    let h = harness(a, RecordingSubscriber::new());

    let report = h.engine.dispatch(text(1, "hello")).await;

    assert_eq!(report.iterations, 2);
    assert!(!journal.contains("a:load_controls"));
    assert!(!journal.contains("a:load"));
    assert!(!journal.contains("a:render"));
    assert_eq!(journal.count("b:render"), 1);
}

/// Navigates to a fresh copy of itself on every load
struct Restless {
    loads: Arc<AtomicUsize>,
    renders: Arc<AtomicUsize>,
}

#[async_trait]
impl Form for Restless {
    async fn load(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        ctx.navigate_to(Restless {
            loads: self.loads.clone(),
            renders: self.renders.clone(),
        });
        Ok(())
    }

    async fn render(&mut self, _ctx: &mut FormContext) -> Result<()> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_navigation_loop_is_capped() {
    let loads = Arc::new(AtomicUsize::new(0));
    let renders = Arc::new(AtomicUsize::new(0));
    let client = Arc::new(RecordingClient::new());
    let (l, r) = (loads.clone(), renders.clone());
    let engine = Engine::builder(client)
        .start_form_with(move || {
            Box::new(Restless {
                loads: l.clone(),
                renders: r.clone(),
            })
        })
        .build()
        .unwrap();

    let report = engine.dispatch(text(1, "spin")).await;

    assert!(!report.failed);
    assert_eq!(report.iterations, MAX_NAVIGATION);
    assert_eq!(loads.load(Ordering::SeqCst), MAX_NAVIGATION);
    assert_eq!(renders.load(Ordering::SeqCst), 0);
    assert!(!report.rendered);
}

#[tokio::test]
async fn test_render_switch_runs_another_iteration() {
    let journal = Journal::new();
    let b = ScriptedForm::new("b", &journal);
    let a = ScriptedForm::new("a", &journal).on("render", Step::navigate_to(b));
    let h = harness(a, RecordingSubscriber::new());

    let report = h.engine.dispatch(text(1, "hi")).await;

    assert_eq!(report.iterations, 2);
    assert_eq!(journal.count("a:render"), 1);
    assert_eq!(journal.count("b:render"), 1);
}

// ─────────────────────────────────────────────────────────
// Attachments
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_attachments_delivered_once() {
    for kind in [
        MessageKind::Photo,
        MessageKind::Document,
        MessageKind::Location,
        MessageKind::Contact,
        MessageKind::Video,
        MessageKind::Audio,
    ] {
        let journal = Journal::new();
        let h = harness(
            ScriptedForm::new("a", &journal),
            RecordingSubscriber::new(),
        );

        let report = h.engine.dispatch(attachment(1, kind)).await;

        assert!(report.rendered, "{kind} should render");
        assert_eq!(journal.count("a:sent_data"), 1, "{kind} delivered once");
    }
}

#[tokio::test]
async fn test_text_is_not_delivered_as_data() {
    let journal = Journal::new();
    let h = harness(ScriptedForm::new("a", &journal), RecordingSubscriber::new());

    h.engine.dispatch(text(1, "plain")).await;

    assert!(!journal.contains("a:sent_data"));
}

#[tokio::test]
async fn test_attachment_not_delivered_after_switch() {
    let journal = Journal::new();
    let b = ScriptedForm::new("b", &journal);
    let a = ScriptedForm::new("a", &journal).on("load", Step::navigate_to(b));
    let h = harness(a, RecordingSubscriber::new());

    h.engine.dispatch(attachment(1, MessageKind::Photo)).await;

    assert_eq!(journal.count("a:sent_data"), 0);
    assert_eq!(journal.count("b:sent_data"), 1);
}

// ─────────────────────────────────────────────────────────
// Unhandled calls
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unhandled_action_notifies_then_renders() {
    let journal = Journal::new();
    let h = harness(ScriptedForm::new("a", &journal), RecordingSubscriber::new());

    let report = h.engine.dispatch(action(1, "mystery")).await;

    assert_eq!(h.subscriber.unhandled_call_count(), 1);
    assert!(report.rendered);
    let unhandled: Vec<_> = h
        .subscriber
        .events()
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::UnhandledCall { data, handled, .. } => Some((data, handled)),
            _ => None,
        })
        .collect();
    assert_eq!(unhandled, vec![("mystery".to_string(), false)]);
}

#[tokio::test]
async fn test_recovered_action_without_switch_skips_render() {
    let journal = Journal::new();
    let h = harness(
        ScriptedForm::new("a", &journal),
        RecordingSubscriber::new().handling_unhandled_calls(),
    );

    let report = h.engine.dispatch(action(1, "mystery")).await;

    assert_eq!(report.iterations, 1);
    assert!(!report.rendered);
    assert!(!journal.contains("a:render_controls"));
    assert_eq!(h.subscriber.unhandled_call_count(), 1);
}

#[tokio::test]
async fn test_recovered_action_with_switch_continues_loop() {
    let journal = Journal::new();
    let rescue = ScriptedForm::new("rescue", &journal);
    let h = harness(
        ScriptedForm::new("a", &journal),
        RecordingSubscriber::new()
            .handling_unhandled_calls()
            .navigating_on_unhandled_call(rescue),
    );

    let report = h.engine.dispatch(action(1, "mystery")).await;

    assert_eq!(report.iterations, 2);
    assert!(report.rendered);
    assert!(!journal.contains("a:render"));
    assert_eq!(journal.count("rescue:load"), 1);
    assert_eq!(journal.count("rescue:render"), 1);
    assert_eq!(h.subscriber.unhandled_call_count(), 1);
}

#[tokio::test]
async fn test_unhandled_switch_without_handling_continues_loop() {
    let journal = Journal::new();
    let rescue = ScriptedForm::new("rescue", &journal).on("action", Step::Handle);
    let h = harness(
        ScriptedForm::new("a", &journal),
        RecordingSubscriber::new().navigating_on_unhandled_call(rescue),
    );

    let report = h.engine.dispatch(action(1, "mystery")).await;

    assert_eq!(report.iterations, 2);
    assert!(!journal.contains("a:render"));
    assert_eq!(journal.count("rescue:render"), 1);
    assert_eq!(h.subscriber.unhandled_call_count(), 1);
}

#[tokio::test]
async fn test_action_switch_without_handling_is_reported_once() {
    let journal = Journal::new();
    let b = ScriptedForm::new("b", &journal).on("action", Step::Handle);
    let a = ScriptedForm::new("a", &journal).on("action", Step::navigate_to(b));
    let h = harness(a, RecordingSubscriber::new());

    let report = h.engine.dispatch(action(1, "go")).await;

    assert_eq!(report.iterations, 2);
    assert!(report.rendered);
    assert_eq!(h.subscriber.unhandled_call_count(), 1);
    assert_eq!(h.subscriber.count("unhandled_call"), 1);
    assert!(!journal.contains("a:render"));
    assert_eq!(journal.count("b:action"), 1);
    assert_eq!(journal.count("b:render"), 1);
}

#[tokio::test]
async fn test_recovered_action_after_switch_continues_on_new_form() {
    let journal = Journal::new();
    let b = ScriptedForm::new("b", &journal);
    let a = ScriptedForm::new("a", &journal).on("action", Step::navigate_to(b));
    let h = harness(a, RecordingSubscriber::new().handling_unhandled_calls());

    let report = h.engine.dispatch(action(1, "go")).await;

    assert_eq!(report.iterations, 2);
    assert!(report.rendered);
    assert_eq!(h.subscriber.unhandled_call_count(), 1);
    assert_eq!(journal.count("b:render"), 1);
}

#[tokio::test]
async fn test_load_switch_skips_action_and_report() {
    let journal = Journal::new();
    let b = ScriptedForm::new("b", &journal).on("action", Step::Handle);
    let a = ScriptedForm::new("a", &journal).on("load", Step::navigate_to(b));
    let h = harness(a, RecordingSubscriber::new());

    let report = h.engine.dispatch(action(1, "go")).await;

    assert_eq!(report.iterations, 2);
    assert!(!journal.contains("a:action"));
    assert_eq!(h.subscriber.unhandled_call_count(), 0);
    assert_eq!(journal.count("b:render"), 1);
}

#[tokio::test]
async fn test_handled_action_is_not_reported() {
    let journal = Journal::new();
    let a = ScriptedForm::new("a", &journal).on("action", Step::Handle);
    let h = harness(a, RecordingSubscriber::new());

    let report = h.engine.dispatch(action(1, "known")).await;

    assert!(report.rendered);
    assert_eq!(h.subscriber.unhandled_call_count(), 0);
    assert_eq!(h.subscriber.count("unhandled_call"), 0);
}

#[tokio::test]
async fn test_action_never_delivers_attachment_or_system_call() {
    let journal = Journal::new();
    let h = harness(
        ScriptedForm::new("a", &journal).on("action", Step::Handle),
        RecordingSubscriber::new().handling_system_calls(),
    );

    let report = h
        .engine
        .dispatch(Update::action(Message::callback(1, 1, "/start")))
        .await;

    assert!(!report.system_call_handled);
    assert!(report.rendered);
    assert_eq!(h.subscriber.system_call_count(), 0);
    assert!(!journal.contains("a:sent_data"));
}

// ─────────────────────────────────────────────────────────
// Edited messages
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_edit_without_switch_runs_only_edited() {
    let journal = Journal::new();
    let h = harness(ScriptedForm::new("a", &journal), RecordingSubscriber::new());

    let report = h
        .engine
        .dispatch(Update::edited(Message::text(1, 1, "typo fixed")))
        .await;

    assert_eq!(report.kind, UpdateKind::Edited);
    assert_eq!(report.iterations, 0);
    assert!(!report.rendered);
    assert_eq!(
        journal.entries(),
        vec!["a:init", "a:opened", "a:edited"]
    );
}

#[tokio::test]
async fn test_edit_with_switch_runs_full_cycle_on_new_form() {
    let journal = Journal::new();
    let b = ScriptedForm::new("b", &journal);
    let a = ScriptedForm::new("a", &journal).on("edited", Step::navigate_to(b));
    let h = harness(a, RecordingSubscriber::new());

    let report = h
        .engine
        .dispatch(Update::edited(Message::text(1, 1, "changed")))
        .await;

    assert_eq!(report.iterations, 1);
    assert!(report.rendered);
    assert!(!journal.contains("a:load"));
    assert_eq!(
        loop_hooks("b", &journal),
        vec![
            "b:init",
            "b:opened",
            "b:pre_load",
            "b:load_controls",
            "b:load",
            "b:render_controls",
            "b:render",
        ]
    );
}

// ─────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_application_error_is_reported_and_session_survives() {
    let journal = Journal::new();
    let a = ScriptedForm::new("a", &journal).on("load", Step::Fail("bad input".to_string()));
    let h = harness(a, RecordingSubscriber::new());

    let report = h
        .engine
        .dispatch(Update::message(
            Message::text(5, 1, "boom").with_chat_title("Ops"),
        ))
        .await;

    assert!(report.failed);
    assert!(!report.rendered);
    assert!(!journal.contains("a:render"));

    let exceptions: Vec<_> = h
        .subscriber
        .events()
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::Exception {
                device_id,
                title,
                text,
                error,
            } => Some((device_id, title, text, error)),
            _ => None,
        })
        .collect();
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].0, DeviceId::from(5));
    assert_eq!(exceptions[0].1, "Ops");
    assert_eq!(exceptions[0].2, "boom");
    assert!(exceptions[0].3.contains("bad input"));

    // The session stays registered and keeps its form
    assert!(h.engine.session(&DeviceId::from(5)).is_some());
    h.engine.dispatch(text(5, "again")).await;
    assert_eq!(journal.count("a:init"), 1);
    assert_eq!(journal.count("a:load"), 2);
}

#[tokio::test]
async fn test_transport_error_is_not_reported() {
    let journal = Journal::new();
    let a = ScriptedForm::new("a", &journal).on("render", Step::Reply("hello".to_string()));
    let h = harness(a, RecordingSubscriber::new());
    h.client.fail_sends(true);

    let report = h.engine.dispatch(text(1, "hi")).await;

    assert!(report.failed);
    assert_eq!(h.subscriber.count("exception"), 0);

    h.client.fail_sends(false);
    let report = h.engine.dispatch(text(1, "hi")).await;
    assert!(!report.failed);
    assert_eq!(h.client.sent_to(&DeviceId::from(1)), vec!["hello"]);
}

#[tokio::test]
async fn test_scripted_transport_failure_is_not_reported() {
    let journal = Journal::new();
    let a = ScriptedForm::new("a", &journal)
        .on("action", Step::FailTransport("connection reset".to_string()));
    let h = harness(a, RecordingSubscriber::new());

    let report = h.engine.dispatch(action(1, "x")).await;

    assert!(report.failed);
    assert_eq!(h.subscriber.count("exception"), 0);
    assert_eq!(h.subscriber.unhandled_call_count(), 0);
}

#[tokio::test]
async fn test_failing_open_is_retried_on_next_update() {
    let journal = Journal::new();
    let a = ScriptedForm::new("a", &journal).on("init", Step::Fail("not ready".to_string()));
    let h = harness(a, RecordingSubscriber::new());

    let report = h.engine.dispatch(text(1, "hi")).await;
    assert!(report.failed);
    assert_eq!(h.subscriber.count("exception"), 1);

    let session = h.engine.session(&DeviceId::from(1)).unwrap();
    assert!(!session.lock().await.is_opened());
}

// ─────────────────────────────────────────────────────────
// Isolation and concurrency
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sessions_are_independent() {
    let journal = Journal::new();
    let menu = ScriptedForm::new("menu", &journal);
    let a = ScriptedForm::new("a", &journal)
        .on("action", Step::navigate_to(menu))
        .on("action", Step::Handle);
    let h = harness(a, RecordingSubscriber::new());

    h.engine
        .dispatch(Update::message(
            Message::text(1, 1, "hi").with_username("alice"),
        ))
        .await;
    h.engine
        .dispatch(Update::message(Message::text(2, 1, "hi").with_username("bob")))
        .await;
    h.engine
        .dispatch(Update::action(
            Message::callback(1, 2, "go").with_username("alice"),
        ))
        .await;

    let one = h.engine.session(&DeviceId::from(1)).unwrap();
    let two = h.engine.session(&DeviceId::from(2)).unwrap();
    let one = one.lock().await;
    let two = two.lock().await;

    assert_eq!(one.title, "alice");
    assert_eq!(two.title, "bob");
    assert!(crate::form::downcast_ref::<ScriptedForm>(one.form.as_ref())
        .is_some_and(|f| f.name() == "menu"));
    assert!(crate::form::downcast_ref::<ScriptedForm>(two.form.as_ref())
        .is_some_and(|f| f.name() == "a"));
    assert_eq!(two.last_message.as_ref().unwrap().raw_data(), "hi");
    assert!(one.last_action >= two.last_action);
}

/// Detects overlapping passes on the same form instance
struct Exclusive {
    busy: Arc<AtomicBool>,
    overlapped: Arc<AtomicBool>,
    loads: Arc<AtomicUsize>,
}

#[async_trait]
impl Form for Exclusive {
    async fn load(&mut self, _ctx: &mut FormContext) -> Result<()> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_passes_for_one_session_are_serialized() {
    let busy = Arc::new(AtomicBool::new(false));
    let overlapped = Arc::new(AtomicBool::new(false));
    let loads = Arc::new(AtomicUsize::new(0));
    let (b, o, l) = (busy.clone(), overlapped.clone(), loads.clone());

    let subscriber = Arc::new(RecordingSubscriber::new());
    let engine = Engine::builder(Arc::new(RecordingClient::new()))
        .with_subscriber(subscriber.clone())
        .start_form_with(move || {
            Box::new(Exclusive {
                busy: b.clone(),
                overlapped: o.clone(),
                loads: l.clone(),
            })
        })
        .build()
        .unwrap();

    let passes: Vec<_> = (0..20)
        .map(|i| engine.spawn_dispatch(text(9, &format!("msg {}", i))))
        .collect();
    for pass in passes {
        assert!(!pass.await.unwrap().failed);
    }

    assert!(!overlapped.load(Ordering::SeqCst));
    assert_eq!(loads.load(Ordering::SeqCst), 20);
    assert_eq!(engine.sessions().len(), 1);
    assert_eq!(subscriber.count("session_begins"), 1);
}

#[tokio::test]
async fn test_verbose_emits_message_observed() {
    let journal = Journal::new();
    let subscriber = Arc::new(RecordingSubscriber::new());
    let start = ScriptedForm::new("a", &journal);
    let engine = Engine::builder(Arc::new(RecordingClient::new()))
        .with_verbose(true)
        .with_subscriber(subscriber.clone())
        .start_form_with(move || Box::new(start.clone()))
        .build()
        .unwrap();

    engine.dispatch(text(1, "one")).await;
    engine.dispatch(action(1, "two")).await;

    assert_eq!(subscriber.count("message_observed"), 2);
}

#[tokio::test]
async fn test_quiet_mode_does_not_emit_message_observed() {
    let journal = Journal::new();
    let h = harness(ScriptedForm::new("a", &journal), RecordingSubscriber::new());

    h.engine.dispatch(text(1, "one")).await;

    assert_eq!(h.subscriber.count("message_observed"), 0);
}
