//! Test helpers: a scripted form and a recording subscriber
//!
//! Available in unit tests and, with the `test-helpers` feature, to
//! downstream integration tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::engine::FormFactory;
use crate::engine_event::EngineEvent;
use crate::form::{Form, FormContext};
use crate::subscriber::EngineSubscriber;
use formbot_core::prelude::*;

/// Shared, ordered log of `form:hook` entries
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(entry.into());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// How often `entry` was recorded
    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.count(entry) > 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.0.lock() {
            entries.clear();
        }
    }
}

/// Something a [`ScriptedForm`] does when one of its hooks runs
#[derive(Clone)]
pub enum Step {
    /// Mark the update handled
    Handle,
    /// Request navigation to the form built by the factory
    Navigate(FormFactory),
    /// Send a text reply through the client
    Reply(String),
    /// Fail with an application error
    Fail(String),
    /// Fail with a transport error
    FailTransport(String),
}

impl Step {
    pub fn navigate<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn Form> + Send + Sync + 'static,
    {
        Self::Navigate(Arc::new(factory))
    }

    pub fn navigate_to(form: ScriptedForm) -> Self {
        Self::navigate(move || Box::new(form.clone()))
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handle => write!(f, "Handle"),
            Self::Navigate(_) => write!(f, "Navigate"),
            Self::Reply(text) => write!(f, "Reply({:?})", text),
            Self::Fail(message) => write!(f, "Fail({:?})", message),
            Self::FailTransport(message) => write!(f, "FailTransport({:?})", message),
        }
    }
}

/// A form that records every hook into a [`Journal`] and performs scripted
/// steps per hook.
///
/// Hook names: `init`, `opened`, `closed`, `pre_load`, `load_controls`,
/// `load`, `sent_data`, `action_controls`, `action`, `render_controls`,
/// `render`, `edited`.
#[derive(Debug, Clone)]
pub struct ScriptedForm {
    name: String,
    journal: Journal,
    script: HashMap<&'static str, Vec<Step>>,
}

impl ScriptedForm {
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            script: HashMap::new(),
        }
    }

    /// Perform `step` whenever `hook` runs
    pub fn on(mut self, hook: &'static str, step: Step) -> Self {
        self.script.entry(hook).or_default().push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, hook: &str, ctx: &mut FormContext) -> Result<()> {
        self.journal.push(format!("{}:{}", self.name, hook));

        let Some(steps) = self.script.get(hook) else {
            return Ok(());
        };
        for step in steps {
            match step {
                Step::Handle => ctx.mark_handled(),
                Step::Navigate(factory) => ctx.navigate_to_boxed(factory()),
                Step::Reply(text) => ctx.send_text(text).await?,
                Step::Fail(message) => return Err(Error::form(message.clone())),
                Step::FailTransport(message) => return Err(Error::transport(message.clone())),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Form for ScriptedForm {
    async fn on_init(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("init", ctx).await
    }

    async fn on_opened(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("opened", ctx).await
    }

    async fn on_closed(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("closed", ctx).await
    }

    async fn pre_load(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("pre_load", ctx).await
    }

    async fn load_controls(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("load_controls", ctx).await
    }

    async fn load(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("load", ctx).await
    }

    async fn sent_data(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("sent_data", ctx).await
    }

    async fn action_controls(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("action_controls", ctx).await
    }

    async fn action(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("action", ctx).await
    }

    async fn render_controls(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("render_controls", ctx).await
    }

    async fn render(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("render", ctx).await
    }

    async fn edited(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.run("edited", ctx).await
    }
}

/// Subscriber that records events and answers calls as configured
#[derive(Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<EngineEvent>>,
    system_calls: AtomicUsize,
    unhandled_calls: AtomicUsize,
    handle_system_calls: bool,
    handle_unhandled_calls: bool,
    system_call_navigation: Option<FormFactory>,
    unhandled_call_navigation: Option<FormFactory>,
}

impl RecordingSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every system call handled
    pub fn handling_system_calls(mut self) -> Self {
        self.handle_system_calls = true;
        self
    }

    /// Mark every unhandled call handled
    pub fn handling_unhandled_calls(mut self) -> Self {
        self.handle_unhandled_calls = true;
        self
    }

    pub fn navigating_on_system_call(mut self, form: ScriptedForm) -> Self {
        self.system_call_navigation = Some(Arc::new(move || {
            Box::new(form.clone()) as Box<dyn Form>
        }));
        self
    }

    pub fn navigating_on_unhandled_call(mut self, form: ScriptedForm) -> Self {
        self.unhandled_call_navigation = Some(Arc::new(move || {
            Box::new(form.clone()) as Box<dyn Form>
        }));
        self
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of recorded events with the given [`EngineEvent::event_type`] label
    pub fn count(&self, event_type: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    pub fn system_call_count(&self) -> usize {
        self.system_calls.load(Ordering::SeqCst)
    }

    pub fn unhandled_call_count(&self) -> usize {
        self.unhandled_calls.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for RecordingSubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSubscriber")
            .field("system_calls", &self.system_calls)
            .field("unhandled_calls", &self.unhandled_calls)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EngineSubscriber for RecordingSubscriber {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_event(&self, event: &EngineEvent) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
        Ok(())
    }

    async fn on_system_call(&self, ctx: &mut FormContext) -> Result<()> {
        self.system_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(factory) = &self.system_call_navigation {
            ctx.navigate_to_boxed(factory());
        }
        if self.handle_system_calls {
            ctx.mark_handled();
        }
        Ok(())
    }

    async fn on_unhandled_call(&self, ctx: &mut FormContext) -> Result<()> {
        self.unhandled_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(factory) = &self.unhandled_call_navigation {
            ctx.navigate_to_boxed(factory());
        }
        if self.handle_unhandled_calls {
            ctx.mark_handled();
        }
        Ok(())
    }
}
