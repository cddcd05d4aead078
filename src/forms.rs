//! Demo forms for the console bot
//!
//! - [`WelcomeForm`] - start form, routes to the others
//! - [`CounterForm`] - counts messages, persisted across restarts
//! - [`NoteForm`] - collects notes and attachments, never persisted

use async_trait::async_trait;

use formbot_app::state::{FormType, PersistedField};
use formbot_app::{persisted_field, Form, FormContext};
use formbot_core::prelude::*;
use formbot_core::MessageKind;

/// Start form of every new session
#[derive(Debug, Default)]
pub struct WelcomeForm;

#[async_trait]
impl Form for WelcomeForm {
    async fn load(&mut self, ctx: &mut FormContext) -> Result<()> {
        match ctx.raw_data().trim() {
            "count" => ctx.navigate_to(CounterForm::default()),
            "notes" => ctx.navigate_to(NoteForm::default()),
            _ => {}
        }
        Ok(())
    }

    async fn render(&mut self, ctx: &mut FormContext) -> Result<()> {
        let name = match ctx.title() {
            "" => "there",
            title => title,
        };
        ctx.send_text(&format!(
            "Welcome, {}! Send `count` to start counting or `notes` to take notes.",
            name
        ))
        .await
    }
}

impl FormType for WelcomeForm {
    const TYPE_NAME: &'static str = "Welcome";
}

/// Counts the messages it receives until told to go `back`
#[derive(Debug, Default)]
pub struct CounterForm {
    count: u64,
}

impl CounterForm {
    pub fn count(&self) -> u64 {
        self.count
    }
}

#[async_trait]
impl Form for CounterForm {
    async fn load(&mut self, ctx: &mut FormContext) -> Result<()> {
        let is_text = ctx.message().is_some_and(|m| m.kind == MessageKind::Text);
        match ctx.raw_data().trim() {
            "back" => ctx.navigate_to(WelcomeForm),
            "count" => {}
            _ if is_text => self.count += 1,
            _ => {}
        }
        Ok(())
    }

    async fn action(&mut self, ctx: &mut FormContext) -> Result<()> {
        if ctx.raw_data() == "reset" {
            self.count = 0;
            ctx.mark_handled();
        }
        Ok(())
    }

    async fn render(&mut self, ctx: &mut FormContext) -> Result<()> {
        ctx.send_text(&format!("Count: {} (send `back` to leave)", self.count))
            .await
    }
}

impl FormType for CounterForm {
    const TYPE_NAME: &'static str = "Counter";

    fn persisted_fields() -> Vec<PersistedField<Self>> {
        vec![persisted_field!(CounterForm, count)]
    }
}

/// Collects text notes and attachments
#[derive(Debug, Default)]
pub struct NoteForm {
    notes: Vec<String>,
}

impl NoteForm {
    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

#[async_trait]
impl Form for NoteForm {
    async fn load(&mut self, ctx: &mut FormContext) -> Result<()> {
        let Some(message) = ctx.message() else {
            return Ok(());
        };
        if message.kind != MessageKind::Text {
            return Ok(());
        }
        match message.raw_data().trim() {
            "done" => ctx.navigate_to(WelcomeForm),
            "" | "notes" => {}
            text => self.notes.push(text.to_string()),
        }
        Ok(())
    }

    async fn sent_data(&mut self, ctx: &mut FormContext) -> Result<()> {
        let Some(message) = ctx.message() else {
            return Ok(());
        };
        let payload = message
            .attachment
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        self.notes.push(format!("[{}] {}", message.kind, payload));
        Ok(())
    }

    async fn render(&mut self, ctx: &mut FormContext) -> Result<()> {
        ctx.send_text(&format!(
            "{} note(s) saved (send `done` to leave)",
            self.notes.len()
        ))
        .await
    }

    async fn edited(&mut self, ctx: &mut FormContext) -> Result<()> {
        let Some(message) = ctx.message() else {
            return Ok(());
        };
        let text = message.raw_data().trim().to_string();
        if let Some(last) = self.notes.last_mut() {
            *last = text;
        }
        ctx.send_text("Last note updated").await
    }
}

impl FormType for NoteForm {
    const TYPE_NAME: &'static str = "Note";
    const IGNORE_STATE: bool = true;
}
