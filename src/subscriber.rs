//! Console subscriber: answers system calls and stray actions, logs events

use async_trait::async_trait;

use crate::forms::WelcomeForm;
use formbot_app::{EngineEvent, EngineSubscriber, FormContext};
use formbot_core::prelude::*;

const HELP_TEXT: &str = "Commands: /start restarts the conversation, /help shows this text. \
Send `count` or `notes` from the welcome screen.";

/// Subscriber wired into the console bot
#[derive(Debug, Default)]
pub struct ConsoleSubscriber;

impl ConsoleSubscriber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EngineSubscriber for ConsoleSubscriber {
    fn name(&self) -> &str {
        "console"
    }

    fn on_event(&self, event: &EngineEvent) -> Result<()> {
        match event {
            EngineEvent::SessionBegins { device_id, title } => {
                info!("New conversation with {} ({})", device_id, title);
            }
            EngineEvent::Exception {
                device_id,
                title,
                text,
                error,
            } => {
                error!(
                    "Exception in conversation {} ({}) on {:?}: {}",
                    device_id, title, text, error
                );
            }
            EngineEvent::UnhandledCall {
                device_id, data, ..
            } => {
                debug!("Unhandled action {:?} from {}", data, device_id);
            }
            _ => {}
        }
        Ok(())
    }

    async fn on_system_call(&self, ctx: &mut FormContext) -> Result<()> {
        let Some(command) = ctx.update().and_then(|u| u.command.clone()) else {
            return Ok(());
        };
        match command.token.as_str() {
            "/start" => ctx.navigate_to(WelcomeForm),
            "/help" => {
                ctx.send_text(HELP_TEXT).await?;
                ctx.mark_handled();
            }
            _ => {}
        }
        Ok(())
    }

    async fn on_unhandled_call(&self, ctx: &mut FormContext) -> Result<()> {
        let reply = format!("Nothing to do for `{}` here.", ctx.raw_data());
        ctx.send_text(&reply).await?;
        ctx.mark_handled();
        Ok(())
    }
}
