//! Dispatch passes - the navigation state machine
//!
//! One pass handles one update for one session. The session lock is held for
//! the whole pass. Each iteration of the navigation loop resets the switch
//! flag and runs the lifecycle hooks on the active form; once a hook switches
//! the form, the remaining hooks of that iteration are skipped and the loop
//! re-enters on the new form, up to [`MAX_NAVIGATION`] iterations.

use std::sync::Arc;

use crate::engine::Engine;
use crate::engine_event::EngineEvent;
use crate::form::FormContext;
use crate::session::{Session, SessionHandle};
use formbot_core::prelude::*;
use formbot_core::{Update, UpdateKind};

#[cfg(test)]
mod tests;

/// Maximum navigation loop iterations for a single update
pub const MAX_NAVIGATION: usize = 10;

/// Completion signal of one dispatch pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub kind: UpdateKind,

    /// Navigation loop iterations run (0 when the loop was never entered)
    pub iterations: usize,

    /// Whether the render hooks ran
    pub rendered: bool,

    /// A subscriber consumed the update as a system call
    pub system_call_handled: bool,

    /// The pass was abandoned because of an error
    pub failed: bool,
}

impl DispatchReport {
    fn new(kind: UpdateKind) -> Self {
        Self {
            kind,
            iterations: 0,
            rendered: false,
            system_call_handled: false,
            failed: false,
        }
    }
}

/// Form lifecycle hooks run inside the navigation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    PreLoad,
    LoadControls,
    Load,
    SentData,
    ActionControls,
    Action,
    RenderControls,
    Render,
}

impl Engine {
    /// Run one dispatch pass for `update` and report how it went.
    ///
    /// Never fails: application errors are reported as
    /// [`EngineEvent::Exception`], transport errors are only logged.
    #[instrument(level = "debug", skip_all, fields(device = %update.device_id(), kind = ?update.kind))]
    pub async fn dispatch(&self, update: Update) -> DispatchReport {
        let mut report = DispatchReport::new(update.kind);
        let handle = self.resolve_session(&update);
        let mut session = handle.lock().await;

        if self.verbose {
            self.bus.emit(EngineEvent::MessageObserved {
                device_id: update.device_id().clone(),
                kind: update.kind,
                message: update.message.clone(),
            });
        }

        let mut ctx = FormContext::new(
            update.device_id().clone(),
            session.title.clone(),
            Some(update.clone()),
            Arc::clone(&self.client),
        );

        let result = self.run_pass(&mut session, &mut ctx, &mut report).await;
        if let Err(e) = result {
            report.failed = true;
            self.report_failure(&session, &update, e);
        }

        debug!(
            "Pass finished after {} iteration(s), rendered: {}",
            report.iterations, report.rendered
        );
        report
    }

    fn resolve_session(&self, update: &Update) -> SessionHandle {
        let device_id = update.device_id();
        let (handle, created) = self.sessions.get_or_create(device_id, || {
            let mut session = Session::new(device_id.clone(), (self.start_form)());
            session.last_message = Some(update.message.clone());
            session
        });

        if created {
            info!("Session begins for {}", device_id);
            self.bus.emit(EngineEvent::SessionBegins {
                device_id: device_id.clone(),
                title: update.message.display_title().unwrap_or_default().to_string(),
            });
        }
        handle
    }

    async fn run_pass(
        &self,
        session: &mut Session,
        ctx: &mut FormContext,
        report: &mut DispatchReport,
    ) -> Result<()> {
        if !session.opened {
            session.open(ctx).await?;
        }

        match report.kind {
            UpdateKind::Message => self.message_pass(session, ctx, report).await,
            UpdateKind::Edited => self.edited_pass(session, ctx, report).await,
            UpdateKind::Action => self.action_pass(session, ctx, report).await,
        }
    }

    fn refresh_metadata(&self, session: &mut Session, ctx: &mut FormContext) {
        if let Some(message) = ctx.message() {
            session.update_metadata(message);
        }
        ctx.set_title(session.title.clone());
    }

    /// New message: metadata, system call check, then the navigation loop
    async fn message_pass(
        &self,
        session: &mut Session,
        ctx: &mut FormContext,
        report: &mut DispatchReport,
    ) -> Result<()> {
        self.refresh_metadata(session, ctx);

        if self.intercept_system_call(session, ctx).await? {
            report.system_call_handled = true;
            return Ok(());
        }

        self.navigation_loop(session, ctx, report, UpdateKind::Message)
            .await
    }

    /// Edited message: a single `edited` hook, followed by a full message
    /// pass only when it switched the form
    async fn edited_pass(
        &self,
        session: &mut Session,
        ctx: &mut FormContext,
        report: &mut DispatchReport,
    ) -> Result<()> {
        self.refresh_metadata(session, ctx);
        session.form_switched = false;

        session.form.edited(ctx).await?;
        session.apply_navigation(ctx).await?;

        if session.form_switched {
            debug!("Edit switched form, running full pass on the new form");
            return self.message_pass(session, ctx, report).await;
        }
        Ok(())
    }

    /// Callback/action: the navigation loop with the action branch
    async fn action_pass(
        &self,
        session: &mut Session,
        ctx: &mut FormContext,
        report: &mut DispatchReport,
    ) -> Result<()> {
        self.refresh_metadata(session, ctx);
        self.navigation_loop(session, ctx, report, UpdateKind::Action)
            .await
    }

    /// Offer a recognized system command to subscribers.
    ///
    /// Returns `true` when a subscriber consumed it. Navigation requested by a
    /// subscriber is applied either way.
    async fn intercept_system_call(
        &self,
        session: &mut Session,
        ctx: &FormContext,
    ) -> Result<bool> {
        let Some(command) = ctx
            .update()
            .and_then(|u| u.command.as_ref())
            .filter(|c| self.system_calls.contains(&c.token))
            .cloned()
        else {
            return Ok(false);
        };

        let mut call = FormContext::new(
            ctx.device_id().clone(),
            ctx.title(),
            ctx.update().cloned(),
            Arc::clone(&self.client),
        );
        self.bus.system_call(&mut call).await?;
        let handled = call.is_handled();

        self.bus.emit(EngineEvent::SystemCall {
            device_id: ctx.device_id().clone(),
            command,
            handled,
        });

        session.form_switched = false;
        session.apply_navigation(&mut call).await?;
        Ok(handled)
    }

    async fn navigation_loop(
        &self,
        session: &mut Session,
        ctx: &mut FormContext,
        report: &mut DispatchReport,
        path: UpdateKind,
    ) -> Result<()> {
        let attachment = ctx.update().is_some_and(Update::is_attachment);

        for iteration in 1..=MAX_NAVIGATION {
            report.iterations = iteration;
            session.form_switched = false;

            self.run_hook(session, ctx, Hook::PreLoad).await?;
            self.run_hook(session, ctx, Hook::LoadControls).await?;
            self.run_hook(session, ctx, Hook::Load).await?;

            if path == UpdateKind::Action {
                // Action hooks only run on a form that is still active
                if !session.form_switched && self.run_action_hooks(session, ctx).await? {
                    self.bus.unhandled_call(ctx).await?;
                    session.apply_navigation(ctx).await?;

                    self.bus.emit(EngineEvent::UnhandledCall {
                        device_id: ctx.device_id().clone(),
                        data: ctx.raw_data().to_string(),
                        handled: ctx.is_handled(),
                    });

                    if ctx.is_handled() {
                        if session.form_switched {
                            continue;
                        }
                        return Ok(());
                    }
                }
            } else if attachment {
                self.run_hook(session, ctx, Hook::SentData).await?;
            }

            if session.form_switched {
                continue;
            }

            self.run_hook(session, ctx, Hook::RenderControls).await?;
            self.run_hook(session, ctx, Hook::Render).await?;
            report.rendered = true;

            if !session.form_switched {
                return Ok(());
            }
        }

        warn!(
            "Navigation for {} stopped after {} iterations",
            session.device_id, MAX_NAVIGATION
        );
        Ok(())
    }

    /// Run the action hooks and report whether the action is still unhandled.
    ///
    /// A form that navigates away without marking the action handled still
    /// leaves it unhandled.
    async fn run_action_hooks(&self, session: &mut Session, ctx: &mut FormContext) -> Result<bool> {
        self.run_hook(session, ctx, Hook::ActionControls).await?;
        self.run_hook(session, ctx, Hook::Action).await?;
        Ok(!ctx.is_handled())
    }

    /// Run one hook on the active form and apply any navigation it requested.
    ///
    /// Skipped once the form was switched in the current iteration.
    async fn run_hook(&self, session: &mut Session, ctx: &mut FormContext, hook: Hook) -> Result<()> {
        if session.form_switched {
            return Ok(());
        }

        trace!("{:?} on {}", hook, session.device_id);
        let form = session.form.as_mut();
        match hook {
            Hook::PreLoad => form.pre_load(ctx).await?,
            Hook::LoadControls => form.load_controls(ctx).await?,
            Hook::Load => form.load(ctx).await?,
            Hook::SentData => form.sent_data(ctx).await?,
            Hook::ActionControls => form.action_controls(ctx).await?,
            Hook::Action => form.action(ctx).await?,
            Hook::RenderControls => form.render_controls(ctx).await?,
            Hook::Render => form.render(ctx).await?,
        }

        session.apply_navigation(ctx).await
    }

    fn report_failure(&self, session: &Session, update: &Update, err: Error) {
        if err.is_transport() {
            warn!(
                "Transport error while handling update for {}: {}",
                session.device_id, err
            );
            return;
        }

        error!(
            "Dispatch for {} failed on {:?}: {}",
            session.device_id,
            update.message.raw_data(),
            err
        );
        self.bus.emit(EngineEvent::Exception {
            device_id: session.device_id.clone(),
            title: session.title.clone(),
            text: update.message.raw_data().to_string(),
            error: err.to_string(),
        });
    }
}
