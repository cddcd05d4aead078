//! # formbot-app - Session and Form Dispatch Engine
//!
//! Owns everything between the platform client and the forms: the session
//! registry, the form lifecycle contract, the dispatch passes with their
//! bounded navigation loop, state persistence and engine events.
//!
//! Depends on [`formbot_core`] for domain types and [`formbot_client`] for the
//! platform client contract.
//!
//! ## Public API
//!
//! ### Engine
//! - [`Engine`], [`EngineBuilder`] - Configure, start and stop the engine
//! - [`DispatchReport`] - Completion signal of one dispatch pass
//! - [`MAX_NAVIGATION`] - Navigation loop bound
//!
//! ### Forms & Sessions
//! - [`Form`], [`FormContext`] - Lifecycle hooks and their per-update context
//! - [`Session`], [`SessionHandle`], [`SessionManager`]
//!
//! ### Events
//! - [`EngineEvent`] - Lifecycle notifications
//! - [`EngineSubscriber`] - In-process observer with call hooks
//!
//! ### Persistence (`state`)
//! - [`FormType`], [`FormRegistry`], [`persisted_field!`]
//! - [`StateEntry`], [`StateContainer`], [`StateStore`]
//! - [`JsonStateStore`], [`MemoryStateStore`]
//!
//! ### Configuration (`config`)
//! - [`Settings`], [`config::load_settings`], [`config::save_settings`]

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod engine_event;
pub mod event_bus;
pub mod form;
pub mod session;
pub mod session_manager;
pub mod state;
pub mod subscriber;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use config::Settings;
pub use dispatch::{DispatchReport, MAX_NAVIGATION};
pub use engine::{Engine, EngineBuilder, FormFactory};
pub use engine_event::EngineEvent;
pub use form::{downcast_mut, downcast_ref, Form, FormContext};
pub use session::{Session, SessionHandle};
pub use session_manager::SessionManager;
pub use state::{
    FormRegistry, FormType, JsonStateStore, MemoryStateStore, PersistedField, StateContainer,
    StateEntry, StateStore, StateValues,
};
pub use subscriber::EngineSubscriber;
