//! formbot - console chat bot built on the form dispatch engine
//!
//! Wires the stdin/stdout client, a handful of demo forms and a console
//! subscriber into a [`formbot_app::Engine`].

pub mod forms;
pub mod runner;
pub mod subscriber;

pub use runner::{build_engine, run_with_project, RunOptions};
