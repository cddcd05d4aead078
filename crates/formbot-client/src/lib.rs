//! # formbot-client - Messaging Platform Client
//!
//! Defines the contract between the dispatch engine and a messaging platform,
//! plus a console implementation that speaks a small line protocol over
//! stdin/stdout.
//!
//! Depends on [`formbot_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Client Contract
//! - [`BotClient`] - Start/stop update delivery and send text messages
//!
//! ### Console Client
//! - [`ConsoleClient`] - Reads updates from stdin, writes replies to stdout
//! - [`parse_console_line()`] - Convert one console line into an [`Update`]

pub mod client;
pub mod console;
pub mod protocol;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use client::BotClient;
pub use console::ConsoleClient;
pub use protocol::parse_console_line;

/// Re-exported from `formbot_core` for convenience. Canonical import: `formbot_core::Update`.
pub use formbot_core::Update;
