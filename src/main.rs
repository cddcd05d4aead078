//! formbot - console chat bot
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use formbot::RunOptions;
use formbot_app::config::{config_dir, init_config_dir};
use formbot_core::prelude::*;

/// formbot - a form-driven chat bot on your terminal
#[derive(Parser, Debug)]
#[command(name = "formbot")]
#[command(about = "A form-driven chat bot on your terminal", long_about = None)]
struct Args {
    /// Project directory holding `.formbot/config.toml`
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Write a default `.formbot/config.toml` before starting
    #[arg(long)]
    init: bool,

    /// Emit an event for every received update
    #[arg(short, long)]
    verbose: bool,

    /// Device id of the console conversation
    #[arg(long, value_name = "ID")]
    device: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let project_path = args
        .path
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if args.init {
        init_config_dir(&project_path)?;
        eprintln!(
            "Wrote default settings to {}",
            config_dir(&project_path).display()
        );
    }

    let options = RunOptions {
        verbose: args.verbose,
        device: args.device,
    };
    formbot::run_with_project(&project_path, options).await
}
