//! Console bot runner: settings, engine wiring and the shutdown wait

use std::path::Path;
use std::sync::Arc;

use formbot_app::config::{load_settings, state_file_path};
use formbot_app::{Engine, JsonStateStore, Settings};
use formbot_client::ConsoleClient;
use formbot_core::prelude::*;

use crate::forms::{CounterForm, NoteForm, WelcomeForm};
use crate::subscriber::ConsoleSubscriber;

/// Command-line overrides applied on top of the project settings
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Emit an event for every observed update
    pub verbose: bool,

    /// Device id of the console conversation
    pub device: Option<i64>,
}

/// Main entry point with a specific project path
pub async fn run_with_project(project_path: &Path, options: RunOptions) -> Result<()> {
    color_eyre::install().map_err(|e| Error::config(e.to_string()))?;

    // Read before the subscriber exists: the log level comes from settings
    let settings = load_settings(project_path);
    let log_dir = formbot_core::logging::init(&settings.logging.log_options())?;

    info!("formbot {} starting", env!("CARGO_PKG_VERSION"));
    info!("Project: {}, logs: {}", project_path.display(), log_dir.display());

    let engine = build_engine(project_path, &settings, &options)?;
    info!("{}", describe_engine(&engine));

    let result = serve(&engine).await;
    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }

    info!("formbot exiting");
    result
}

/// Wire the console client, demo forms and subscriber into an engine
pub fn build_engine(
    project_path: &Path,
    settings: &Settings,
    options: &RunOptions,
) -> Result<Arc<Engine>> {
    let device = options.device.unwrap_or(settings.client.device_id);
    let client = ConsoleClient::new(device).with_request_timeout(settings.client.request_timeout());

    let mut builder = Engine::builder(Arc::new(client))
        .with_settings(settings)
        .with_system_call("/help")
        .with_verbose(settings.dispatch.verbose || options.verbose)
        .start_form::<WelcomeForm>()
        .register_form::<CounterForm>()
        .register_form::<NoteForm>()
        .with_subscriber(Arc::new(ConsoleSubscriber::new()));

    if let Some(path) = state_file_path(project_path, settings) {
        info!("State file: {}", path.display());
        builder = builder.with_state_store(Arc::new(JsonStateStore::new(path)));
    }

    builder.build()
}

/// One-line summary of how the engine is wired
pub fn describe_engine(engine: &Engine) -> String {
    format!(
        "Engine: client {}, {} form type(s), system calls [{}], verbose {}, state store {}",
        engine.client().name(),
        engine.forms().len(),
        engine.system_calls().join(", "),
        engine.is_verbose(),
        if engine.has_state_store() { "on" } else { "off" },
    )
}

async fn serve(engine: &Arc<Engine>) -> Result<()> {
    engine.start().await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Interrupted, shutting down");
        }
        _ = engine.closed() => {
            info!("Input closed, shutting down");
        }
    }

    engine.stop().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use formbot_app::config::StateSettings;
    use tempfile::tempdir;

    #[test]
    fn test_build_engine_without_state() {
        let dir = tempdir().unwrap();
        let engine = build_engine(dir.path(), &Settings::default(), &RunOptions::default())
            .unwrap();

        assert!(!engine.has_state_store());
        assert!(engine.is_system_call("/start"));
        assert!(engine.is_system_call("/help"));
        assert!(engine.forms().contains("Counter"));
        assert!(engine.forms().contains("Note"));
        assert_eq!(
            describe_engine(&engine),
            "Engine: client console, 3 form type(s), system calls [/help, /start], \
             verbose false, state store off"
        );
    }

    #[test]
    fn test_build_engine_with_state_file() {
        let dir = tempdir().unwrap();
        let settings = Settings {
            state: StateSettings {
                enabled: true,
                ..StateSettings::default()
            },
            ..Settings::default()
        };

        let engine = build_engine(dir.path(), &settings, &RunOptions::default()).unwrap();
        assert!(engine.has_state_store());
    }
}
