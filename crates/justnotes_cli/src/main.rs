//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire config, logging, store and view-model the way a front-end does.
//! - Print the loaded note list as JSON for quick local sanity checks.

use justnotes_core::{
    core_version, init_logging, open_note_store, CoreConfig, NoteUseCases, NotesViewModel,
    StorageMode,
};
use log::warn;
use std::process::ExitCode;
use std::time::Duration;
use tokio::runtime::Handle;

const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("justnotes: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let config = CoreConfig::from_env()?;
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        // Still usable without file logs.
        eprintln!("justnotes: logging disabled: {err}");
    }

    println!("justnotes_core version={}", core_version());
    match &config.storage {
        StorageMode::InMemory => println!("storage=memory"),
        StorageMode::Sqlite(path) => println!("storage=sqlite path={}", path.display()),
    }

    let store = open_note_store(&config).map_err(|err| err.to_string())?;
    let view_model = NotesViewModel::new(NoteUseCases::new(store), Handle::current());

    let mut state_rx = view_model.subscribe_state();
    let state = tokio::time::timeout(LOAD_TIMEOUT, state_rx.wait_for(|state| !state.is_loading))
        .await
        .map_err(|_| "timed out waiting for notes".to_string())?
        .map_err(|err| err.to_string())?
        .clone();

    if let Some(message) = &state.error_message {
        warn!("event=cli_load module=cli status=error error={message}");
        return Err(message.clone());
    }

    let json = serde_json::to_string_pretty(state.notes.as_slice()).map_err(|err| err.to_string())?;
    println!("{json}");
    view_model.close();
    Ok(())
}
