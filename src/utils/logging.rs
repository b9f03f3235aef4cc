// Logging setup.
//
// Wraps flexi_logger initialization and shutdown so async log output is
// flushed before the process exits.

use crate::config::Settings;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use std::sync::Mutex;

/// Global logger handle, kept for the final flush.
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

/// Initialize the logging system from the `log` section of the settings.
pub fn init(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let handle = Logger::try_with_str(&settings.log.level)?
        .log_to_file(
            FileSpec::default()
                .basename(&settings.log.file)
                .directory(&settings.log.dir),
        )
        .rotate(
            Criterion::Size(settings.log.max_file_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(settings.log.max_files),
        )
        .write_mode(WriteMode::Async)
        .append()
        .start()?;

    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        *guard = Some(handle);
    }

    log::info!(
        "logging initialized: {}/{}",
        settings.log.dir,
        settings.log.file
    );
    Ok(())
}

/// Flush and shut down the logging system. Blocks until the async writer has
/// drained.
pub fn shutdown() {
    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        if let Some(handle) = guard.take() {
            handle.flush();
        }
    }
}

/// Whether [`init`] has run and [`shutdown`] has not.
pub fn is_initialized() -> bool {
    LOGGER_HANDLE
        .lock()
        .map(|guard| guard.is_some())
        .unwrap_or(false)
}
