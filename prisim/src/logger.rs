//! Logger set-up shared by the command line tools.

use std::path::Path;

use log::LevelFilter;

/// Translates the number of `-v` flags to a level filter.
#[must_use]
pub fn level_filter(verbosity: u64) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Sets up the global logger.
///
/// Messages go to the standard error unless `no_stderr` is set, and additionally to
/// `log_output` if given, truncating any existing file.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global logger is already set.
pub fn set_up_logger(
    verbosity: u64,
    log_output: Option<&Path>,
    no_stderr: bool,
) -> Result<(), fern::InitError> {
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(level_filter(verbosity));
    let dispatch = if let Some(path) = log_output {
        dispatch.chain(
            std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
        )
    } else {
        dispatch
    };
    let dispatch = if no_stderr {
        dispatch
    } else {
        dispatch.chain(std::io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}
