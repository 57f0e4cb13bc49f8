//! Logger and logging macros
//!
//! Components log through the `log` facade re-exported at the crate root
//! (`visor_core::info!` and friends). The binary installs a `log4rs` backend
//! with [`init_logger`].

use std::path::Path;

use log4rs::config::{Config, Root};

pub mod appender;
pub mod consts;
pub mod logger;

use appender::AppenderSpec;
use consts::{DEFAULT_LOGGER_ENV, ERR_LOG_FILE_NAME, LOG_FILE_NAME};
pub use logger::LogError;
use logger::Filters;

const CONSOLE_APPENDER: &str = "stdout";
const LOG_FILE_APPENDER: &str = "log_file";
const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

/// Installs the global logger.
///
/// `filters` is a comma-separated expression such as `info` or
/// `info,visor_historydb=trace`; entries from the `RUST_LOG` environment
/// variable take precedence. When `log_dir` is provided, two rolling files
/// are written there, one with every record and one with errors only.
pub fn init_logger(log_dir: Option<&Path>, filters: &str) -> Result<(), LogError> {
    let config = build_config(log_dir, filters)?;
    log4rs::init_config(config).map(|_| ()).map_err(|err| LogError::ConfigError(err.to_string()))
}

/// Tries to init the global logger, but does not panic if it was already setup.
/// Should be used for tests.
pub fn try_init_logger(filters: &str) {
    let _ = init_logger(None, filters);
}

fn build_config(log_dir: Option<&Path>, filters: &str) -> Result<Config, LogError> {
    let mut parsed: Filters = filters.parse()?;
    parsed.parse_env(DEFAULT_LOGGER_ENV);

    let mut appenders = vec![AppenderSpec::console(CONSOLE_APPENDER, None)];
    if let Some(log_dir) = log_dir {
        appenders.push(AppenderSpec::roller(LOG_FILE_APPENDER, None, log_dir, LOG_FILE_NAME)?);
        appenders.push(AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(log::LevelFilter::Warn), log_dir, ERR_LOG_FILE_NAME)?);
    }
    let names = appenders.iter().map(|x| x.name).collect::<Vec<_>>();

    Config::builder()
        .appenders(appenders.into_iter().map(|x| x.appender()))
        .loggers(parsed.loggers().map(|x| x.logger(&names)))
        .build(Root::builder().appenders(names.iter().copied()).build(parsed.root_level()))
        .map_err(|err| LogError::ConfigError(err.to_string()))
}
