use std::{fs, path::PathBuf, sync::Arc};

use async_channel::{Sender, unbounded};
use thiserror::Error;
use visor_consensus_core::notify::ChainEvent;
use visor_core::{info, log::LogError, trace, warn};
use visor_database::prelude::{ConnBuilder, StoreError, delete_db};
use visor_explorer::{Gateway, GatewayError};
use visor_historydb::{HistoryError, HistoryIndex, HistoryIndexRetrievalApi, service::HistoryIndexService};

use crate::args::Args;

const DEFAULT_DATA_DIR: &str = "datadir";
const HISTORY_DB: &str = "historydb";
const HISTORY_DB_FILE_LIMIT: i32 = 128;
const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Configuration: --logdir and --nologfiles cannot be used together")]
    MixedLogDirAndNoLogFiles,

    #[error("Configuration: --csrf-token-ttl-sec must be positive")]
    ZeroCsrfTokenTtl,

    #[error("logger initialization failed: {0}")]
    LogError(#[from] LogError),

    #[error("history database failed: {0}")]
    StoreError(#[from] StoreError),

    #[error("{0}")]
    HistoryError(#[from] HistoryError),

    #[error("{0}")]
    ExplorerError(#[from] GatewayError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("task failed: {0}")]
    TaskError(String),
}

pub type DaemonResult<T> = std::result::Result<T, DaemonError>;

fn get_home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    let home = dirs::data_local_dir();
    #[cfg(not(target_os = "windows"))]
    let home = dirs::home_dir();
    home.unwrap_or_else(std::env::temp_dir)
}

/// Get the default application directory.
pub fn get_app_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    return get_home_dir().join("visor");
    #[cfg(not(target_os = "windows"))]
    return get_home_dir().join(".visor");
}

/// Get the application directory from the supplied [`Args`].
/// The folder holds the history database and, unless told otherwise, the logs.
pub fn get_app_dir_from_args(args: &Args) -> PathBuf {
    let home = get_home_dir();
    match args.appdir.as_deref().map(|dir| dir.replace('~', &home.to_string_lossy())) {
        Some(app_dir) if !app_dir.is_empty() => PathBuf::from(app_dir),
        _ => get_app_dir(),
    }
}

/// Get the log directory from the supplied [`Args`].
pub fn get_log_dir(args: &Args) -> Option<PathBuf> {
    if args.no_log_files {
        return None;
    }
    // Logs directory is usually under the application directory, unless otherwise specified
    let log_dir = args.logdir.clone().unwrap_or_default().replace('~', &get_home_dir().to_string_lossy());
    if log_dir.is_empty() { Some(get_app_dir_from_args(args).join(DEFAULT_LOG_DIR)) } else { Some(PathBuf::from(log_dir)) }
}

pub fn get_db_dir(args: &Args) -> PathBuf {
    get_app_dir_from_args(args).join(DEFAULT_DATA_DIR).join(HISTORY_DB)
}

pub fn validate_args(args: &Args) -> DaemonResult<()> {
    if args.logdir.is_some() && args.no_log_files {
        return Err(DaemonError::MixedLogDirAndNoLogFiles);
    }
    if args.csrf_token_ttl_sec == 0 && !args.disable_csrf {
        return Err(DaemonError::ZeroCsrfTokenTtl);
    }
    Ok(())
}

/// The history node: an indexer fed by chain events plus the explorer API reading from it
pub struct Daemon {
    args: Args,
    service: Arc<HistoryIndexService>,
    events: Sender<ChainEvent>,
}

impl Daemon {
    /// Opens (or resets) the history database and wires the indexer.
    ///
    /// The logger is expected to be installed already, see [`init_logger`].
    pub fn create(args: Args) -> DaemonResult<Self> {
        validate_args(&args)?;

        let db_dir = get_db_dir(&args);
        if args.reset_db && db_dir.exists() {
            info!("Deleting history database {}", db_dir.display());
            delete_db(&db_dir)?;
        }
        fs::create_dir_all(&db_dir)?;
        info!("History database: {}", db_dir.display());

        let db = ConnBuilder::default().with_db_path(db_dir).with_files_limit(HISTORY_DB_FILE_LIMIT).build()?;
        let index = HistoryIndex::new(db);
        match index.parsed_height()? {
            -1 => info!("History index is empty, indexing starts from genesis"),
            height => info!("History index resumes after block {}", height),
        }

        let (events, receiver) = unbounded();
        let service = Arc::new(HistoryIndexService::new(index, None, receiver, args.retry_policy()));
        Ok(Self { args, service, events })
    }

    /// The channel chain events are delivered on, in commit order
    pub fn events(&self) -> Sender<ChainEvent> {
        self.events.clone()
    }

    pub fn service(&self) -> Arc<HistoryIndexService> {
        self.service.clone()
    }

    /// Runs the indexer and the explorer until ctrl-c or until the explorer stops
    pub async fn run(self) -> DaemonResult<()> {
        let (shutdown_trigger, shutdown_listener) = triggered::trigger();

        let indexer = tokio::spawn(self.service.clone().start());

        let retrieval: Arc<dyn HistoryIndexRetrievalApi> = Arc::new(self.service.index().clone());
        let config = self.args.explorer_config();
        let gateway = Arc::new(Gateway::new(retrieval, config.distribution_addresses.clone()));
        let mut explorer = tokio::spawn(visor_explorer::serve(config, gateway, shutdown_listener));

        let explorer_result = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received ctrl-c, shutting down");
                None
            }
            result = &mut explorer => Some(result),
        };

        shutdown_trigger.trigger();
        self.service.signal_exit();
        // The sender held by the daemon is dropped so a waiting indexer sees a closed channel
        drop(self.events);

        let explorer_result = match explorer_result {
            Some(result) => result,
            None => explorer.await,
        };
        let indexer_result = indexer.await;

        trace!("Daemon tasks joined");
        if self.service.is_halted() {
            warn!("History indexing was halted, the explorer served data up to the last indexed block");
        }
        explorer_result.map_err(|err| DaemonError::TaskError(err.to_string()))??;
        indexer_result.map_err(|err| DaemonError::TaskError(err.to_string()))??;
        Ok(())
    }
}

/// Installs the global logger as configured by `args`
pub fn init_logger(args: &Args) -> DaemonResult<()> {
    let log_dir = get_log_dir(args);
    visor_core::log::init_logger(log_dir.as_deref(), &args.log_level)?;
    Ok(())
}
