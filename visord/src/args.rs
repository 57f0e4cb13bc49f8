use clap::{Arg, ArgAction, Command, arg};
use serde::Deserialize;
use std::{
    ffi::OsString,
    fs,
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};
use toml::from_str;
use visor_addresses::Address;
use visor_explorer::{ExplorerConfig, config::DEFAULT_LISTEN_PORT};
use visor_historydb::service::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Args {
    // NOTE: property names match config file fields
    pub appdir: Option<String>,
    pub logdir: Option<String>,
    #[serde(rename = "nologfiles")]
    pub no_log_files: bool,
    #[serde(rename = "loglevel")]
    pub log_level: String,
    pub reset_db: bool,
    #[serde(rename = "httplisten")]
    pub http_listen: SocketAddr,
    pub disable_csrf: bool,
    pub csrf_token_ttl_sec: u64,
    #[serde(rename = "distribution-address")]
    pub distribution_addresses: Vec<Address>,
    pub index_max_retries: u32,
    pub index_retry_backoff_ms: u64,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            appdir: None,
            logdir: None,
            no_log_files: false,
            log_level: "info".to_string(),
            reset_db: false,
            http_listen: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_LISTEN_PORT)),
            disable_csrf: false,
            csrf_token_ttl_sec: 30 * 60,
            distribution_addresses: vec![],
            index_max_retries: 5,
            index_retry_backoff_ms: 200,
        }
    }
}

impl Args {
    pub fn explorer_config(&self) -> ExplorerConfig {
        ExplorerConfig {
            listen: self.http_listen,
            distribution_addresses: self.distribution_addresses.clone(),
            enable_csrf: !self.disable_csrf,
            csrf_token_ttl: Duration::from_secs(self.csrf_token_ttl_sec),
            ..Default::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.index_max_retries, Duration::from_millis(self.index_retry_backoff_ms))
    }
}

pub fn cli() -> Command {
    let defaults: Args = Default::default();

    Command::new("visord")
        .about(format!("{} v{}", env!("CARGO_PKG_DESCRIPTION"), env!("CARGO_PKG_VERSION")))
        .version(env!("CARGO_PKG_VERSION"))
        .arg(arg!(-C --configfile <CONFIG_FILE> "Path of config file."))
        .arg(arg!(-b --appdir <DATA_DIR> "Directory to store data."))
        .arg(arg!(--logdir <LOG_DIR> "Directory to log output."))
        .arg(arg!(--nologfiles "Disable logging to files."))
        .arg(
            Arg::new("log_level")
                .short('d')
                .long("loglevel")
                .env("VISORD_LOG_LEVEL")
                .value_name("LEVEL")
                .default_value("info")
                .require_equals(true)
                .help("Logging level for all subsystems {off, error, warn, info, debug, trace}\n-- You may also specify <subsystem>=<level>,<subsystem2>=<level>,... to set the log level for individual subsystems.".to_string()),
        )
        .arg(arg!(--"reset-db" "Reset the history database before starting the node. Indexing restarts from genesis."))
        .arg(
            Arg::new("httplisten")
                .long("httplisten")
                .env("VISORD_HTTPLISTEN")
                .value_name("IP:PORT")
                .require_equals(true)
                .value_parser(clap::value_parser!(SocketAddr))
                .help(format!("Interface:port to serve the explorer API on (default: {}).", defaults.http_listen)),
        )
        .arg(
            Arg::new("disable-csrf")
                .long("disable-csrf")
                .env("VISORD_DISABLE_CSRF")
                .action(ArgAction::SetTrue)
                .help("Disable CSRF token checks of the explorer API."),
        )
        .arg(
            Arg::new("csrf-token-ttl-sec")
                .long("csrf-token-ttl-sec")
                .env("VISORD_CSRF_TOKEN_TTL_SEC")
                .value_name("SECONDS")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help(format!("Lifetime of an issued CSRF token (default: {}).", defaults.csrf_token_ttl_sec)),
        )
        .arg(
            Arg::new("distribution-address")
                .long("distribution-address")
                .value_name("ADDRESS")
                .action(ArgAction::Append)
                .require_equals(true)
                .value_parser(clap::value_parser!(Address))
                .help("Address holding coins not yet in circulation, hidden from the richlist unless requested. May be repeated."),
        )
        .arg(
            Arg::new("index-max-retries")
                .long("index-max-retries")
                .env("VISORD_INDEX_MAX_RETRIES")
                .value_name("N")
                .require_equals(true)
                .value_parser(clap::value_parser!(u32))
                .help(format!("Retries of a block hitting a storage fault before indexing halts (default: {}).", defaults.index_max_retries)),
        )
        .arg(
            Arg::new("index-retry-backoff-ms")
                .long("index-retry-backoff-ms")
                .env("VISORD_INDEX_RETRY_BACKOFF_MS")
                .value_name("MILLISECONDS")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help(format!("Initial delay between indexing retries, doubled on each retry (default: {}).", defaults.index_retry_backoff_ms)),
        )
}

pub fn parse_args() -> Args {
    match Args::parse(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => {
            println!("{err}");
            std::process::exit(1);
        }
    }
}

impl Args {
    pub fn parse<I, T>(itr: I) -> Result<Args, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let m: clap::ArgMatches = cli().try_get_matches_from(itr)?;
        let mut defaults: Args = Default::default();

        if let Some(config_file) = m.get_one::<String>("configfile") {
            let config_str = fs::read_to_string(config_file)?;
            defaults = from_str(&config_str).map_err(|toml_error| {
                clap::Error::raw(
                    clap::error::ErrorKind::ValueValidation,
                    format!("failed parsing config file, reason: {}", toml_error.message()),
                )
            })?;
        }

        Ok(Args {
            appdir: m.get_one::<String>("appdir").cloned().or(defaults.appdir),
            logdir: m.get_one::<String>("logdir").cloned().or(defaults.logdir),
            no_log_files: arg_match_unwrap_or::<bool>(&m, "nologfiles", defaults.no_log_files),
            log_level: arg_match_unwrap_or::<String>(&m, "log_level", defaults.log_level),
            reset_db: arg_match_unwrap_or::<bool>(&m, "reset-db", defaults.reset_db),
            http_listen: arg_match_unwrap_or::<SocketAddr>(&m, "httplisten", defaults.http_listen),
            disable_csrf: arg_match_unwrap_or::<bool>(&m, "disable-csrf", defaults.disable_csrf),
            csrf_token_ttl_sec: arg_match_unwrap_or::<u64>(&m, "csrf-token-ttl-sec", defaults.csrf_token_ttl_sec),
            distribution_addresses: arg_match_many_unwrap_or::<Address>(&m, "distribution-address", defaults.distribution_addresses),
            index_max_retries: arg_match_unwrap_or::<u32>(&m, "index-max-retries", defaults.index_max_retries),
            index_retry_backoff_ms: arg_match_unwrap_or::<u64>(&m, "index-retry-backoff-ms", defaults.index_retry_backoff_ms),
        })
    }
}

use clap::parser::ValueSource::DefaultValue;
fn arg_match_unwrap_or<T: Clone + Send + Sync + 'static>(m: &clap::ArgMatches, arg_id: &str, default: T) -> T {
    m.get_one::<T>(arg_id).cloned().filter(|_| m.value_source(arg_id) != Some(DefaultValue)).unwrap_or(default)
}

fn arg_match_many_unwrap_or<T: Clone + Send + Sync + 'static>(m: &clap::ArgMatches, arg_id: &str, default: Vec<T>) -> Vec<T> {
    match m.get_many::<T>(arg_id) {
        Some(val_ref) => val_ref.cloned().collect(),
        None => default,
    }
}
