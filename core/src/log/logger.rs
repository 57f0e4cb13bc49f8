use log::LevelFilter;
use log4rs::config::Logger;
use std::{collections::BTreeMap, env, str::FromStr};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum LogError {
    #[error("logger spec parsing error: {0}")]
    ParseLoggerSpecError(String),

    #[error("log directory {0} is not valid UTF-8")]
    InvalidLogDir(String),

    #[error("log appender error: {0}")]
    AppenderError(String),

    #[error("logger configuration error: {0}")]
    ConfigError(String),
}

/// A named logger with its level, attached to the given appenders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct LoggerSpec {
    pub name: String,
    pub level: LevelFilter,
}

impl LoggerSpec {
    pub fn logger(&self, appenders: &[&'static str]) -> Logger {
        Logger::builder().appenders(appenders.iter().map(|x| x.to_string())).additive(false).build(self.name.clone(), self.level)
    }
}

/// Parsed filter expression of the form `level` or `module=level,...`
#[derive(Debug, Default)]
pub(super) struct Filters {
    loggers: BTreeMap<String, LevelFilter>,
    root_level: Option<LevelFilter>,
}

impl Filters {
    pub fn root_level(&self) -> LevelFilter {
        self.root_level.unwrap_or(LevelFilter::Info)
    }

    pub fn loggers(&self) -> impl Iterator<Item = LoggerSpec> + '_ {
        self.loggers.iter().map(|(name, level)| LoggerSpec { name: name.clone(), level: *level })
    }

    /// Merges the expression held by the `env` variable, if any. Entries
    /// already present are overridden.
    pub fn parse_env(&mut self, env: &str) -> &mut Self {
        self.parse_expression(&env::var(env).unwrap_or_default())
    }

    pub fn parse_expression(&mut self, expression: &str) -> &mut Self {
        for spec in expression.split(',').map(|x| x.trim()) {
            if spec.is_empty() {
                continue;
            }
            match Self::parse_spec(spec) {
                Ok((None, level)) => {
                    self.root_level.replace(level);
                }
                Ok((Some(name), level)) => {
                    self.loggers.insert(name, level);
                }
                Err(err) => println!("Ignoring invalid logging spec '{}'", err),
            }
        }
        self
    }

    fn parse_spec(spec: &str) -> Result<(Option<String>, LevelFilter), LogError> {
        let mut parts = spec.split('=');
        match (parts.next(), parts.next().map(|x| x.trim()), parts.next()) {
            // a lone level string defines the root level, a lone name enables everything for it
            (Some(part0), None, None) => match part0.parse() {
                Ok(level) => Ok((None, level)),
                Err(_) => Ok((Some(part0.to_string()), LevelFilter::max())),
            },
            (Some(part0), Some(""), None) => Ok((Some(part0.to_string()), LevelFilter::max())),
            (Some(part0), Some(part1), None) => match part1.parse() {
                Ok(level) => Ok((Some(part0.to_string()), level)),
                Err(_) => Err(LogError::ParseLoggerSpecError(part1.to_string())),
            },
            _ => Err(LogError::ParseLoggerSpecError(spec.to_string())),
        }
    }
}

impl FromStr for Filters {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filters = Self::default();
        filters.parse_expression(s);
        Ok(filters)
    }
}
