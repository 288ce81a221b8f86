//! Process configuration from environment variables.
use std::num::ParseIntError;
use std::path::PathBuf;

use crate::discovery::{DEFAULT_COMMIT_LABEL, LabelPolicy};
use crate::fanout::DEFAULT_WORKERS;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";
pub const DEFAULT_STATIC_DIR: &str = "web/public";

pub const LOGS_SHOW: &str = "LOGS_SHOW";
pub const CONTAINER_RESTART: &str = "CONTAINER_RESTART";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for `{name}`: {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub docker_socket: PathBuf,
    pub static_dir: PathBuf,
    pub enrich_workers: usize,
    pub label_policy: LabelPolicy,
    pub commit_label: String,
    pub debug: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNumber`] if `PORT` or `ENRICH_WORKERS` is set
    /// but not a valid number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let port = match var("PORT") {
            Some(value) => parse_number("PORT", value)?,
            None => DEFAULT_PORT,
        };
        let enrich_workers = match var("ENRICH_WORKERS") {
            Some(value) => parse_number::<usize>("ENRICH_WORKERS", value)?.max(1),
            None => DEFAULT_WORKERS,
        };

        Ok(Self {
            port,
            docker_socket: var("DOCKER_SOCKET")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCKER_SOCKET)),
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            enrich_workers,
            label_policy: LabelPolicy::from_prefixes(
                var("LABEL_PREFIX").as_deref(),
                var("LABEL_PREFIX_EXCLUDE").as_deref(),
            ),
            commit_label: var("COMMIT_LABEL").unwrap_or_else(|| DEFAULT_COMMIT_LABEL.to_owned()),
            debug: var("DEBUG").and_then(|v| parse_bool(&v)).unwrap_or(false),
        })
    }
}

fn parse_number<T>(name: &'static str, value: String) -> Result<T>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    let parsed = value.trim().parse();
    parsed.map_err(|source| Error::InvalidNumber { name, value, source })
}

/// Parses a boolean the way Go's `strconv.ParseBool` does.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Runtime toggles for the log viewer and the restart action.
///
/// [`FeatureFlags::Env`] re-reads the environment on every call so operators
/// can flip a flag without restarting the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeatureFlags {
    #[default]
    Env,
    Fixed { logs: bool, restart: bool },
}

impl FeatureFlags {
    pub fn logs_enabled(&self) -> bool {
        match self {
            Self::Env => env_flag(LOGS_SHOW),
            Self::Fixed { logs, .. } => *logs,
        }
    }

    pub fn restart_enabled(&self) -> bool {
        match self {
            Self::Env => env_flag(CONTAINER_RESTART),
            Self::Fixed { restart, .. } => *restart,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(false)
}
