//! Configuration for the terminal client.
//!
//! Values are resolved once at startup, in increasing precedence: built-in
//! defaults, the RON file, environment variables, command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use refresh_core::{ListQuery, PollSettings};
use refresh_engine::ClientSettings;
use refresh_logging::refresh_info;
use serde::Deserialize;
use thiserror::Error;

use crate::Args;

pub const DEFAULT_CONFIG_FILENAME: &str = "refresh.ron";
pub const ENV_API_BASE: &str = "REFRESH_API_BASE";
pub const ENV_TOKEN: &str = "REFRESH_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("page size must be at least 1")]
    PageSize,
}

/// Shape of `refresh.ron`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub narrative: Option<String>,
    pub page_size: Option<u32>,
    pub debug: Option<bool>,
    pub poll_interval_ms: Option<u64>,
    pub max_polls: Option<u32>,
    pub completion_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub client: ClientSettings,
    pub poll: PollSettings,
    /// List to show; `None` when no narrative was configured.
    pub query: Option<ListQuery>,
}

/// Reads the config file.
///
/// A missing file is only an error when the path was given explicitly.
pub fn load_file(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
    };

    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
            return Ok(FileConfig::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.clone(),
        message: err.to_string(),
    })?;
    refresh_info!("Loaded configuration from {:?}", path);
    Ok(config)
}

pub fn resolve(
    file: FileConfig,
    env: impl Fn(&str) -> Option<String>,
    args: &Args,
) -> Result<CliConfig, ConfigError> {
    let mut client = ClientSettings::default();
    let mut poll = PollSettings::default();

    if let Some(base_url) = file.base_url {
        client.base_url = base_url;
    }
    client.token = file.token;
    if let Some(secs) = file.request_timeout_secs {
        client.request_timeout = Duration::from_secs(secs);
    }
    if let Some(ms) = file.poll_interval_ms {
        poll.interval = Duration::from_millis(ms);
    }
    if let Some(max_polls) = file.max_polls {
        poll.max_polls = max_polls;
    }
    if let Some(ms) = file.completion_delay_ms {
        poll.completion_delay = Duration::from_millis(ms);
    }

    if let Some(base_url) = non_empty(env(ENV_API_BASE)) {
        client.base_url = base_url;
    }
    if let Some(token) = non_empty(env(ENV_TOKEN)) {
        client.token = Some(token);
    }

    if let Some(base_url) = &args.base_url {
        client.base_url = base_url.clone();
    }
    if let Some(token) = &args.token {
        client.token = Some(token.clone());
    }
    client.token = non_empty(client.token);

    let narrative = args.narrative.clone().or(file.narrative);
    let query = match narrative {
        Some(name) => {
            let mut query = ListQuery::new(name);
            if let Some(page_size) = args.page_size.or(file.page_size) {
                if page_size == 0 {
                    return Err(ConfigError::PageSize);
                }
                query.page_size = page_size;
            }
            query.debug = args.debug || file.debug.unwrap_or(false);
            Some(query)
        }
        None => None,
    };

    Ok(CliConfig {
        client,
        poll,
        query,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
