mod file_config;

pub use file_config::FileConfig;

use crate::ratings::DEFAULT_BACKUP_COUNT;
use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::net::IpAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_METRICS_PORT: u16 = 9091;
pub const DEFAULT_METADATA_PATH: &str = "/songs/metadata.json";
pub const DEFAULT_RATINGS_DIR: &str = "/ratings/";
pub const DEFAULT_USERS_PATH: &str = "/users.json";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub metadata_path: Option<PathBuf>,
    pub ratings_dir: Option<PathBuf>,
    pub users_path: Option<PathBuf>,
    pub bind_address: String,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub backup_count: usize,
    pub random_seed: Option<u64>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            metadata_path: None,
            ratings_dir: None,
            users_path: None,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            logging_level: RequestsLoggingLevel::Path,
            backup_count: DEFAULT_BACKUP_COUNT,
            random_seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub metadata_path: PathBuf,
    pub ratings_dir: PathBuf,
    pub users_path: PathBuf,
    pub bind_address: IpAddr,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub backup_count: usize,
    pub random_seed: Option<u64>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let metadata_path = file
            .metadata_path
            .map(PathBuf::from)
            .or_else(|| cli.metadata_path.clone())
            .ok_or_else(|| {
                anyhow!("metadata_path must be specified via --metadata-path or in config file")
            })?;
        if !metadata_path.is_file() {
            bail!("Metadata file does not exist: {:?}", metadata_path);
        }

        let users_path = file
            .users_path
            .map(PathBuf::from)
            .or_else(|| cli.users_path.clone())
            .ok_or_else(|| {
                anyhow!("users_path must be specified via --users-path or in config file")
            })?;
        if !users_path.is_file() {
            bail!("Users file does not exist: {:?}", users_path);
        }

        // Created on demand, but must not be something else.
        let ratings_dir = file
            .ratings_dir
            .map(PathBuf::from)
            .or_else(|| cli.ratings_dir.clone())
            .ok_or_else(|| {
                anyhow!("ratings_dir must be specified via --ratings-dir or in config file")
            })?;
        if ratings_dir.exists() && !ratings_dir.is_dir() {
            bail!("ratings_dir is not a directory: {:?}", ratings_dir);
        }

        let bind_address = file
            .bind_address
            .unwrap_or_else(|| cli.bind_address.clone());
        let bind_address: IpAddr = bind_address
            .parse()
            .map_err(|_| anyhow!("Invalid bind address: {}", bind_address))?;

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port && port != 0 {
            bail!("port and metrics_port must differ, both are {}", port);
        }

        let logging_level = match file.logging_level {
            Some(level) => parse_logging_level(&level)
                .ok_or_else(|| anyhow!("Invalid logging_level: {}", level))?,
            None => cli.logging_level.clone(),
        };

        let backup_count = file.backup_count.unwrap_or(cli.backup_count);
        let random_seed = file.random_seed.or(cli.random_seed);

        Ok(Self {
            metadata_path,
            ratings_dir,
            users_path,
            bind_address,
            port,
            metrics_port,
            logging_level,
            backup_count,
            random_seed,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
