use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vgs_server::cli_style::get_styles;
use vgs_server::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_BIND_ADDRESS, DEFAULT_METADATA_PATH,
    DEFAULT_METRICS_PORT, DEFAULT_PORT, DEFAULT_RATINGS_DIR, DEFAULT_USERS_PATH,
};
use vgs_server::ratings::DEFAULT_BACKUP_COUNT;
use vgs_server::server::{self, run_server, RequestsLoggingLevel, ServerConfig};
use vgs_server::{Catalog, FileUserStore, Library};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Path to the catalog metadata JSON file. Track paths are relative to its directory.
    #[clap(long, env = "VGSSERVER_METADATA_PATH", default_value = DEFAULT_METADATA_PATH, value_parser = parse_path)]
    pub metadata_path: Option<PathBuf>,

    /// Directory holding one ratings ledger per user.
    #[clap(long, env = "VGSSERVER_RATING_DIR_PATH", default_value = DEFAULT_RATINGS_DIR, value_parser = parse_path)]
    pub ratings_dir: Option<PathBuf>,

    /// Path to the users JSON file.
    #[clap(long, env = "VGSSERVER_USER_PATH", default_value = DEFAULT_USERS_PATH, value_parser = parse_path)]
    pub users_path: Option<PathBuf>,

    /// Optional TOML config file, its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The address to listen on.
    #[clap(long, default_value = DEFAULT_BIND_ADDRESS)]
    pub bind_address: String,

    /// The port to listen on.
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// How many previous versions of each ratings file to keep.
    #[clap(long, default_value_t = DEFAULT_BACKUP_COUNT)]
    pub backup_count: usize,

    /// Seed for the random selection, OS entropy when absent.
    #[clap(long, env = "VGSSERVER_RANDOM_SEED")]
    pub random_seed: Option<u64>,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            metadata_path: args.metadata_path.clone(),
            ratings_dir: args.ratings_dir.clone(),
            users_path: args.users_path.clone(),
            bind_address: args.bind_address.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            backup_count: args.backup_count,
            random_seed: args.random_seed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Loading catalog from {:?}...", config.metadata_path);
    let catalog = Catalog::from_file(&config.metadata_path, config.random_seed)
        .with_context(|| format!("Failed to load catalog {:?}", config.metadata_path))?;
    if config.random_seed.is_some() {
        info!("Random selection is seeded, results are reproducible");
    }

    info!("Initializing metrics...");
    server::metrics::init_metrics();
    server::metrics::init_catalog_metrics(
        catalog.len(),
        catalog.iter().map(|track| track.size_bytes).sum(),
    );

    let user_store = FileUserStore::load(&config.users_path)?;

    std::fs::create_dir_all(&config.ratings_dir)
        .with_context(|| format!("Failed to create ratings dir {:?}", config.ratings_dir))?;
    let library = Library::new(Arc::new(catalog), &config.ratings_dir, config.backup_count);

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        bind_address: config.bind_address,
        port: config.port,
        metrics_port: config.metrics_port,
    };
    run_server(server_config, Arc::new(library), Arc::new(user_store)).await
}
