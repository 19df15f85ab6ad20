use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_log_server::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_BIND_ADDRESS, DEFAULT_CONTENT_CACHE_AGE_SEC,
    DEFAULT_PORT,
};
use music_log_server::sqlite_persistence::open_database;
use music_log_server::{
    run_server, RequestsLoggingLevel, SqliteMusicStore, SqliteUserStore, UserManager,
};

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
struct CliArgs {
    /// Path to a TOML config file. Values in it override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database file, created on first run.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The address to bind to.
    #[clap(long, default_value = DEFAULT_BIND_ADDRESS)]
    pub bind_address: String,

    /// The port to listen on.
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of content in the cache in seconds.
    #[clap(long, default_value_t = DEFAULT_CONTENT_CACHE_AGE_SEC)]
    pub content_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            bind_address: self.bind_address.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            content_cache_age_sec: self.content_cache_age_sec,
            frontend_dir_path: self.frontend_dir_path.clone(),
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

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening SQLite database at {:?}...", config.db_path);
    let conn = open_database(&config.db_path)?;
    let music_store = Arc::new(SqliteMusicStore::new(conn.clone()));
    let user_manager = Arc::new(UserManager::new(Arc::new(SqliteUserStore::new(conn))));

    info!(
        "Ready to serve at {}:{}",
        config.bind_address, config.port
    );
    run_server(config.server_config(), music_store, user_manager).await
}
