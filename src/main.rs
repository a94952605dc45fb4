// sqlsentry entrypoint
//!
//! Thin orchestrator: load configuration, initialize logging, build the
//! application context, then dispatch one subcommand. The pipeline itself
//! lives in the crates under `crates/`.

mod logging;

use anyhow::Result;
use log::info;
use sqlsentry_configs::ServerConfig;
use sqlsentry_core::AppContext;
use std::env;

const USAGE: &str = "usage: sqlsentry <command>\n\n\
commands:\n  \
  exec <sql>    run a SQL blob through the pipeline, print the report as JSON\n  \
  schema        print the database schema description\n\n\
SQLSENTRY_CONFIG selects the config file (default: config.toml)";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    // Load configuration (env overrides applied on top of the file)
    let config_path = env::var("SQLSENTRY_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = match ServerConfig::from_file(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path, e);
            std::process::exit(1);
        },
    };
    config.apply_env_overrides();
    config.validate()?;

    // Logging before any other side effects
    logging::init_logging(
        &config.logging.level,
        config.logging.log_to_console,
        Some(&config.logging.targets),
        &config.logging.format,
    )?;

    info!("sqlsentry v{}", env!("CARGO_PKG_VERSION"));

    match args.get(1).map(String::as_str) {
        Some("exec") => {
            let blob = match args.get(2) {
                Some(blob) => blob,
                None => {
                    eprintln!("exec requires a SQL argument\n\n{}", USAGE);
                    std::process::exit(1);
                },
            };

            let context = AppContext::initialize(config).await?;
            let report = context.agent().run_blob(blob).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        },
        Some("schema") => {
            let context = AppContext::initialize(config).await?;
            let description = context.catalog().schema_description().await?;
            print!("{}", description);
        },
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(1);
        },
    }

    Ok(())
}
