use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use perch_core::PerchConfig;

fn main() {
    // Init logging
    let filter = EnvFilter::try_from_env("PERCH_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let config_path = std::env::var_os("PERCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("perch.toml"));
    let config = match PerchConfig::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    info!("Perch starting");
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            if let Err(e) = perch_win::run_app(&config) {
                eprintln!("Perch error: {e}");
            }
        } else {
            let _ = config;
            error!("no shell backend for this platform");
        }
    }
}
