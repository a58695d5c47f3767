//! Plot browser: serves generated SVG plots grouped by use case.
//!
//! # Usage
//!
//! ```bash
//! plot-browser                      # serves ./plots on 127.0.0.1:8050
//! plot-browser /srv/plots --port 8080 --host 0.0.0.0
//! plot-browser plots --page-size 50 --open
//! ```

mod data;
mod error;
mod server;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use data::loader::list_use_cases;
use state::{ServerConfig, DEFAULT_PAGE_SIZE, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(name = "plot-browser")]
#[command(about = "Browse generated plots by use case, with outlier and std filters")]
#[command(version)]
struct Args {
    /// Directory containing one sub-directory per use case
    #[arg(default_value = "plots")]
    root: PathBuf,

    /// Port for the web server
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Initial page size of the paginated viewer
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: i64,

    /// Open the index page in a browser
    #[arg(long)]
    open: bool,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        if self.page_size <= 0 {
            bail!("--page-size must be positive, got {}", self.page_size);
        }
        if !self.root.is_dir() {
            bail!("Plots root {} is not a directory", self.root.display());
        }
        Ok(ServerConfig {
            root: self.root,
            host: self.host,
            port: self.port,
            default_page_size: self.page_size,
            open_browser: self.open,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;

    let use_cases = list_use_cases(&config.root)
        .with_context(|| format!("listing use cases in {}", config.root.display()))?;
    if use_cases.is_empty() {
        log::warn!("No use cases found in {}", config.root.display());
    } else {
        log::info!("Found {} use case(s)", use_cases.len());
        for name in &use_cases {
            log::debug!("  {name}");
        }
    }

    server::run_server(config).await
}
