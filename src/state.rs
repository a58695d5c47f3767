use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Server configuration and shared handler state
// ---------------------------------------------------------------------------

pub const DEFAULT_PORT: u16 = 8050;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Runtime settings gathered from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding one sub-directory per use case.
    pub root: PathBuf,
    pub host: String,
    pub port: u16,
    /// Page size the paginated viewer starts with.
    pub default_page_size: i64,
    /// Open the index page in a browser once listening.
    pub open_browser: bool,
}

/// State shared (read-only) by every request handler.
///
/// Holds no listing cache: each request reads the plots root again.
#[derive(Debug, Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub default_page_size: i64,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            root: config.root.clone(),
            default_page_size: config.default_page_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
