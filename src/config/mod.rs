// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::Config;

/// Config file used when `BLOG_CONFIG` is not set (extension optional)
const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from the path in `BLOG_CONFIG`, or `config.*`
    pub fn load() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var("BLOG_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (extension optional).
    /// A missing file is not an error; defaults and `BLOG_*` variables apply.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("BLOG")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 4000)?
            .set_default("storage.data_dir", "./.blog")?
            .set_default("storage.db_file", "sqlite-database.db")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default(
                "http.server_name",
                concat!("blog_server/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("render.escape_content", false)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
