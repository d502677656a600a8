pub mod loader;
pub mod schema;

pub use loader::{
    default_config_path, load_config, load_config_from_str, validate_config, BASE_URL_ENV,
};
pub use schema::{
    expand_home, ClientConfig, CredentialsConfig, DownloadConfig, LogFormat, LoggingConfig,
    PollingConfig, ServerConfig,
};
