//! Configuration model loaded from external sources.

use serde::Deserialize;

fn default_product_name() -> String {
    "Pilot".to_string()
}

fn default_page_size() -> u32 {
    crate::domain::query::DEFAULT_COUNT
}

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    pub templates_dir: String,
    /// Prefix of exported file names.
    #[serde(default = "default_product_name")]
    pub product_name: String,
    /// Page size used when the URL carries no query.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

impl ServerConfig {
    /// Reads `config/default.yaml`, the optional `config/<APP_ENV>.yaml`
    /// profile (`local` by default) and `APP_`-prefixed environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".into());

        config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(config::Environment::with_prefix("APP"))
            .build()?
            .try_deserialize()
    }
}
