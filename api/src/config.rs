use std::time::Duration;

use config::{ConfigError, Environment, File, FileFormat};

const CONFIG_FILE: &str = "config.toml";
const SERVER_ADDRESS: &str = "0.0.0.0:8080";

/// Settings layered from defaults, an optional `config.toml` and `DINO_*`
/// environment variables, later sources winning.
#[derive(Debug, serde::Deserialize)]
pub struct Config {
    pub server_address: String,
    pub request_timeout_secs: u64,
    pub max_connections: usize,
    pub max_body_bytes: usize,
}

impl Config {
    /// `DINO_CONFIG` points at an alternative file.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("DINO_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
        Self::from_file(&path)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        ::config::Config::builder()
            .set_default("server_address", SERVER_ADDRESS)?
            .set_default("request_timeout_secs", 15_i64)?
            .set_default("max_connections", 1_000_i64)?
            .set_default("max_body_bytes", 64 * 1024_i64)?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("DINO"))
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let config = Config::from_file("this-file-does-not-exist.toml").unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.max_connections, 1_000);
        assert_eq!(config.max_body_bytes, 64 * 1024);
    }

    #[test]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("dino-api-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "server_address = \"127.0.0.1:9999\"\nmax_body_bytes = 128\n",
        )
        .unwrap();

        let config = Config::from_file(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.server_address, "127.0.0.1:9999");
        assert_eq!(config.max_body_bytes, 128);
        assert_eq!(config.request_timeout_secs, 15);
    }
}
