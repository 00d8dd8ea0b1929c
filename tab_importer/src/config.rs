use std::path::Path;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, serde::Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub logging_config: String,
    pub max_concurrent_requests: usize,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: None,
            api_token: None,
            logging_config: "info,reqwest=warn,hyper=warn".into(),
            max_concurrent_requests: 8,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Parses a YAML file. Keys it leaves out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, anyhow::Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not open {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("Invalid config in {}", path.display()))
    }
}

pub const CONFIG_ENV: &str = "TAB_IMPORTER_CONFIG";

/// The config named by `TAB_IMPORTER_CONFIG`, or the defaults when it is unset
/// or unusable. Logging is configured from the result, so problems go to stderr.
pub fn read_config() -> Config {
    let path = match std::env::var_os(CONFIG_ENV) {
        Some(path) => path,
        None => return Config::default(),
    };
    Config::load(&path).unwrap_or_else(|e| {
        eprintln!("Warning: {:#}. Using the default config.", e);
        Config::default()
    })
}
