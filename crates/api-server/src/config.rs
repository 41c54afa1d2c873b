use anyhow::{Context, Result};
use calibration_engine::CalibrationPolicy;
use model_client::BackendConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Server settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backends: BackendConfig,
    /// Optional JSON file overriding calibration constants
    pub policy_path: Option<PathBuf>,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = get("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .context("PORT must be a valid port number")?;
        let timeout_secs: u64 = get("TRANSFORMER_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("TRANSFORMER_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            backends: BackendConfig {
                transformer_url: non_empty("TRANSFORMER_URL"),
                transformer_timeout: Duration::from_secs(timeout_secs),
                models_dir: PathBuf::from(
                    get("MODELS_DIR").unwrap_or_else(|| "./models".to_string()),
                ),
            },
            policy_path: non_empty("CALIBRATION_POLICY_PATH").map(PathBuf::from),
            cors_origins: get("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured policy file, or the built-in constants when none is set.
    pub fn load_policy(&self) -> Result<CalibrationPolicy> {
        match &self.policy_path {
            Some(path) => CalibrationPolicy::from_json_file(path),
            None => Ok(CalibrationPolicy::default()),
        }
    }
}
