use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_STORE_PATH: &str = ".chat-client/state.json";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Client configuration loaded from environment variables.
/// Every value has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub temperature: f64,
    pub store_path: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let temperature = match std::env::var("CHAT_TEMPERATURE") {
            Ok(raw) => parse_temperature(&raw).context("CHAT_TEMPERATURE is invalid")?,
            Err(_) => DEFAULT_TEMPERATURE,
        };

        Ok(Config {
            api_url: std::env::var("CHAT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            temperature,
            store_path: std::env::var("CHAT_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH)),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        temperature: Option<f64>,
        store_path: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(t) = temperature {
            self.temperature = check_temperature(t)?;
        }
        if let Some(path) = store_path {
            self.store_path = path;
        }
        Ok(self)
    }
}

/// Parses a temperature the way the settings slider constrains it: a float in `[0, 1]`.
pub fn parse_temperature(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("'{raw}' is not a number"))?;
    check_temperature(value)
}

fn check_temperature(value: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        bail!("temperature must be between 0 and 1, got {value}");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_temperature_accepts_slider_range() {
        assert_eq!(parse_temperature("0.7").unwrap(), 0.7);
        assert_eq!(parse_temperature(" 1 ").unwrap(), 1.0);
        assert_eq!(parse_temperature("0").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_temperature_rejects_out_of_range() {
        assert!(parse_temperature("1.5").is_err());
        assert!(parse_temperature("-0.1").is_err());
    }

    #[test]
    fn test_parse_temperature_rejects_garbage() {
        assert!(parse_temperature("warm").is_err());
    }

    #[test]
    fn test_overrides_replace_env_values() {
        let config = Config {
            api_url: DEFAULT_API_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            rust_log: "warn".to_string(),
        };
        let config = config
            .with_overrides(Some("http://backend:8000".to_string()), Some(0.2), None)
            .unwrap();
        assert_eq!(config.api_url, "http://backend:8000");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    }
}
