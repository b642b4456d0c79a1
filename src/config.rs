use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Persisted settings, all optional: the file only stores what the user
/// changed, and every reader falls back to a default. Environment variables
/// override the file.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub backend_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: Option<String>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            Self::new()
        };
        Ok(config.apply_env())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("brampton").join("config.json"))
    }

    fn apply_env(mut self) -> Self {
        if let Ok(url) = env::var("BRAMPTON_BACKEND_URL") {
            self.backend_url = Some(url);
        }
        if let Ok(host) = env::var("BRAMPTON_HOST") {
            self.host = Some(host);
        }
        if let Ok(port) = env::var("BRAMPTON_PORT") {
            if let Ok(port) = port.parse() {
                self.port = Some(port);
            }
        }
        if let Ok(key) = env::var("OPENROUTER_API_KEY") {
            self.openrouter_api_key = Some(key);
        }
        if let Ok(model) = env::var("OPENROUTER_MODEL") {
            self.openrouter_model = Some(model);
        }
        if let Ok(url) = env::var("OLLAMA_URL") {
            self.ollama_url = Some(url);
        }
        if let Ok(model) = env::var("OLLAMA_MODEL") {
            self.ollama_model = Some(model);
        }
        self
    }

    // Defaulted accessors

    pub fn backend_url(&self) -> String {
        self.backend_url
            .clone()
            .unwrap_or_else(|| "http://localhost:8000".to_string())
    }

    pub fn listen_addr(&self) -> String {
        let host = self.host.as_deref().unwrap_or("0.0.0.0");
        let port = self.port.unwrap_or(8000);
        format!("{host}:{port}")
    }

    pub fn ollama_url(&self) -> String {
        self.ollama_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string())
    }

    pub fn ollama_model(&self) -> String {
        self.ollama_model
            .clone()
            .unwrap_or_else(|| "llama3".to_string())
    }

    pub fn openrouter_model(&self) -> String {
        self.openrouter_model
            .clone()
            .unwrap_or_else(|| "meta-llama/llama-3.1-8b-instruct".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.backend_url(), "http://localhost:8000");
        assert_eq!(config.listen_addr(), "0.0.0.0:8000");
        assert_eq!(config.ollama_url(), "http://localhost:11434");
        assert_eq!(config.ollama_model(), "llama3");
        assert_eq!(config.openrouter_model(), "meta-llama/llama-3.1-8b-instruct");
        assert!(config.openrouter_api_key.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            backend_url: Some("http://example.com:9000".to_string()),
            port: Some(9000),
            ollama_model: Some("llama3.2".to_string()),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.backend_url(), "http://example.com:9000");
        assert_eq!(loaded.port, Some(9000));
        assert_eq!(loaded.ollama_model(), "llama3.2");
        assert!(loaded.host.is_none());
    }

    #[test]
    fn test_env_overrides_file_value() {
        env::set_var("OLLAMA_MODEL", "mistral");
        let config = Config {
            ollama_model: Some("llama3".to_string()),
            ..Config::new()
        }
        .apply_env();
        env::remove_var("OLLAMA_MODEL");

        assert_eq!(config.ollama_model(), "mistral");
    }
}
