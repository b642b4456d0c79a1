pub mod ollama;
pub mod openrouter;

pub use ollama::OllamaClient;
pub use openrouter::OpenRouterClient;

use anyhow::Result;

use crate::config::Config;

/// Persona given to whichever model answers. Every request is a fresh
/// [system, user] exchange; the backend keeps no conversation state.
pub const SYSTEM_PROMPT: &str = "You are Brampton, a finance AI chatbot and expert advisor. \
You specialize in providing insights on finance, investing, stock markets, economics, \
personal finance, and financial planning. Always provide actionable, accurate, and \
well-reasoned advice. Keep responses concise but comprehensive.";

pub enum Provider {
    OpenRouter(OpenRouterClient),
    Ollama(OllamaClient),
}

impl Provider {
    /// OpenRouter when an API key is configured, local Ollama otherwise.
    pub fn from_config(config: &Config) -> Self {
        match &config.openrouter_api_key {
            Some(key) => {
                Provider::OpenRouter(OpenRouterClient::new(key, &config.openrouter_model()))
            }
            None => Provider::Ollama(OllamaClient::new(
                &config.ollama_url(),
                &config.ollama_model(),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenRouter(_) => "OpenRouter",
            Provider::Ollama(_) => "Ollama",
        }
    }

    pub async fn reply(&self, user_msg: &str) -> Result<String> {
        match self {
            Provider::OpenRouter(client) => client.reply(user_msg).await,
            Provider::Ollama(client) => client.reply(user_msg).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_selection_follows_api_key() {
        let config = Config::new();
        assert_eq!(Provider::from_config(&config).name(), "Ollama");

        let config = Config {
            openrouter_api_key: Some("sk-or-test".to_string()),
            ..Config::new()
        };
        assert_eq!(Provider::from_config(&config).name(), "OpenRouter");
    }
}
