use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::SYSTEM_PROMPT;

/// Provider calls get a timeout so a stuck model process cannot hold a
/// backend worker forever. The chat client itself has no such limit.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub async fn reply(&self, user_msg: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: build_prompt(user_msg),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ollama request failed with status: {}. Make sure Ollama is running with: ollama serve",
                response.status()
            ));
        }

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response)
    }
}

/// Ollama's generate endpoint takes a flat prompt, so the persona and the
/// user turn are spliced into one string ending with the assistant cue.
fn build_prompt(user_msg: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nUser: {user_msg}\n\nBrampton:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_splices_persona_and_question() {
        let prompt = build_prompt("Should I buy index funds?");
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("User: Should I buy index funds?"));
        assert!(prompt.ends_with("Brampton:"));
    }

    #[test]
    fn test_generate_request_wire_shape() {
        let body = serde_json::to_value(GenerateRequest {
            model: "llama3".to_string(),
            prompt: "hello".to_string(),
            stream: false,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "model": "llama3", "prompt": "hello", "stream": false })
        );
    }

    #[test]
    fn test_generate_response_requires_response_field() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"response": "Index funds are...", "done": true}"#).unwrap();
        assert_eq!(parsed.response, "Index funds are...");

        assert!(serde_json::from_str::<GenerateResponse>(r#"{"done": true}"#).is_err());
    }
}
