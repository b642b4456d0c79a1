use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    response: String,
}

#[derive(Deserialize)]
struct StatusReply {
    message: String,
}

/// HTTP client for the Brampton backend. One request per user turn, no
/// retries, no client-side timeout beyond the transport default.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one user message and return the assistant's reply text. A
    /// non-success status or a body without a `response` field is an error;
    /// the caller decides what the user sees.
    pub async fn chat(&self, message: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status: {}",
                response.status()
            ));
        }

        let reply: ChatReply = response.json().await?;
        Ok(reply.response)
    }

    /// Probe the backend's root status route.
    pub async fn status(&self) -> Result<String> {
        let response = self.client.get(&self.base_url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "status check failed with status: {}",
                response.status()
            ));
        }

        let status: StatusReply = response.json().await?;
        Ok(status.message)
    }
}
