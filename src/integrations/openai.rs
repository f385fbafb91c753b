//! OpenAI chat completions client used for answer generation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Generator;
use crate::{Error, Result};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI client.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAIClient {
    /// Create client with API key.
    pub fn new<S: Into<String>>(api_key: S) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Config("OPENAI_API_KEY is empty".to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!("grambank_rag/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: OPENAI_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Point the client at a compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Chat completion with the configured model and temperature.
    async fn chat_completion(&self, messages: Vec<ChatMessage>, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Generation(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::Generation(format!(
                "OpenAI error {}: {}",
                status, text
            )));
        }

        let chat_response: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Generation(format!("Invalid response: {}", e)))?;

        chat_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| Error::Generation("Empty response from OpenAI".to_string()))
    }
}

#[async_trait]
impl Generator for OpenAIClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        debug!("Requesting completion from {}", self.model);
        self.chat_completion(vec![ChatMessage::user(prompt)], max_tokens)
            .await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const ANSWER: &str = "Mapudungun (ISO 639-3: arn) is spoken in Chile and Argentina.";

    fn generator(server: &MockServer) -> OpenAIClient {
        OpenAIClient::new("sk-grambank")
            .expect("client")
            .with_base_url(server.base_url())
            .with_temperature(0.0)
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    #[test]
    fn blank_key_is_a_config_error() {
        let err = OpenAIClient::new("   ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn user_message_carries_prompt() {
        let message = ChatMessage::user("q");
        assert_eq!(message.role, "user");
        assert_eq!(message.content.as_deref(), Some("q"));
    }

    #[tokio::test]
    async fn grounded_prompt_is_sent_as_single_user_message() {
        let server = MockServer::start_async().await;

        let completion_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("Authorization", "Bearer sk-grambank")
                .is_true(|req| {
                    let body: serde_json::Value =
                        serde_json::from_slice(req.body().as_ref()).unwrap_or_default();
                    body["max_tokens"] == 200
                        && body["model"] == "gpt-4o"
                        && body["messages"].as_array().map(Vec::len) == Some(1)
                        && body["messages"][0]["role"] == "user"
                        && body["messages"][0]["content"]
                            .as_str()
                            .unwrap_or("")
                            .contains("Entity: Mapudungun")
                });
            then.status(200).json_body(completion(json!(ANSWER)));
        });

        let client = generator(&server).with_model("gpt-4o");
        let prompt = "Entity: Mapudungun\nRelevant properties:\n- isoCode: arn\n\nWhat is its ISO code?";
        let reply = client.generate(prompt, 200).await.unwrap();

        assert_eq!(reply, ANSWER);
        assert_eq!(Generator::model(&client), "gpt-4o");
        completion_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn generated_text_is_returned_verbatim() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion(json!("  Aymara.\n")));
        });

        let reply = generator(&server).generate("q", 16).await.unwrap();
        assert_eq!(reply, "  Aymara.\n");
    }

    #[tokio::test]
    async fn http_failure_is_a_generation_error() {
        let server = MockServer::start_async().await;

        let completion_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503).body("upstream overloaded");
        });

        let err = generator(&server).generate("q", 16).await.unwrap_err();

        assert!(matches!(err, Error::Generation(_)));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("upstream overloaded"));
        completion_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn malformed_or_empty_completions_are_rejected() {
        let server = MockServer::start_async().await;
        let mut garbage = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).body("<html>gateway</html>");
        });

        let err = generator(&server).generate("q", 16).await.unwrap_err();
        assert!(err.to_string().contains("Invalid response"));
        garbage.delete();

        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion(serde_json::Value::Null));
        });

        let err = generator(&server).generate("q", 16).await.unwrap_err();
        assert!(err.to_string().contains("Empty response from OpenAI"));
    }
}
