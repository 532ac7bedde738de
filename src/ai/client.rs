use crate::config::Settings;
use crate::error::PrompterError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A single chat-completion round-trip.
///
/// With `json_mode` the provider is asked to return a JSON object; otherwise
/// the first choice's free text is returned verbatim.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        json_mode: bool,
    ) -> Result<String, PrompterError>;
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(settings: &Settings) -> Result<Self, PrompterError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| PrompterError::Config("OPENAI_API_KEY must be set".into()))?;

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()?,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        json_mode: bool,
    ) -> Result<String, PrompterError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = request_body(model, messages, json_mode);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let err_text = res.text().await.unwrap_or_default();
            log::error!("API Error: {}", err_text);
            return Err(PrompterError::Provider { status: status.as_u16(), body: err_text });
        }

        let body: Value = res.json().await?;
        first_choice_text(&body)
    }
}

fn request_body(model: &str, messages: &[ChatMessage], json_mode: bool) -> Value {
    let mut payload = json!({
        "model": model,
        "messages": messages,
    });
    if json_mode {
        payload["response_format"] = json!({ "type": "json_object" });
    }
    payload
}

fn first_choice_text(body: &Value) -> Result<String, PrompterError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PrompterError::Provider {
            status: 200,
            body: "No text content returned".into(),
        })
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub model: String,
        pub messages: Vec<ChatMessage>,
        pub json_mode: bool,
    }

    type Responder = dyn Fn(&RecordedCall) -> Result<String, PrompterError> + Send + Sync;

    /// Answers each request with a closure and remembers what was asked.
    pub struct StubClient {
        responder: Box<Responder>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl StubClient {
        pub fn new<F>(responder: F) -> Self
        where
            F: Fn(&RecordedCall) -> Result<String, PrompterError> + Send + Sync + 'static,
        {
            Self { responder: Box::new(responder), calls: Mutex::new(Vec::new()) }
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatClient for StubClient {
        async fn complete(
            &self,
            model: &str,
            messages: &[ChatMessage],
            json_mode: bool,
        ) -> Result<String, PrompterError> {
            let call = RecordedCall {
                model: model.to_string(),
                messages: messages.to_vec(),
                json_mode,
            };
            self.calls.lock().unwrap().push(call.clone());
            (self.responder)(&call)
        }
    }
}
