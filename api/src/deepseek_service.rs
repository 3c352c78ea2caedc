use crate::config::ServerConfig;
use anyhow::Result;
use pdf_reader::ChatMessage;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SYSTEM_PROMPT: &str = "You are an assistant that answers questions about a PDF. \
Answer the user's question using only the information in the provided PDF. \
If the answer cannot be found in the PDF, say you don't know.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepSeekMessage {
    pub role: String,
    pub content: String,
}

impl DeepSeekMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DeepSeekRequest<'a> {
    model: &'a str,
    messages: Vec<DeepSeekMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct DeepSeekResponse {
    choices: Vec<DeepSeekChoice>,
}

#[derive(Debug, Deserialize)]
struct DeepSeekChoice {
    message: DeepSeekReply,
}

/// Only the content of a returned message is used.
#[derive(Debug, Deserialize)]
struct DeepSeekReply {
    content: String,
}

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("DeepSeek API key not configured on server.")]
    MissingApiKey,

    #[error("Failed to call DeepSeek API: {0}")]
    Transport(#[source] reqwest::Error),

    /// The upstream answered with a non-200 status; `body` is its raw text.
    #[error("DeepSeek API returned an error.")]
    Upstream { status: u16, body: String },

    #[error("Invalid response from DeepSeek API: {0}")]
    InvalidResponse(String),
}

pub struct DeepSeekService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl DeepSeekService {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.deepseek_timeout).build()?;

        Ok(Self {
            client,
            api_key: config.deepseek_api_key.clone(),
            base_url: config.deepseek_base_url.clone(),
            model: config.deepseek_model.clone(),
        })
    }

    /// Asks the model about the document.
    ///
    /// `context` is the (already truncated) document text and `history` the
    /// earlier exchanges about the same document, oldest first.
    pub async fn generate_answer(
        &self,
        context: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<String, AnswerError> {
        let api_key = self.api_key.as_deref().ok_or(AnswerError::MissingApiKey)?;

        let request = DeepSeekRequest {
            model: &self.model,
            messages: build_messages(context, history, question),
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(AnswerError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log::error!("DeepSeek API error {}: {}", status, body);
            return Err(AnswerError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnswerError::InvalidResponse(e.to_string()))?;
        let parsed: DeepSeekResponse = serde_json::from_str(&body)
            .map_err(|e| AnswerError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AnswerError::InvalidResponse("response contained no choices".to_string()))
    }
}

/// System prompt, document text, earlier exchanges, then the new question.
pub fn build_messages(context: &str, history: &[ChatMessage], question: &str) -> Vec<DeepSeekMessage> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(DeepSeekMessage::new("system", SYSTEM_PROMPT));
    messages.push(DeepSeekMessage::new("system", context));
    messages.extend(
        history
            .iter()
            .map(|msg| DeepSeekMessage::new(msg.role.as_str(), msg.content.clone())),
    );
    messages.push(DeepSeekMessage::new("user", question));
    messages
}
