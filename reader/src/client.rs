use crate::error::RequestError;
use crate::models::*;
use crate::page::SelectedFile;
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;

/// The two requests the page can make.
#[async_trait]
pub trait ReaderBackend: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResult, RequestError>;
    async fn ask(&self, question: &str) -> Result<AskResult, RequestError>;
}

/// HTTP client for a reader server.
///
/// No timeout is configured: an unresponsive server keeps the caller waiting.
#[derive(Debug, Clone)]
pub struct ReaderClient {
    client: Client,
    base_url: String,
}

impl ReaderClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ReaderBackend for ReaderClient {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResult, RequestError> {
        log::info!("Uploading {} ({} bytes)", file.name, file.bytes.len());

        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await?;

        decode(response).await
    }

    async fn ask(&self, question: &str) -> Result<AskResult, RequestError> {
        log::info!("Asking question ({} chars)", question.chars().count());

        let response = self
            .client
            .post(self.endpoint("/ask"))
            .header("Content-Type", "application/json")
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await?;

        decode(response).await
    }
}

/// Reads the whole body, then parses it as `T` on 2xx or as an
/// [`ErrorPayload`] otherwise.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RequestError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let payload: ErrorPayload = serde_json::from_slice(&body)?;
        log::warn!("Server rejected request with {}: {:?}", status, payload.error);
        return Err(RequestError::Rejected {
            status: status.as_u16(),
            message: payload.error,
        });
    }

    Ok(serde_json::from_slice(&body)?)
}
