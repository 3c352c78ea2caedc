use anyhow::{anyhow, Result};
use pdf_extract::extract_text_from_mem;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub content: String,
}

pub struct DocumentProcessor {
    preview_chars: usize,
    max_context_chars: usize,
}

impl DocumentProcessor {
    pub fn new(preview_chars: usize, max_context_chars: usize) -> Self {
        Self {
            preview_chars,
            max_context_chars,
        }
    }

    /// Extracts the text of an uploaded PDF.
    ///
    /// Extraction runs on the blocking pool; a panic inside the extractor is
    /// reported as an error like any other unreadable file.
    pub async fn process_pdf(&self, filename: String, bytes: Vec<u8>) -> Result<Document> {
        log::info!("Processing PDF: {} ({} bytes)", filename, bytes.len());

        let content = tokio::task::spawn_blocking(move || extract_text_from_mem(&bytes))
            .await
            .map_err(|e| anyhow!("text extraction aborted: {}", e))??;

        log::info!(
            "Extracted {} characters from {}",
            content.chars().count(),
            filename
        );

        Ok(Document {
            id: Uuid::new_v4().to_string(),
            filename,
            content,
        })
    }

    pub fn preview(&self, document: &Document) -> String {
        truncate_chars(&document.content, self.preview_chars)
    }

    /// Leading part of the document sent to the model with every question.
    pub fn context(&self, document: &Document) -> String {
        truncate_chars(&document.content, self.max_context_chars)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
