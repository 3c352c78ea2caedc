use crate::config::ServerConfig;
use crate::deepseek_service::DeepSeekService;
use crate::document_processor::{Document, DocumentProcessor};
use anyhow::Result;
use pdf_reader::{ChatMessage, Role};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The one document the server currently answers questions about.
#[derive(Debug, Default)]
pub struct Session {
    pub document: Option<Document>,
    pub history: Vec<ChatMessage>,
}

impl Session {
    /// Replaces the document and starts a fresh conversation.
    pub fn load(&mut self, document: Document) {
        log::info!("Loaded document {} ({})", document.filename, document.id);
        self.document = Some(document);
        self.history.clear();
    }

    /// Records a question and its answer, unless the document was replaced
    /// while the answer was being generated.
    pub fn record_exchange(&mut self, document_id: &str, question: String, answer: String) -> bool {
        match &self.document {
            Some(document) if document.id == document_id => {
                self.history.push(ChatMessage::new(Role::User, question));
                self.history.push(ChatMessage::new(Role::Assistant, answer));
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub session: Arc<RwLock<Session>>,
    pub processor: Arc<DocumentProcessor>,
    pub deepseek: Arc<DeepSeekService>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let processor = DocumentProcessor::new(config.preview_chars, config.max_context_chars);
        let deepseek = DeepSeekService::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            session: Arc::new(RwLock::new(Session::default())),
            processor: Arc::new(processor),
            deepseek: Arc::new(deepseek),
        })
    }
}
