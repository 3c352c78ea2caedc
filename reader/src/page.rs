//! Page state and the controller that drives it.
//!
//! [`UiState`] holds every visible region of the page. Its `begin_*` and
//! `settle_*` methods are the only transitions; [`PageController`] runs them
//! around the backend call and asks the [`View`] to redraw after each one,
//! so the optimistic user entry is on screen before the answer arrives.

use crate::client::ReaderBackend;
use crate::error::{RequestError, ValidationError};
use crate::models::{AskResult, ChatMessage, Role, UploadResult};
use std::path::Path;

pub const CHOOSE_FILE_MESSAGE: &str = "請選擇一個 PDF 文件。";
pub const UPLOADING_MESSAGE: &str = "正在上傳和解析…";
pub const UPLOAD_FAILED_MESSAGE: &str = "上傳失敗";
pub const ASK_FAILED_MESSAGE: &str = "提問失敗";
pub const ERROR_PREFIX: &str = "錯誤：";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Neutral,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

impl StatusLine {
    pub fn neutral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Neutral,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Error,
        }
    }
}

/// A local file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        Ok(Self::new(name, bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub selected_file: Option<SelectedFile>,
    pub status: StatusLine,
    /// Bumped on every status update, even when the text repeats.
    pub status_revision: u64,
    pub preview_visible: bool,
    pub preview_text: String,
    pub chat_visible: bool,
    pub transcript: Vec<ChatMessage>,
    pub question: String,
    pub send_enabled: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            selected_file: None,
            status: StatusLine::default(),
            status_revision: 0,
            preview_visible: false,
            preview_text: String::new(),
            chat_visible: false,
            transcript: Vec::new(),
            question: String::new(),
            send_enabled: true,
        }
    }
}

impl UiState {
    pub fn set_status(&mut self, status: StatusLine) {
        self.status = status;
        self.status_revision += 1;
    }

    pub fn document_loaded(&self) -> bool {
        self.chat_visible
    }

    /// Validates the selection and marks the upload as in progress.
    pub fn begin_upload(&mut self) -> Result<SelectedFile, ValidationError> {
        let Some(file) = self.selected_file.clone() else {
            self.set_status(StatusLine::error(CHOOSE_FILE_MESSAGE));
            return Err(ValidationError::NoFileSelected);
        };

        self.set_status(StatusLine::neutral(UPLOADING_MESSAGE));
        Ok(file)
    }

    pub fn settle_upload(&mut self, outcome: Result<UploadResult, RequestError>) {
        match outcome {
            Ok(result) => {
                self.set_status(StatusLine::success(result.message));
                self.preview_visible = true;
                self.chat_visible = true;
                self.preview_text = result.preview;
                self.transcript.clear();
            }
            Err(err) => {
                log::warn!("Upload failed: {}", err);
                self.set_status(StatusLine::error(err.user_message(UPLOAD_FAILED_MESSAGE)));
            }
        }
    }

    /// Appends the user's question and locks the send control.
    ///
    /// Returns the trimmed question to send. Nothing changes when the
    /// question is blank or a previous one is still outstanding.
    pub fn begin_question(&mut self) -> Result<String, ValidationError> {
        if !self.send_enabled {
            return Err(ValidationError::RequestInFlight);
        }

        let question = self.question.trim();
        if question.is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }

        let question = question.to_string();
        self.append(Role::User, question.clone());
        self.question.clear();
        self.send_enabled = false;
        Ok(question)
    }

    pub fn settle_question(&mut self, outcome: Result<AskResult, RequestError>) {
        match outcome {
            Ok(result) => self.append(Role::Assistant, result.answer),
            Err(err) => {
                log::warn!("Question failed: {}", err);
                let message = err.user_message(ASK_FAILED_MESSAGE);
                self.append(Role::Assistant, format!("{}{}", ERROR_PREFIX, message));
            }
        }
        self.send_enabled = true;
    }

    fn append(&mut self, role: Role, content: String) {
        self.transcript.push(ChatMessage { role, content });
    }
}

/// Something the user did on the page.
#[derive(Debug, Clone)]
pub enum Intent {
    SelectFile(Option<SelectedFile>),
    /// The chosen file could not be read; carries the reason.
    SelectionFailed(String),
    EditQuestion(String),
    /// Upload action with the file selected at that moment.
    UploadRequested(Option<SelectedFile>),
    /// Send action (or Enter) with the question field's current text.
    QuestionSubmitted(String),
}

/// Projects a [`UiState`] onto some output.
pub trait View {
    fn render(&mut self, state: &UiState);
}

pub struct PageController<B, V> {
    state: UiState,
    backend: B,
    view: V,
}

impl<B: ReaderBackend, V: View> PageController<B, V> {
    pub fn new(backend: B, view: V) -> Self {
        Self {
            state: UiState::default(),
            backend,
            view,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub async fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::SelectFile(file) => {
                self.state.selected_file = file;
            }
            Intent::SelectionFailed(reason) => {
                self.state.selected_file = None;
                self.state.set_status(StatusLine::error(reason));
                self.view.render(&self.state);
            }
            Intent::EditQuestion(text) => {
                self.state.question = text;
            }
            Intent::UploadRequested(file) => {
                self.state.selected_file = file;
                self.submit_upload().await;
            }
            Intent::QuestionSubmitted(text) => {
                if self.state.send_enabled {
                    self.state.question = text;
                }
                self.submit_question().await;
            }
        }
    }

    pub async fn submit_upload(&mut self) {
        let file = self.state.begin_upload();
        self.view.render(&self.state);

        let file = match file {
            Ok(file) => file,
            Err(err) => {
                log::debug!("Upload not sent: {}", err);
                return;
            }
        };

        let outcome = self.backend.upload(&file).await;
        self.state.settle_upload(outcome);
        self.view.render(&self.state);
    }

    pub async fn submit_question(&mut self) {
        let question = match self.state.begin_question() {
            Ok(question) => question,
            Err(err) => {
                log::debug!("Question not sent: {}", err);
                return;
            }
        };
        self.view.render(&self.state);

        let outcome = self.backend.ask(&question).await;
        self.state.settle_question(outcome);
        self.view.render(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Clone)]
    enum Reply<T> {
        Ok(T),
        Rejected(u16, Option<&'static str>),
        Garbled,
    }

    impl<T> Reply<T> {
        fn into_result(self) -> Result<T, RequestError> {
            match self {
                Reply::Ok(value) => Ok(value),
                Reply::Rejected(status, message) => Err(RequestError::Rejected {
                    status,
                    message: message.map(str::to_string),
                }),
                Reply::Garbled => Err(serde_json::from_str::<serde_json::Value>("not json")
                    .unwrap_err()
                    .into()),
            }
        }
    }

    struct FakeBackend {
        upload_reply: Reply<UploadResult>,
        ask_reply: Reply<AskResult>,
        uploads: Mutex<Vec<String>>,
        questions: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn new(upload_reply: Reply<UploadResult>, ask_reply: Reply<AskResult>) -> Self {
            Self {
                upload_reply,
                ask_reply,
                uploads: Mutex::new(Vec::new()),
                questions: Mutex::new(Vec::new()),
            }
        }

        fn uploading(reply: Reply<UploadResult>) -> Self {
            Self::new(reply, Reply::Rejected(500, None))
        }

        fn answering(reply: Reply<AskResult>) -> Self {
            Self::new(Reply::Rejected(500, None), reply)
        }
    }

    #[async_trait]
    impl ReaderBackend for FakeBackend {
        async fn upload(&self, file: &SelectedFile) -> Result<UploadResult, RequestError> {
            self.uploads.lock().unwrap().push(file.name.clone());
            self.upload_reply.clone().into_result()
        }

        async fn ask(&self, question: &str) -> Result<AskResult, RequestError> {
            self.questions.lock().unwrap().push(question.to_string());
            self.ask_reply.clone().into_result()
        }
    }

    #[derive(Default)]
    struct RecordingView {
        frames: Vec<UiState>,
    }

    impl View for RecordingView {
        fn render(&mut self, state: &UiState) {
            self.frames.push(state.clone());
        }
    }

    fn report() -> SelectedFile {
        SelectedFile::new("report.pdf", b"%PDF-1.4".to_vec())
    }

    fn parsed() -> Reply<UploadResult> {
        Reply::Ok(UploadResult {
            message: "已解析 3 頁".to_string(),
            preview: "第一頁內容…".to_string(),
        })
    }

    fn entry(role: Role, content: &str) -> ChatMessage {
        ChatMessage::new(role, content)
    }

    #[tokio::test]
    async fn upload_without_file_makes_no_request() {
        let mut page = PageController::new(FakeBackend::uploading(parsed()), RecordingView::default());

        page.dispatch(Intent::UploadRequested(None)).await;

        assert!(page.backend.uploads.lock().unwrap().is_empty());
        assert_eq!(page.state().status, StatusLine::error(CHOOSE_FILE_MESSAGE));
        assert!(!page.state().preview_visible);
        assert!(!page.state().chat_visible);
    }

    #[tokio::test]
    async fn repeated_upload_without_file_redraws_status() {
        let mut page = PageController::new(FakeBackend::uploading(parsed()), RecordingView::default());

        page.submit_upload().await;
        page.submit_upload().await;

        let frames = &page.view().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].status, frames[1].status);
        assert!(frames[1].status_revision > frames[0].status_revision);
    }

    #[tokio::test]
    async fn successful_upload_shows_preview_and_empty_chat() {
        let mut page = PageController::new(FakeBackend::uploading(parsed()), RecordingView::default());
        page.state.transcript.push(entry(Role::User, "old question"));

        page.dispatch(Intent::UploadRequested(Some(report()))).await;

        let state = page.state();
        assert_eq!(*page.backend.uploads.lock().unwrap(), vec!["report.pdf".to_string()]);
        assert_eq!(state.status, StatusLine::success("已解析 3 頁"));
        assert!(state.preview_visible);
        assert!(state.chat_visible);
        assert_eq!(state.preview_text, "第一頁內容…");
        assert!(state.transcript.is_empty());
        assert!(state.document_loaded());

        let in_progress = &page.view().frames[0];
        assert_eq!(in_progress.status, StatusLine::neutral(UPLOADING_MESSAGE));
    }

    #[tokio::test]
    async fn failed_upload_keeps_previous_document() {
        let mut page = PageController::new(
            FakeBackend::uploading(Reply::Rejected(400, Some("No PDF file uploaded."))),
            RecordingView::default(),
        );
        page.state.preview_visible = true;
        page.state.chat_visible = true;
        page.state.preview_text = "earlier".to_string();
        page.state.transcript.push(entry(Role::User, "kept"));

        page.dispatch(Intent::UploadRequested(Some(report()))).await;

        let state = page.state();
        assert_eq!(state.status, StatusLine::error("No PDF file uploaded."));
        assert!(state.preview_visible);
        assert!(state.chat_visible);
        assert_eq!(state.preview_text, "earlier");
        assert_eq!(state.transcript.len(), 1);
    }

    #[tokio::test]
    async fn failed_upload_without_message_uses_fallback() {
        let mut page = PageController::new(
            FakeBackend::uploading(Reply::Rejected(500, None)),
            RecordingView::default(),
        );

        page.dispatch(Intent::UploadRequested(Some(report()))).await;

        assert_eq!(page.state().status, StatusLine::error(UPLOAD_FAILED_MESSAGE));
        assert!(!page.state().preview_visible);
    }

    #[tokio::test]
    async fn blank_question_is_ignored() {
        let mut page = PageController::new(
            FakeBackend::answering(Reply::Ok(AskResult {
                answer: "unused".to_string(),
            })),
            RecordingView::default(),
        );

        page.dispatch(Intent::QuestionSubmitted("   \t ".to_string())).await;

        assert!(page.state().transcript.is_empty());
        assert_eq!(page.state().question, "   \t ");
        assert!(page.state().send_enabled);
        assert!(page.backend.questions.lock().unwrap().is_empty());
        assert!(page.view().frames.is_empty());
    }

    #[tokio::test]
    async fn answered_question_appends_two_entries() {
        let mut page = PageController::new(
            FakeBackend::answering(Reply::Ok(AskResult {
                answer: "這是一篇關於…".to_string(),
            })),
            RecordingView::default(),
        );

        page.dispatch(Intent::QuestionSubmitted("  這篇文章在說什麼？\n".to_string())).await;

        assert_eq!(
            page.state().transcript,
            vec![
                entry(Role::User, "這篇文章在說什麼？"),
                entry(Role::Assistant, "這是一篇關於…"),
            ]
        );
        assert_eq!(page.state().question, "");
        assert!(page.state().send_enabled);
        assert_eq!(
            *page.backend.questions.lock().unwrap(),
            vec!["這篇文章在說什麼？".to_string()]
        );

        // Drawn before the request settled.
        let pending = &page.view().frames[0];
        assert_eq!(pending.transcript, vec![entry(Role::User, "這篇文章在說什麼？")]);
        assert_eq!(pending.question, "");
        assert!(!pending.send_enabled);
    }

    #[tokio::test]
    async fn rejected_question_appends_error_entry() {
        let mut page = PageController::new(
            FakeBackend::answering(Reply::Rejected(400, Some("No PDF uploaded yet."))),
            RecordingView::default(),
        );

        page.dispatch(Intent::QuestionSubmitted("hello".to_string())).await;

        assert_eq!(
            page.state().transcript,
            vec![
                entry(Role::User, "hello"),
                entry(Role::Assistant, "錯誤：No PDF uploaded yet."),
            ]
        );
        assert!(page.state().send_enabled);
    }

    #[tokio::test]
    async fn garbled_response_reports_parse_message() {
        let mut page = PageController::new(
            FakeBackend::answering(Reply::Garbled),
            RecordingView::default(),
        );

        page.dispatch(Intent::QuestionSubmitted("hello".to_string())).await;

        let last = page.state().transcript.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.content.starts_with(ERROR_PREFIX));
        assert!(last.content.len() > ERROR_PREFIX.len());
        assert!(page.state().send_enabled);
    }

    #[tokio::test]
    async fn edited_question_is_sent_on_submit() {
        let mut page = PageController::new(
            FakeBackend::answering(Reply::Ok(AskResult {
                answer: "ok".to_string(),
            })),
            RecordingView::default(),
        );

        page.dispatch(Intent::EditQuestion("draft".to_string())).await;
        assert_eq!(page.state().question, "draft");
        page.submit_question().await;

        assert_eq!(*page.backend.questions.lock().unwrap(), vec!["draft".to_string()]);
    }

    #[test]
    fn busy_state_rejects_second_question() {
        let mut state = UiState {
            question: "second".to_string(),
            send_enabled: false,
            ..UiState::default()
        };

        assert_eq!(state.begin_question(), Err(ValidationError::RequestInFlight));
        assert_eq!(state.question, "second");
        assert!(state.transcript.is_empty());
    }

    #[test]
    fn settle_reenables_send_after_failure() {
        let mut state = UiState {
            question: "q".to_string(),
            ..UiState::default()
        };
        state.begin_question().unwrap();
        assert!(!state.send_enabled);

        state.settle_question(Err(RequestError::Rejected {
            status: 500,
            message: None,
        }));

        assert!(state.send_enabled);
        assert_eq!(
            state.transcript.last().unwrap().content,
            format!("{}{}", ERROR_PREFIX, ASK_FAILED_MESSAGE)
        );
    }

    #[tokio::test]
    async fn unreadable_selection_clears_file() {
        let mut page = PageController::new(FakeBackend::uploading(parsed()), RecordingView::default());
        page.dispatch(Intent::SelectFile(Some(report()))).await;

        page.dispatch(Intent::SelectionFailed("missing.pdf: not found".to_string()))
            .await;
        page.submit_upload().await;

        assert!(page.state().selected_file.is_none());
        assert_eq!(page.state().status, StatusLine::error(CHOOSE_FILE_MESSAGE));
        assert!(page.backend.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_reads_file_name_and_bytes() {
        let path = std::env::temp_dir().join(format!("reader-open-{}.pdf", std::process::id()));
        tokio::fs::write(&path, b"%PDF-1.7").await.unwrap();

        let file = SelectedFile::open(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(file.name, path.file_name().unwrap().to_string_lossy());
        assert_eq!(file.bytes, b"%PDF-1.7");
    }
}
