use crate::deepseek_service::AnswerError;
use crate::session::AppState;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use pdf_reader::{AskRequest, AskResult, ErrorPayload, UploadResult};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "PDF uploaded successfully.";

type ApiError = (StatusCode, Json<ErrorPayload>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn reject(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorPayload::new(message)))
}

/// `POST /upload`: multipart form with a `file` field holding the PDF.
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadResult> {
    let no_file = || reject(StatusCode::BAD_REQUEST, "No PDF file uploaded.");
    let mut multipart = multipart.map_err(|_| no_file())?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        reject(
            StatusCode::BAD_REQUEST,
            format!("Failed to read upload: {}", e),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            reject(
                StatusCode::BAD_REQUEST,
                format!("Failed to read upload: {}", e),
            )
        })?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload
        .filter(|(filename, _)| !filename.is_empty())
        .ok_or_else(no_file)?;

    let document = state
        .processor
        .process_pdf(filename, bytes.to_vec())
        .await
        .map_err(|e| {
            log::error!("Failed to parse PDF: {}", e);
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to parse PDF: {}", e),
            )
        })?;

    let preview = state.processor.preview(&document);
    state.session.write().await.load(document);

    Ok(Json(UploadResult {
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        preview,
    }))
}

/// `POST /ask`: answers a question about the loaded document.
///
/// The body is read leniently; anything that is not a JSON object with a
/// `question` string counts as an empty question.
pub async fn ask_question(State(state): State<AppState>, body: Bytes) -> ApiResult<AskResult> {
    let (document_id, context, history) = {
        let session = state.session.read().await;
        // A PDF without extractable text counts as no upload.
        let Some(document) = session
            .document
            .as_ref()
            .filter(|document| !document.content.is_empty())
        else {
            return Err(reject(StatusCode::BAD_REQUEST, "No PDF uploaded yet."));
        };
        (
            document.id.clone(),
            state.processor.context(document),
            session.history.clone(),
        )
    };

    let request: AskRequest = serde_json::from_slice(&body).unwrap_or_default();
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Question cannot be empty."));
    }

    log::info!(
        "Answering question about {} with {} earlier messages",
        document_id,
        history.len()
    );

    let answer = state
        .deepseek
        .generate_answer(&context, &history, &question)
        .await
        .map_err(answer_error)?;

    let recorded = state
        .session
        .write()
        .await
        .record_exchange(&document_id, question, answer.clone());
    if !recorded {
        log::warn!("Document {} was replaced while answering; exchange not kept", document_id);
    }

    Ok(Json(AskResult { answer }))
}

pub async fn not_found() -> ApiError {
    reject(StatusCode::NOT_FOUND, "Not found.")
}

fn answer_error(err: AnswerError) -> ApiError {
    let payload = match &err {
        AnswerError::Upstream { status, body } => {
            log::error!("{} (status {})", err, status);
            ErrorPayload::new(err.to_string()).with_details(body.clone())
        }
        _ => {
            log::error!("{}", err);
            ErrorPayload::new(err.to_string())
        }
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload))
}
