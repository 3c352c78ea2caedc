use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[derive(Clone, Copy)]
pub enum Reply {
    Answer(&'static str),
    Status(u16, &'static str),
    Raw(&'static str),
}

pub struct SeenRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

pub type Seen = Arc<Mutex<Vec<SeenRequest>>>;

/// Stand-in for the chat completions endpoint.
pub fn deepseek_stub(reply: Reply) -> (Router, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();

    let router = Router::new().route(
        "/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(SeenRequest {
                    authorization: headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body,
                });
                respond(reply)
            }
        }),
    );

    (router, seen)
}

fn respond(reply: Reply) -> Response {
    match reply {
        Reply::Answer(answer) => Json(json!({
            "choices": [{"message": {"role": "assistant", "content": answer}}]
        }))
        .into_response(),
        Reply::Status(status, body) => {
            (StatusCode::from_u16(status).unwrap(), body.to_string()).into_response()
        }
        Reply::Raw(body) => (StatusCode::OK, body.to_string()).into_response(),
    }
}
