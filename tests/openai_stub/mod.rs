use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

/// What the stub answers to one `/v1/responses` call.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum StubReply {
    Text(String),
    Refusal(String),
    ContentFilter,
    Status(u16, String),
}

type Responder = Arc<dyn Fn(&str) -> StubReply + Send + Sync>;

pub struct OpenAiStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl OpenAiStub {
    /// Spawns a stub whose reply is chosen from the request's `input` prompt.
    pub fn spawn(respond: impl Fn(&str) -> StubReply + Send + Sync + 'static) -> Self {
        let respond: Responder = Arc::new(respond);
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start openai stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/v1");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                if request.method() != &tiny_http::Method::Post || path != "/v1/responses" {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }

                let authorized = request.headers().iter().any(|h| {
                    h.field.equiv("Authorization") && h.value.as_str().starts_with("Bearer ")
                });
                if !authorized {
                    let _ = request.respond(
                        tiny_http::Response::from_string(
                            r#"{"error":{"message":"missing bearer token"}}"#,
                        )
                        .with_status_code(401),
                    );
                    continue;
                }

                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid request body")
                            .with_status_code(400),
                    );
                    continue;
                }

                let parsed: Value = match serde_json::from_str(&body) {
                    Ok(value) => value,
                    Err(_) => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("invalid json").with_status_code(400),
                        );
                        continue;
                    }
                };
                let prompt = parsed
                    .get("input")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_owned();
                let model = parsed
                    .get("model")
                    .cloned()
                    .unwrap_or(Value::String("stub-model".to_owned()));
                recorded.lock().expect("lock requests").push(parsed);

                let (status, response_body) = match respond(&prompt) {
                    StubReply::Text(text) => (200, message(&model, "completed", serde_json::json!([
                        { "type": "output_text", "text": text }
                    ]))),
                    StubReply::Refusal(reason) => (200, message(&model, "completed", serde_json::json!([
                        { "type": "refusal", "refusal": reason }
                    ]))),
                    StubReply::ContentFilter => {
                        let mut body = message(&model, "incomplete", serde_json::json!([]));
                        body["incomplete_details"] = serde_json::json!({ "reason": "content_filter" });
                        (200, body)
                    }
                    StubReply::Status(code, message) => {
                        (code, serde_json::json!({ "error": { "message": message } }))
                    }
                };

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(response_body.to_string())
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Request bodies received so far, in arrival order.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("lock requests").clone()
    }
}

impl Drop for OpenAiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn message(model: &Value, status: &str, content: Value) -> Value {
    serde_json::json!({
        "id": "resp_stub",
        "object": "response",
        "status": status,
        "model": model,
        "output": [
            {
                "type": "message",
                "role": "assistant",
                "content": content
            }
        ]
    })
}
