//! parley HTTP server.
//!
//! Exposes chat sessions and the host nodes over JSON:
//!
//! - `POST /chat_optimize/chat` runs one chat action
//! - `GET /chat_optimize/sessions/{session_id}` inspects a session
//! - `GET /chat_optimize/nodes` lists node descriptors
//! - `POST /chat_optimize/nodes/{class_name}` executes a node

pub mod config;
pub mod error;

use crate::config::ServerConfig;
use crate::error::ApiError;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parley_ai::BackendFactory;
use parley_conversation::{ChatReply, ControllerSettings, ConversationController, SessionStore};
use parley_nodes::{ChatRequest, NodeDescriptor, NodeOutput, NodeRegistry, run_chat};
use serde_json::{Value as JsonValue, json};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

/// Shared state for request handlers.
pub struct AppState {
    pub controller: ConversationController,
    pub registry: NodeRegistry,
    /// Model used when a chat request omits `model_name`.
    pub default_model: String,
    /// Base URL used when a chat request omits `base_url`.
    pub default_base_url: String,
}

impl AppState {
    /// Builds the session store, controller and node registry.
    #[must_use]
    pub fn new(config: &ServerConfig, backends: Arc<dyn BackendFactory>) -> Self {
        let controller = ConversationController::new(
            Arc::new(SessionStore::new()),
            backends,
            ControllerSettings {
                clean_responses: config.llm.clean_responses,
            },
        );
        Self {
            registry: NodeRegistry::with_chat_nodes(controller.clone()),
            controller,
            default_model: config.llm.default_model.clone(),
            default_base_url: config.llm.default_base_url.clone(),
        }
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/chat_optimize/chat", post(chat))
        .route("/chat_optimize/sessions/{session_id}", get(session))
        .route("/chat_optimize/nodes", get(list_nodes))
        .route("/chat_optimize/nodes/{class_name}", post(execute_node))
        .with_state(state);
    with_middleware(routes)
}

/// Adds request tracing and panic recovery to `routes`.
pub fn with_middleware(routes: Router) -> Router {
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// Serves `state` on `listener` until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if accepting connections fails.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("internal error: {detail}") })),
    )
        .into_response()
}

fn parse_body(body: &Bytes) -> Result<JsonValue, ApiError> {
    if body.is_empty() {
        return Ok(JsonValue::Null);
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest {
        message: format!("invalid JSON body: {e}"),
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatReply>, ApiError> {
    let mut fields = match parse_body(&body)? {
        JsonValue::Object(fields) => fields,
        other => {
            return Err(ApiError::BadRequest {
                message: format!("request body must be a JSON object, got {other}"),
            });
        }
    };
    fields
        .entry("model_name")
        .or_insert_with(|| state.default_model.clone().into());
    fields
        .entry("base_url")
        .or_insert_with(|| state.default_base_url.clone().into());

    let request: ChatRequest =
        serde_json::from_value(JsonValue::Object(fields)).map_err(|e| ApiError::BadRequest {
            message: format!("invalid chat request: {e}"),
        })?;

    let reply = run_chat(&state.controller, request)
        .await
        .map_err(|report| ApiError::BadRequest {
            message: report.to_string(),
        })?;

    Ok(Json(reply))
}

async fn session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    let snapshot = state
        .controller
        .store()
        .snapshot(&session_id)
        .await
        .ok_or_else(|| ApiError::NotFound {
            message: format!("session '{session_id}' not found"),
        })?;

    Ok(Json(json!({
        "session_id": session_id,
        "messages": snapshot.history,
        "readable_history": snapshot.history.transcript(),
        "created_at": snapshot.created_at.to_rfc3339(),
        "updated_at": snapshot.updated_at.to_rfc3339(),
    })))
}

async fn list_nodes(State(state): State<Arc<AppState>>) -> Json<JsonValue> {
    let nodes: Vec<&NodeDescriptor> = state.registry.descriptors().collect();
    Json(json!({
        "nodes": nodes,
        "display_names": state.registry.display_names(),
    }))
}

async fn execute_node(
    State(state): State<Arc<AppState>>,
    Path(class_name): Path<String>,
    body: Bytes,
) -> Result<Json<NodeOutput>, ApiError> {
    let inputs = parse_body(&body)?;
    let output = state.registry.execute(&class_name, inputs).await?;
    Ok(Json(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_ai::{ChatBackend, LlmError, Provider, ProviderConfig, SamplingParams};
    use parley_core::Message;
    use std::sync::Mutex;

    /// Echoes the last message, fails on "fail" and panics on "panic".
    #[derive(Default)]
    struct Scripted {
        models: Mutex<Vec<String>>,
    }

    struct ScriptedBackend;

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn generate(
            &self,
            history: &[Message],
            _sampling: &SamplingParams,
        ) -> Result<String, LlmError> {
            let last = history.last().map(|m| m.content.as_str()).unwrap_or("");
            match last {
                "panic" => panic!("backend exploded"),
                "fail" => Err(LlmError::Provider {
                    status: Some(503),
                    reason: "loading".to_string(),
                }),
                other => Ok(format!("echo: {other}")),
            }
        }

        fn provider(&self) -> Provider {
            Provider::Ollama
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    impl BackendFactory for Scripted {
        fn backend(&self, config: &ProviderConfig) -> Result<Box<dyn ChatBackend>, LlmError> {
            self.models.lock().unwrap().push(config.model().to_string());
            Ok(Box::new(ScriptedBackend))
        }
    }

    fn test_config() -> ServerConfig {
        serde_json::from_value(json!({})).expect("defaults")
    }

    async fn spawn(config: ServerConfig) -> (String, Arc<Scripted>) {
        let scripted = Arc::new(Scripted::default());
        let state = Arc::new(AppState::new(&config, scripted.clone()));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(serve(listener, state, std::future::pending()));
        (format!("http://{addr}"), scripted)
    }

    async fn post_json(url: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        let response = reqwest::Client::new()
            .post(url)
            .json(&body)
            .send()
            .await
            .expect("request");
        let status = StatusCode::from_u16(response.status().as_u16()).expect("status");
        (status, response.json().await.expect("json body"))
    }

    #[tokio::test]
    async fn chat_send_returns_reply_and_transcript() {
        let (base, scripted) = spawn(test_config()).await;

        let (status, body) = post_json(
            &format!("{base}/chat_optimize/chat"),
            json!({"user_message": "Hello", "session_id": "http-1"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "assistant_response": "echo: Hello",
                "readable_history": "User: Hello\n\nAssistant: echo: Hello\n\n"
            })
        );
        assert_eq!(scripted.models.lock().unwrap().as_slice(), ["llama3"]);
    }

    #[tokio::test]
    async fn configured_default_model_is_used() {
        let mut config = test_config();
        config.llm.default_model = "mistral".to_string();
        let (base, scripted) = spawn(config).await;

        post_json(
            &format!("{base}/chat_optimize/chat"),
            json!({"user_message": "hi"}),
        )
        .await;

        assert_eq!(scripted.models.lock().unwrap().as_slice(), ["mistral"]);
    }

    #[tokio::test]
    async fn provider_failure_is_reported_in_reply() {
        let (base, _) = spawn(test_config()).await;

        let (status, body) = post_json(
            &format!("{base}/chat_optimize/chat"),
            json!({"user_message": "fail"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response = body["assistant_response"].as_str().expect("string");
        assert!(response.starts_with("[chat error]"));
        assert_eq!(body["readable_history"], "User: fail\n\n");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (base, _) = spawn(test_config()).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/chat_optimize/chat"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .expect("request");

        assert_eq!(response.status().as_u16(), 400);
        let body: JsonValue = response.json().await.expect("json body");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn invalid_provider_config_is_bad_request() {
        let (base, _) = spawn(test_config()).await;

        let (status, body) = post_json(
            &format!("{base}/chat_optimize/chat"),
            json!({"user_message": "x", "llm_config": {"provider": "openai"}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = post_json(
            &format!("{base}/chat_optimize/chat"),
            json!({"user_message": "x", "llm_config": {"temperature": -1.0}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn session_endpoint_shows_history_without_creating() {
        let (base, _) = spawn(test_config()).await;
        let client = reqwest::Client::new();

        let missing = client
            .get(format!("{base}/chat_optimize/sessions/s9"))
            .send()
            .await
            .expect("request");
        assert_eq!(missing.status().as_u16(), 404);

        post_json(
            &format!("{base}/chat_optimize/chat"),
            json!({"user_message": "Hi", "session_id": "s9", "system_prompt": "Be kind."}),
        )
        .await;

        let body: JsonValue = client
            .get(format!("{base}/chat_optimize/sessions/s9"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json body");
        assert_eq!(body["session_id"], "s9");
        assert_eq!(
            body["messages"],
            json!([
                {"role": "system", "content": "Be kind."},
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "echo: Hi"}
            ])
        );
        assert_eq!(
            body["readable_history"],
            "System: Be kind.\n\nUser: Hi\n\nAssistant: echo: Hi\n\n"
        );
    }

    #[tokio::test]
    async fn nodes_are_listed_and_executable() {
        let (base, _) = spawn(test_config()).await;
        let client = reqwest::Client::new();

        let listing: JsonValue = client
            .get(format!("{base}/chat_optimize/nodes"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json body");
        assert_eq!(listing["display_names"]["LLMConfigNode"], "LLM Config");
        assert_eq!(listing["nodes"].as_array().map(Vec::len), Some(3));

        let (status, body) = post_json(
            &format!("{base}/chat_optimize/nodes/ChatHistoryViewer"),
            json!({"history": "User: hi\n\n"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ui"], json!({"text": ["User: hi\n\n"]}));

        let (status, _) =
            post_json(&format!("{base}/chat_optimize/nodes/Upscale"), json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = post_json(
            &format!("{base}/chat_optimize/nodes/LLMConfigNode"),
            json!({"top_p": 2.0}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn panic_becomes_json_500_and_server_survives() {
        let (base, _) = spawn(test_config()).await;
        let url = format!("{base}/chat_optimize/chat");

        let (status, body) =
            post_json(&url, json!({"user_message": "panic", "session_id": "p"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().unwrap_or_default();
        assert!(message.contains("backend exploded"), "got {message}");

        let (status, _) =
            post_json(&url, json!({"user_message": "still here", "session_id": "q"})).await;
        assert_eq!(status, StatusCode::OK);
    }
}
