//! HTTP surface: the single chat page plus a small JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | The chat page |
//! | `GET`  | `/api/options` | Models, categories, stored documents, connection state |
//! | `POST` | `/api/ask` | Answer one question |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! A failed platform connection does not stop the server: it keeps serving
//! the page with the connection diagnostic, `/api/options` reports
//! `connected: false`, and `/api/ask` answers `503` without touching the
//! network.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `no_connection` (503).

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::chat::Assistant;
use crate::client::PlatformClient;
use crate::config::Config;
use crate::models::{AskOptions, CategoryFilter, DocLink, DocumentRefs, ModelId};

/// Shared application state. `assistant` is `None` when the startup
/// connection failed; every handler checks before issuing requests.
struct AppState {
    assistant: Option<Assistant<PlatformClient>>,
    connect_error: Option<String>,
}

/// Connect to the platform and serve the chat UI.
///
/// Connection failure is non-fatal: the server starts anyway and renders the
/// diagnostic instead of answering questions.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let (assistant, connect_error) = match PlatformClient::connect(config).await {
        Ok(client) => (
            Some(Assistant::new(client, config.retrieval.num_chunks)),
            None,
        ),
        Err(e) => {
            eprintln!("Failed to connect to the platform: {e:#}");
            eprintln!("Check the [credentials] section of your configuration.");
            (
                None,
                Some(format!(
                    "Failed to connect to the platform: {e:#}. \
                     Check the [credentials] section of your configuration."
                )),
            )
        }
    };

    let state = Arc::new(AppState {
        assistant,
        connect_error,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_page))
        .route("/api/options", get(handle_options))
        .route("/api/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    let bind_addr = config.server.bind.clone();
    println!("docchat listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// 503 used for every request made while no platform session exists.
fn no_connection(state: &AppState) -> AppError {
    AppError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        code: "no_connection".to_string(),
        message: state
            .connect_error
            .clone()
            .unwrap_or_else(|| "Platform connection not available".to_string()),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET / ============

async fn handle_page() -> Html<&'static str> {
    Html(PAGE_HTML)
}

// ============ GET /api/options ============

/// Everything the page needs to render its sidebar and document list.
#[derive(Serialize)]
struct OptionsResponse {
    connected: bool,
    connection_error: Option<String>,
    models: Vec<&'static str>,
    categories: Vec<String>,
    documents: Vec<String>,
    diagnostics: Vec<String>,
}

async fn handle_options(State(state): State<Arc<AppState>>) -> Json<OptionsResponse> {
    let models: Vec<&'static str> = ModelId::ALL.iter().map(|m| m.as_str()).collect();

    let Some(assistant) = &state.assistant else {
        return Json(OptionsResponse {
            connected: false,
            connection_error: state.connect_error.clone(),
            models,
            categories: vec![CategoryFilter::ALL_SENTINEL.to_string()],
            documents: Vec::new(),
            diagnostics: Vec::new(),
        });
    };

    let mut diagnostics = Vec::new();
    let (categories, category_diag) = assistant.categories().await;
    if let Some(d) = category_diag {
        diagnostics.push(d);
    }
    let (documents, document_diag) = assistant.documents().await;
    if let Some(d) = document_diag {
        diagnostics.push(d);
    }

    Json(OptionsResponse {
        connected: true,
        connection_error: None,
        models,
        categories,
        documents,
        diagnostics,
    })
}

// ============ POST /api/ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    model: Option<ModelId>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default = "default_use_context")]
    use_context: bool,
}

fn default_use_context() -> bool {
    true
}

#[derive(Serialize)]
struct AskResponse {
    answer: Option<String>,
    links: Vec<DocLink>,
    /// Referenced document paths; `null` when retrieval was disabled, which
    /// is distinct from an empty list.
    references: Option<Vec<String>>,
    diagnostics: Vec<String>,
    /// Raw context payload for the debug panel.
    context: Option<serde_json::Value>,
}

async fn handle_ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    if req.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    let assistant = state.assistant.as_ref().ok_or_else(|| no_connection(&state))?;

    let opts = AskOptions {
        model: req.model.unwrap_or_default(),
        category: req
            .category
            .as_deref()
            .map(CategoryFilter::from_selection)
            .unwrap_or(CategoryFilter::All),
        use_retrieval: req.use_context,
    };

    let outcome = assistant.ask(&req.question, &opts).await;

    let references = match &outcome.refs {
        DocumentRefs::Disabled => None,
        DocumentRefs::Paths(paths) => Some(paths.iter().cloned().collect()),
    };

    Ok(Json(AskResponse {
        answer: outcome.answer,
        links: outcome.links,
        references,
        diagnostics: outcome.diagnostics,
        context: outcome.context,
    }))
}

// ============ The page ============

const PAGE_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Document Chat Assistant</title>
<style>
  body { font-family: sans-serif; margin: 0; display: flex; }
  #sidebar { width: 260px; padding: 1rem; background: #f4f4f4; min-height: 100vh; }
  #main { flex: 1; padding: 1rem 2rem; max-width: 52rem; }
  select, input[type=text] { width: 100%; margin: 0.25rem 0 1rem; padding: 0.4rem; }
  #answer { white-space: pre-wrap; background: #fafafa; border: 1px solid #ddd;
            padding: 1rem; margin-top: 1rem; display: none; }
  .diag { color: #a00; margin: 0.5rem 0; }
  details { margin-top: 1rem; }
  pre { overflow-x: auto; background: #f0f0f0; padding: 0.5rem; }
  ul { padding-left: 1.2rem; }
</style>
</head>
<body>
<div id="sidebar">
  <label>Select your model:</label>
  <select id="model"></select>
  <label>Select what products you are looking for:</label>
  <select id="category"></select>
  <label><input type="checkbox" id="use-context" checked>
    Use your own documents as context?</label>
  <div id="related" style="display:none">
    <h4>Related Documents</h4>
    <ul id="links"></ul>
  </div>
  <details>
    <summary>Session State</summary>
    <pre id="debug">{}</pre>
  </details>
</div>
<div id="main">
  <h2>&#128172; Document Chat Assistant</h2>
  <p>This is the list of documents you already have and that will be used
     to answer your questions:</p>
  <ul id="documents"></ul>
  <div id="diagnostics"></div>
  <input type="text" id="question"
         placeholder="Is there any special lubricant to be used with the premium bike?">
  <div id="answer"></div>
</div>
<script>
const el = id => document.getElementById(id);

function showDiagnostics(messages) {
  el('diagnostics').innerHTML = '';
  for (const m of messages || []) {
    const d = document.createElement('div');
    d.className = 'diag';
    d.textContent = m;
    el('diagnostics').appendChild(d);
  }
}

async function loadOptions() {
  const res = await fetch('/api/options');
  const opts = await res.json();
  for (const m of opts.models) {
    el('model').add(new Option(m, m));
  }
  for (const c of opts.categories) {
    el('category').add(new Option(c, c));
  }
  for (const name of opts.documents) {
    const li = document.createElement('li');
    li.textContent = name;
    el('documents').appendChild(li);
  }
  const diags = (opts.diagnostics || []).slice();
  if (!opts.connected) {
    diags.push(opts.connection_error ||
      'Failed to connect to the platform. Check your credentials and try again.');
    el('question').disabled = true;
  }
  showDiagnostics(diags);
  el('debug').textContent = JSON.stringify(opts, null, 2);
}

async function ask() {
  const body = {
    question: el('question').value,
    model: el('model').value,
    category: el('category').value,
    use_context: el('use-context').checked,
  };
  const res = await fetch('/api/ask', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(body),
  });
  const out = await res.json();
  if (out.error) {
    showDiagnostics([out.error.message]);
    return;
  }
  showDiagnostics(out.diagnostics);
  el('answer').style.display = out.answer ? 'block' : 'none';
  el('answer').textContent = out.answer || '';
  el('links').innerHTML = '';
  el('related').style.display = out.links.length ? 'block' : 'none';
  for (const link of out.links) {
    const li = document.createElement('li');
    const a = document.createElement('a');
    a.href = link.url;
    a.textContent = link.label;
    a.target = '_blank';
    li.appendChild(a);
    el('links').appendChild(li);
  }
  el('debug').textContent = JSON.stringify(out.context || {}, null, 2);
}

el('question').addEventListener('keydown', e => {
  if (e.key === 'Enter' && el('question').value.trim()) ask();
});
loadOptions();
</script>
</body>
</html>
"#;
