//! Web dashboard
//!
//! # Endpoints
//!
//! ## Dashboard (HTML forms, redirect back to `/`)
//! - `GET /` - Rendered dashboard
//! - `POST /upload` - Upload pasted source (`file_name`, `source`)
//! - `POST /upload/file` - Upload a chosen file (multipart field `file`)
//! - `POST /functions/explain` - Explain a function
//! - `POST /functions/ask` - Ask a question about a function
//! - `POST /functions/more` - Show details of a function
//! - `POST /functions/close` - Close a function's panels
//! - `POST /improvements` - Ask for improvement suggestions for the whole file
//!
//! ## JSON API
//! - `GET /api/view` - Current view
//! - `POST /api/events` - Apply an event, returns the new view
//! - `GET /health` - Liveness probe
//!
//! All events go through one mutex, so user actions are applied strictly one
//! after another. Dispatch may block on the inference service and therefore
//! runs on the blocking thread pool.

use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::explain::ExplanationService;
use crate::metrics::MetricsService;
use crate::schema::{DefinitionId, DefinitionKind};
use crate::session::{dispatch, render, AppState, Event, FunctionPanel, MetricsView, PanelView, View};

/// Address the dashboard listens on
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// State shared by all handlers
pub struct Dashboard {
    app: Mutex<AppState>,
    explainer: Arc<dyn ExplanationService>,
    metrics: Arc<dyn MetricsService>,
}

impl Dashboard {
    pub fn new(explainer: Arc<dyn ExplanationService>, metrics: Arc<dyn MetricsService>) -> Self {
        Self {
            app: Mutex::new(AppState::new()),
            explainer,
            metrics,
        }
    }

    /// Apply an event and render the resulting state
    pub fn apply(&self, event: Event) -> View {
        let mut app = self.app.lock();
        dispatch(&mut app, event, self.explainer.as_ref(), self.metrics.as_ref());
        render(&app)
    }

    pub fn view(&self) -> View {
        render(&self.app.lock())
    }
}

/// Errors returned by the dashboard's handlers
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        let body = ErrorResponse {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type Shared = Arc<Dashboard>;

#[derive(Debug, Deserialize)]
pub struct UploadForm {
    pub file_name: String,
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct TargetForm {
    pub kind: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl TargetForm {
    fn id(&self) -> Result<DefinitionId, ServerError> {
        target_id(&self.kind, self.start_line, self.end_line)
    }
}

// urlencoded forms cannot flatten numeric fields, so the target is repeated
#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub kind: String,
    pub start_line: usize,
    pub end_line: usize,
    pub question: String,
}

fn target_id(kind: &str, start_line: usize, end_line: usize) -> Result<DefinitionId, ServerError> {
    let kind = DefinitionKind::parse(kind)
        .ok_or_else(|| ServerError::BadRequest(format!("unknown definition kind: {}", kind)))?;
    Ok(DefinitionId {
        kind,
        start_line,
        end_line,
    })
}

async fn run_event(dashboard: Shared, event: Event) -> Result<View, ServerError> {
    tokio::task::spawn_blocking(move || dashboard.apply(event))
        .await
        .map_err(|e| ServerError::Internal(format!("event handler panicked: {}", e)))
}

async fn index(State(dashboard): State<Shared>) -> Html<String> {
    Html(render_html(&dashboard.view()))
}

/// Browsers send form text with CRLF line breaks
fn upload_event(file_name: &str, source: &str) -> Event {
    let file_name = match file_name.trim() {
        "" => "upload.py".to_string(),
        name => name.to_string(),
    };
    Event::Upload {
        file_name,
        source: source.replace("\r\n", "\n"),
    }
}

async fn upload(
    State(dashboard): State<Shared>,
    Form(form): Form<UploadForm>,
) -> Result<Redirect, ServerError> {
    run_event(dashboard, upload_event(&form.file_name, &form.source)).await?;
    Ok(Redirect::to("/"))
}

async fn upload_file(
    State(dashboard): State<Shared>,
    mut multipart: Multipart,
) -> Result<Redirect, ServerError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        ServerError::BadRequest(format!("malformed upload: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(malformed)?;
        let source = std::str::from_utf8(&bytes).map_err(|_| {
            ServerError::BadRequest(format!("{} is not UTF-8 text", file_name))
        })?;

        tracing::debug!(file = %file_name, bytes = bytes.len(), "file uploaded");
        run_event(dashboard, upload_event(&file_name, source)).await?;
        return Ok(Redirect::to("/"));
    }

    Err(ServerError::BadRequest("upload has no `file` field".to_string()))
}

async fn explain(
    State(dashboard): State<Shared>,
    Form(form): Form<TargetForm>,
) -> Result<Redirect, ServerError> {
    run_event(dashboard, Event::RequestExplanation { id: form.id()? }).await?;
    Ok(Redirect::to("/"))
}

async fn ask(
    State(dashboard): State<Shared>,
    Form(form): Form<AskForm>,
) -> Result<Redirect, ServerError> {
    let event = Event::RequestAnswer {
        id: target_id(&form.kind, form.start_line, form.end_line)?,
        question: form.question,
    };
    run_event(dashboard, event).await?;
    Ok(Redirect::to("/"))
}

async fn more(
    State(dashboard): State<Shared>,
    Form(form): Form<TargetForm>,
) -> Result<Redirect, ServerError> {
    run_event(dashboard, Event::RequestMore { id: form.id()? }).await?;
    Ok(Redirect::to("/"))
}

async fn close(
    State(dashboard): State<Shared>,
    Form(form): Form<TargetForm>,
) -> Result<Redirect, ServerError> {
    run_event(dashboard, Event::ClosePanels { id: form.id()? }).await?;
    Ok(Redirect::to("/"))
}

async fn improvements(State(dashboard): State<Shared>) -> Result<Redirect, ServerError> {
    run_event(dashboard, Event::RequestImprovements).await?;
    Ok(Redirect::to("/"))
}

async fn api_view(State(dashboard): State<Shared>) -> Json<View> {
    Json(dashboard.view())
}

async fn api_event(
    State(dashboard): State<Shared>,
    Json(event): Json<Event>,
) -> Result<Json<View>, ServerError> {
    Ok(Json(run_event(dashboard, event).await?))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Build the dashboard router
pub fn build_router(dashboard: Shared) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/upload/file", post(upload_file))
        .route("/functions/explain", post(explain))
        .route("/functions/ask", post(ask))
        .route("/functions/more", post(more))
        .route("/functions/close", post(close))
        .route("/improvements", post(improvements))
        .route("/api/view", get(api_view))
        .route("/api/events", post(api_event))
        .route("/health", get(health))
        .with_state(dashboard)
}

/// Serve the dashboard until Ctrl-C
pub async fn serve(config: ServerConfig, dashboard: Dashboard) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("dashboard listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(Arc::new(dashboard)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl-C, shutting down");
}

// ============================================================================
// HTML rendering
// ============================================================================

const STYLE: &str = "body{font-family:Arial,sans-serif;margin:0;display:flex;color:#212529}\
nav{width:220px;padding:15px;background:#f8f9fa;min-height:100vh}\
nav a{display:block;padding:6px 0;color:#212529;text-decoration:none}\
main{flex:1;padding:20px 40px;max-width:1000px}\
pre{background:#f6f8fa;padding:10px;overflow-x:auto}\
.warn{color:#8a6d3b}.ok{color:#2e7d32}.err{color:#c62828}\
form.inline{display:inline}table{border-collapse:collapse}\
td,th{border:1px solid #ddd;padding:4px 8px}";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a view as a full HTML page
pub fn render_html(view: &View) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Code Analysis</title><style>{}</style></head><body>",
        STYLE
    );

    out.push_str("<nav><h3>Navigation</h3>");
    for anchor in ["Introduction", "Functions", "Complexity", "Maintainability", "Recommendations"] {
        let _ = write!(out, "<a href=\"#{0}\">{0}</a>", anchor);
    }
    if let Some(sidebar) = &view.sidebar {
        out.push_str("<h3>Code Info</h3><ul>");
        if let Some(raw) = &sidebar.raw {
            let _ = write!(
                out,
                "<li><strong>Lines of Code:</strong> {}</li><li><strong>Logical Lines of Code:</strong> {}</li>\
                 <li><strong>Comments:</strong> {}</li><li><strong>Multi-line Strings (Docstrings):</strong> {}</li>",
                raw.loc, raw.lloc, raw.comments, raw.multi
            );
        }
        let _ = write!(
            out,
            "<li><strong>Number of Functions:</strong> {}</li><li><strong>Number of Classes:</strong> {}</li></ul>",
            sidebar.functions, sidebar.classes
        );
    }
    out.push_str("</nav><main>");

    out.push_str("<h1 id=\"Introduction\">Code Analysis</h1>");
    out.push_str("<p>Analyze the complexity of your Python code for better readability and maintainability.</p>");
    out.push_str(
        "<form method=\"post\" action=\"/upload/file\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" accept=\".py,.pyi\" required> \
         <button type=\"submit\">Analyze file</button></form>",
    );
    let _ = write!(
        out,
        "<details><summary>or paste source</summary>\
         <form method=\"post\" action=\"/upload\"><input name=\"file_name\" placeholder=\"file name\" value=\"{}\"><br>\
         <textarea name=\"source\" rows=\"10\" cols=\"90\" placeholder=\"Paste a Python file\"></textarea><br>\
         <button type=\"submit\">Analyze</button></form></details>",
        escape(view.file_name.as_deref().unwrap_or(""))
    );

    if let Some(failure) = &view.failure {
        let _ = write!(out, "<p class=\"err\">{}</p>", escape(failure));
    }

    if let Some(source) = &view.source {
        let _ = write!(
            out,
            "<details><summary><strong>Show Code</strong></summary><pre>{}</pre></details>",
            escape(source)
        );
    }

    if view.file_name.is_some() {
        out.push_str("<hr><h2 id=\"Functions\">Functions</h2>");
        if view.functions.is_empty() {
            out.push_str("<p>No functions found in the uploaded code.</p>");
        }
        for function in &view.functions {
            render_function(&mut out, function);
        }
    }

    match &view.metrics {
        Some(MetricsView::Ready {
            complexity,
            high_complexity,
            threshold,
            maintainability,
            grade,
            needs_refactor,
            recommendation,
            advice,
        }) => {
            out.push_str("<h2 id=\"Complexity\">Cyclomatic Complexity</h2>");
            if complexity.is_empty() {
                out.push_str("<p>No functions or classes detected.</p>");
            } else {
                out.push_str("<table><tr><th>Name</th><th>Complexity</th></tr>");
                for entry in complexity {
                    let _ = write!(
                        out,
                        "<tr><td>{}</td><td>{}</td></tr>",
                        escape(&entry.name),
                        entry.score
                    );
                }
                out.push_str("</table>");
                if high_complexity.is_empty() {
                    out.push_str("<p class=\"ok\">No functions with high complexity found.</p>");
                } else {
                    let _ = write!(
                        out,
                        "<p class=\"warn\">Functions with high complexity (over {}):</p><ul>",
                        threshold
                    );
                    for entry in high_complexity {
                        let _ = write!(out, "<li>{}: {}</li>", escape(&entry.name), entry.score);
                    }
                    out.push_str("</ul>");
                }
            }

            let _ = write!(
                out,
                "<h2 id=\"Maintainability\">Maintainability Index</h2><p>Maintainability Index: {:.2} ({})</p>",
                maintainability, grade
            );

            let _ = write!(
                out,
                "<h2 id=\"Recommendations\">Recommendations</h2><p class=\"{}\">{}</p><p>{}</p>",
                if *needs_refactor { "warn" } else { "ok" },
                escape(recommendation),
                escape(advice)
            );
        }
        Some(MetricsView::Failed { message }) => {
            let _ = write!(
                out,
                "<h2 id=\"Complexity\">Metrics</h2><p class=\"err\">Metrics unavailable: {}</p>",
                escape(message)
            );
        }
        None => {}
    }

    if view.file_name.is_some() {
        out.push_str(
            "<form method=\"post\" action=\"/improvements\"><button type=\"submit\">Suggest improvements</button></form>",
        );
    }
    if let Some(panel) = &view.improvements {
        render_panel(&mut out, panel);
    }

    out.push_str("</main></body></html>");
    out
}

fn target_fields(function: &FunctionPanel) -> String {
    format!(
        "<input type=\"hidden\" name=\"kind\" value=\"{}\"><input type=\"hidden\" name=\"start_line\" value=\"{}\">\
         <input type=\"hidden\" name=\"end_line\" value=\"{}\">",
        function.id.kind.as_str(),
        function.id.start_line,
        function.id.end_line
    )
}

fn render_function(out: &mut String, function: &FunctionPanel) {
    let fields = target_fields(function);
    let _ = write!(
        out,
        "<h3>{}</h3><pre>{}</pre>",
        escape(&function.qualified_name),
        escape(&function.source)
    );
    let _ = write!(
        out,
        "<form class=\"inline\" method=\"post\" action=\"/functions/explain\">{0}<button>Explain</button></form> \
         <form class=\"inline\" method=\"post\" action=\"/functions/more\">{0}<button>More</button></form> \
         <form class=\"inline\" method=\"post\" action=\"/functions/ask\">{0}<input name=\"question\" placeholder=\"Ask...\"><button>Ask</button></form> \
         <form class=\"inline\" method=\"post\" action=\"/functions/close\">{0}<button>Close</button></form>",
        fields
    );

    if let Some(explanation) = &function.explanation {
        out.push_str("<details open><summary>Explanation</summary>");
        render_panel(out, explanation);
        for (key, value) in function.metadata.fields() {
            let _ = write!(out, "<p><strong>{}:</strong> {}</p>", key, escape(&value));
        }
        out.push_str("</details>");
    }

    if let Some(details) = &function.details {
        let json = serde_json::to_string_pretty(details).unwrap_or_default();
        let _ = write!(
            out,
            "<details open><summary>More about this Function</summary><pre>{}</pre></details>",
            escape(&json)
        );
    }

    if let Some(answer) = &function.answer {
        let _ = write!(
            out,
            "<details open><summary>Show Answer</summary><h4>{}</h4>",
            escape(&answer.question)
        );
        render_panel(out, &answer.content);
        out.push_str("</details>");
    }
    out.push_str("<hr>");
}

fn render_panel(out: &mut String, panel: &PanelView) {
    match panel {
        PanelView::Ready { text } => {
            let _ = write!(out, "<pre>{}</pre>", escape(text));
        }
        PanelView::Failed { message } => {
            let _ = write!(out, "<p class=\"err\">{}</p>", escape(message));
        }
    }
}
