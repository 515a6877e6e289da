use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::app::model::{
    ErrorBody, FinalizeBookRequest, FinalizeBookResponse, FinalizePlanningRequest,
    GenerateRequest, StartPlanningRequest, WriteChaptersRequest, WriteChaptersResponse,
};
use crate::chapters::WriteOptions;
use crate::config::Config;
use crate::generation::{GenerationError, ProviderClient};
use crate::interaction::AutoApprove;
use crate::planning::PlanningDraft;
use crate::project::{ParagraphBounds, Project};
use crate::render::{Format, style};
use crate::workflow::{PlanRequest, Workflow};

#[derive(Clone)]
pub struct AppState {
    workflow: Arc<Workflow>,
    /// Set when a credential is configured; required by `/api/generate`.
    provider: Option<ProviderClient>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let provider = match config.api_key.as_deref() {
            Some(api_key) => Some(ProviderClient::new(
                &config.base_url,
                api_key,
                Duration::from_secs(config.timeout_secs),
            )?),
            None => None,
        };
        let workflow = Workflow::new(config)?;
        Ok(Self::with_parts(workflow, provider))
    }

    pub fn with_parts(workflow: Workflow, provider: Option<ProviderClient>) -> Self {
        Self {
            workflow: Arc::new(workflow),
            provider,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!("request failed: {err:#}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
}

pub fn router(state: AppState) -> Router {
    let artifacts = ServeDir::new(&state.workflow.config().output_dir);
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/projects", get(list_projects))
        .route("/api/projects/:name", get(get_project))
        .route("/api/projects/:name/chapters", post(write_chapters))
        .route("/api/projects/:name/finalize", post(finalize_book))
        .route("/api/planning/start", post(start_planning))
        .route("/api/planning/finalize", post(finalize_planning))
        .route("/api/generate", post(generate))
        .nest_service("/artifacts", artifacts)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html lang="en">
  <head><meta charset="utf-8"><title>bookforge</title></head>
  <body>
    <h1>bookforge</h1>
    <ul>
      <li><code>POST /api/planning/start</code></li>
      <li><code>POST /api/planning/finalize</code></li>
      <li><code>GET /api/projects</code></li>
      <li><code>POST /api/projects/{name}/chapters</code></li>
      <li><code>POST /api/projects/{name}/finalize</code></li>
      <li><code>POST /api/generate</code></li>
    </ul>
  </body>
</html>"#,
    )
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    state.workflow.list_projects().await.map(Json).map_err(internal)
}

async fn existing_project(state: &AppState, name: &str) -> Result<Project, ApiError> {
    state
        .workflow
        .load(name)
        .await
        .map_err(internal)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("project `{name}` not found")))
}

async fn get_project(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Project>, ApiError> {
    existing_project(&state, &name).await.map(Json)
}

async fn start_planning(
    State(state): State<AppState>,
    Json(req): Json<StartPlanningRequest>,
) -> Result<Json<PlanningDraft>, ApiError> {
    if req.theme.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "theme is required"));
    }
    state
        .workflow
        .start_planning(&req.theme)
        .await
        .map(Json)
        .map_err(internal)
}

async fn finalize_planning(
    State(state): State<AppState>,
    Json(req): Json<FinalizePlanningRequest>,
) -> Result<Json<Project>, ApiError> {
    let paragraph_bounds = ParagraphBounds::parse(&req.paragraphs)
        .map_err(|err| api_error(StatusCode::BAD_REQUEST, format!("{err:#}")))?;
    if req.chapter_count == 0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "chapter_count must be at least 1",
        ));
    }
    let request = PlanRequest {
        project: req.project,
        chapter_count: req.chapter_count,
        paragraph_bounds,
        with_introduction: true,
    };
    state
        .workflow
        .finish_planning(req.draft, &req.title, &request)
        .await
        .map(Json)
        .map_err(internal)
}

async fn write_chapters(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Option<Json<WriteChaptersRequest>>,
) -> Result<Json<WriteChaptersResponse>, ApiError> {
    let project = existing_project(&state, &name).await?;
    if project.plan.is_none() {
        return Err(api_error(
            StatusCode::CONFLICT,
            format!("project `{}` has no plan yet", project.name),
        ));
    }
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let options = WriteOptions {
        max_chapters: req.max_chapters,
    };
    let run = state
        .workflow
        .write_chapters(&project.name, options, &mut AutoApprove)
        .await
        .map_err(internal)?;
    Ok(Json(run.into()))
}

async fn finalize_book(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Option<Json<FinalizeBookRequest>>,
) -> Result<Json<FinalizeBookResponse>, ApiError> {
    let project = existing_project(&state, &name).await?;
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let style = style::lookup(req.style.as_deref().unwrap_or(style::DEFAULT_STYLE))
        .map_err(|err| api_error(StatusCode::BAD_REQUEST, format!("{err:#}")))?;
    let formats = match req.formats {
        Some(formats) if !formats.is_empty() => formats,
        _ => vec![Format::Md, Format::Docx],
    };
    let (outcome, report) = state
        .workflow
        .finalize_and_render(&project.name, style, &formats)
        .await
        .map_err(internal)?;
    Ok(Json(FinalizeBookResponse::new(outcome, &report)))
}

/// Thin relay to the provider: forwards `{model, prompt}` and returns the raw response.
async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, ApiError> {
    let Some(provider) = state.provider.as_ref() else {
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "provider credential is not configured",
        ));
    };
    if req.model.trim().is_empty() || req.prompt.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "model and prompt are required",
        ));
    }

    match provider.relay(req.model.trim(), &req.prompt).await {
        Ok(value) => Ok(Json(value).into_response()),
        Err(err) => {
            tracing::warn!(model = %req.model, "relay failed: {err}");
            let message = match err {
                GenerationError::Rejected { .. } => "provider rejected the request",
                GenerationError::Transport { .. } | GenerationError::Empty => {
                    "provider request failed"
                }
            };
            Err(api_error(StatusCode::BAD_GATEWAY, message))
        }
    }
}
