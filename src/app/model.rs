use serde::{Deserialize, Serialize};

use crate::chapters::ChapterRun;
use crate::finalize::{FinalizeOutcome, FinalizeStatus};
use crate::planning::PlanningDraft;
use crate::project::Project;
use crate::render::{Format, RenderReport};

#[derive(Debug, Clone, Deserialize)]
pub struct StartPlanningRequest {
    pub theme: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalizePlanningRequest {
    pub draft: PlanningDraft,
    pub title: String,
    pub chapter_count: usize,
    /// `min-max`, e.g. `5-8`.
    pub paragraphs: String,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WriteChaptersRequest {
    #[serde(default)]
    pub max_chapters: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteChaptersResponse {
    pub created: Vec<u32>,
    pub checkpoint_errors: Vec<String>,
    pub cancelled: bool,
    pub complete: bool,
    pub project: Project,
}

impl From<ChapterRun> for WriteChaptersResponse {
    fn from(run: ChapterRun) -> Self {
        Self {
            created: run.created,
            checkpoint_errors: run.checkpoint_errors,
            cancelled: run.cancelled,
            complete: run.project.is_complete(),
            project: run.project,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinalizeBookRequest {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<Format>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactView {
    pub format: Format,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizeBookResponse {
    pub applied: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_error: Option<String>,
    pub artifacts: Vec<ArtifactView>,
    pub project: Project,
}

impl FinalizeBookResponse {
    /// Artifact URLs are relative to the `/artifacts/` mount.
    pub fn new(outcome: FinalizeOutcome, report: &RenderReport) -> Self {
        let artifacts = report
            .files
            .iter()
            .map(|file| ArtifactView {
                format: file.format,
                url: match (&file.error, file.path.file_name()) {
                    (None, Some(name)) => Some(format!("/artifacts/{}", name.to_string_lossy())),
                    _ => None,
                },
                error: file.error.clone(),
            })
            .collect();
        Self {
            applied: outcome.status == FinalizeStatus::Applied,
            status: outcome.status.to_string(),
            checkpoint_error: outcome.checkpoint_error,
            artifacts,
            project: outcome.project,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
