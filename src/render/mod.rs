//! Turns a finished project into downloadable documents.

pub mod docx;
pub mod layout;
pub mod markdown;
pub mod pdf;
pub mod style;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

pub use layout::BookLayout;
pub use style::StyleProfile;

use crate::project::Project;
use crate::store::sanitize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Md,
    Docx,
    Pdf,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Md, Format::Docx, Format::Pdf];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Md => "md",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedFile {
    pub format: Format,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome per requested format; one failure never blocks the others.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderReport {
    pub files: Vec<RenderedFile>,
}

impl RenderReport {
    pub fn written(&self) -> impl Iterator<Item = &RenderedFile> {
        self.files.iter().filter(|file| file.error.is_none())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RenderedFile> {
        self.files.iter().filter(|file| file.error.is_some())
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    pandoc: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(pdf::DEFAULT_PANDOC)
    }
}

impl Renderer {
    pub fn new(pandoc: impl Into<String>) -> Self {
        Self {
            pandoc: pandoc.into(),
        }
    }

    /// Writes `<out_dir>/<sanitize(base_name)>.<ext>` for each format.
    pub fn render(
        &self,
        project: &Project,
        base_name: &str,
        style: &StyleProfile,
        formats: &[Format],
        out_dir: &Path,
    ) -> anyhow::Result<RenderReport> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("create output dir: {}", out_dir.display()))?;

        let layout = BookLayout::from_project(project);
        let stem = sanitize(base_name);
        let mut report = RenderReport::default();
        for &format in formats {
            let path = out_dir.join(format!("{stem}.{}", format.extension()));
            let result = match format {
                Format::Md => std::fs::write(&path, markdown::render(&layout, false))
                    .with_context(|| format!("write markdown: {}", path.display())),
                Format::Docx => docx::write(&layout, style, &path),
                Format::Pdf => pdf::write(&layout, style, &path, &self.pandoc),
            };
            let error = match result {
                Ok(()) => {
                    tracing::info!(format = format.extension(), path = %path.display(), "rendered");
                    None
                }
                Err(err) => {
                    tracing::warn!(format = format.extension(), "render failed: {err:#}");
                    Some(format!("{err:#}"))
                }
            };
            report.files.push(RenderedFile {
                format,
                path,
                error,
            });
        }
        Ok(report)
    }
}
