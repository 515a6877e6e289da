use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::project::Project;

pub const DEFAULT_PROJECT_NAME: &str = "untitled_project";
const RECORD_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("project store io error at `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("project record `{path}` is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize project record: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Fully overwrites the record addressed by `sanitize(project_name)`.
    async fn save(&self, project_name: &str, project: &Project) -> Result<(), StoreError>;
    async fn load(&self, project_name: &str) -> Result<Option<Project>, StoreError>;
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// Maps a human title to a storage identifier.
///
/// Drops everything except word characters, whitespace and hyphens, trims, then collapses
/// whitespace/hyphen runs into a single `_`. Never returns an empty string.
pub fn sanitize(name: &str) -> String {
    let kept = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect::<String>();

    let mut out = String::with_capacity(kept.len());
    let mut in_run = false;
    for ch in kept.trim().chars() {
        if ch == '-' || ch.is_whitespace() {
            if !in_run {
                out.push('_');
                in_run = true;
            }
            continue;
        }
        in_run = false;
        out.push(ch);
    }

    if out.is_empty() {
        return DEFAULT_PROJECT_NAME.to_owned();
    }
    out
}

#[derive(Debug, Clone)]
pub struct LocalFsProjectStore {
    base_dir: PathBuf,
}

impl LocalFsProjectStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn record_path(&self, project_name: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.{RECORD_EXTENSION}", sanitize(project_name)))
    }
}

#[async_trait]
impl ProjectStore for LocalFsProjectStore {
    async fn save(&self, project_name: &str, project: &Project) -> Result<(), StoreError> {
        let path = self.record_path(project_name);
        write_json_atomic(&path, project).await?;
        tracing::debug!(path = %path.display(), chapters = project.chapters.len(), "project saved");
        Ok(())
    }

    async fn load(&self, project_name: &str) -> Result<Option<Project>, StoreError> {
        let path = self.record_path(project_name);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(&path, err)),
        };
        let project = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Corrupt { path, source })?;
        Ok(Some(project))
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|err| StoreError::io(&self.base_dir, err))?;

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|err| StoreError::io(&self.base_dir, err))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| StoreError::io(&self.base_dir, err))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_owned());
            }
        }
        Ok(names)
    }
}

async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .await
        .map_err(|err| StoreError::io(parent, err))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).map_err(StoreError::Serialize)?;
    fs::write(&tmp_path, &data)
        .await
        .map_err(|err| StoreError::io(&tmp_path, err))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|err| StoreError::io(path, err))?;
    Ok(())
}
