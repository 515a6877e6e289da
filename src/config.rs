use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    pub model: String,
    pub temperature: f32,
}

impl ModelProfile {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Process configuration, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub generation: Option<ModelProfile>,
    pub finalization: Option<ModelProfile>,
    pub timeout_secs: u64,
    pub projects_dir: PathBuf,
    pub output_dir: PathBuf,
    pub fallback_delay_ms: u64,
    /// Program used to render PDF.
    pub pandoc: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            generation: None,
            finalization: None,
            timeout_secs: 300,
            projects_dir: PathBuf::from("book_projects"),
            output_dir: PathBuf::from("book_output"),
            fallback_delay_ms: 1000,
            pandoc: "pandoc".to_owned(),
        }
    }
}

impl Config {
    /// Offline configuration: no credential, so every call goes to the fallback responder.
    pub fn offline(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
            fallback_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Defaults, then the optional YAML file, then `BOOKFORGE_*` environment variables.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let env_path = std::env::var("BOOKFORGE_CONFIG").ok().map(PathBuf::from);
        let file = match config_path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Some(ConfigFile::read(&path)?),
            None => None,
        };
        Self::resolve(file.unwrap_or_default(), |key| std::env::var(key).ok())
    }

    fn resolve(
        file: ConfigFile,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let env = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let api_key = env("BOOKFORGE_API_KEY")
            .or_else(|| env("OPENAI_API_KEY"))
            .or(file.api_key);
        let base_url = env("BOOKFORGE_BASE_URL")
            .or(file.base_url)
            .unwrap_or(defaults.base_url);
        url::Url::parse(&base_url).with_context(|| format!("invalid base url: {base_url}"))?;

        let generation_model = env("BOOKFORGE_MODEL").or(file.generation_model);
        let finalization_model = env("BOOKFORGE_FINALIZE_MODEL").or(file.finalization_model);
        let temperature = file.temperature.unwrap_or(DEFAULT_TEMPERATURE);

        let (generation, finalization) = if api_key.is_some() {
            let generation = ModelProfile {
                model: generation_model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
                temperature,
            };
            let finalization = finalization_model.map(|model| ModelProfile { model, temperature });
            (Some(generation), finalization)
        } else {
            (None, None)
        };

        let timeout_secs = match env("BOOKFORGE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("invalid BOOKFORGE_TIMEOUT_SECS={raw:?}"))?,
            None => file.timeout_secs.unwrap_or(defaults.timeout_secs),
        };
        let fallback_delay_ms = match env("BOOKFORGE_FALLBACK_DELAY_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("invalid BOOKFORGE_FALLBACK_DELAY_MS={raw:?}"))?,
            None => file
                .fallback_delay_ms
                .unwrap_or(defaults.fallback_delay_ms),
        };

        Ok(Self {
            api_key,
            base_url,
            generation,
            finalization,
            timeout_secs: timeout_secs.max(1),
            projects_dir: env("BOOKFORGE_PROJECTS_DIR")
                .map(PathBuf::from)
                .or(file.projects_dir)
                .unwrap_or(defaults.projects_dir),
            output_dir: env("BOOKFORGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .or(file.output_dir)
                .unwrap_or(defaults.output_dir),
            fallback_delay_ms,
            pandoc: env("BOOKFORGE_PANDOC")
                .or(file.pandoc)
                .unwrap_or(defaults.pandoc),
        })
    }

    pub fn is_offline(&self) -> bool {
        self.generation.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_key: Option<String>,
    base_url: Option<String>,
    generation_model: Option<String>,
    finalization_model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    projects_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    fallback_delay_ms: Option<u64>,
    pandoc: Option<String>,
}

impl ConfigFile {
    fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parse config: {}", path.display()))
    }
}
