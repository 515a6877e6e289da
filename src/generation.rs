use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, ModelProfile};
use crate::fallback::FallbackResponder;
use crate::openai;

/// Prefix used when a generation failure is rendered as text (logs, HTTP error bodies).
pub const ERROR_PREFIX: &str = "API_ERROR:";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("API_ERROR: content rejected by provider: {reason}")]
    Rejected { reason: String },
    #[error("API_ERROR: {message}")]
    Transport { message: String },
    #[error("API_ERROR: empty or unexpected response")]
    Empty,
}

impl GenerationError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Which agent is asking. Used for logging and to pick the offline canned response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    OutlineResearch,
    ChapterResearch,
    Writer,
    Reviewer,
    Finalizer,
    SectionWriter,
    General,
}

impl AgentRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutlineResearch => "outline_research",
            Self::ChapterResearch => "chapter_research",
            Self::Writer => "writer",
            Self::Reviewer => "reviewer",
            Self::Finalizer => "finalizer",
            Self::SectionWriter => "section_writer",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Generation,
    Finalization,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        role: AgentRole,
        profile: Profile,
    ) -> Result<String, GenerationError>;
}

/// Authenticated connection to the Responses API.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ProviderClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow::anyhow!("build http client: {err}"))?;
        Ok(Self {
            http,
            endpoint: openai::responses_endpoint(base_url),
            api_key: api_key.to_owned(),
        })
    }

    pub async fn complete(
        &self,
        profile: &ModelProfile,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        openai::responses_text(
            &self.http,
            &self.endpoint,
            &self.api_key,
            &profile.model,
            prompt,
            profile.temperature,
        )
        .await
    }

    /// Forwards `{model, prompt}` and hands back the provider's JSON untouched.
    pub async fn relay(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<serde_json::Value, GenerationError> {
        let body = serde_json::json!({ "model": model, "input": prompt });
        openai::post_responses(&self.http, &self.endpoint, &self.api_key, &body).await
    }
}

#[derive(Debug, Clone)]
struct Profiles {
    generation: ModelProfile,
    finalization: Option<ModelProfile>,
}

impl Profiles {
    fn select(&self, profile: Profile) -> &ModelProfile {
        match profile {
            Profile::Finalization => self.finalization.as_ref().unwrap_or(&self.generation),
            Profile::Generation => &self.generation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationClient {
    provider: Option<(ProviderClient, Profiles)>,
    fallback: FallbackResponder,
}

impl GenerationClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let fallback = FallbackResponder::new(Duration::from_millis(config.fallback_delay_ms));
        let provider = match (config.api_key.as_deref(), config.generation.clone()) {
            (Some(api_key), Some(generation)) => {
                let client = ProviderClient::new(
                    &config.base_url,
                    api_key,
                    Duration::from_secs(config.timeout_secs),
                )?;
                tracing::info!(
                    model = %generation.model,
                    finalization_model = config.finalization.as_ref().map(|p| p.model.as_str()),
                    "generation client configured"
                );
                Some((
                    client,
                    Profiles {
                        generation,
                        finalization: config.finalization.clone(),
                    },
                ))
            }
            _ => {
                tracing::warn!("no API credential configured; using the offline fallback responder");
                None
            }
        };
        Ok(Self { provider, fallback })
    }

    pub fn is_offline(&self) -> bool {
        self.provider.is_none()
    }

    pub fn provider(&self) -> Option<&ProviderClient> {
        self.provider.as_ref().map(|(client, _)| client)
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(
        &self,
        prompt: &str,
        role: AgentRole,
        profile: Profile,
    ) -> Result<String, GenerationError> {
        let Some((client, profiles)) = &self.provider else {
            return Ok(self.fallback.respond(prompt, role).await);
        };

        let selected = profiles.select(profile);
        tracing::debug!(
            role = role.as_str(),
            model = %selected.model,
            prompt_chars = prompt.chars().count(),
            "generate"
        );
        let result = client.complete(selected, prompt).await;
        if let Err(err) = &result {
            tracing::warn!(role = role.as_str(), model = %selected.model, "{err}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_with_prefix() {
        let err = GenerationError::Rejected {
            reason: "content_filter".to_owned(),
        };
        assert!(err.to_string().starts_with(ERROR_PREFIX));
        assert!(GenerationError::Empty.to_string().starts_with(ERROR_PREFIX));
        assert_eq!(
            GenerationError::transport("timeout").to_string(),
            "API_ERROR: timeout"
        );
    }

    #[test]
    fn finalization_profile_falls_back_to_generation() {
        let profiles = Profiles {
            generation: ModelProfile::new("fast"),
            finalization: None,
        };
        assert_eq!(profiles.select(Profile::Finalization).model, "fast");

        let profiles = Profiles {
            generation: ModelProfile::new("fast"),
            finalization: Some(ModelProfile::new("robust")),
        };
        assert_eq!(profiles.select(Profile::Finalization).model, "robust");
        assert_eq!(profiles.select(Profile::Generation).model, "fast");
    }

    #[tokio::test]
    async fn offline_client_uses_fallback() {
        let client = GenerationClient::new(&Config::offline("unused")).unwrap();
        assert!(client.is_offline());
        assert!(client.provider().is_none());

        let text = client
            .generate("anything", AgentRole::Writer, Profile::Generation)
            .await
            .unwrap();
        assert!(text.contains("simulated paragraph"));
    }
}
