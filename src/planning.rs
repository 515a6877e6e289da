use serde::{Deserialize, Serialize};

use crate::generation::{AgentRole, GenerationError, Profile, TextGenerator};
use crate::interaction::ReviewPolicy;
use crate::project::{ExtraSection, ParagraphBounds, Plan};
use crate::prompts;
use crate::suggestions;

pub const UNTITLED_BOOK: &str = "Untitled Book";
pub const OUTLINE_UNAVAILABLE: &str = "Outline could not be generated.";
pub const SUMMARY_UNAVAILABLE: &str = "Summary could not be generated.";
pub const AUDIENCE_UNAVAILABLE: &str = "Target audience could not be generated.";

/// First planning phase: everything needed to pick a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningDraft {
    pub theme: String,
    pub outline: String,
    pub summary: String,
    pub title_candidates: Vec<String>,
}

pub struct Planner<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> Planner<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }

    async fn generate_or(&self, prompt: &str, role: AgentRole, field: &str, fallback: &str) -> String {
        match self.generator.generate(prompt, role, Profile::Generation).await {
            Ok(text) => text.trim().to_owned(),
            Err(err) => {
                tracing::warn!(field, "{err}");
                fallback.to_owned()
            }
        }
    }

    /// Outline, summary and title candidates for `theme`.
    pub async fn draft(&self, theme: &str) -> PlanningDraft {
        tracing::info!(theme, "planning: outline");
        let outline = self
            .generate_or(
                &prompts::outline(theme),
                AgentRole::OutlineResearch,
                "outline",
                OUTLINE_UNAVAILABLE,
            )
            .await;

        tracing::info!("planning: summary");
        let summary = self
            .generate_or(
                &prompts::summary(&outline, theme),
                AgentRole::Writer,
                "summary",
                SUMMARY_UNAVAILABLE,
            )
            .await;

        tracing::info!("planning: title suggestions");
        let title_candidates = match self
            .generator
            .generate(
                &prompts::title_suggestions(&summary, theme),
                AgentRole::General,
                Profile::Generation,
            )
            .await
        {
            Ok(raw) => suggestions::parse_title_candidates(&raw),
            Err(err) => {
                tracing::warn!(field = "title_candidates", "{err}");
                Vec::new()
            }
        };

        PlanningDraft {
            theme: theme.to_owned(),
            outline,
            summary,
            title_candidates,
        }
    }

    /// Second planning phase: chapter titles and audience for the chosen title.
    pub async fn finalize(
        &self,
        draft: PlanningDraft,
        title: &str,
        chapter_count: usize,
        paragraph_bounds: ParagraphBounds,
    ) -> Plan {
        let title = match title.trim() {
            "" => UNTITLED_BOOK.to_owned(),
            title => title.to_owned(),
        };

        tracing::info!(title = %title, chapter_count, "planning: chapter titles");
        let chapter_titles = match self
            .generator
            .generate(
                &prompts::chapter_titles(&draft.summary, chapter_count, &title),
                AgentRole::General,
                Profile::Generation,
            )
            .await
        {
            Ok(raw) => suggestions::reconcile_chapter_titles(&raw, chapter_count),
            Err(err) => {
                tracing::warn!(field = "chapter_titles", "{err}");
                suggestions::placeholder_chapter_titles(chapter_count)
            }
        };

        tracing::info!("planning: audience");
        let audience = self
            .generate_or(
                &prompts::audience(&draft.summary, &title),
                AgentRole::General,
                "audience",
                AUDIENCE_UNAVAILABLE,
            )
            .await;

        Plan {
            theme: draft.theme,
            title,
            summary: draft.summary,
            chapter_titles,
            audience,
            paragraph_bounds,
            outline: Some(draft.outline),
        }
    }

    /// Both phases, letting `policy` pick the title.
    pub async fn plan(
        &self,
        theme: &str,
        chapter_count: usize,
        paragraph_bounds: ParagraphBounds,
        policy: &mut dyn ReviewPolicy,
    ) -> Plan {
        let draft = self.draft(theme).await;
        let title = policy
            .choose_title(&draft.title_candidates)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| UNTITLED_BOOK.to_owned());
        self.finalize(draft, &title, chapter_count, paragraph_bounds)
            .await
    }

    /// Writes an extra section such as an introduction or preface.
    pub async fn generate_section(
        &self,
        kind: &str,
        plan: &Plan,
    ) -> Result<ExtraSection, GenerationError> {
        let kind = kind.trim();
        tracing::info!(section = kind, "generating extra section");
        let content = self
            .generator
            .generate(
                &prompts::section(kind, plan),
                AgentRole::SectionWriter,
                Profile::Generation,
            )
            .await?;
        Ok(ExtraSection {
            title: kind.to_owned(),
            content: content.trim().to_owned(),
        })
    }
}
