use crate::generation::{AgentRole, Profile, TextGenerator};
use crate::interaction::{Decision, ReviewPolicy};
use crate::project::{self, ChapterRecord, Plan, Project};
use crate::prompts;
use crate::store::ProjectStore;

pub const RESEARCH_FAILED: &str = "Research failed for this chapter.";
pub const DRAFT_FAILED: &str = "Draft failed for this chapter.";
/// Revisions shorter than this are treated as failed and the draft is kept.
pub const MIN_REVISION_CHARS: usize = 20;

pub fn summary_unavailable(number: u32) -> String {
    format!("Summary of chapter {number} is unavailable.")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Stop after creating this many chapters.
    pub max_chapters: Option<usize>,
}

#[derive(Debug)]
pub struct ChapterRun {
    pub project: Project,
    pub created: Vec<u32>,
    /// Saves that failed. The chapters are still in `project`.
    pub checkpoint_errors: Vec<String>,
    pub cancelled: bool,
}

pub struct ChapterPipeline<'a> {
    generator: &'a dyn TextGenerator,
    store: &'a dyn ProjectStore,
}

impl<'a> ChapterPipeline<'a> {
    pub fn new(generator: &'a dyn TextGenerator, store: &'a dyn ProjectStore) -> Self {
        Self { generator, store }
    }

    /// Continues from the first chapter that has not been created yet.
    pub async fn resume(
        &self,
        project: Project,
        options: WriteOptions,
        policy: &mut dyn ReviewPolicy,
    ) -> anyhow::Result<ChapterRun> {
        let start = project.next_pending_index();
        self.run(project, start, options, policy).await
    }

    /// Writes chapters `start_index..` of the plan, saving after each one.
    ///
    /// A `start_index` below the number of existing chapters regenerates (and replaces) them.
    pub async fn run(
        &self,
        mut project: Project,
        start_index: usize,
        options: WriteOptions,
        policy: &mut dyn ReviewPolicy,
    ) -> anyhow::Result<ChapterRun> {
        let Some(plan) = project.plan.clone() else {
            anyhow::bail!("project `{}` has no plan yet", project.name);
        };
        if start_index > project.chapters.len() {
            anyhow::bail!(
                "cannot start at chapter {} when only {} exist",
                start_index + 1,
                project.chapters.len()
            );
        }

        let total = plan.chapter_count();
        let mut created = Vec::new();
        let mut checkpoint_errors = Vec::new();
        let mut cancelled = false;

        tracing::info!(
            project = %project.name,
            start = start_index + 1,
            total,
            "writing chapters"
        );
        for index in start_index..total {
            if options
                .max_chapters
                .is_some_and(|max| created.len() >= max)
            {
                break;
            }

            let record = self
                .write_chapter(&plan, index, &project.chapters[..index], policy)
                .await;
            let number = record.number;
            project.upsert_chapter(record)?;
            project.touch();

            if let Err(err) = self.store.save(&project.name, &project).await {
                tracing::warn!(chapter = number, "checkpoint failed: {err}");
                checkpoint_errors.push(format!("chapter {number}: {err}"));
            }
            created.push(number);

            if index + 1 < total && !policy.continue_after(number) {
                tracing::info!(chapter = number, "stopped after chapter");
                cancelled = true;
                break;
            }
        }

        Ok(ChapterRun {
            project,
            created,
            checkpoint_errors,
            cancelled,
        })
    }

    /// Research, draft, review and summarize one chapter. Never fails: each stage degrades.
    pub async fn write_chapter(
        &self,
        plan: &Plan,
        index: usize,
        previous: &[ChapterRecord],
        policy: &mut dyn ReviewPolicy,
    ) -> ChapterRecord {
        let number = index as u32 + 1;
        let title = plan
            .chapter_titles
            .get(index)
            .cloned()
            .unwrap_or_else(|| crate::suggestions::placeholder_chapter_title(index + 1));
        let context = project::rolling_context(previous);

        tracing::info!(chapter = number, title = %title, "chapter: research");
        let mut feedback: Option<String> = None;
        let researched_content = loop {
            let prompt =
                prompts::chapter_research(plan, number, &title, &context, feedback.as_deref());
            let research = self
                .generate_or(&prompt, AgentRole::ChapterResearch, number, RESEARCH_FAILED)
                .await;
            match policy.approve_research(number, &title, &research) {
                Decision::Accept => break research,
                Decision::Retry => {}
                Decision::Revise(guidance) => feedback = Some(guidance),
            }
        };

        tracing::info!(chapter = number, "chapter: draft");
        let mut feedback: Option<String> = None;
        let draft = loop {
            let prompt = prompts::chapter_draft(
                plan,
                &title,
                &researched_content,
                &context,
                feedback.as_deref(),
            );
            let draft = self
                .generate_or(&prompt, AgentRole::Writer, number, DRAFT_FAILED)
                .await;
            match policy.approve_draft(number, &title, &draft) {
                Decision::Accept => break draft,
                Decision::Retry => {}
                Decision::Revise(guidance) => feedback = Some(guidance),
            }
        };

        tracing::info!(chapter = number, "chapter: review");
        let final_text = match self
            .generator
            .generate(
                &prompts::chapter_review(plan, &title, &draft),
                AgentRole::Reviewer,
                Profile::Generation,
            )
            .await
        {
            Ok(revised) if revised.chars().count() < MIN_REVISION_CHARS => {
                tracing::warn!(chapter = number, "revision too short; keeping draft");
                draft
            }
            Ok(revised) => {
                if policy.accept_revision(number, &draft, &revised) {
                    revised
                } else {
                    draft
                }
            }
            Err(err) => {
                tracing::warn!(chapter = number, "review failed; keeping draft: {err}");
                draft
            }
        };

        tracing::info!(chapter = number, "chapter: summary");
        let context_summary = match self
            .generator
            .generate(
                &prompts::chapter_summary(&title, &final_text),
                AgentRole::General,
                Profile::Generation,
            )
            .await
        {
            Ok(summary) => summary.trim().to_owned(),
            Err(err) => {
                tracing::warn!(chapter = number, "summary failed: {err}");
                summary_unavailable(number)
            }
        };

        ChapterRecord {
            number,
            title,
            researched_content,
            final_text,
            context_summary,
        }
    }

    async fn generate_or(
        &self,
        prompt: &str,
        role: AgentRole,
        number: u32,
        fallback: &str,
    ) -> String {
        match self
            .generator
            .generate(prompt, role, Profile::Generation)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(chapter = number, role = role.as_str(), "{err}");
                fallback.to_owned()
            }
        }
    }
}
