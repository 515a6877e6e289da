//! The one pipeline core behind the CLI, the HTTP service and the tests.

use std::sync::Arc;

use anyhow::Context as _;

use crate::chapters::{ChapterPipeline, ChapterRun, WriteOptions};
use crate::config::Config;
use crate::finalize::{FinalizeOutcome, FinalizeStatus, Finalizer};
use crate::generation::{GenerationClient, TextGenerator};
use crate::interaction::{AutoApprove, ReviewPolicy};
use crate::planning::{Planner, PlanningDraft};
use crate::project::{ParagraphBounds, Project};
use crate::render::{Format, RenderReport, Renderer, StyleProfile};
use crate::store::{LocalFsProjectStore, ProjectStore, StoreError, sanitize};

pub const INTRODUCTION: &str = "Introduction";
pub const KNOWN_SECTIONS: [&str; 4] = ["Introduction", "Preface", "Appendix", "Index"];

/// Planning input shared by every entry point.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Store name; defaults to the chosen title.
    pub project: Option<String>,
    pub chapter_count: usize,
    pub paragraph_bounds: ParagraphBounds,
    pub with_introduction: bool,
}

#[derive(Debug)]
pub struct BookRun {
    pub project: Project,
    pub chapters: Vec<u32>,
    pub checkpoint_errors: Vec<String>,
    pub finalize: FinalizeStatus,
    pub report: RenderReport,
}

#[derive(Clone)]
pub struct Workflow {
    config: Config,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn ProjectStore>,
    renderer: Renderer,
}

impl Workflow {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let generator = GenerationClient::new(&config).context("build generation client")?;
        let store = LocalFsProjectStore::new(&config.projects_dir);
        Ok(Self::with_parts(config, Arc::new(generator), Arc::new(store)))
    }

    pub fn with_parts(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn ProjectStore>,
    ) -> Self {
        let renderer = Renderer::new(config.pandoc.clone());
        Self {
            config,
            generator,
            store,
            renderer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn list_projects(&self) -> anyhow::Result<Vec<String>> {
        let mut names = self.store.list().await.context("list projects")?;
        names.sort();
        Ok(names)
    }

    pub async fn load(&self, name: &str) -> anyhow::Result<Option<Project>> {
        self.store
            .load(name)
            .await
            .with_context(|| format!("load project `{name}`"))
    }

    async fn load_existing(&self, name: &str) -> anyhow::Result<Project> {
        self.load(name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("project `{}` not found", sanitize(name)))
    }

    /// Loads `name`, or starts fresh when there is no usable record.
    pub async fn load_or_new(&self, name: &str) -> anyhow::Result<Project> {
        match self.store.load(name).await {
            Ok(Some(project)) => Ok(project),
            Ok(None) => Ok(Project::new(name)),
            Err(err @ StoreError::Corrupt { .. }) => {
                tracing::warn!(project = name, "could not resume, starting fresh: {err}");
                Ok(Project::new(name))
            }
            Err(err) => Err(err).with_context(|| format!("load project `{name}`")),
        }
    }

    async fn save(&self, project: &Project) -> anyhow::Result<()> {
        self.store
            .save(&project.name, project)
            .await
            .with_context(|| format!("save project `{}`", project.name))
    }

    pub async fn start_planning(&self, theme: &str) -> anyhow::Result<PlanningDraft> {
        let theme = theme.trim();
        if theme.is_empty() {
            anyhow::bail!("theme must not be empty");
        }
        Ok(Planner::new(self.generator.as_ref()).draft(theme).await)
    }

    /// Completes planning for `title`, resetting the project's chapters and sections.
    pub async fn finish_planning(
        &self,
        draft: PlanningDraft,
        title: &str,
        request: &PlanRequest,
    ) -> anyhow::Result<Project> {
        validate_chapter_count(request.chapter_count)?;
        let planner = Planner::new(self.generator.as_ref());
        let plan = planner
            .finalize(
                draft,
                title,
                request.chapter_count,
                request.paragraph_bounds,
            )
            .await;
        self.store_plan(plan, request).await
    }

    /// Both planning phases for a title fixed up front.
    pub async fn plan_with_title(
        &self,
        theme: &str,
        title: &str,
        request: &PlanRequest,
    ) -> anyhow::Result<Project> {
        validate_chapter_count(request.chapter_count)?;
        let draft = self.start_planning(theme).await?;
        self.finish_planning(draft, title, request).await
    }

    /// Both planning phases in one call, with `policy` choosing the title.
    pub async fn plan(
        &self,
        theme: &str,
        request: &PlanRequest,
        policy: &mut dyn ReviewPolicy,
    ) -> anyhow::Result<Project> {
        validate_chapter_count(request.chapter_count)?;
        let theme = theme.trim();
        if theme.is_empty() {
            anyhow::bail!("theme must not be empty");
        }
        let plan = Planner::new(self.generator.as_ref())
            .plan(
                theme,
                request.chapter_count,
                request.paragraph_bounds,
                policy,
            )
            .await;
        self.store_plan(plan, request).await
    }

    async fn store_plan(
        &self,
        plan: crate::project::Plan,
        request: &PlanRequest,
    ) -> anyhow::Result<Project> {
        let name = request
            .project
            .as_deref()
            .unwrap_or(plan.title.as_str())
            .to_owned();
        let mut project = self.load_or_new(&name).await?;
        if project.plan.is_some() {
            tracing::info!(project = %project.name, "replanning: chapters and sections reset");
        }
        project.replan(plan);

        if request.with_introduction {
            let planner = Planner::new(self.generator.as_ref());
            if let Some(plan) = project.plan.as_ref() {
                match planner.generate_section(INTRODUCTION, plan).await {
                    Ok(section) => {
                        project.extra_sections.insert(sanitize(INTRODUCTION), section);
                    }
                    Err(err) => tracing::warn!("introduction not generated: {err}"),
                }
            }
        }

        project.touch();
        self.save(&project).await?;
        tracing::info!(
            project = %project.name,
            chapters = project.plan.as_ref().map_or(0, |p| p.chapter_count()),
            "plan saved"
        );
        Ok(project)
    }

    /// Generates (or regenerates) an extra section such as a preface.
    pub async fn add_section(&self, name: &str, kind: &str) -> anyhow::Result<Project> {
        let mut project = self.load_existing(name).await?;
        let Some(plan) = project.plan.as_ref() else {
            anyhow::bail!("project `{}` has no plan yet", project.name);
        };
        let section = Planner::new(self.generator.as_ref())
            .generate_section(kind, plan)
            .await
            .with_context(|| format!("generate section `{}`", kind.trim()))?;
        project.extra_sections.insert(sanitize(kind), section);
        project.touch();
        self.save(&project).await?;
        Ok(project)
    }

    /// Creates the next pending chapters of `name`.
    pub async fn write_chapters(
        &self,
        name: &str,
        options: WriteOptions,
        policy: &mut dyn ReviewPolicy,
    ) -> anyhow::Result<ChapterRun> {
        let project = self.load_existing(name).await?;
        ChapterPipeline::new(self.generator.as_ref(), self.store.as_ref())
            .resume(project, options, policy)
            .await
    }

    pub async fn finalize(&self, name: &str) -> anyhow::Result<FinalizeOutcome> {
        let project = self.load_existing(name).await?;
        Ok(Finalizer::new(self.generator.as_ref(), self.store.as_ref())
            .finalize(project)
            .await)
    }

    /// Renders into the configured output directory, named after the book title.
    pub async fn render(
        &self,
        project: &Project,
        style: &'static StyleProfile,
        formats: &[Format],
    ) -> anyhow::Result<RenderReport> {
        let base_name = project
            .plan
            .as_ref()
            .map_or(project.name.clone(), |plan| plan.title.clone());
        let renderer = self.renderer.clone();
        let project = project.clone();
        let formats = formats.to_vec();
        let out_dir = self.config.output_dir.clone();
        tokio::task::spawn_blocking(move || {
            renderer.render(&project, &base_name, style, &formats, &out_dir)
        })
        .await
        .context("join render task")?
    }

    pub async fn finalize_and_render(
        &self,
        name: &str,
        style: &'static StyleProfile,
        formats: &[Format],
    ) -> anyhow::Result<(FinalizeOutcome, RenderReport)> {
        let outcome = self.finalize(name).await?;
        let report = self.render(&outcome.project, style, formats).await?;
        Ok((outcome, report))
    }

    /// Autonomous end-to-end run: plan, write every chapter, finalize, render.
    pub async fn run_book(
        &self,
        theme: &str,
        request: &PlanRequest,
        style: &'static StyleProfile,
        formats: &[Format],
    ) -> anyhow::Result<BookRun> {
        let mut policy = AutoApprove;
        let project = self.plan(theme, request, &mut policy).await?;
        let run = ChapterPipeline::new(self.generator.as_ref(), self.store.as_ref())
            .resume(project, WriteOptions::default(), &mut policy)
            .await?;
        let outcome = Finalizer::new(self.generator.as_ref(), self.store.as_ref())
            .finalize(run.project)
            .await;
        let mut checkpoint_errors = run.checkpoint_errors;
        checkpoint_errors.extend(outcome.checkpoint_error);
        let report = self.render(&outcome.project, style, formats).await?;

        Ok(BookRun {
            project: outcome.project,
            chapters: run.created,
            checkpoint_errors,
            finalize: outcome.status,
            report,
        })
    }
}

pub fn validate_chapter_count(chapter_count: usize) -> anyhow::Result<()> {
    if chapter_count == 0 {
        anyhow::bail!("chapter count must be at least 1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(project: Option<&str>) -> PlanRequest {
        PlanRequest {
            project: project.map(str::to_owned),
            chapter_count: 2,
            paragraph_bounds: ParagraphBounds { min: 2, max: 3 },
            with_introduction: true,
        }
    }

    #[tokio::test]
    async fn corrupt_record_starts_fresh() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        std::fs::write(temp.path().join("Broken.json"), "{")?;
        let workflow = Workflow::new(Config::offline(temp.path()))?;

        let project = workflow.load_or_new("Broken").await?;
        assert!(project.plan.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn planning_validates_and_stores_introduction() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let workflow = Workflow::new(Config::offline(temp.path()))?;

        assert!(workflow.start_planning("   ").await.is_err());
        let draft = workflow.start_planning("Tides").await?;
        let mut bad = request(None);
        bad.chapter_count = 0;
        assert!(workflow.finish_planning(draft.clone(), "T", &bad).await.is_err());

        let project = workflow
            .finish_planning(draft, "Moon Pull", &request(Some("tides book")))
            .await?;
        assert_eq!(project.name, "tides_book");
        assert!(project.extra_sections.contains_key("Introduction"));
        assert_eq!(workflow.list_projects().await?, vec!["tides_book".to_owned()]);
        Ok(())
    }

    struct Counting(std::sync::atomic::AtomicUsize);

    #[async_trait::async_trait]
    impl TextGenerator for Counting {
        async fn generate(
            &self,
            _prompt: &str,
            _role: crate::generation::AgentRole,
            _profile: crate::generation::Profile,
        ) -> Result<String, crate::generation::GenerationError> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok("text".to_owned())
        }
    }

    #[tokio::test]
    async fn zero_chapters_is_rejected_before_generation() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let config = Config::offline(temp.path());
        let generator = Arc::new(Counting(Default::default()));
        let store = Arc::new(LocalFsProjectStore::new(temp.path()));
        let workflow = Workflow::with_parts(config, generator.clone(), store);

        let mut bad = request(None);
        bad.chapter_count = 0;
        assert!(workflow.plan_with_title("Tides", "T", &bad).await.is_err());
        assert!(workflow.plan("Tides", &bad, &mut AutoApprove).await.is_err());
        assert_eq!(generator.0.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(workflow.list_projects().await?.is_empty());

        let project = workflow.plan_with_title("Tides", "T", &request(None)).await?;
        assert_eq!(project.plan.map(|p| p.title), Some("T".to_owned()));
        assert!(generator.0.load(std::sync::atomic::Ordering::SeqCst) > 0);
        Ok(())
    }

    #[tokio::test]
    async fn sections_require_an_existing_plan() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let workflow = Workflow::new(Config::offline(temp.path()))?;
        assert!(workflow.add_section("missing", "Preface").await.is_err());
        Ok(())
    }
}
