use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use bookforge::chapters::WriteOptions;
use bookforge::config::Config;
use bookforge::fallback::SIMULATED_REVIEW_NOTICE;
use bookforge::finalize::FinalizeStatus;
use bookforge::generation::{
    AgentRole, GenerationClient, GenerationError, Profile, TextGenerator,
};
use bookforge::interaction::AutoApprove;
use bookforge::manuscript;
use bookforge::project::{ParagraphBounds, Project};
use bookforge::render::{Format, style};
use bookforge::store::{LocalFsProjectStore, ProjectStore};
use bookforge::workflow::{PlanRequest, Workflow};

/// Passes calls through to `inner`, keeping every prompt with its role.
struct Recording<G> {
    inner: G,
    calls: Mutex<Vec<(AgentRole, String)>>,
}

impl<G> Recording<G> {
    fn new(inner: G) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn prompts_for(&self, role: AgentRole) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for Recording<G> {
    async fn generate(
        &self,
        prompt: &str,
        role: AgentRole,
        profile: Profile,
    ) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push((role, prompt.to_owned()));
        self.inner.generate(prompt, role, profile).await
    }
}

/// Returns the same reply to every call.
struct Fixed(String);

#[async_trait]
impl TextGenerator for Fixed {
    async fn generate(
        &self,
        _prompt: &str,
        _role: AgentRole,
        _profile: Profile,
    ) -> Result<String, GenerationError> {
        Ok(self.0.clone())
    }
}

fn offline_config(dir: &std::path::Path) -> Config {
    Config {
        output_dir: dir.join("out"),
        ..Config::offline(dir.join("projects"))
    }
}

fn request() -> PlanRequest {
    PlanRequest {
        project: None,
        chapter_count: 2,
        paragraph_bounds: ParagraphBounds { min: 2, max: 3 },
        with_introduction: true,
    }
}

#[tokio::test]
async fn offline_book_end_to_end() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = offline_config(temp.path());
    let generator = Arc::new(Recording::new(GenerationClient::new(&config)?));
    let store = Arc::new(LocalFsProjectStore::new(&config.projects_dir));
    let workflow = Workflow::with_parts(config, generator.clone(), store.clone());

    let project = workflow
        .plan("Quantum Computing Basics", &request(), &mut AutoApprove)
        .await?;
    let plan = project.plan.as_ref().expect("plan stored");
    assert!(!plan.outline.as_deref().unwrap_or_default().trim().is_empty());
    assert!(!plan.summary.trim().is_empty());
    assert!(!plan.title.trim().is_empty());
    assert_eq!(plan.chapter_titles.len(), 2);
    assert_eq!(plan.paragraph_bounds, ParagraphBounds { min: 2, max: 3 });

    let run = workflow
        .write_chapters(&project.name, WriteOptions::default(), &mut AutoApprove)
        .await?;
    assert_eq!(run.created, vec![1, 2]);
    assert!(run.checkpoint_errors.is_empty());
    assert!(!run.cancelled);

    let stored = store.load(&project.name).await?.expect("project persisted");
    assert_eq!(stored.chapters.len(), 2);
    for (idx, chapter) in stored.chapters.iter().enumerate() {
        assert_eq!(chapter.number as usize, idx + 1);
        assert!(!chapter.final_text.trim().is_empty());
        assert!(!chapter.context_summary.trim().is_empty());
    }

    let research = generator.prompts_for(AgentRole::ChapterResearch);
    assert_eq!(research.len(), 2);
    assert!(research[1].contains(&stored.chapters[0].context_summary));

    let before = stored.chapters.clone();
    let outcome = workflow.finalize(&project.name).await?;
    assert_eq!(outcome.status, FinalizeStatus::Applied);
    let after = store.load(&project.name).await?.expect("project persisted");
    assert!(after.finalized_at.is_some());
    assert_eq!(after.chapters.len(), 2);
    assert_eq!(after.chapters[0].final_text, before[0].final_text);
    assert_eq!(after.chapters[1].number, 2);
    assert!(after.chapters[1].final_text.starts_with(&before[1].final_text));
    assert!(after.chapters[1].final_text.ends_with(SIMULATED_REVIEW_NOTICE));

    let report = workflow
        .render(&after, style::lookup("standard")?, &[Format::Md])
        .await?;
    let written: Vec<_> = report.written().collect();
    assert_eq!(written.len(), 1);
    let markdown = std::fs::read_to_string(&written[0].path)?;
    assert!(markdown.contains(&plan.title));
    assert!(markdown.contains(&after.chapters[0].title));
    Ok(())
}

fn two_chapter_project(store_dir: &std::path::Path) -> anyhow::Result<(Config, Project)> {
    let config = offline_config(store_dir);
    let mut project = Project::new("Round Trip");
    project.plan = Some(bookforge::project::Plan {
        theme: "t".to_owned(),
        title: "Round Trip".to_owned(),
        summary: "s".to_owned(),
        chapter_titles: vec!["T1".to_owned(), "T2".to_owned()],
        audience: "a".to_owned(),
        paragraph_bounds: ParagraphBounds { min: 1, max: 2 },
        outline: None,
    });
    for (number, title, text) in [(1, "T1", "A"), (2, "T2", "B")] {
        project.upsert_chapter(bookforge::project::ChapterRecord {
            number,
            title: title.to_owned(),
            researched_content: String::new(),
            final_text: text.to_owned(),
            context_summary: format!("summary {number}"),
        })?;
    }
    Ok((config, project))
}

#[tokio::test]
async fn unchanged_manuscript_round_trips() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let (config, project) = two_chapter_project(temp.path())?;
    let store = Arc::new(LocalFsProjectStore::new(&config.projects_dir));
    store.save(&project.name, &project).await?;

    let reply = manuscript::build(&project.chapters);
    let workflow = Workflow::with_parts(config, Arc::new(Fixed(reply)), store.clone());
    let outcome = workflow.finalize(&project.name).await?;

    assert_eq!(outcome.status, FinalizeStatus::Applied);
    let stored = store.load(&project.name).await?.expect("stored");
    assert_eq!(stored.chapters[0].final_text, "A");
    assert_eq!(stored.chapters[1].final_text, "B");
    Ok(())
}

#[tokio::test]
async fn mismatched_segments_leave_the_project_untouched() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let (config, project) = two_chapter_project(temp.path())?;
    let store = Arc::new(LocalFsProjectStore::new(&config.projects_dir));
    store.save(&project.name, &project).await?;

    let reply = format!("{}\nOnly one chapter came back.", manuscript::delimiter(1, "T1"));
    let workflow = Workflow::with_parts(config, Arc::new(Fixed(reply)), store.clone());
    let outcome = workflow.finalize(&project.name).await?;

    assert_eq!(
        outcome.status,
        FinalizeStatus::SegmentMismatch {
            expected: 2,
            found: 1
        }
    );
    assert_eq!(outcome.project, project);
    let stored = store.load(&project.name).await?.expect("stored");
    assert_eq!(stored, project);
    Ok(())
}

#[tokio::test]
async fn resuming_completes_a_partial_project() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let config = offline_config(temp.path());
    let workflow = Workflow::new(config)?;

    let mut req = request();
    req.chapter_count = 3;
    req.project = Some("resume me".to_owned());
    let project = workflow.plan("Tides", &req, &mut AutoApprove).await?;

    let first = workflow
        .write_chapters(
            &project.name,
            WriteOptions {
                max_chapters: Some(1),
            },
            &mut AutoApprove,
        )
        .await?;
    assert_eq!(first.created, vec![1]);
    assert_eq!(first.project.next_pending_index(), 1);

    let rest = workflow
        .write_chapters(&project.name, WriteOptions::default(), &mut AutoApprove)
        .await?;
    assert_eq!(rest.created, vec![2, 3]);
    assert!(rest.project.is_complete());
    let numbers: Vec<u32> = rest.project.chapters.iter().map(|c| c.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    Ok(())
}
