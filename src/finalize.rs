use chrono::Utc;

use crate::generation::{AgentRole, GenerationError, Profile, TextGenerator};
use crate::manuscript;
use crate::project::Project;
use crate::prompts;
use crate::store::ProjectStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeStatus {
    Applied,
    NothingToReview,
    MissingPlan,
    ModelFailed(String),
    SegmentMismatch { expected: usize, found: usize },
}

impl FinalizeStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl std::fmt::Display for FinalizeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => f.write_str("revision applied"),
            Self::NothingToReview => f.write_str("no chapters to review"),
            Self::MissingPlan => f.write_str("project has no plan"),
            Self::ModelFailed(reason) => write!(f, "finalization call failed: {reason}"),
            Self::SegmentMismatch { expected, found } => write!(
                f,
                "reply had {found} chapter segments, expected {expected}; original text kept"
            ),
        }
    }
}

#[derive(Debug)]
pub struct FinalizeOutcome {
    pub project: Project,
    pub status: FinalizeStatus,
    /// Set when the revision was applied but could not be saved.
    pub checkpoint_error: Option<String>,
}

pub struct Finalizer<'a> {
    generator: &'a dyn TextGenerator,
    store: &'a dyn ProjectStore,
}

impl<'a> Finalizer<'a> {
    pub fn new(generator: &'a dyn TextGenerator, store: &'a dyn ProjectStore) -> Self {
        Self { generator, store }
    }

    /// One whole-manuscript revision. Anything short of a clean split leaves the project as it was.
    pub async fn finalize(&self, mut project: Project) -> FinalizeOutcome {
        let status = self.revise(&mut project).await;
        let mut checkpoint_error = None;

        if status.is_applied() {
            let now = Utc::now();
            project.finalized_at = Some(now);
            project.updated_at = Some(now);
            if let Err(err) = self.store.save(&project.name, &project).await {
                tracing::warn!(project = %project.name, "checkpoint failed: {err}");
                checkpoint_error = Some(err.to_string());
            }
            tracing::info!(project = %project.name, chapters = project.chapters.len(), "finalization applied");
        } else {
            tracing::warn!(project = %project.name, "finalization skipped: {status}");
        }

        FinalizeOutcome {
            project,
            status,
            checkpoint_error,
        }
    }

    async fn revise(&self, project: &mut Project) -> FinalizeStatus {
        let Some(plan) = project.plan.as_ref() else {
            return FinalizeStatus::MissingPlan;
        };
        let text = manuscript::build(&project.chapters);
        if text.trim().is_empty() {
            return FinalizeStatus::NothingToReview;
        }

        let prompt = prompts::finalization(plan, &text);
        tracing::info!(
            chapters = project.chapters.len(),
            manuscript_chars = text.chars().count(),
            "finalization: whole-manuscript review"
        );
        let reply = match self
            .generator
            .generate(&prompt, AgentRole::Finalizer, Profile::Finalization)
            .await
        {
            Ok(reply) if reply.trim().is_empty() => {
                return FinalizeStatus::ModelFailed(GenerationError::Empty.to_string());
            }
            Ok(reply) => reply,
            Err(err) => return FinalizeStatus::ModelFailed(err.to_string()),
        };

        apply_reply(project, &reply)
    }
}

/// Replaces every chapter's text from `reply`, or nothing at all.
pub fn apply_reply(project: &mut Project, reply: &str) -> FinalizeStatus {
    let bodies = match manuscript::parse_reply(reply, project.chapters.len()) {
        Ok(bodies) => bodies,
        Err(mismatch) => {
            return FinalizeStatus::SegmentMismatch {
                expected: mismatch.expected,
                found: mismatch.found,
            };
        }
    };
    tracing::debug!(segments = bodies.len(), "finalization reply split");
    for (chapter, body) in project.chapters.iter_mut().zip(bodies) {
        chapter.final_text = body;
    }
    FinalizeStatus::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ChapterRecord;

    fn project(texts: &[(&str, &str)]) -> Project {
        let mut project = Project::new("p");
        for (idx, (title, text)) in texts.iter().enumerate() {
            project.chapters.push(ChapterRecord {
                number: idx as u32 + 1,
                title: (*title).to_owned(),
                researched_content: String::new(),
                final_text: (*text).to_owned(),
                context_summary: String::new(),
            });
        }
        project
    }

    #[test]
    fn apply_reply_rewrites_in_order() {
        let mut project = project(&[("T1", "A"), ("T2", "B")]);
        let status = apply_reply(
            &mut project,
            "--- CHAPTER 1: T1 ---\nA revised\n\n--- CHAPTER 2: T2 ---\nB revised",
        );
        assert_eq!(status, FinalizeStatus::Applied);
        assert_eq!(project.chapters[0].final_text, "A revised");
        assert_eq!(project.chapters[1].final_text, "B revised");
    }

    #[test]
    fn empty_chapter_survives_repeated_finalization() {
        let mut project = project(&[("T1", ""), ("T2", "B")]);
        let before = project.clone();
        for _ in 0..2 {
            let reply = manuscript::build(&project.chapters);
            assert_eq!(apply_reply(&mut project, &reply), FinalizeStatus::Applied);
            assert_eq!(project, before);
        }
    }

    #[test]
    fn apply_reply_is_all_or_nothing() {
        let mut project = project(&[("T1", "A"), ("T2", "B")]);
        let before = project.clone();
        let status = apply_reply(&mut project, "--- CHAPTER 1: T1 ---\nMerged A and B");
        assert_eq!(
            status,
            FinalizeStatus::SegmentMismatch {
                expected: 2,
                found: 1
            }
        );
        assert_eq!(project, before);
    }
}
