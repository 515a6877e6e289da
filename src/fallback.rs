use std::time::Duration;

use crate::generation::AgentRole;
use crate::prompts::{MANUSCRIPT_MARKER, REVIEW_TEXT_MARKER};

pub const SIMULATED_REVIEW_NOTICE: &str =
    "(Note: this is a simulated review. The text was returned as-is.)";

const OUTLINE_REPORT: &str =
    "Suggested topics report (simulated):\n1. Introduction\n2. Development\n3. Conclusion";
const CHAPTER_RESEARCH: &str =
    "Simulated researched content for the chapter:\n- Key point A\n- Key point B";
const WRITER_PARAGRAPH: &str = "This is a simulated paragraph generated as a fallback. \
     No language model is configured.";
const REVIEW_WITHOUT_TEXT: &str =
    "Text (simulated) reviewed and finalized. (Note: simulated review without source text.)";
pub const GENERIC_RESPONSE: &str = "Generic simulated response (API not available).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackBranch {
    OutlineResearch,
    ChapterResearch,
    Writer,
    Review,
    Generic,
}

/// Canned responses used when no model is configured.
#[derive(Debug, Clone)]
pub struct FallbackResponder {
    delay: Duration,
}

impl FallbackResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// A specific role decides the branch; general prompts are classified by keyword.
    pub fn branch(prompt: &str, role: AgentRole) -> FallbackBranch {
        match role {
            AgentRole::OutlineResearch => return FallbackBranch::OutlineResearch,
            AgentRole::ChapterResearch => return FallbackBranch::ChapterResearch,
            AgentRole::Writer => return FallbackBranch::Writer,
            AgentRole::Reviewer | AgentRole::Finalizer => return FallbackBranch::Review,
            AgentRole::SectionWriter | AgentRole::General => {}
        }

        let lower = prompt.to_lowercase();
        if lower.contains("research the main topics") {
            FallbackBranch::OutlineResearch
        } else if lower.contains("research content for the chapter") {
            FallbackBranch::ChapterResearch
        } else if lower.contains("write the content of the chapter") {
            FallbackBranch::Writer
        } else if lower.contains("revise the following chapter text")
            || prompt.contains(MANUSCRIPT_MARKER)
        {
            FallbackBranch::Review
        } else {
            FallbackBranch::Generic
        }
    }

    /// Pure part of [`FallbackResponder::respond`].
    pub fn canned(prompt: &str, role: AgentRole) -> String {
        match Self::branch(prompt, role) {
            FallbackBranch::OutlineResearch => OUTLINE_REPORT.to_owned(),
            FallbackBranch::ChapterResearch => CHAPTER_RESEARCH.to_owned(),
            FallbackBranch::Writer => WRITER_PARAGRAPH.to_owned(),
            FallbackBranch::Review => {
                if let Some(manuscript) = text_after(prompt, MANUSCRIPT_MARKER) {
                    return format!("{manuscript}\n\n{SIMULATED_REVIEW_NOTICE}");
                }
                if let Some(text) = text_after(prompt, REVIEW_TEXT_MARKER) {
                    return text.to_owned();
                }
                REVIEW_WITHOUT_TEXT.to_owned()
            }
            FallbackBranch::Generic => GENERIC_RESPONSE.to_owned(),
        }
    }

    pub async fn respond(&self, prompt: &str, role: AgentRole) -> String {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::debug!(
            role = role.as_str(),
            branch = ?Self::branch(prompt, role),
            "fallback response"
        );
        Self::canned(prompt, role)
    }
}

fn text_after<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
    let (_, rest) = prompt.split_once(marker)?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}
