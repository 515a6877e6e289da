use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FIRST_CHAPTER_CONTEXT: &str = "This is the first chapter.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphBounds {
    pub min: u32,
    pub max: u32,
}

impl ParagraphBounds {
    pub fn new(min: u32, max: u32) -> anyhow::Result<Self> {
        if min < 1 {
            anyhow::bail!("paragraph minimum must be >= 1 (got {min})");
        }
        if max < min {
            anyhow::bail!("paragraph maximum must be >= minimum (got {min}-{max})");
        }
        Ok(Self { min, max })
    }

    /// Parses the `min-max` form, e.g. `5-8`.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let Some((min, max)) = raw.trim().split_once('-') else {
            anyhow::bail!("paragraph range must look like `min-max`: {raw:?}");
        };
        let min = min
            .trim()
            .parse::<u32>()
            .map_err(|err| anyhow::anyhow!("invalid paragraph minimum {min:?}: {err}"))?;
        let max = max
            .trim()
            .parse::<u32>()
            .map_err(|err| anyhow::anyhow!("invalid paragraph maximum {max:?}: {err}"))?;
        Self::new(min, max)
    }
}

impl std::fmt::Display for ParagraphBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub theme: String,
    pub title: String,
    pub summary: String,
    pub chapter_titles: Vec<String>,
    pub audience: String,
    pub paragraph_bounds: ParagraphBounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
}

impl Plan {
    pub fn chapter_count(&self) -> usize {
        self.chapter_titles.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub number: u32,
    pub title: String,
    pub researched_content: String,
    pub final_text: String,
    pub context_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraSection {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub chapters: Vec<ChapterRecord>,
    #[serde(default)]
    pub extra_sections: BTreeMap<String, ExtraSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(name: &str) -> Self {
        Self {
            name: crate::store::sanitize(name),
            plan: None,
            chapters: Vec::new(),
            extra_sections: BTreeMap::new(),
            updated_at: None,
            finalized_at: None,
        }
    }

    /// Starts a new planning round: chapters and extra sections belong to the old plan.
    pub fn replan(&mut self, plan: Plan) {
        self.plan = Some(plan);
        self.chapters.clear();
        self.extra_sections.clear();
        self.finalized_at = None;
    }

    /// Zero-based index of the first chapter that has not been created yet.
    pub fn next_pending_index(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_complete(&self) -> bool {
        self.plan
            .as_ref()
            .is_some_and(|plan| self.chapters.len() >= plan.chapter_count())
    }

    /// Appends the record, or replaces the one already holding its number.
    ///
    /// Records must stay contiguous, so a number beyond `len + 1` is rejected.
    pub fn upsert_chapter(&mut self, record: ChapterRecord) -> anyhow::Result<()> {
        let idx = (record.number as usize)
            .checked_sub(1)
            .ok_or_else(|| anyhow::anyhow!("chapter numbers start at 1"))?;
        if idx < self.chapters.len() {
            self.chapters[idx] = record;
            return Ok(());
        }
        if idx == self.chapters.len() {
            self.chapters.push(record);
            return Ok(());
        }
        anyhow::bail!(
            "chapter {} would leave a gap after chapter {}",
            record.number,
            self.chapters.len()
        );
    }

    pub fn rolling_context(&self) -> String {
        rolling_context(&self.chapters)
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

pub fn rolling_context(previous: &[ChapterRecord]) -> String {
    if previous.is_empty() {
        return FIRST_CHAPTER_CONTEXT.to_owned();
    }

    let mut out = String::from("Summaries of previous chapters:");
    for chapter in previous {
        out.push_str(&format!(
            "\nChapter {} ({}): {}",
            chapter.number,
            chapter.title,
            chapter.context_summary.trim()
        ));
    }
    out
}
