use crate::project::Project;

pub const CONTENT_UNAVAILABLE: &str = "Content unavailable.";
pub const CONTENTS_HEADING: &str = "Table of Contents";

/// Extra sections that open the book, in this order, before any others.
const PREFERRED_SECTION_ORDER: [&str; 2] = ["preface", "introduction"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSection {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

/// Format-independent reading order of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookLayout {
    pub title: String,
    pub front_matter: Vec<LayoutSection>,
    pub contents: Vec<String>,
    pub chapters: Vec<LayoutSection>,
}

impl BookLayout {
    pub fn from_project(project: &Project) -> Self {
        let title = project
            .plan
            .as_ref()
            .map(|plan| plan.title.trim())
            .filter(|title| !title.is_empty())
            .unwrap_or(project.name.as_str())
            .to_owned();

        let mut sections = project
            .extra_sections
            .iter()
            .filter(|(_, section)| !section.content.trim().is_empty())
            .collect::<Vec<_>>();
        sections.sort_by_key(|(key, _)| section_rank(key));
        let front_matter = sections
            .into_iter()
            .map(|(_, section)| LayoutSection {
                heading: section.title.clone(),
                paragraphs: paragraphs(&section.content),
            })
            .collect();

        let contents = project
            .chapters
            .iter()
            .map(|chapter| chapter_heading(chapter.number, &chapter.title))
            .collect();
        let chapters = project
            .chapters
            .iter()
            .map(|chapter| LayoutSection {
                heading: chapter_heading(chapter.number, &chapter.title),
                paragraphs: paragraphs(&chapter.final_text),
            })
            .collect();

        Self {
            title,
            front_matter,
            contents,
            chapters,
        }
    }
}

fn section_rank(key: &str) -> usize {
    PREFERRED_SECTION_ORDER
        .iter()
        .position(|preferred| preferred.eq_ignore_ascii_case(key))
        .unwrap_or(PREFERRED_SECTION_ORDER.len())
}

pub fn chapter_heading(number: u32, title: &str) -> String {
    format!("Chapter {number}: {title}")
}

/// Splits on blank lines. Text with no paragraphs yields the placeholder.
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        current.push(line.trim_end());
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }

    if out.is_empty() {
        out.push(CONTENT_UNAVAILABLE.to_owned());
    }
    out
}
