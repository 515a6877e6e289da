//! Prompt text for every generation call. Each builder embeds the output of the stage before it.

use crate::manuscript;
use crate::project::Plan;

/// Precedes the whole manuscript in the finalization prompt.
pub const MANUSCRIPT_MARKER: &str = "FULL MANUSCRIPT FOR FINAL REVIEW:";
/// Precedes the chapter draft in the review prompt.
pub const REVIEW_TEXT_MARKER: &str = "TEXT TO REVIEW:";

const TITLE_SUGGESTION_COUNT: usize = 5;

pub fn outline(theme: &str) -> String {
    format!(
        "I am planning a book about '{theme}'. Research the main topics, subtopics and important \
         areas that a book on this theme could cover. Present them as a concise report in a \
         numbered or bulleted list."
    )
}

pub fn summary(outline: &str, theme: &str) -> String {
    format!(
        "Based on the following approved outline for a book about '{theme}':\n{outline}\n\
         Write a detailed and cohesive summary of what the book will cover. This summary will be \
         the main context for writing every chapter."
    )
}

pub fn title_suggestions(summary: &str, theme: &str) -> String {
    format!(
        "Suggest {TITLE_SUGGESTION_COUNT} creative titles for a book on the theme '{theme}' with \
         the summary:\n'{summary}'. List only the titles, one per line."
    )
}

pub fn chapter_titles(summary: &str, chapter_count: usize, book_title: &str) -> String {
    format!(
        "For the book '{book_title}' ({chapter_count} chapters, summary: '{summary}'), suggest a \
         concise title for each of the {chapter_count} chapters. List one per line, without \
         numbering."
    )
}

pub fn audience(summary: &str, book_title: &str) -> String {
    format!(
        "For the book '{book_title}' (context: '{summary}'), describe the ideal target audience \
         in one or two sentences."
    )
}

pub fn section(kind: &str, plan: &Plan) -> String {
    format!(
        "For the book '{}' on the theme '{}' with the target audience '{}', write a concise and \
         fitting {kind}. General context of the book: {}",
        plan.title, plan.theme, plan.audience, plan.summary
    )
}

pub fn chapter_research(
    plan: &Plan,
    number: u32,
    title: &str,
    rolling_context: &str,
    feedback: Option<&str>,
) -> String {
    let mut prompt = format!(
        "For the chapter '{title}' (Ch. {number}) of the book '{}' (target audience: {}), whose \
         general theme is '{}', and considering the following context from previous chapters: \
         {rolling_context}. Research content for the chapter: provide the main points, relevant \
         information, data and concepts this specific chapter should cover. Be detailed and \
         provide substantial material.",
        plan.title, plan.audience, plan.summary
    );
    push_feedback(&mut prompt, feedback);
    prompt
}

pub fn chapter_draft(
    plan: &Plan,
    title: &str,
    researched_content: &str,
    rolling_context: &str,
    feedback: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Act as an expert writer on the subject of the book '{}'. Write the content of the \
         chapter '{title}'. The target audience is: {}. Base it on the following material:\n\
         '{researched_content}'.\n\
         The chapter must have between {} and {} paragraphs. Keep a fitting tone. Take the \
         context of the previous chapters ({rolling_context}) into account for flow.\n\
         Focus on clarity and cohesion. Do not add 'In this chapter...' unless it is natural.",
        plan.title, plan.audience, plan.paragraph_bounds.min, plan.paragraph_bounds.max
    );
    push_feedback(&mut prompt, feedback);
    prompt
}

pub fn chapter_review(plan: &Plan, title: &str, draft: &str) -> String {
    format!(
        "Revise the following chapter text of '{title}' (book: '{}') for grammar, cohesion and \
         clarity. Provide only the revised version of the text.\n{REVIEW_TEXT_MARKER}\n{draft}",
        plan.title
    )
}

pub fn chapter_summary(title: &str, final_text: &str) -> String {
    format!(
        "Summarize the main points of the chapter '{title}' in 2-3 sentences. \
         Chapter text:\n{final_text}"
    )
}

pub fn finalization(plan: &Plan, manuscript_text: &str) -> String {
    let first = manuscript::delimiter(1, "...");
    let first = first.trim_end_matches(" ---");
    format!(
        "You are a senior book editor. Perform a final review and polish of the COMPLETE \
         MANUSCRIPT below. General context of the book (Theme: {}, Title: {}, Target audience: \
         {}):\n{}\n\n\
         Instructions:\n\
         1. Correct grammar and spelling.\n\
         2. Ensure global cohesion and coherence across chapters.\n\
         3. Keep a consistent tone appropriate for the target audience.\n\
         4. Improve clarity and remove redundancy.\n\
         5. **IMPORTANT**: Return the COMPLETE REVISED TEXT, keeping EXACTLY the same chapter \
         separator structure ({}). Your answer must start directly with '{first}' and end after \
         the last chapter, without adding comments.\n\n\
         {MANUSCRIPT_MARKER}\n{manuscript_text}",
        plan.theme,
        plan.title,
        plan.audience,
        plan.summary,
        manuscript::delimiter_pattern_hint(),
    )
}

fn push_feedback(prompt: &mut String, feedback: Option<&str>) {
    if let Some(feedback) = feedback.map(str::trim).filter(|f| !f.is_empty()) {
        prompt.push_str("\nAdditional guidance from the editor: ");
        prompt.push_str(feedback);
    }
}
