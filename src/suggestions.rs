//! Turns free-text model replies into title lists.

const LEAD_IN: &str = "here are";

pub fn placeholder_chapter_title(number: usize) -> String {
    format!("Chapter {number}")
}

pub fn placeholder_chapter_titles(count: usize) -> Vec<String> {
    (1..=count).map(placeholder_chapter_title).collect()
}

/// One candidate per non-blank line, with any leading `N.` numbering removed.
pub fn parse_title_candidates(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| strip_numbering(line).to_owned())
        .filter(|title| !title.is_empty())
        .collect()
}

/// Parses one title per line and reconciles the list to exactly `chapter_count` entries.
///
/// Extra titles are dropped; missing trailing positions get `Chapter {i}` placeholders.
pub fn reconcile_chapter_titles(raw: &str, chapter_count: usize) -> Vec<String> {
    let mut titles = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.to_lowercase().starts_with(LEAD_IN))
        .map(str::to_owned)
        .collect::<Vec<_>>();

    titles.truncate(chapter_count);
    while titles.len() < chapter_count {
        titles.push(placeholder_chapter_title(titles.len() + 1));
    }
    titles
}

fn strip_numbering(line: &str) -> &str {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return line;
    }
    match line[digits..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}
