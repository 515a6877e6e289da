//! The chapter delimiter convention shared by the finalization prompt and its reply.
//!
//! Each chapter is serialized as a `--- CHAPTER <n>: <title> ---` line followed by its body. A reply
//! is split in front of every `--- CHAPTER <digits>:` prefix and must yield exactly one segment per
//! chapter.

use crate::project::ChapterRecord;

const DELIMITER_OPEN: &str = "--- CHAPTER ";
const DELIMITER_CLOSE: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} chapter segments, found {found}")]
pub struct SegmentMismatch {
    pub expected: usize,
    pub found: usize,
}

pub fn delimiter(number: u32, title: &str) -> String {
    format!("{DELIMITER_OPEN}{number}: {title} {DELIMITER_CLOSE}")
}

pub fn delimiter_pattern_hint() -> &'static str {
    "--- CHAPTER X: [TITLE] ---"
}

/// Serializes the chapters in order. Empty when there are no chapters.
pub fn build(chapters: &[ChapterRecord]) -> String {
    let mut out = String::new();
    for chapter in chapters {
        out.push_str(&delimiter(chapter.number, &chapter.title));
        out.push('\n');
        out.push_str(&chapter.final_text);
        out.push_str("\n\n");
    }
    out
}

/// Length of the `--- CHAPTER <digits>:` prefix at the start of `text`, if present.
fn header_prefix_len(text: &str) -> Option<usize> {
    let rest = text.strip_prefix(DELIMITER_OPEN)?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || rest.as_bytes().get(digits) != Some(&b':') {
        return None;
    }
    Some(DELIMITER_OPEN.len() + digits + 1)
}

fn header_starts(text: &str) -> Vec<usize> {
    text.match_indices(DELIMITER_OPEN)
        .map(|(idx, _)| idx)
        .filter(|&idx| header_prefix_len(&text[idx..]).is_some())
        .collect()
}

/// Splits in front of every chapter header, keeping the header with its segment.
///
/// Segments are trimmed and empty ones dropped; text before the first header counts as a segment.
pub fn split(reply: &str) -> Vec<&str> {
    let mut bounds = header_starts(reply);
    bounds.push(reply.len());

    let mut segments = Vec::with_capacity(bounds.len());
    let mut start = 0;
    for end in bounds {
        let segment = reply[start..end].trim();
        if !segment.is_empty() {
            segments.push(segment);
        }
        start = end;
    }
    segments
}

/// Removes the first complete `--- CHAPTER <n>: ... ---` header line and trims the rest.
pub fn strip_header(segment: &str) -> String {
    for start in header_starts(segment) {
        // A header may also be the last line, e.g. for an empty chapter.
        let (line_end, rest) = match segment[start..].find('\n') {
            Some(off) => (start + off, start + off + 1),
            None => (segment.len(), segment.len()),
        };
        let line = segment[start..line_end].trim_end_matches('\r');
        let prefix = header_prefix_len(line).unwrap_or(line.len());
        if !line[prefix..].ends_with(DELIMITER_CLOSE) {
            continue;
        }
        let mut out = String::with_capacity(segment.len());
        out.push_str(&segment[..start]);
        out.push_str(&segment[rest..]);
        return out.trim().to_owned();
    }
    segment.trim().to_owned()
}

/// Splits a revised manuscript back into chapter bodies, all or nothing.
pub fn parse_reply(reply: &str, expected: usize) -> Result<Vec<String>, SegmentMismatch> {
    let segments = split(reply);
    if segments.len() != expected {
        return Err(SegmentMismatch {
            expected,
            found: segments.len(),
        });
    }
    Ok(segments.into_iter().map(strip_header).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(number: u32, title: &str, text: &str) -> ChapterRecord {
        ChapterRecord {
            number,
            title: title.to_owned(),
            researched_content: String::new(),
            final_text: text.to_owned(),
            context_summary: String::new(),
        }
    }

    #[test]
    fn build_writes_delimiters_in_order() {
        let text = build(&[chapter(1, "T1", "A"), chapter(2, "T2", "B")]);
        assert_eq!(text, "--- CHAPTER 1: T1 ---\nA\n\n--- CHAPTER 2: T2 ---\nB\n\n");
        assert!(build(&[]).is_empty());
    }

    #[test]
    fn unchanged_manuscript_round_trips() {
        let chapters = [chapter(1, "T1", "A"), chapter(2, "T2", "B")];
        let bodies = parse_reply(&build(&chapters), 2).unwrap();
        assert_eq!(bodies, vec!["A".to_owned(), "B".to_owned()]);
    }

    #[test]
    fn empty_chapter_round_trips() {
        let chapters = [chapter(1, "T1", ""), chapter(2, "T2", "B")];
        let bodies = parse_reply(&build(&chapters), 2).unwrap();
        assert_eq!(bodies, vec![String::new(), "B".to_owned()]);
        assert_eq!(strip_header("--- CHAPTER 1: T1 ---"), "");
    }

    #[test]
    fn split_requires_digits_and_colon() {
        let reply = "--- CHAPTER 1: A ---\nSee --- CHAPTER X: later.\n--- CHAPTER 2 missing colon";
        assert_eq!(split(reply).len(), 1);
    }

    #[test]
    fn preamble_counts_as_a_segment() {
        let reply = "Here is the revision:\n--- CHAPTER 1: A ---\nOne\n--- CHAPTER 2: B ---\nTwo";
        assert_eq!(
            parse_reply(reply, 2),
            Err(SegmentMismatch {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn strip_header_only_removes_first_header() {
        let segment = "--- CHAPTER 3: Deep ---\nBody mentions --- CHAPTER 3: Deep ---\nend";
        assert_eq!(
            strip_header(segment),
            "Body mentions --- CHAPTER 3: Deep ---\nend"
        );
    }

    #[test]
    fn strip_header_keeps_unterminated_header() {
        assert_eq!(strip_header("--- CHAPTER 1: No body"), "--- CHAPTER 1: No body");
        assert_eq!(strip_header("--- CHAPTER 1: T ---\r\nBody"), "Body");
    }
}
