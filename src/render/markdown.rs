use super::layout::{BookLayout, CONTENTS_HEADING, LayoutSection};

const PAGE_BREAK: &str = "\\newpage";

/// Renders the layout as Markdown. `page_breaks` adds LaTeX `\newpage` lines for pandoc.
pub fn render(layout: &BookLayout, page_breaks: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", layout.title));
    push_break(&mut out, page_breaks);

    for section in &layout.front_matter {
        push_section(&mut out, section);
        push_break(&mut out, page_breaks);
    }

    out.push_str(&format!("## {CONTENTS_HEADING}\n\n"));
    for entry in &layout.contents {
        out.push_str(&format!("- {entry}\n"));
    }
    out.push('\n');
    push_break(&mut out, page_breaks);

    for (idx, chapter) in layout.chapters.iter().enumerate() {
        push_section(&mut out, chapter);
        if idx + 1 < layout.chapters.len() {
            push_break(&mut out, page_breaks);
        }
    }
    out
}

fn push_section(out: &mut String, section: &LayoutSection) {
    out.push_str(&format!("## {}\n\n", section.heading));
    for paragraph in &section.paragraphs {
        out.push_str(paragraph);
        out.push_str("\n\n");
    }
}

fn push_break(out: &mut String, page_breaks: bool) {
    if page_breaks {
        out.push_str(PAGE_BREAK);
        out.push_str("\n\n");
    }
}
