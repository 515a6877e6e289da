use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use zip::write::SimpleFileOptions;

use super::layout::{BookLayout, CONTENTS_HEADING, LayoutSection};
use super::style::StyleProfile;

const TWIPS_PER_INCH: f32 = 1440.0;
// US Letter.
const PAGE_WIDTH_TWIPS: u32 = 12240;
const PAGE_HEIGHT_TWIPS: u32 = 15840;

/// Writes a WordprocessingML package.
pub fn write(layout: &BookLayout, style: &StyleProfile, out_path: &Path) -> anyhow::Result<()> {
    let out_file = File::create(out_path)
        .with_context(|| format!("open docx output: {}", out_path.display()))?;
    let mut zip = zip::ZipWriter::new(out_file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let parts = [
        ("[Content_Types].xml", render_content_types()),
        ("_rels/.rels", render_package_rels()),
        ("word/_rels/document.xml.rels", render_document_rels()),
        ("word/styles.xml", render_styles(style)),
        ("word/document.xml", render_document(layout, style)),
    ];
    for (name, xml) in parts {
        zip.start_file(name, options)
            .with_context(|| format!("docx start_file {name}"))?;
        zip.write_all(xml.as_bytes())
            .with_context(|| format!("docx write {name}"))?;
    }

    zip.finish().context("docx finish zip")?;
    Ok(())
}

fn render_content_types() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>
"#
    .to_string()
}

fn render_package_rels() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>
"#
    .to_string()
}

fn render_document_rels() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>
"#
    .to_string()
}

fn half_points(pt: f32) -> u32 {
    (pt * 2.0).round() as u32
}

fn twips_from_pt(pt: f32) -> u32 {
    (pt * 20.0).round() as u32
}

fn twips_from_in(inches: f32) -> u32 {
    (inches * TWIPS_PER_INCH).round() as u32
}

fn run_props(font: &str, size_pt: f32, bold: bool, italic: bool) -> String {
    let font = xml_escape(font);
    let mut out = format!(
        "<w:rPr><w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/>"
    );
    if bold {
        out.push_str("<w:b/>");
    }
    if italic {
        out.push_str("<w:i/>");
    }
    let size = half_points(size_pt);
    out.push_str(&format!("<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/></w:rPr>"));
    out
}

fn render_styles(style: &StyleProfile) -> String {
    let line = (style.line_spacing * 240.0).round() as u32;
    let after = twips_from_pt(style.space_after_pt);
    let indent = twips_from_in(style.first_line_indent_in);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    out.push_str(
        "<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\n",
    );
    out.push_str(&format!(
        "  <w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/>\
<w:pPr><w:spacing w:after=\"{after}\" w:line=\"{line}\" w:lineRule=\"auto\"/><w:ind w:firstLine=\"{indent}\"/><w:jc w:val=\"both\"/></w:pPr>{}</w:style>\n",
        run_props(style.body_font, style.body_size_pt, false, false)
    ));
    out.push_str(&format!(
        "  <w:style w:type=\"paragraph\" w:styleId=\"Title\"><w:name w:val=\"Title\"/><w:basedOn w:val=\"Normal\"/>\
<w:pPr><w:ind w:firstLine=\"0\"/><w:jc w:val=\"center\"/></w:pPr>{}</w:style>\n",
        run_props(
            style.title_font,
            style.title_size_pt,
            style.title_bold,
            false
        )
    ));
    out.push_str(&format!(
        "  <w:style w:type=\"paragraph\" w:styleId=\"Heading1\"><w:name w:val=\"heading 1\"/><w:basedOn w:val=\"Normal\"/>\
<w:pPr><w:keepNext/><w:spacing w:before=\"240\" w:after=\"240\"/><w:ind w:firstLine=\"0\"/><w:jc w:val=\"left\"/><w:outlineLvl w:val=\"0\"/></w:pPr>{}</w:style>\n",
        run_props(
            style.heading_font,
            style.heading_size_pt,
            style.heading_bold,
            style.heading_italic
        )
    ));
    out.push_str(
        "  <w:style w:type=\"paragraph\" w:styleId=\"ContentsEntry\"><w:name w:val=\"Contents Entry\"/><w:basedOn w:val=\"Normal\"/>\
<w:pPr><w:ind w:left=\"360\" w:firstLine=\"0\"/><w:jc w:val=\"left\"/></w:pPr></w:style>\n",
    );
    out.push_str("</w:styles>\n");
    out
}

fn paragraph(style_id: &str, text: &str) -> String {
    let mut runs = String::new();
    for (idx, line) in text.lines().enumerate() {
        if idx > 0 {
            runs.push_str("<w:br/>");
        }
        runs.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t>",
            xml_escape(line)
        ));
    }
    format!("    <w:p><w:pPr><w:pStyle w:val=\"{style_id}\"/></w:pPr><w:r>{runs}</w:r></w:p>\n")
}

fn page_break() -> &'static str {
    "    <w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>\n"
}

fn push_section(body: &mut String, section: &LayoutSection) {
    body.push_str(&paragraph("Heading1", &section.heading));
    for text in &section.paragraphs {
        body.push_str(&paragraph("Normal", text));
    }
}

fn render_document(layout: &BookLayout, style: &StyleProfile) -> String {
    let mut body = String::new();
    body.push_str(&paragraph("Title", &layout.title));
    body.push_str(page_break());

    for section in &layout.front_matter {
        push_section(&mut body, section);
        body.push_str(page_break());
    }

    body.push_str(&paragraph("Heading1", CONTENTS_HEADING));
    for entry in &layout.contents {
        body.push_str(&paragraph("ContentsEntry", entry));
    }
    body.push_str(page_break());

    for (idx, chapter) in layout.chapters.iter().enumerate() {
        push_section(&mut body, chapter);
        if idx + 1 < layout.chapters.len() {
            body.push_str(page_break());
        }
    }

    let margins = style.margins;
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    out.push_str(
        "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\n",
    );
    out.push_str("  <w:body>\n");
    out.push_str(&body);
    out.push_str(&format!(
        "    <w:sectPr><w:pgSz w:w=\"{PAGE_WIDTH_TWIPS}\" w:h=\"{PAGE_HEIGHT_TWIPS}\"/>\
<w:pgMar w:top=\"{}\" w:right=\"{}\" w:bottom=\"{}\" w:left=\"{}\" w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>\n",
        twips_from_in(margins.top),
        twips_from_in(margins.right),
        twips_from_in(margins.bottom),
        twips_from_in(margins.left),
    ));
    out.push_str("  </w:body>\n");
    out.push_str("</w:document>\n");
    out
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use super::*;
    use crate::render::style::{ACADEMIC, STANDARD};

    fn layout() -> BookLayout {
        BookLayout {
            title: "Tides & <Moons>".to_owned(),
            front_matter: Vec::new(),
            contents: vec!["Chapter 1: Pull".to_owned()],
            chapters: vec![LayoutSection {
                heading: "Chapter 1: Pull".to_owned(),
                paragraphs: vec!["Line one\nline two".to_owned()],
            }],
        }
    }

    #[test]
    fn styles_follow_profile() {
        let xml = render_styles(&ACADEMIC);
        assert!(xml.contains("w:ascii=\"Times New Roman\""));
        // 1.5 line spacing, 0.5in indent, 12pt body.
        assert!(xml.contains("w:line=\"360\""));
        assert!(xml.contains("w:firstLine=\"720\""));
        assert!(xml.contains("<w:sz w:val=\"24\"/>"));
    }

    #[test]
    fn document_escapes_text_and_sets_margins() {
        let xml = render_document(&layout(), &ACADEMIC);
        assert!(xml.contains("Tides &amp; &lt;Moons&gt;"));
        assert!(xml.contains("Line one</w:t><w:br/><w:t xml:space=\"preserve\">line two"));
        assert!(xml.contains("w:top=\"1699\""));
    }

    #[test]
    fn write_produces_readable_package() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("book.docx");
        write(&layout(), &STANDARD, &path)?;

        let mut archive = zip::ZipArchive::new(File::open(&path)?)?;
        let mut document = String::new();
        archive
            .by_name("word/document.xml")?
            .read_to_string(&mut document)?;
        assert!(document.contains("Chapter 1: Pull"));
        assert!(archive.by_name("[Content_Types].xml").is_ok());
        Ok(())
    }
}
