/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margins {
    const fn uniform(inches: f32) -> Self {
        Self {
            top: inches,
            bottom: inches,
            left: inches,
            right: inches,
        }
    }
}

/// Rendering rules applied uniformly across a document.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleProfile {
    pub name: &'static str,
    pub title_font: &'static str,
    pub title_size_pt: f32,
    pub title_bold: bool,
    pub heading_font: &'static str,
    pub heading_size_pt: f32,
    pub heading_bold: bool,
    pub heading_italic: bool,
    pub body_font: &'static str,
    pub body_size_pt: f32,
    pub line_spacing: f32,
    pub space_after_pt: f32,
    /// First-line indent in inches; zero for block paragraphs.
    pub first_line_indent_in: f32,
    pub margins: Margins,
}

pub const DEFAULT_STYLE: &str = "standard";

pub static STANDARD: StyleProfile = StyleProfile {
    name: "standard",
    title_font: "Arial",
    title_size_pt: 28.0,
    title_bold: false,
    heading_font: "Arial",
    heading_size_pt: 18.0,
    heading_bold: false,
    heading_italic: false,
    body_font: "Calibri",
    body_size_pt: 12.0,
    line_spacing: 1.5,
    space_after_pt: 12.0,
    first_line_indent_in: 0.0,
    margins: Margins::uniform(1.0),
};

/// Thesis layout: 3 cm top/left and 2 cm bottom/right margins.
pub static ACADEMIC: StyleProfile = StyleProfile {
    name: "academic",
    title_font: "Times New Roman",
    title_size_pt: 16.0,
    title_bold: true,
    heading_font: "Times New Roman",
    heading_size_pt: 14.0,
    heading_bold: true,
    heading_italic: false,
    body_font: "Times New Roman",
    body_size_pt: 12.0,
    line_spacing: 1.5,
    space_after_pt: 0.0,
    first_line_indent_in: 0.5,
    margins: Margins {
        top: 1.18,
        bottom: 0.78,
        left: 1.18,
        right: 0.78,
    },
};

pub static MODERN_NOVEL: StyleProfile = StyleProfile {
    name: "modern_novel",
    title_font: "Georgia",
    title_size_pt: 36.0,
    title_bold: false,
    heading_font: "Georgia",
    heading_size_pt: 22.0,
    heading_bold: false,
    heading_italic: true,
    body_font: "Georgia",
    body_size_pt: 11.0,
    line_spacing: 1.8,
    space_after_pt: 6.0,
    first_line_indent_in: 0.3,
    margins: Margins::uniform(1.0),
};

pub static PROFILES: [&StyleProfile; 3] = [&STANDARD, &ACADEMIC, &MODERN_NOVEL];

pub fn names() -> Vec<&'static str> {
    PROFILES.iter().map(|profile| profile.name).collect()
}

pub fn lookup(name: &str) -> anyhow::Result<&'static StyleProfile> {
    let wanted = name.trim().to_ascii_lowercase().replace('-', "_");
    PROFILES
        .iter()
        .copied()
        .find(|profile| profile.name == wanted)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "unknown style profile `{name}` (known: {})",
                names().join(", ")
            )
        })
}
