use std::ffi::OsString;
use std::io;
use std::io::Write as _;
use std::path::Path;
use std::process::Command;

use anyhow::Context as _;

use super::layout::BookLayout;
use super::markdown;
use super::style::StyleProfile;

pub const DEFAULT_PANDOC: &str = "pandoc";
const PDF_ENGINE: &str = "xelatex";

/// Renders via pandoc from a temporary Markdown file carrying page breaks.
pub fn write(
    layout: &BookLayout,
    style: &StyleProfile,
    out_path: &Path,
    pandoc: &str,
) -> anyhow::Result<()> {
    let mut input = tempfile::Builder::new()
        .prefix("bookforge-")
        .suffix(".md")
        .tempfile()
        .context("create pandoc input file")?;
    input
        .write_all(markdown::render(layout, true).as_bytes())
        .context("write pandoc input file")?;
    input.flush().context("flush pandoc input file")?;

    tracing::info!(
        format = "pdf",
        pdf_engine = PDF_ENGINE,
        pandoc,
        style = style.name,
        out = %out_path.display(),
        "export via pandoc"
    );
    let args = build_pandoc_args(input.path(), out_path, style);
    let output = match Command::new(pandoc).args(&args).output() {
        Ok(output) => output,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            anyhow::bail!("pandoc not found (`{pandoc}`); install pandoc to render PDF")
        }
        Err(err) => return Err(err).with_context(|| format!("run pandoc: {pandoc}")),
    };
    if !output.status.success() {
        anyhow::bail!(
            "pandoc failed with pdf_engine={PDF_ENGINE} ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}

fn variable(name: &str, value: impl std::fmt::Display) -> [OsString; 2] {
    [
        OsString::from("--variable"),
        OsString::from(format!("{name}={value}")),
    ]
}

fn build_pandoc_args(input: &Path, out_path: &Path, style: &StyleProfile) -> Vec<OsString> {
    let mut args = vec![
        input.as_os_str().to_owned(),
        OsString::from("-o"),
        out_path.as_os_str().to_owned(),
        OsString::from("--from"),
        OsString::from("markdown"),
        OsString::from("--pdf-engine"),
        OsString::from(PDF_ENGINE),
    ];

    let margins = style.margins;
    args.extend(variable(
        "geometry",
        format!(
            "top={}in,bottom={}in,left={}in,right={}in",
            margins.top, margins.bottom, margins.left, margins.right
        ),
    ));
    args.extend(variable("mainfont", style.body_font));
    // LaTeX document classes only accept 10pt, 11pt and 12pt.
    let font_size = (style.body_size_pt.round() as u32).clamp(10, 12);
    args.extend(variable("fontsize", format!("{font_size}pt")));
    args.extend(variable("linestretch", style.line_spacing));
    if style.first_line_indent_in > 0.0 {
        args.extend(variable("indent", "true"));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::style::{MODERN_NOVEL, STANDARD};

    fn joined(args: &[OsString]) -> String {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn pandoc_args_carry_style() {
        let args = joined(&build_pandoc_args(
            Path::new("in.md"),
            Path::new("out.pdf"),
            &MODERN_NOVEL,
        ));
        assert!(args.starts_with("in.md -o out.pdf"));
        assert!(args.contains("--variable mainfont=Georgia"));
        assert!(args.contains("--variable fontsize=11pt"));
        assert!(args.contains("--variable linestretch=1.8"));
        assert!(args.contains("--variable indent=true"));
    }

    #[test]
    fn standard_has_no_indent() {
        let args = joined(&build_pandoc_args(
            Path::new("in.md"),
            Path::new("out.pdf"),
            &STANDARD,
        ));
        assert!(args.contains("geometry=top=1in,bottom=1in,left=1in,right=1in"));
        assert!(!args.contains("indent=true"));
    }

    #[test]
    fn missing_pandoc_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let layout = BookLayout {
            title: "T".to_owned(),
            front_matter: Vec::new(),
            contents: Vec::new(),
            chapters: Vec::new(),
        };
        let err = write(
            &layout,
            &STANDARD,
            &temp.path().join("out.pdf"),
            "bookforge-no-such-pandoc",
        )
        .unwrap_err();
        assert!(err.to_string().contains("pandoc not found"), "{err:#}");
    }
}
