use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::project::ParagraphBounds;
use crate::render::Format;
use crate::render::style::DEFAULT_STYLE;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// YAML config file (also read from `BOOKFORGE_CONFIG`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a book: outline, summary, title, chapter titles and audience.
    Plan(PlanArgs),
    /// Generate an extra section (Introduction, Preface, Appendix, Index, ...).
    Section(SectionArgs),
    /// Create the next pending chapters.
    Write(WriteArgs),
    /// Whole-manuscript review, then render.
    Finalize(FinalizeArgs),
    Render(RenderArgs),
    /// Plan, write, finalize and render without asking anything.
    Run(RunArgs),
    /// List stored projects.
    List,
    /// Print a stored project as JSON.
    Show(ProjectArg),
}

#[derive(Debug, Args)]
pub struct PlanningArgs {
    /// Book theme.
    #[arg(long)]
    pub theme: String,

    /// Number of chapters.
    #[arg(long, default_value_t = 5)]
    pub chapters: usize,

    /// Paragraphs per chapter as `min-max`.
    #[arg(long, default_value = "5-8", value_parser = ParagraphBounds::parse)]
    pub paragraphs: ParagraphBounds,

    /// Store name (default: derived from the chosen title).
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub planning: PlanningArgs,

    /// Use this title instead of picking one of the suggestions.
    #[arg(long)]
    pub title: Option<String>,

    /// Ask on the terminal which title to use.
    #[arg(long, conflicts_with = "title")]
    pub interactive: bool,

    /// Skip the automatic introduction.
    #[arg(long)]
    pub no_introduction: bool,
}

#[derive(Debug, Args)]
pub struct ProjectArg {
    /// Project name.
    #[arg(long)]
    pub project: String,
}

#[derive(Debug, Args)]
pub struct SectionArgs {
    #[command(flatten)]
    pub project: ProjectArg,

    /// Section kind or free-form name.
    #[arg(long, default_value = "Introduction")]
    pub kind: String,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    #[command(flatten)]
    pub project: ProjectArg,

    /// Stop after this many chapters.
    #[arg(long)]
    pub max_chapters: Option<usize>,

    /// Review research, drafts and revisions on the terminal.
    #[arg(long)]
    pub interactive: bool,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Style profile (standard, academic, modern_novel).
    #[arg(long, default_value = DEFAULT_STYLE)]
    pub style: String,

    /// Output formats (default: md and docx).
    #[arg(long = "format", value_enum)]
    pub formats: Vec<Format>,
}

impl OutputArgs {
    pub fn formats(&self) -> Vec<Format> {
        if self.formats.is_empty() {
            return vec![Format::Md, Format::Docx];
        }
        self.formats.clone()
    }
}

#[derive(Debug, Args)]
pub struct FinalizeArgs {
    #[command(flatten)]
    pub project: ProjectArg,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Only run the review pass.
    #[arg(long)]
    pub no_render: bool,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub project: ProjectArg,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub planning: PlanningArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}
