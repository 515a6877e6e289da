use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use bookforge::chapters::WriteOptions;
use bookforge::cli::{Cli, Command, OutputArgs, PlanArgs, PlanningArgs};
use bookforge::config::Config;
use bookforge::interaction::{AutoApprove, ReviewPolicy, TerminalReview};
use bookforge::project::Project;
use bookforge::render::{RenderReport, style};
use bookforge::workflow::{PlanRequest, Workflow};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    bookforge::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let config = Config::load(cli.config.as_deref()).context("load config")?;
    let workflow = Workflow::new(config)?;

    match cli.command {
        Command::Plan(args) => plan(&workflow, args).await.context("plan")?,
        Command::Section(args) => {
            let project = workflow
                .add_section(&args.project.project, &args.kind)
                .await
                .context("section")?;
            println!(
                "section `{}` saved to project `{}`",
                args.kind.trim(),
                project.name
            );
        }
        Command::Write(args) => {
            let options = WriteOptions {
                max_chapters: args.max_chapters,
            };
            let mut policy = policy(args.interactive);
            let run = workflow
                .write_chapters(&args.project.project, options, policy.as_mut())
                .await
                .context("write")?;
            for err in &run.checkpoint_errors {
                eprintln!("warning: checkpoint not saved: {err}");
            }
            println!(
                "created chapters {:?}; {}/{} done{}",
                run.created,
                run.project.chapters.len(),
                run.project.plan.as_ref().map_or(0, |p| p.chapter_count()),
                if run.cancelled { " (stopped)" } else { "" }
            );
        }
        Command::Finalize(args) => {
            let outcome = if args.no_render {
                workflow.finalize(&args.project.project).await?
            } else {
                let style = style::lookup(&args.output.style)?;
                let (outcome, report) = workflow
                    .finalize_and_render(&args.project.project, style, &args.output.formats())
                    .await
                    .context("finalize")?;
                print_report(&report);
                outcome
            };
            if let Some(err) = &outcome.checkpoint_error {
                eprintln!("warning: finalized project not saved: {err}");
            }
            println!("finalization: {}", outcome.status);
        }
        Command::Render(args) => {
            let project = workflow
                .load(&args.project.project)
                .await?
                .ok_or_else(|| anyhow::anyhow!("project `{}` not found", args.project.project))?;
            render(&workflow, &project, &args.output).await?;
        }
        Command::Run(args) => {
            let style = style::lookup(&args.output.style)?;
            let request = plan_request(&args.planning, true);
            let run = workflow
                .run_book(&args.planning.theme, &request, style, &args.output.formats())
                .await
                .context("run")?;
            for err in &run.checkpoint_errors {
                eprintln!("warning: checkpoint not saved: {err}");
            }
            println!(
                "project `{}`: {} chapters, finalization: {}",
                run.project.name,
                run.chapters.len(),
                run.finalize
            );
            print_report(&run.report);
        }
        Command::List => {
            for name in workflow.list_projects().await? {
                println!("{name}");
            }
        }
        Command::Show(args) => {
            let project = workflow
                .load(&args.project)
                .await?
                .ok_or_else(|| anyhow::anyhow!("project `{}` not found", args.project))?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
    }

    Ok(())
}

fn policy(interactive: bool) -> Box<dyn ReviewPolicy> {
    if interactive {
        Box::new(TerminalReview::new(
            std::io::BufReader::new(std::io::stdin()),
            std::io::stderr(),
        ))
    } else {
        Box::new(AutoApprove)
    }
}

fn plan_request(args: &PlanningArgs, with_introduction: bool) -> PlanRequest {
    PlanRequest {
        project: args.project.clone(),
        chapter_count: args.chapters,
        paragraph_bounds: args.paragraphs,
        with_introduction,
    }
}

async fn plan(workflow: &Workflow, args: PlanArgs) -> anyhow::Result<()> {
    let request = plan_request(&args.planning, !args.no_introduction);
    let project = match &args.title {
        Some(title) => {
            workflow
                .plan_with_title(&args.planning.theme, title, &request)
                .await?
        }
        None => {
            let mut policy = policy(args.interactive);
            workflow
                .plan(&args.planning.theme, &request, policy.as_mut())
                .await?
        }
    };

    let Some(plan) = &project.plan else {
        anyhow::bail!("planning produced no plan");
    };
    println!("project: {}", project.name);
    println!("title: {}", plan.title);
    println!("audience: {}", plan.audience);
    for (idx, title) in plan.chapter_titles.iter().enumerate() {
        println!("  {}. {title}", idx + 1);
    }
    Ok(())
}

async fn render(workflow: &Workflow, project: &Project, output: &OutputArgs) -> anyhow::Result<()> {
    let style = style::lookup(&output.style)?;
    let report = workflow.render(project, style, &output.formats()).await?;
    print_report(&report);
    if report.written().next().is_none() {
        anyhow::bail!("no format could be rendered");
    }
    Ok(())
}

fn print_report(report: &RenderReport) {
    for file in &report.files {
        match &file.error {
            None => println!("wrote {}", file.path.display()),
            Some(err) => eprintln!("warning: {} not rendered: {err}", file.path.display()),
        }
    }
}
