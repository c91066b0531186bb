/*!
# Patchsmith CLI

Command-line front end for the patch engine: apply a plan to a project, or
inspect a plan without touching anything.
*/

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::{style, Term};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

use patchsmith::{JsonReporter, Plan, ReportFormat, RunConfig, Runner, TextReporter};

#[derive(Parser)]
#[command(
    name = "patchsmith",
    version = env!("CARGO_PKG_VERSION"),
    about = "Idempotent source-patching engine for wiring libraries into existing Rust projects"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a plan to a project
    Apply {
        /// Path to the plan file (TOML)
        #[arg(short, long)]
        plan: PathBuf,

        /// Project root the plan's paths resolve against
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Classify every patch but write nothing
        #[arg(long)]
        dry_run: bool,

        /// Overwrite existing scaffold destinations
        #[arg(long)]
        force: bool,

        /// File-level worker count (1 = sequential)
        #[arg(short, long, default_value = "1")]
        workers: usize,

        /// Report format (text, json)
        #[arg(short = 'f', long, default_value = "text")]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what a plan would do, without reading the project
    Show {
        /// Path to the plan file (TOML)
        #[arg(short, long)]
        plan: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Apply {
            plan,
            project,
            dry_run,
            force,
            workers,
            format,
            output,
        } => apply_command(plan, project, dry_run, force, workers, &format, output),
        Commands::Show { plan } => show_command(plan),
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_command(
    plan_path: PathBuf,
    project: PathBuf,
    dry_run: bool,
    force: bool,
    workers: usize,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let Some(format) = ReportFormat::from_name(format) else {
        bail!("unknown report format `{format}` (expected text or json)");
    };

    let plan = Plan::load(&plan_path)
        .with_context(|| format!("loading plan {}", plan_path.display()))?;
    if plan.is_empty() {
        bail!("plan {} contains no patches or scaffolds", plan_path.display());
    }

    info!(
        plan = %plan_path.display(),
        patches = plan.patches.len(),
        scaffolds = plan.scaffolds.len(),
        "plan loaded"
    );

    let runner = Runner::new(RunConfig {
        project_root: project,
        dry_run,
        force,
        workers,
    });

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!(
        "applying {} patches to {} files...",
        plan.patches.len(),
        plan.target_files().len()
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let started = Instant::now();
    let result = runner.run(&plan);
    spinner.finish_and_clear();
    let result = result.context("run aborted")?;

    let report = match format {
        ReportFormat::Text => TextReporter::new().render(&result),
        ReportFormat::Json => JsonReporter::new()
            .render(&result)
            .context("serializing report")?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, report)
                .with_context(|| format!("writing report to {}", path.display()))?;
            eprintln!("report written to {}", path.display());
        }
        None => println!("{report}"),
    }
    info!(elapsed = ?started.elapsed(), "run finished");
    Ok(())
}

fn show_command(plan_path: PathBuf) -> Result<()> {
    let plan = Plan::load(&plan_path)
        .with_context(|| format!("loading plan {}", plan_path.display()))?;
    let term = Term::stdout();

    let title = plan.name.as_deref().unwrap_or("unnamed plan");
    term.write_line(&format!("{}", style(title).bold().cyan()))?;

    if !plan.scaffolds.is_empty() {
        term.write_line(&format!("\n{}", style("Files to create").bold()))?;
        for request in &plan.scaffolds {
            term.write_line(&format!("  {}", request.dest.display()))?;
        }
    }

    if !plan.patches.is_empty() {
        term.write_line(&format!("\n{}", style("Patches").bold()))?;
        for patch in &plan.patches {
            term.write_line(&format!(
                "  {} {}",
                style(&patch.label).bold(),
                style(format!("({})", patch.target.display())).dim()
            ))?;
            for selector in &patch.recipe {
                term.write_line(&format!("    -> {}", selector.describe()))?;
            }
            if !patch.dependencies.is_empty() {
                term.write_line(&format!(
                    "    introduces: {}",
                    style(patch.dependencies.join(", ")).dim()
                ))?;
            }
        }
    }

    term.write_line(&format!(
        "\n{} patches, {} files to create",
        plan.patches.len(),
        plan.scaffolds.len()
    ))?;
    Ok(())
}
