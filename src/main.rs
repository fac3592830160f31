use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use text_mutator::engine::closest_line_in_batch;
use text_mutator::{
    load_from_path, Approver, AutoApprove, DiffPreview, EditBatch, EditReport, EditSession,
    FsStorage, Operations, Outcome, PromptApprover,
};
use tracing_subscriber::EnvFilter;

/// Similarity above which a line is offered as a "did you mean" hint.
const NEAR_MATCH_THRESHOLD: f64 = 0.6;

#[derive(Parser)]
#[command(name = "text-mutator")]
#[command(
    about = "Apply line insertions and search/replace batches with a diff preview",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert content blocks at line positions of a file
    Insert(ApplyArgs),

    /// Run search/replace operations on a file
    Replace(ApplyArgs),

    /// Show the diff a batch would produce, without writing
    Preview {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// File to edit (defaults to `meta.file` from the batch)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Edit batch file (.toml, or .json)
    #[arg(short, long)]
    ops: PathBuf,

    /// Workspace root (defaults to TEXT_MUTATOR_WORKSPACE, then the current directory)
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Lines of context around each change in diffs
    #[arg(long, default_value_t = 3)]
    context: usize,
}

#[derive(Args)]
struct ApplyArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Insert(args) => cmd_apply(args, "insert"),
        Commands::Replace(args) => cmd_apply(args, "replace"),
        Commands::Preview { target } => cmd_preview(target),
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("TEXT_MUTATOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the workspace root.
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. TEXT_MUTATOR_WORKSPACE environment variable
/// 3. Current directory
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return path
            .canonicalize()
            .with_context(|| format!("workspace not found: {}", path.display()));
    }

    if let Ok(env_path) = env::var("TEXT_MUTATOR_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: TEXT_MUTATOR_WORKSPACE is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    Ok(env::current_dir()?)
}

/// Load the batch and settle which file it targets.
fn load_target(target: &TargetArgs) -> Result<(PathBuf, EditBatch, FsStorage)> {
    let workspace = resolve_workspace(target.workspace.clone())?;
    let batch = load_from_path(&target.ops)?;

    let file = match (&target.file, &batch.meta.file) {
        (Some(file), _) => file.clone(),
        (None, Some(file)) => PathBuf::from(file),
        (None, None) => anyhow::bail!(
            "No target file: pass --file or set `file` in the [meta] section of {}",
            target.ops.display()
        ),
    };

    let storage = FsStorage::new(&workspace)?;
    Ok((file, batch, storage))
}

fn cmd_apply(args: ApplyArgs, kind: &str) -> Result<()> {
    let (file, batch, storage) = load_target(&args.target)?;

    if batch.operations.kind() != kind {
        anyhow::bail!(
            "{} contains {} operations; use `text-mutator {}`",
            args.target.ops.display(),
            batch.operations.kind(),
            batch.operations.kind()
        );
    }

    println!("Workspace: {}", storage.workspace_root().display());
    println!("File: {}", file.display());
    if !batch.meta.name.is_empty() {
        println!("Batch: {}", batch.meta.name);
    }
    println!();

    let approver: Box<dyn Approver> = if args.yes || args.dry_run {
        Box::new(AutoApprove)
    } else {
        let prompt =
            PromptApprover::new(io::stdin().lock(), io::stdout(), file.display().to_string());
        Box::new(prompt.context(args.target.context))
    };

    if args.dry_run {
        println!("{}", "[DRY RUN - showing what would be applied]".cyan());
    }

    let mut session = EditSession::new(storage, approver).dry_run(args.dry_run);
    let report = session
        .run(&file, &batch.operations)
        .with_context(|| format!("failed to apply {kind} batch to {}", file.display()))?;

    if args.diff && matches!(report.outcome, Outcome::Applied | Outcome::Previewed) {
        display_diff(&report.preview, &file, args.target.context);
    }

    report_outcome(&report);
    finish(&report, &batch.operations)
}

fn cmd_preview(target: TargetArgs) -> Result<()> {
    let (file, batch, storage) = load_target(&target)?;

    let mut session = EditSession::new(storage, AutoApprove).dry_run(true);
    let report = session
        .run(&file, &batch.operations)
        .with_context(|| format!("failed to preview batch on {}", file.display()))?;

    display_diff(&report.preview, &file, target.context);
    report_outcome(&report);
    finish(&report, &batch.operations)
}

/// Helper: Show colored unified diff
fn display_diff(preview: &DiffPreview, file: &Path, context: usize) {
    let unified = preview.unified(
        context,
        &format!("{} (original)", file.display()),
        &format!("{} (modified)", file.display()),
    );

    for line in unified.lines() {
        let styled = if line.starts_with("---") || line.starts_with("+++") {
            line.dimmed()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else {
            line.normal()
        };
        println!("{}", styled);
    }
}

fn report_outcome(report: &EditReport) {
    let summary = report.preview.summary();
    let file = report.path.display();
    match report.outcome {
        Outcome::Applied => println!("{} {}: Applied ({})", "✓".green(), file, summary),
        Outcome::Previewed => println!("{} {}: Would apply ({})", "✓".green(), file, summary),
        Outcome::Rejected => println!("{} {}: Rejected, nothing written", "⊘".cyan(), file),
        Outcome::Unchanged => println!("{} {}: No changes", "⊙".yellow(), file),
    }
}

/// Report replace operations that matched nothing. Exits 1 when none of
/// them matched anything.
fn finish(report: &EditReport, operations: &Operations) -> Result<()> {
    let Operations::Replace(ops) = operations else {
        return Ok(());
    };

    let unmatched = report.unmatched();
    for &index in &unmatched {
        let op = &ops[index];
        eprintln!(
            "{} operation {}: no matches for {:?}",
            "⚠".yellow(),
            index,
            op.search
        );
        let hint = closest_line_in_batch(&report.original, ops, index, NEAR_MATCH_THRESHOLD);
        if let Some(near) = hint {
            eprintln!(
                "  Closest line {} ({:.0}% similar): {}",
                near.line,
                near.similarity * 100.0,
                near.text.trim()
            );
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  {} of {} operations matched ({} replacements)",
        format!("{}", ops.len() - unmatched.len()).green(),
        ops.len(),
        report.total_matches()
    );

    if !ops.is_empty() && unmatched.len() == ops.len() {
        std::process::exit(1);
    }

    Ok(())
}
