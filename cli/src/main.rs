//! naqi CLI - bilingual document cleaning

mod external;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use naqi::{BatchReport, BatchRunner, CancelFlag, CleaningConfig, LopdfRebuilder, RunMode};

use external::TesseractEngine;

#[derive(Parser)]
#[command(name = "naqi")]
#[command(version)]
#[command(about = "Clean bilingual scanned documents for semantic indexing", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze documents and write plans and reports; modifies nothing
    Preview(RunArgs),

    /// Apply previously previewed plans (requires a preview artifact per file)
    Apply(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory containing the documents to process
    #[arg(long, default_value = "context", value_name = "DIR")]
    input_dir: PathBuf,

    /// Process a single file instead of the whole input directory
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Directory for cleaned artifacts and backups
    #[arg(long, default_value = "output", value_name = "DIR")]
    output_dir: PathBuf,

    /// Directory for preview and batch reports
    #[arg(long, default_value = "report", value_name = "DIR")]
    report_dir: PathBuf,

    /// Default OCR language code (ara, eng, ara+eng, ...)
    #[arg(long, default_value = "ara+eng", value_name = "CODE")]
    lang: String,

    /// Pages per OCR chunk
    #[arg(long, default_value = "200", value_name = "PAGES")]
    chunk_size: usize,

    /// Consistency score required to remove a header/footer band
    #[arg(long, default_value = "0.85", value_name = "SCORE")]
    detection_threshold: f32,

    /// Images below this fraction of page area are decorative candidates
    #[arg(long, default_value = "0.05", value_name = "FRACTION")]
    area_threshold: f32,

    /// Mean OCR confidence below which plans degrade to minimal mode
    #[arg(long, default_value = "0.70", value_name = "SCORE")]
    confidence_threshold: f32,

    /// Process documents sequentially
    #[arg(long)]
    sequential: bool,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "debug" } else { "info" },
    ))
    .init();

    let (args, mode) = match &cli.command {
        Commands::Preview(args) => (args, RunMode::Preview),
        Commands::Apply(args) => (args, RunMode::Apply),
    };

    match run(args, mode) {
        Ok(report) => {
            print_summary(&report, mode);
            if !report.skipped.is_empty() {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            std::process::exit(2);
        }
    }
}

fn run(args: &RunArgs, mode: RunMode) -> naqi::Result<BatchReport> {
    let mut config = CleaningConfig::new()
        .with_chunk_size(args.chunk_size)
        .with_detection_threshold(args.detection_threshold)
        .with_area_threshold(args.area_threshold)
        .with_confidence_threshold(args.confidence_threshold)
        .with_default_language(args.lang.parse().expect("language parsing is infallible"))
        .with_output_dir(&args.output_dir)
        .with_report_dir(&args.report_dir);
    if args.sequential {
        config = config.sequential();
    }

    let files = discover_files(args)?;
    if files.is_empty() {
        return Err(naqi::Error::Config(format!(
            "no PDF files found in {}",
            args.input_dir.display()
        )));
    }

    if mode == RunMode::Preview {
        println!(
            "{}",
            "PREVIEW MODE: no files will be modified".yellow().bold()
        );
    }
    println!("processing {} file(s)", files.len());

    let engine = TesseractEngine::new();
    let rebuilder = LopdfRebuilder::new();
    let runner = BatchRunner::new(&engine, &rebuilder, &config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .expect("static template"),
    );
    spinner.set_message("cleaning...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = runner.run(&files, mode, &CancelFlag::new());
    spinner.finish_and_clear();
    report
}

fn discover_files(args: &RunArgs) -> naqi::Result<Vec<PathBuf>> {
    if let Some(file) = &args.file {
        return Ok(vec![file.clone()]);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(&args.input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn print_summary(report: &BatchReport, mode: RunMode) {
    println!();
    println!(
        "{} {}/{} file(s) processed",
        "done:".green().bold(),
        report.processed,
        report.total_files
    );

    for doc in &report.files {
        let removals = doc.remove_regions.len();
        let line = format!(
            "  {} — {} page(s), {} removal(s), {} kept region(s)",
            doc.file_name,
            doc.page_count,
            removals,
            doc.keep_regions.len()
        );
        if doc.degraded {
            println!("{} {}", line, "[minimal mode]".yellow());
        } else {
            println!("{line}");
        }
        for note in &doc.recommendations {
            println!("      {}", note.dimmed());
        }
    }

    for skipped in &report.skipped {
        println!(
            "  {} {} — {}",
            "skipped:".red(),
            skipped.file_name,
            skipped.error
        );
    }

    if mode == RunMode::Preview {
        println!();
        println!("review the reports, then run {} to clean", "naqi apply".bold());
    }
}
