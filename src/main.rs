mod crawl;
mod db;
mod loader;
mod parser;
mod settings;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use crawl::{CrawlEvent, CrawlSummary, Indexer};
use loader::FsLoader;
use settings::Settings;

#[derive(Parser)]
#[command(name = "docset_indexer", about = "Build the Dash search index of a Doxygen docset")]
struct Cli {
    /// Docset bundle (the folder holding Contents/)
    docset: PathBuf,
    /// Print file lines only, without a progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    let documents = settings.documents_dir(&cli.docset);
    if !documents.is_dir() {
        bail!("No documents folder at {}", documents.display());
    }

    let conn = db::connect(&settings.index_path(&cli.docset))?;
    db::init_schema(&conn)?;

    let pb = if cli.no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    println!("Starting index...");
    let summary = Indexer::new(&documents, &settings.page_extension, FsLoader, &conn)
        .index(|event| report(&pb, event))?
        .wait()?;
    pb.finish_and_clear();

    println!("{}", done_line(&summary));
    println!(
        "  {} entries, {} unknown: {} resolved, {} dropped",
        summary.inserted, summary.unknown, summary.resolved, summary.purged
    );
    if summary.failed + summary.skipped > 0 {
        println!("  {} failed, {} skipped", summary.failed, summary.skipped);
    }
    for (ty, count) in db::count_by_type(&conn)? {
        println!("  {:<10} {:>6}", ty, count);
    }
    Ok(())
}

/// Stdout lines and progress for one crawl event.
fn report(pb: &ProgressBar, event: CrawlEvent<'_>) {
    match event {
        CrawlEvent::Started { files } => {
            pb.set_length(files as u64);
            pb.set_message("indexing");
        }
        CrawlEvent::Loaded(file) => {
            pb.suspend(|| println!("{}", file));
            pb.inc(1);
        }
        CrawlEvent::Reused(_) => pb.inc(1),
        CrawlEvent::Failed { file, error } => {
            pb.suspend(|| println!("Error indexing {}: {}", file, error));
            pb.inc(1);
        }
        CrawlEvent::Skipped(file) => {
            pb.suspend(|| println!("Skipping {}", file));
            pb.inc(1);
        }
        CrawlEvent::FixingUp { entries } => {
            pb.suspend(|| println!("Fixing up unknown links…"));
            pb.set_length(entries as u64);
            pb.set_position(0);
            pb.set_message("fixing up");
        }
    }
}

fn done_line(summary: &CrawlSummary) -> String {
    format!(
        "Done: indexed {} file(s) in {}s",
        summary.file_count,
        summary.duration.as_secs()
    )
}
