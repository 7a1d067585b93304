use std::path::PathBuf;

use anyhow::bail;
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use personsearch_cli::{configured_path, init_logging, json_files, read_people, DEFAULT_DATA_DIR, DEFAULT_INDEX_DIR};
use personsearch_core::config::Config;
use personsearch_text::PersonIndexer;

/// Build the person index from JSON person records.
#[derive(Debug, Parser)]
#[command(name = "personsearch-indexer", version)]
struct Args {
    /// JSON file or directory of JSON files (default: `data.people_dir`)
    input: Option<PathBuf>,

    /// Index directory, replaced if it exists (default: `data.index_dir`)
    #[arg(long)]
    index_dir: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let input = configured_path(&config, args.input, "data.people_dir", DEFAULT_DATA_DIR)?;
    let index_dir = configured_path(&config, args.index_dir, "data.index_dir", DEFAULT_INDEX_DIR)?;

    let files = json_files(&input);
    if files.is_empty() { bail!("no .json files found under {}", input.display()); }
    println!("Person indexer\n==============");
    println!("Input: {} ({} files)", input.display(), files.len());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?.progress_chars("#>-"));
    let mut people = Vec::new();
    for file in &files {
        pb.set_message(file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
        people.extend(read_people(file)?);
        pb.inc(1);
    }
    pb.finish_with_message("parsed");

    let indexer = PersonIndexer::new(index_dir.clone())?;
    let documents = indexer.index_people(&people)?;
    info!(index = %index_dir.display(), documents, "index written");
    println!("Indexed {} people ({} documents) into {}", people.len(), documents, index_dir.display());
    Ok(())
}
