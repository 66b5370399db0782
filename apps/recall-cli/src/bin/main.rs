use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use recall_cli::{build_prompt, generator_from_settings, ingest_documents, AnswerGenerator};
use recall_core::config::{Config, Settings};
use recall_core::documents::DocumentLoader;
use recall_core::ScoredResult;
use recall_embed::provider_from_settings;
use recall_vector::SemanticSearchEngine;

#[derive(Parser)]
#[command(name = "recall", version, about = "In-memory semantic search over a small document corpus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank the corpus against a query
    Search {
        query: String,
        /// Number of results to print (default: all)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Corpus file or directory (overrides data.corpus)
        #[arg(short, long)]
        corpus: Option<PathBuf>,
    },
    /// Retrieve context and ask the generation model to answer
    Ask {
        question: String,
        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,
        #[arg(short, long)]
        corpus: Option<PathBuf>,
    },
    /// List the documents in the corpus
    Docs {
        #[arg(short, long)]
        corpus: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    info!(env = config.env_name(), "configuration loaded");

    match cli.command {
        Command::Search { query, top_k, corpus } => {
            let engine = build_engine(&config, &settings, corpus)?;
            let top_k = top_k.or(settings.search.top_k);
            let results = engine.search(&query, top_k)?;
            println!("\n🔍 Found {} results for: \"{}\"", results.len(), query);
            print_results(&results);
        }
        Command::Ask { question, top_k, corpus } => {
            let engine = build_engine(&config, &settings, corpus)?;
            let results = engine.search(&question, Some(top_k))?;
            println!("\n📚 Context ({} records):", results.len());
            print_results(&results);

            let generator = generator_from_settings(&settings)?;
            let answer = generator.generate(&build_prompt(&question, &results))?;
            println!("\n💬 Answer:\n{}", answer.trim());
        }
        Command::Docs { corpus } => {
            let path = corpus_path(&config, &settings, corpus);
            let docs = DocumentLoader::new().load(&path)?;
            println!("📄 {} documents in {}", docs.len(), path.display());
            for (i, doc) in docs.iter().enumerate() {
                println!("  {}. [{}] {}", i + 1, doc.title, doc.text);
            }
        }
    }
    Ok(())
}

/// `--corpus` as given, else `data.corpus` relative to the config directory.
fn corpus_path(config: &Config, settings: &Settings, flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| config.resolve_path(&settings.data.corpus))
}

fn build_engine(config: &Config, settings: &Settings, corpus: Option<PathBuf>) -> anyhow::Result<SemanticSearchEngine> {
    let path = corpus_path(config, settings, corpus);
    let docs = DocumentLoader::new()
        .load(&path)
        .with_context(|| format!("loading corpus from {}", path.display()))?;
    let engine = SemanticSearchEngine::new(provider_from_settings(settings)?);
    let report = ingest_documents(&engine, &docs, settings.ingest.on_error, true)?;
    if !report.skipped.is_empty() {
        eprintln!("⚠️  skipped {} of {} documents", report.skipped.len(), docs.len());
    }
    info!(records = engine.len(), embedder = engine.embedder_id(), "corpus ingested");
    Ok(engine)
}

fn print_results(results: &[ScoredResult]) {
    for (i, r) in results.iter().enumerate() {
        if r.is_degenerate() {
            println!("\n  {}. score=n/a  title={}", i + 1, r.title);
        } else {
            println!("\n  {}. score={:.4}  title={}", i + 1, r.score, r.title);
        }
        println!("     📝 {}", r.text);
    }
}
