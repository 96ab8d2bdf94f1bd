//! Command line front end for step-verified answers and trial evidence.
//!
//! - `rct chat` answers a question, verifying every reasoning step
//! - `rct ingest` adds trial documents to the evidence graph
//! - `rct verify-outcome` checks a new trial's outcome against it

mod config;
mod dataset;
mod models;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llm_client::LlmClient;
use step_verify::{
    ai::LlmAdapter, Backtracker, EvidenceConfig, EvidenceGraph, EvidenceRecord,
    MemoryEvidenceStore, Relation, VerificationStatus, VerifiedQa, VerifyConfig,
};

use crate::config::AppConfig;
use crate::dataset::split_documents;
use crate::models::LanguageModel;

#[derive(Parser)]
#[command(name = "rct")]
#[command(about = "Step-verified answers and clinical-trial evidence checks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question, verifying each step of the reasoning
    Chat {
        question: String,

        /// Model that writes the answer
        #[arg(long, value_enum, default_value_t = LanguageModel::Mistral)]
        model: LanguageModel,

        /// Model that classifies each reasoning step
        #[arg(long, value_enum, default_value_t = LanguageModel::CommandR)]
        verifier_model: LanguageModel,

        /// Generations allowed before giving up on verification
        #[arg(long, default_value_t = 3)]
        max_attempts: usize,

        /// Print the most recent model exchanges
        #[arg(long)]
        debug: bool,
    },

    /// Add trial documents (blank-line separated) to the evidence graph
    Ingest {
        file: PathBuf,

        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Skip the evidence-gathering call for each document
        #[arg(long)]
        no_gather: bool,

        /// Evidence graph snapshot to update
        #[arg(long, default_value = "evidence.json")]
        store: PathBuf,
    },

    /// Check a trial's outcome against the evidence graph
    VerifyOutcome {
        text: String,

        /// Most similar interventions to compare against
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Evidence graph snapshot to search
        #[arg(long, default_value = "evidence.json")]
        store: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Chat {
            question,
            model,
            verifier_model,
            max_attempts,
            debug,
        } => {
            let client = config.chat_client()?;
            let result = chat(&client, &question, model, verifier_model, max_attempts).await;
            if debug {
                println!("\n{}", "Recent model exchanges".bright_blue().bold());
                println!("{}", client.history().render(5));
            }
            result
        }
        Commands::Ingest {
            file,
            limit,
            no_gather,
            store,
        } => {
            let settings = EvidenceConfig::default().with_gather_evidence(!no_gather);
            ingest(&config, &file, limit, settings, &store).await
        }
        Commands::VerifyOutcome { text, limit, store } => {
            let settings = EvidenceConfig::default().with_search_limit(limit);
            verify_outcome(&config, &text, settings, &store).await
        }
    }
}

async fn chat(
    client: &LlmClient,
    question: &str,
    model: LanguageModel,
    verifier_model: LanguageModel,
    max_attempts: usize,
) -> Result<()> {
    tracing::info!(%model, %verifier_model, "Answering question");

    let chat_model = LlmAdapter::new(client.clone(), model.as_str());
    let verifier = LlmAdapter::new(client.clone(), verifier_model.as_str());

    let backtracker = Backtracker::new(
        chat_model.clone(),
        verifier,
        VerifyConfig::default().with_max_attempts(max_attempts),
    )
    .context("Invalid verification settings")?;
    let qa = VerifiedQa::new(chat_model.clone(), chat_model, backtracker);

    let outcome = qa.ask(question).await.context("Failed to answer question")?;

    println!("{}", outcome.reply);
    println!();
    match outcome.verified.status {
        VerificationStatus::Verified => println!(
            "{}",
            format!("✓ Reasoning verified (attempt {})", outcome.verified.attempts).green()
        ),
        VerificationStatus::Unverified => {
            println!(
                "{}",
                format!(
                    "⚠ Reasoning could not be verified after {} attempts",
                    outcome.verified.attempts
                )
                .yellow()
            );
            for signal in &outcome.verified.verdict.retries {
                println!("  step {}: {}", signal.step_index + 1, signal.raw_label.red());
            }
        }
    }

    Ok(())
}

async fn ingest(
    config: &AppConfig,
    file: &Path,
    limit: usize,
    settings: EvidenceConfig,
    store_path: &Path,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let documents = split_documents(&text, limit);
    println!("Ingesting {} documents", documents.len());

    let store = load_store(store_path)?;
    let graph = EvidenceGraph::with_config(store, evidence_ai(config)?, settings);

    for (i, document) in documents.iter().enumerate() {
        match graph.ingest(document).await {
            Ok(record) => println!(
                "  {} {} ({} references)",
                "✓".green(),
                record.ico.intervention,
                record.references.len()
            ),
            Err(e) => eprintln!("  {} document {}: {}", "✗".red(), i + 1, e),
        }
    }

    save_store(graph.store(), store_path)?;
    println!("Evidence graph holds {} interventions", graph.store().len());
    Ok(())
}

async fn verify_outcome(
    config: &AppConfig,
    text: &str,
    settings: EvidenceConfig,
    store_path: &Path,
) -> Result<()> {
    let store = load_store(store_path)?;
    let graph = EvidenceGraph::with_config(store, evidence_ai(config)?, settings);

    let verification = graph
        .verify_outcome(text)
        .await
        .context("Failed to verify outcome")?;

    println!("{}", verification.ico);
    println!("Related evidence:");
    for related in &verification.related {
        println!("  [{:.3}] {}", related.score, related.record.ico.intervention);
        for edge in edges(&related.record) {
            println!("    {}", edge.dimmed());
        }
    }
    println!("Conclusion: {}", verification.conclusion.to_string().bold());
    Ok(())
}

/// One line per graph edge leaving the record's intervention node.
fn edges(record: &EvidenceRecord) -> Vec<String> {
    let references = |id: &str| {
        record
            .references
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.text.as_str())
            .unwrap_or_default()
    };

    record
        .relations()
        .into_iter()
        .map(|(relation, target)| match relation {
            Relation::CitedIn => format!("{relation} {target}: {}", references(&target)),
            _ => format!("{relation} {target}"),
        })
        .collect()
}

fn evidence_ai(config: &AppConfig) -> Result<LlmAdapter> {
    Ok(
        LlmAdapter::new(config.evidence_client()?, &config.extraction_model)
            .with_embedding_model(&config.embedding_model),
    )
}

fn load_store(path: &Path) -> Result<MemoryEvidenceStore> {
    if !path.exists() {
        return Ok(MemoryEvidenceStore::new());
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    MemoryEvidenceStore::from_json(&json)
        .with_context(|| format!("Invalid evidence snapshot {}", path.display()))
}

fn save_store(store: &MemoryEvidenceStore, path: &Path) -> Result<()> {
    let json = store.to_json().context("Failed to serialize evidence graph")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
