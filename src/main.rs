//! `fact-find` - batch-imports meeting transcripts into client records.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use fact_find::adapters::{FileRecordStore, FileTranscriptStore, LlmTextExtractor};
use fact_find::application::{BatchEvent, BatchPipeline, BatchRunner};
use fact_find::config::{AppConfig, LoggingConfig};
use fact_find::domain::batch::{BatchItemResult, BatchReport, Decision, DecisionRequest, DocumentSource, ItemOutcome};

#[derive(Parser, Debug)]
#[command(name = "fact-find")]
#[command(about = "Extract fact-find data from meeting transcripts into client records")]
#[command(version)]
struct Args {
    /// Transcript files to import, processed in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Overrides the configured storage directory
    #[arg(long, env = "FACT_FIND_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }

    init_tracing(&config.logging);

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    let provider = match config.ai.build_provider() {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("AI provider error: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        provider = %provider.provider_info().name,
        model = %provider.provider_info().model,
        data_dir = %config.storage.data_dir.display(),
        documents = args.files.len(),
        "Starting batch import"
    );

    let pipeline = BatchPipeline::new(
        args.files.into_iter().map(DocumentSource::File),
        Arc::new(LlmTextExtractor::new(provider)),
        Arc::new(FileRecordStore::new(&config.storage.data_dir)),
        Arc::new(FileTranscriptStore::new(&config.storage.data_dir)),
    )
    .with_extractor_config(config.extractor_config())
    .with_policy(config.batch.policy());

    let mut handle = BatchRunner::spawn(pipeline);
    let decisions = handle.decisions();

    let abort = handle.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Aborting after the current document...");
            abort.abort();
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    while let Some(event) = handle.next_event().await {
        match event {
            BatchEvent::ItemFinished(result) => print_result(&result),
            BatchEvent::DecisionRequired(request) => {
                print_request(&request);
                let decision = loop {
                    prompt();
                    match stdin.next_line().await {
                        Ok(Some(line)) => match parse_decision(&line, request.candidates.len()) {
                            Some(decision) => break decision,
                            None => println!("Enter e<number>, n or s."),
                        },
                        // No more input: leave the document unprocessed.
                        Ok(None) | Err(_) => break Decision::Skip,
                    }
                };
                if decisions.send(request.item_id, decision).is_err() {
                    break;
                }
            }
            BatchEvent::DecisionRejected { error, .. } => eprintln!("Decision rejected: {error}"),
            BatchEvent::Halted { error, report } => {
                eprintln!("Batch halted: {error}");
                print_summary(&report);
                return ExitCode::from(2);
            }
            BatchEvent::Finished { report } => {
                print_summary(&report);
                return if report.failed() == 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                };
            }
        }
    }

    ExitCode::FAILURE
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// `e<n>` merges into candidate n (1-based), `n` creates a new client, `s` skips.
fn parse_decision(input: &str, candidates: usize) -> Option<Decision> {
    match input.trim().to_ascii_lowercase().as_str() {
        "n" => Some(Decision::CreateNew),
        "s" => Some(Decision::Skip),
        other => {
            let n: usize = other.strip_prefix('e')?.parse().ok()?;
            (1..=candidates).contains(&n).then(|| Decision::UseExisting(n - 1))
        }
    }
}

fn prompt() {
    print!("[e<n>] use existing, [n] new client, [s] skip > ");
    let _ = std::io::stdout().flush();
}

fn print_request(request: &DecisionRequest) {
    println!(
        "\n{}: '{} {}' may already be a client:",
        request.document, request.name.first_name, request.name.last_name
    );
    for (i, candidate) in request.candidates.iter().enumerate() {
        println!(
            "  e{}  {} ({:?}, {:.0}% match, {}% complete, id {})",
            i + 1,
            candidate.record.display_name(),
            candidate.match_type,
            candidate.score * 100.0,
            candidate.record.data_completeness().value(),
            candidate.record.id()
        );
    }
}

fn print_result(result: &BatchItemResult) {
    match &result.outcome {
        ItemOutcome::Success(s) => println!(
            "OK    {} -> {}{} ({} fields, {}% complete)",
            result.document,
            s.client_name,
            if s.created_new { " [new]" } else { "" },
            s.fields_written,
            s.completeness.value()
        ),
        ItemOutcome::Error(e) => println!("ERROR {}: {}", result.document, e),
        ItemOutcome::Skipped(reason) => println!("SKIP  {} ({:?})", result.document, reason),
    }
}

fn print_summary(report: &BatchReport) {
    println!(
        "\n{} succeeded, {} failed, {} skipped{}",
        report.succeeded(),
        report.failed(),
        report.skipped(),
        if report.aborted { " (aborted)" } else { "" }
    );
}
