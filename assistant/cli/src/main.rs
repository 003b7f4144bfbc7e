//! StudySpace CLI
//!
//! Command-line surface for the study assistant, backed by a local Ollama
//! server.
//!
//! # Usage
//!
//! ```bash
//! # Summarize a file, streaming the summary
//! studyspace summarize --file chapter3.txt
//!
//! # Summary, flashcards and a quiz in one go
//! cat notes.txt | studyspace study
//!
//! # Derive from an existing summary, as JSON
//! studyspace --json quiz --file summary.md
//!
//! # With verbose logging
//! RUST_LOG=debug studyspace status
//! ```
//!
//! # Environment Variables
//!
//! - `STUDYSPACE_CONFIG`: Config file path
//! - `STUDYSPACE_MODEL`: Ollama model name (default: llama3.2)
//! - `OLLAMA_HOST` / `OLLAMA_PORT`: Ollama server (default: localhost:11434)
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

mod cli;
mod progress;
mod render;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use studyspace_core::{
    load_config, load_config_from_path, ChannelObserver, OllamaSource, ProgressUpdate,
    StudyAssistant, StudyRequest, StudyResponse,
};

use crate::cli::{Cli, Command, InputArgs};

type Assistant = StudyAssistant<OllamaSource>;

/// Read the command input from `--file` or stdin
async fn read_input(input: &InputArgs) -> anyhow::Result<String> {
    match input.file {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

async fn write_stdout(text: &str) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

/// Print a response; errors become a failed exit
async fn emit(response: &StudyResponse, json: bool) -> anyhow::Result<()> {
    if json {
        write_stdout(&format!("{}\n", serde_json::to_string_pretty(response)?)).await?;
    } else if response.is_success() {
        write_stdout(&render::render(response)).await?;
    }

    match response {
        StudyResponse::Error { error } => Err(anyhow::anyhow!("{error}")),
        _ => Ok(()),
    }
}

/// Summarize, echoing deltas to stdout while the model writes
///
/// If progress updates were dropped the full summary is printed afterwards.
/// In JSON mode nothing is streamed; the full response is printed at the end.
async fn summarize(assistant: &Assistant, text: String, json: bool) -> anyhow::Result<String> {
    let request = StudyRequest::ProcessText { text };

    let response = if json {
        assistant.handle(request, None).await
    } else {
        let (tx, rx) = mpsc::channel::<ProgressUpdate>(256);
        let printer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            progress::print_deltas(rx, &mut stdout).await
        });

        let observer = ChannelObserver::new(tx);
        let response = assistant.handle(request, Some(&observer)).await;
        drop(observer);
        let streamed = printer.await.unwrap_or_else(|e| {
            warn!(error = %e, "Progress printer task failed");
            String::new()
        });

        match &response {
            StudyResponse::Summary { summary } if streamed == *summary => {
                write_stdout("\n").await?;
            }
            StudyResponse::Summary { summary } => {
                warn!(
                    streamed_bytes = streamed.len(),
                    summary_bytes = summary.len(),
                    "Progress output incomplete, printing the full summary"
                );
                if !streamed.is_empty() {
                    write_stdout("\n\n").await?;
                }
                write_stdout(&render::render(&response)).await?;
            }
            _ => {}
        }
        response
    };

    if json || !response.is_success() {
        emit(&response, json).await?;
    }

    match response {
        StudyResponse::Summary { summary } => Ok(summary),
        _ => anyhow::bail!("Unexpected response to summary request"),
    }
}

async fn run(assistant: &Assistant, command: Command, json: bool) -> anyhow::Result<()> {
    match command {
        Command::Summarize(input) => {
            summarize(assistant, read_input(&input).await?, json).await?;
        }
        Command::Flashcards(input) => {
            let summary = read_input(&input).await?;
            let response = assistant
                .handle(StudyRequest::GenerateFlashcards { summary }, None)
                .await;
            emit(&response, json).await?;
        }
        Command::Quiz(input) => {
            let summary = read_input(&input).await?;
            let response = assistant
                .handle(StudyRequest::GenerateQuiz { summary }, None)
                .await;
            emit(&response, json).await?;
        }
        Command::Study(input) => {
            let summary = summarize(assistant, read_input(&input).await?, json).await?;
            if !json {
                write_stdout("\nFlashcards\n----------\n").await?;
            }
            let response = assistant
                .handle(
                    StudyRequest::GenerateFlashcards {
                        summary: summary.clone(),
                    },
                    None,
                )
                .await;
            emit(&response, json).await?;
            if !json {
                write_stdout("\nQuiz\n----\n").await?;
            }
            let response = assistant
                .handle(StudyRequest::GenerateQuiz { summary }, None)
                .await;
            emit(&response, json).await?;
        }
        Command::Status => {
            let response = assistant.handle(StudyRequest::CheckStatus, None).await;
            emit(&response, json).await?;
        }
    }
    Ok(())
}

fn load(cli: &Cli) -> anyhow::Result<studyspace_core::StudyConfig> {
    let mut config = match cli.config.as_deref() {
        Some(path) => load_config_from_path(path)?,
        None => load_config()?,
    };
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studyspace=info".parse()?)
                .add_directive("studyspace_core=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = load(&cli)?;
    info!(model = %config.model, timeout_secs = config.processing_timeout.as_secs(), "Configuration loaded");

    let source = OllamaSource::from_env(config.model.clone());
    let assistant = StudyAssistant::new(source, config);

    let result = tokio::select! {
        result = run(&assistant, cli.command, cli.json) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            Err(anyhow::anyhow!("Interrupted"))
        }
    };

    assistant.cleanup().await;
    result
}
