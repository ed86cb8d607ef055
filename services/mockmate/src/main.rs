mod config;
mod console;

use crate::config::Config;
use crate::console::ConsoleCapture;
use anyhow::{Context, Result};
use clap::Parser;
use mockmate_core::Command;
use mockmate_core::evaluator::EvaluatorClient;
use mockmate_core::events::SessionEvent;
use mockmate_core::proctor::{ProctorConfig, SimulatedProctor};
use mockmate_core::session::InterviewSession;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(about = "Timed mock-interview practice session in the terminal")]
struct Cli {
    /// Path to a plain-text resume or notes file to base the questions on.
    #[arg(conflicts_with = "subject")]
    resume: Option<PathBuf>,

    /// Interview subject to use instead of a resume file.
    #[arg(long)]
    subject: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    tracing::info!("Configuration loaded successfully. Starting mockmate service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    let document = match (&args.resume, &args.subject) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resume file {}", path.display()))?,
        (None, Some(subject)) => subject.clone(),
        (None, None) => anyhow::bail!("Provide a resume file or --subject <topic>"),
    };

    // --- 4. Initialize the AI collaborator ---
    let evaluator = Arc::new(EvaluatorClient::new(
        config.openai_api_key.clone(),
        config.chat_model.clone(),
    ));

    // --- 5. Application Setup ---
    // One queue carries every asynchronous event into the session loop; the
    // command channel carries side effects back out to this runtime.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<SessionEvent>(256);
    let (command_tx, mut command_rx) = tokio::sync::mpsc::channel::<Command>(32);

    // The session owns its collaborators for its whole lifetime.
    let capture = Box::new(ConsoleCapture::new(event_tx.clone()));
    let proctor = Box::new(SimulatedProctor::new(ProctorConfig::default(), event_tx.clone()));

    event_tx
        .send(SessionEvent::StartRequested { document })
        .await
        .context("Failed to enqueue the start request")?;

    // This task renders commands from the core logic for the candidate.
    let command_handler = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            match command {
                Command::AskQuestion { index, question } => {
                    println!("\nQuestion {}: {}", index + 1, question);
                    println!(
                        "(thinking time, then type your answer; press Enter per sentence, Ctrl-D or wait for the timer to finish)"
                    );
                }
                Command::ShowWarning(message) => println!("\n⚠ {message}"),
                Command::ClearWarning => tracing::debug!("Proctoring warning cleared"),
                Command::Notice(message) => println!("\n{message}"),
                Command::Terminated(reason) => {
                    println!("\n{reason}");
                    break;
                }
                Command::Completed(report) => {
                    match serde_json::to_string_pretty(&report) {
                        Ok(rendered) => println!("\nYour results:\n{rendered}"),
                        Err(e) => tracing::error!("Failed to render report: {e:?}"),
                    }
                    break;
                }
            }
        }
    });

    // The session loop: the single consumer of the event queue.
    let evaluator_for_loop = evaluator.clone();
    let session_loop = tokio::spawn(async move {
        let mut session = InterviewSession::new(capture, proctor, event_tx.clone());
        while let Some(event) = event_rx.recv().await {
            InterviewSession::handle_event(
                &mut session,
                &*evaluator_for_loop,
                event,
                command_tx.clone(),
            )
            .await;
            if session.is_finished() {
                break;
            }
        }
    });

    tokio::select! {
        _ = async {
            let _ = session_loop.await;
            // The session loop dropped its command sender; let the renderer
            // drain what the session produced before exiting.
            let _ = command_handler.await;
        } => {},
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
        }
    }
    tracing::info!("Shutting down...");
    Ok(())
}
