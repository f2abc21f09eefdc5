//! `solace daemon`: Long-running pipeline with maintenance jobs.
//!
//! Reads one JSON `ReplyRequest` per line on stdin and writes one JSON line
//! per request on stdout: the `Reply`, or an `{"error": ..}` object. Requests
//! are processed concurrently, so responses may arrive out of order; callers
//! correlate on `conversation_id`.

use std::sync::Arc;

use serde_json::json;
use solace_core::message::ReplyRequest;
use solace_orchestrator::Orchestrator;
use solace_workflow::MaintenanceScheduler;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::{build_orchestrator, load_config};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;

    eprintln!("🌿 Solace Daemon — Starting");
    eprintln!("   Provider:     {}", orchestrator.provider().name());
    eprintln!(
        "   Maintenance:  {}",
        if config.maintenance.enabled { "enabled" } else { "disabled" }
    );
    eprintln!("   Reading JSON requests from stdin, one per line");

    let maintenance = MaintenanceScheduler::for_orchestrator(orchestrator.clone(), &config).start();
    info!(jobs = maintenance.job_count(), "Maintenance started");

    let (tx, mut rx) = mpsc::channel::<String>(64);
    let writer = tokio::spawn(async move {
        let mut out = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            out.write_all(line.as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let orchestrator = orchestrator.clone();
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let response = handle_line(&orchestrator, &line).await;
                    if tx.send(response).await.is_err() {
                        warn!("Response writer closed");
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    while in_flight.join_next().await.is_some() {}
    drop(tx);
    writer.await??;

    maintenance.shutdown();
    eprintln!();
    eprintln!("{}", orchestrator.monitor().health_summary());

    Ok(())
}

/// Process one request line and render the response line.
pub(crate) async fn handle_line(orchestrator: &Arc<Orchestrator>, line: &str) -> String {
    let request: ReplyRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return json!({"error": "invalid_json", "message": e.to_string()}).to_string();
        }
    };

    match orchestrator.process_request(request).await {
        Ok(reply) => serde_json::to_string(&reply).unwrap_or_else(|e| {
            json!({"error": "serialization", "message": e.to_string()}).to_string()
        }),
        Err(e) => json!({"error": "invalid_request", "message": e.to_string()}).to_string(),
    }
}
