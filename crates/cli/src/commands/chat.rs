//! `solace chat`: Interactive or single-message chat mode.

use std::io::Write;

use solace_core::message::{ConversationId, Reply, ReplyRequest};
use solace_orchestrator::Orchestrator;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{build_orchestrator, load_config};

pub async fn run(
    message: Option<String>,
    conversation: Option<String>,
    user: String,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;
    let conversation_id = conversation.map(ConversationId::from).unwrap_or_default();

    if let Some(msg) = message {
        // Single message mode
        let reply = send(&orchestrator, &user, &conversation_id, msg).await?;
        print_reply(&reply, json)?;
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          Solace — Interactive Chat           ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:      {}", orchestrator.provider().name());
    println!("  Conversation:  {conversation_id}");
    println!("  Quality gate:  {}", if config.quality.enabled { "on" } else { "off" });
    println!("  Fallback:      {}", if config.fallback.enabled { "on" } else { "off" });
    println!();
    println!("  Type your message and press Enter.");
    println!("  Commands: /summary, /clear, /stats, /exit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "/exit" | "exit" | "quit" => break,
            "/summary" => {
                println!();
                for l in orchestrator.context_summary(&conversation_id).await.lines() {
                    println!("  {l}");
                }
                println!();
            }
            "/clear" => {
                orchestrator.clear_context(&conversation_id);
                println!("  🧹 Context cleared");
            }
            "/stats" => {
                println!();
                for l in orchestrator.monitor().health_summary().lines() {
                    println!("  {l}");
                }
                println!();
            }
            text => {
                eprint!("  ...");
                match send(&orchestrator, &user, &conversation_id, text.to_string()).await {
                    Ok(reply) => {
                        eprint!("\r     \r");
                        println!();
                        if json {
                            print_reply(&reply, true)?;
                        } else {
                            for l in reply_text(&reply).lines() {
                                println!("  Solace > {l}");
                            }
                            println!(
                                "  [{} · quality {} · {}ms]",
                                reply.provider_name,
                                reply.quality_score.map_or("-".to_string(), |q| q.to_string()),
                                reply.latency_ms
                            );
                        }
                        println!();
                    }
                    Err(e) => {
                        eprint!("\r     \r");
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

async fn send(
    orchestrator: &Orchestrator,
    user: &str,
    conversation_id: &ConversationId,
    text: String,
) -> solace_core::Result<Reply> {
    let request = ReplyRequest::new(user, conversation_id.clone(), text);
    Ok(orchestrator.process_request(request).await?)
}

fn reply_text(reply: &Reply) -> &str {
    if reply.succeeded {
        &reply.text
    } else {
        reply.failure_reason.as_deref().unwrap_or("reply failed")
    }
}

fn print_reply(reply: &Reply, json: bool) -> solace_core::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
    } else if reply.succeeded {
        println!("{}", reply.text);
    } else {
        eprintln!("❌ {}", reply_text(reply));
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}
