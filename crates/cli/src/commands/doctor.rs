//! `solace doctor`: Diagnose configuration and provider health.

use solace_config::AppConfig;
use solace_core::message::{ConversationId, ReplyRequest};
use solace_core::provider::ProviderKind;

use super::build_orchestrator;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Solace Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — defaults in use (run `solace onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid configuration.");
            return Ok(());
        }
    };

    if config.provider != "template" {
        if config.has_api_key() {
            println!("  ✅ API key configured");
        } else {
            println!("  ❌ No API key — set SOLACE_API_KEY or live.api_key in config.toml");
            issues += 1;
        }
    }

    let orchestrator = match build_orchestrator(&config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            println!("  ❌ {e}");
            return Ok(());
        }
    };

    if orchestrator.provider().is_healthy() {
        println!("  ✅ Provider '{}' ready", orchestrator.provider().name());
    } else {
        println!("  ❌ Provider '{}' not ready", orchestrator.provider().name());
        issues += 1;
    }

    // One probe request through the whole pipeline
    let probe = ReplyRequest::new("doctor", ConversationId::new(), "你好，最近有点焦虑");
    match orchestrator.process_request(probe).await {
        Ok(reply) if reply.succeeded && reply.provider_kind != ProviderKind::Fallback => {
            println!(
                "  ✅ Probe reply from {} (quality {}, {}ms)",
                reply.provider_name,
                reply.quality_score.map_or("-".to_string(), |q| q.to_string()),
                reply.latency_ms
            );
        }
        Ok(reply) if reply.succeeded => {
            println!(
                "  ⚠️  Probe fell back ({})",
                reply.metadata.get("fallback_cause").and_then(|c| c.as_str()).unwrap_or("unknown")
            );
            issues += 1;
        }
        Ok(reply) => {
            println!(
                "  ❌ Probe failed: {}",
                reply.failure_reason.unwrap_or_default()
            );
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Probe rejected: {e}");
            issues += 1;
        }
    }

    let report = orchestrator.health_report();
    println!("  {} Health: {}", if report.is_up() { "✅" } else { "❌" }, report.status);

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
