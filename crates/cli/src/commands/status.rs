//! `solace status`: Show configuration status.

use solace_config::AppConfig;

use super::load_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let on_off = |b: bool| if b { "enabled" } else { "disabled" };

    println!("🌿 Solace Status");
    println!("================");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Provider:      {}", config.provider);
    println!("  Timeout:       {}ms", config.request_timeout_ms);
    println!(
        "  Context:       window {}, ttl {}m, summaries {}",
        config.context.window_size,
        config.context.cache_ttl_minutes,
        on_off(config.context.summary_enabled)
    );
    println!(
        "  Quality gate:  {} (min score {})",
        on_off(config.quality.enabled),
        config.quality.min_score
    );
    println!("  Fallback:      {}", on_off(config.fallback.enabled));
    println!(
        "  Health:        success ≥ {}%, errors ≤ {}%, latency ≤ {}ms",
        config.monitor.min_success_rate, config.monitor.max_error_rate, config.monitor.max_avg_response_ms
    );
    if config.provider == "template" {
        println!(
            "  Templates:     {} ({}–{}ms simulated latency)",
            on_off(config.template.enabled),
            config.template.min_latency_ms,
            config.template.max_latency_ms
        );
    } else {
        println!("  Endpoint:      {}", config.live.api_base);
        println!("  Model:         {}", config.live.model);
        println!(
            "  API key:       {}",
            if config.has_api_key() { "configured" } else { "missing" }
        );
    }
    println!("  Maintenance:   {}", on_off(config.maintenance.enabled));

    // Check config file existence
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — using defaults (run `solace onboard` to create one)");
    }

    Ok(())
}
