//! `solace stats`: Exercise the pipeline and report service statistics.

use solace_core::message::{ConversationId, ReplyRequest};

use super::{build_orchestrator, load_config};

const SAMPLE_MESSAGES: &[&str] = &[
    "我感到很焦虑，不知道该怎么办",
    "最近总是睡不好，白天也没有精神",
    "我觉得同事们都不喜欢我",
    "有什么方法可以缓解压力吗？",
    "和父母吵架了，心里很难过",
    "你好",
    "工作上的事情让我很困惑，不知道该不该换工作",
];

pub async fn run(samples: usize) -> solace_core::Result<()> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;
    let conversation_id = ConversationId::new();

    println!("📊 Solace Stats — {samples} sample request(s) via {}", orchestrator.provider().name());
    println!("==========================================\n");

    for (i, text) in SAMPLE_MESSAGES.iter().cycle().take(samples).enumerate() {
        let request = ReplyRequest::new("stats-cli", conversation_id.clone(), *text);
        let reply = orchestrator.process_request(request).await?;
        println!(
            "  {:>2}. {:<10} {:<22} quality {:>3}  {:>5}ms  {}",
            i + 1,
            reply.provider_name,
            reply.category.map_or("-", |c| c.as_str()),
            reply.quality_score.map_or("-".to_string(), |q| q.to_string()),
            reply.latency_ms,
            if reply.succeeded { "✅" } else { "❌" }
        );
    }

    println!();
    println!("  Provider statistics");
    println!("  -------------------");
    let global = orchestrator.service_stats(None);
    for stats in std::iter::once(global).chain(orchestrator.all_service_stats()) {
        println!(
            "  {:<10} calls {:>3}  ok {:>3}  failed {:>3}  success {:>6.2}%  avg {:>6.0}ms  quality {:>5.1}",
            stats.provider,
            stats.total_calls,
            stats.successful_calls,
            stats.failed_calls,
            stats.success_rate(),
            stats.average_latency_ms(),
            stats.average_quality
        );
    }

    println!();
    for line in orchestrator.monitor().health_summary().lines() {
        println!("  {line}");
    }

    println!();
    for line in orchestrator.context_summary(&conversation_id).await.lines() {
        println!("  {line}");
    }

    Ok(())
}
