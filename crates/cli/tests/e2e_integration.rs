//! End-to-end integration tests for the Solace reply pipeline.
//!
//! These tests wire the real crates together from a config file: provider
//! selection, the live HTTP provider against a mock server, context carry-over,
//! the quality gate, fallback and maintenance.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use solace_config::AppConfig;
use solace_core::message::{ConversationId, ReplyCategory, ReplyRequest, FALLBACK_PROVIDER};
use solace_core::provider::ProviderKind;
use solace_history::{InMemoryHistory, NoopHistory};
use solace_orchestrator::{HealthStatus, Orchestrator};
use solace_workflow::MaintenanceScheduler;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_TEXT: &str = "最近睡不好，很焦虑";

const LIVE_REPLY: &str = "我理解你的感受。最近睡不好，很焦虑，这些都会让人很疲惫。\
我会陪伴和支持你，我们可以一起试试睡前的放松练习，希望能帮到你。";

// ── Helpers ──────────────────────────────────────────────────────────────

fn write_config(dir: &tempfile::TempDir, body: &str) -> AppConfig {
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    AppConfig::load_from(&path).unwrap()
}

fn live_config(dir: &tempfile::TempDir, api_base: &str, api_key: &str) -> AppConfig {
    write_config(
        dir,
        &format!(
            r#"
provider = "deepseek"

[live]
api_key = "{api_key}"
api_base = "{api_base}"
timeout_ms = 2000
"#
        ),
    )
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "model": "deepseek-chat",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160}
    })
}

async fn mock_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
        .mount(server)
        .await;
}

// ── Live provider through the pipeline ───────────────────────────────────

#[tokio::test]
async fn live_reply_is_scored_recorded_and_remembered() {
    let server = MockServer::start().await;
    mock_completion(&server, LIVE_REPLY).await;

    let dir = tempfile::tempdir().unwrap();
    let config = live_config(&dir, &server.uri(), "sk-e2e");
    let orch = Orchestrator::from_config(&config, Arc::new(NoopHistory)).unwrap();
    assert_eq!(orch.provider().kind(), ProviderKind::Live);

    let reply = orch
        .process_request(ReplyRequest::new("u1", "c1", USER_TEXT))
        .await
        .unwrap();
    assert!(reply.succeeded);
    assert_eq!(reply.provider_name, "deepseek");
    assert_eq!(reply.text, LIVE_REPLY);
    assert_eq!(reply.category, Some(ReplyCategory::EmotionalSupport));
    assert!(reply.quality_score.unwrap() >= 80, "score {:?}", reply.quality_score);
    assert_eq!(reply.metadata["total_tokens"], 160);

    // Second turn replays the first exchange to the model.
    orch.process_request(ReplyRequest::new("u1", "c1", "很焦虑，该怎么办"))
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    let body: serde_json::Value = serde_json::from_slice(&received[1].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[3]["content"], "很焦虑，该怎么办");
    let replayed: Vec<&str> = messages[1..3]
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert!(replayed.contains(&USER_TEXT));
    assert!(replayed.contains(&LIVE_REPLY));

    let stats = orch.service_stats(Some("deepseek"));
    assert_eq!(stats.total_calls, 2);
    assert_eq!(stats.successful_calls, 2);
}

#[tokio::test]
async fn upstream_outage_degrades_to_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = live_config(&dir, &server.uri(), "sk-e2e");
    let orch = Orchestrator::from_config(&config, Arc::new(NoopHistory)).unwrap();

    let reply = orch
        .process_request(ReplyRequest::new("u1", "c1", USER_TEXT))
        .await
        .unwrap();
    assert!(reply.succeeded);
    assert_eq!(reply.provider_name, FALLBACK_PROVIDER);
    assert_eq!(reply.quality_score, Some(60));
    assert_eq!(reply.metadata["fallback_cause"], "API_ERROR");
    assert_eq!(orch.service_stats(None).total_calls, 1);
}

#[tokio::test]
async fn missing_key_never_calls_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(LIVE_REPLY)))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = live_config(&dir, &server.uri(), "");
    let orch = Orchestrator::from_config(&config, Arc::new(NoopHistory)).unwrap();
    assert!(!orch.is_healthy());
    assert_eq!(orch.health_report().status, HealthStatus::Down);

    let reply = orch
        .process_request(ReplyRequest::new("u1", "c1", USER_TEXT))
        .await
        .unwrap();
    assert_eq!(reply.provider_name, FALLBACK_PROVIDER);
    assert_eq!(reply.metadata["fallback_cause"], "MISSING_API_KEY");
    assert_eq!(orch.config_info()["api_key_configured"], false);
}

#[tokio::test]
async fn low_quality_live_reply_is_replaced() {
    let server = MockServer::start().await;
    mock_completion(&server, "应该暴力").await;

    let dir = tempfile::tempdir().unwrap();
    let config = live_config(&dir, &server.uri(), "sk-e2e");
    let orch = Orchestrator::from_config(&config, Arc::new(NoopHistory)).unwrap();

    let reply = orch
        .process_request(ReplyRequest::new("u1", "c1", USER_TEXT))
        .await
        .unwrap();
    assert_eq!(reply.provider_name, FALLBACK_PROVIDER);
    assert_eq!(reply.metadata["fallback_cause"], "LOW_QUALITY");
}

// ── Template provider and history ────────────────────────────────────────

#[tokio::test]
async fn template_pipeline_uses_persisted_history() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        r#"
[template]
min_latency_ms = 0
max_latency_ms = 0

[context]
window_size = 4
"#,
    );

    let history = Arc::new(InMemoryHistory::new());
    let id = ConversationId::from("c1");
    for i in 0..6 {
        history
            .append(&id, solace_core::message::Speaker::User, format!("以前的消息{i}"))
            .await;
    }

    let orch = Orchestrator::from_config(&config, history).unwrap();
    let reply = orch
        .process_request(ReplyRequest::new("u1", "c1", "我感到很焦虑，不知道该怎么办"))
        .await
        .unwrap();
    assert_eq!(reply.category, Some(ReplyCategory::EmotionalSupport));
    assert!(reply.quality_score.unwrap() >= 60);

    // Loaded window of 4, then the new exchange pushed in, capped at 4.
    assert_eq!(orch.context_store().context_size(&id), 4);
    let summary = orch.context_summary(&id).await;
    assert!(summary.contains("共 4 条消息"));
    assert!(summary.contains("- 焦虑情绪"));
}

#[test]
fn unknown_provider_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "provider = \"gpt-9\"\n").unwrap();
    let err = AppConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("gpt-9"));
}

// ── Maintenance ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn maintenance_runs_against_live_pipeline_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        r#"
[template]
min_latency_ms = 0
max_latency_ms = 0

[context]
cache_ttl_minutes = 1

[maintenance]
cleanup_interval_secs = 120
summary_interval_secs = 60
health_check_interval_secs = 30
"#,
    );
    let orch = Arc::new(Orchestrator::from_config(&config, Arc::new(NoopHistory)).unwrap());
    orch.process_request(ReplyRequest::new("u1", "c1", "你好"))
        .await
        .unwrap();
    assert_eq!(orch.context_store().conversation_count(), 1);

    let handle = MaintenanceScheduler::for_orchestrator(orch.clone(), &config).start();
    assert_eq!(handle.job_count(), 3);

    tokio::time::sleep(Duration::from_secs(125)).await;
    assert_eq!(orch.context_store().conversation_count(), 0);
    // Statistics with calls are never treated as stale.
    assert_eq!(orch.service_stats(None).total_calls, 1);

    handle.shutdown();
}
