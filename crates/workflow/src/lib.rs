//! Maintenance scheduler: periodic housekeeping for a running orchestrator.
//!
//! Each job runs on its own interval in its own Tokio task. Every run is
//! spawned as a child task, so a panicking run is logged and the loop keeps
//! going. The standard jobs are:
//!
//! | job | default period | work |
//! |---|---|---|
//! | `cleanup` | 1h | drop stale provider statistics and expired contexts |
//! | `health-summary` | 30m | log the monitor's health summary |
//! | `health-check` | 5m | warn when the pipeline is unhealthy |

use std::sync::Arc;
use std::time::Duration;

use solace_config::{AppConfig, MAX_MAINTENANCE_INTERVAL_SECS, MAX_STALE_AFTER_HOURS};
use solace_orchestrator::Orchestrator;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

type JobFn = Arc<dyn Fn() + Send + Sync>;

struct Job {
    name: String,
    period: Duration,
    run: JobFn,
}

/// A set of periodic jobs, started together.
#[derive(Default)]
pub struct MaintenanceScheduler {
    jobs: Vec<Job>,
}

impl MaintenanceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard jobs for `orchestrator`, or none when maintenance is
    /// disabled.
    pub fn for_orchestrator(orchestrator: Arc<Orchestrator>, config: &AppConfig) -> Self {
        let mut scheduler = Self::new();
        let m = &config.maintenance;
        if !m.enabled {
            info!("Maintenance disabled");
            return scheduler;
        }

        let stale_hours = config.monitor.stale_after_hours.min(MAX_STALE_AFTER_HOURS);
        let stale_after = chrono::Duration::hours(stale_hours as i64);

        let orch = orchestrator.clone();
        scheduler.add_job("cleanup", period(m.cleanup_interval_secs), move || {
            cleanup(&orch, stale_after);
        });

        let orch = orchestrator.clone();
        scheduler.add_job(
            "health-summary",
            period(m.summary_interval_secs),
            move || log_health_summary(&orch),
        );

        let orch = orchestrator;
        scheduler.add_job(
            "health-check",
            period(m.health_check_interval_secs),
            move || {
                self_check(&orch);
            },
        );

        scheduler
    }

    /// Register a job. A zero period disables it.
    pub fn add_job(
        &mut self,
        name: impl Into<String>,
        period: Duration,
        run: impl Fn() + Send + Sync + 'static,
    ) -> &mut Self {
        let name = name.into();
        if period.is_zero() {
            warn!(job = %name, "Maintenance job has a zero period, not scheduling");
            return self;
        }
        self.jobs.push(Job {
            name,
            period,
            run: Arc::new(run),
        });
        self
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.name.as_str()).collect()
    }

    /// Start every job. The first run of each happens one period from now.
    pub fn start(&self) -> MaintenanceHandle {
        let handles = self
            .jobs
            .iter()
            .map(|job| {
                info!(job = %job.name, period_secs = job.period.as_secs(), "Starting maintenance job");
                spawn_loop(job.name.clone(), job.period, job.run.clone())
            })
            .collect();
        MaintenanceHandle { handles }
    }
}

/// Interval for a configured period, capped so deadlines cannot overflow.
fn period(secs: u64) -> Duration {
    Duration::from_secs(secs.min(MAX_MAINTENANCE_INTERVAL_SECS))
}

fn spawn_loop(name: String, period: Duration, run: JobFn) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            debug!(job = %name, "Maintenance run");

            let run = run.clone();
            if let Err(e) = tokio::spawn(async move { run() }).await {
                if e.is_panic() {
                    error!(job = %name, "Maintenance run panicked");
                } else {
                    error!(job = %name, error = %e, "Maintenance run failed");
                }
            }
        }
    })
}

/// Running maintenance loops.
pub struct MaintenanceHandle {
    handles: Vec<JoinHandle<()>>,
}

impl MaintenanceHandle {
    pub fn job_count(&self) -> usize {
        self.handles.len()
    }

    /// Stop every loop. A run already in progress finishes on its own.
    pub fn shutdown(self) {
        for handle in &self.handles {
            handle.abort();
        }
        info!(jobs = self.handles.len(), "Maintenance stopped");
    }
}

// ── Standard jobs ─────────────────────────────────────────────────────────

/// What a cleanup run removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub stale_providers: usize,
    pub expired_contexts: usize,
}

/// Drop provider statistics idle for longer than `stale_after` and evict
/// expired conversation contexts.
pub fn cleanup(orchestrator: &Orchestrator, stale_after: chrono::Duration) -> CleanupReport {
    let report = CleanupReport {
        stale_providers: orchestrator.monitor().cleanup_stale(stale_after),
        expired_contexts: orchestrator.context_store().evict_expired(),
    };
    info!(
        stale_providers = report.stale_providers,
        expired_contexts = report.expired_contexts,
        "Maintenance cleanup finished"
    );
    report
}

pub fn log_health_summary(orchestrator: &Orchestrator) {
    info!("{}", orchestrator.monitor().health_summary());
}

/// Returns the verdict; an unhealthy pipeline is logged with the summary.
pub fn self_check(orchestrator: &Orchestrator) -> bool {
    let report = orchestrator.health_report();
    if report.is_up() {
        debug!(provider = %report.provider, "Health check passed");
    } else {
        warn!(
            provider = %report.provider,
            provider_healthy = report.provider_healthy,
            monitor_healthy = report.monitor_healthy,
            summary = %orchestrator.monitor().health_summary(),
            "Health check failed"
        );
    }
    report.is_up()
}

#[cfg(test)]
mod tests {
    use super::*;
    use solace_core::message::{ContextEntry, ConversationId};
    use solace_history::NoopHistory;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn orchestrator(config: &AppConfig) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::from_config(config, Arc::new(NoopHistory)).unwrap())
    }

    fn counter_job(counter: &Arc<AtomicUsize>) -> impl Fn() + Send + Sync + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn standard_jobs_registered() {
        let config = AppConfig::default();
        let scheduler = MaintenanceScheduler::for_orchestrator(orchestrator(&config), &config);
        assert_eq!(scheduler.job_names(), ["cleanup", "health-summary", "health-check"]);
    }

    #[test]
    fn disabled_maintenance_has_no_jobs() {
        let mut config = AppConfig::default();
        config.maintenance.enabled = false;
        let scheduler = MaintenanceScheduler::for_orchestrator(orchestrator(&config), &config);
        assert!(scheduler.job_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unvalidated_extremes_are_capped() {
        let mut config = AppConfig::default();
        config.monitor.stale_after_hours = u64::MAX;
        config.maintenance.cleanup_interval_secs = u64::MAX;
        config.maintenance.summary_interval_secs = u64::MAX;
        config.maintenance.health_check_interval_secs = u64::MAX;

        let handle = MaintenanceScheduler::for_orchestrator(orchestrator(&config), &config).start();
        assert_eq!(handle.job_count(), 3);
        tokio::time::sleep(Duration::from_secs(60)).await;
        handle.shutdown();

        assert_eq!(period(u64::MAX), Duration::from_secs(MAX_MAINTENANCE_INTERVAL_SECS));
        assert_eq!(period(30), Duration::from_secs(30));
    }

    #[test]
    fn zero_period_job_is_skipped() {
        let mut scheduler = MaintenanceScheduler::new();
        scheduler.add_job("never", Duration::ZERO, || {});
        assert!(scheduler.job_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn jobs_run_once_per_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = MaintenanceScheduler::new();
        scheduler.add_job("count", Duration::from_secs(60), counter_job(&counter));
        let handle = scheduler.start();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(155)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_run_does_not_stop_its_loop() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_in_job = attempts.clone();
        let mut scheduler = MaintenanceScheduler::new();
        scheduler.add_job("explode", Duration::from_secs(10), move || {
            attempts_in_job.fetch_add(1, Ordering::SeqCst);
            panic!("maintenance failure");
        });
        let handle = scheduler.start();

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert!(attempts.load(Ordering::SeqCst) >= 2);

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_all_loops() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = MaintenanceScheduler::new();
        scheduler
            .add_job("a", Duration::from_secs(10), counter_job(&counter))
            .add_job("b", Duration::from_secs(15), counter_job(&counter));
        let handle = scheduler.start();
        assert_eq!(handle.job_count(), 2);

        tokio::time::sleep(Duration::from_secs(31)).await;
        let before = counter.load(Ordering::SeqCst);
        assert!(before >= 4);

        handle.shutdown();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(counter.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_cleanup_evicts_expired_contexts() {
        let config = AppConfig::default();
        let orch = orchestrator(&config);
        orch.context_store()
            .add_message(&ConversationId::from("c1"), ContextEntry::user("你好"));
        assert_eq!(orch.context_store().conversation_count(), 1);

        let handle = MaintenanceScheduler::for_orchestrator(orch.clone(), &config).start();
        tokio::time::sleep(Duration::from_secs(3_601)).await;
        assert_eq!(orch.context_store().conversation_count(), 0);

        handle.shutdown();
    }

    #[test]
    fn cleanup_drops_idle_providers_without_calls() {
        let orch = orchestrator(&AppConfig::default());
        let monitor = orch.monitor();

        monitor.record_provider_error(Some("idle"), "boom", 10);
        monitor.record_provider_error(Some("busy"), "boom", 10);
        monitor.reset_stats(Some("idle"));
        std::thread::sleep(Duration::from_millis(5));

        let report = cleanup(&orch, chrono::Duration::zero());
        assert_eq!(report.stale_providers, 1);
        let names: Vec<String> = monitor.all_stats().into_iter().map(|s| s.provider).collect();
        assert_eq!(names, ["busy"]);
    }

    #[test]
    fn self_check_reflects_monitor_health() {
        let config = AppConfig::default();
        let orch = orchestrator(&config);
        assert!(self_check(&orch));

        for _ in 0..5 {
            orch.monitor().record_provider_error(Some("template"), "boom", 10);
        }
        assert!(!self_check(&orch));
    }
}
