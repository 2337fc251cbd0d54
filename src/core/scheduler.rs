//! Publish Scheduler
//!
//! Cron-driven loop for the auto-publish task. Single-flight by construction:
//! the loop awaits the current run before computing the next fire time, and
//! `Schedule::upcoming` only yields future instants, so a fire that lands
//! while a run is in progress is dropped, never queued. Shutdown cancels the
//! schedule sleep without side effects.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use cron::Schedule;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::publish::AutoPublisher;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Cron 格式错误：{0}")]
    Invalid(String),
}

/// Parse a crontab expression. Five-field expressions (`45 1 * * *`) are
/// accepted by prepending a zero seconds field; six- and seven-field
/// expressions pass through unchanged.
pub fn parse_crontab(expr: &str) -> Result<Schedule, ScheduleError> {
    let fields = expr.split_whitespace().count();
    let normalized = if fields == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    };
    Schedule::from_str(&normalized).map_err(|e| ScheduleError::Invalid(e.to_string()))
}

/// Running auto-publish task. Dropping the handle aborts it; prefer
/// [`PublishTask::shutdown`] so the final performance report gets logged.
pub struct PublishTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl PublishTask {
    /// Register the cron schedule and spawn the publication loop.
    pub fn start(cron_expr: &str, publisher: Arc<AutoPublisher>) -> Result<Self, ScheduleError> {
        let schedule = parse_crontab(cron_expr)?;
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        log::info!("[AutoPublish] 已启动，任务周期：{cron_expr}");

        let handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Local).next() else {
                    log::warn!("[AutoPublish] 计划任务没有下一次触发时间，退出");
                    break;
                };
                let wait = (next - Local::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO);

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        publisher.run_once().await;
                    }
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                }
            }
        });

        Ok(Self { handle, shutdown })
    }

    /// Stop the loop, wait for any in-flight run, and log the final report.
    pub async fn shutdown(self, publisher: &AutoPublisher) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
        publisher.log_performance_report();
        log::info!("[AutoPublish] 已停止");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_field_expression_normalized() {
        let schedule = parse_crontab("45 1 * * *").expect("five-field crontab");
        let next = schedule.upcoming(Local).next().expect("upcoming fire");
        assert!(next > Local::now());
    }

    #[test]
    fn test_six_field_expression_passes_through() {
        assert!(parse_crontab("0 45 1 * * *").is_ok());
    }

    #[test]
    fn test_invalid_expression_rejected() {
        assert!(matches!(
            parse_crontab("not a cron"),
            Err(ScheduleError::Invalid(_))
        ));
        assert!(parse_crontab("99 99 * * *").is_err());
    }

    #[test]
    fn test_upcoming_fires_are_strictly_future() {
        let schedule = parse_crontab("* * * * *").unwrap();
        let now = Local::now();
        for fire in schedule.upcoming(Local).take(3) {
            assert!(fire > now);
        }
    }

    fn test_publisher() -> (Arc<crate::tests::mocks::MockPublisher>, Arc<AutoPublisher>) {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let generator = Arc::new(crate::tests::mocks::MockGenerator::new());
        let publisher = Arc::new(crate::tests::mocks::MockPublisher::new());
        let orchestrator = Arc::new(AutoPublisher::new(
            generator,
            publisher.clone(),
            StdRng::seed_from_u64(7),
        ));
        (publisher, orchestrator)
    }

    #[tokio::test]
    async fn test_shutdown_before_first_fire() {
        let (publisher, orchestrator) = test_publisher();
        // Next fire is months away; shutdown must cancel the sleep promptly.
        let task = PublishTask::start("0 0 1 1 *", orchestrator.clone()).unwrap();
        task.shutdown(&orchestrator).await;

        assert_eq!(publisher.call_count(), 0);
        assert_eq!(orchestrator.stats_snapshot().total_runs, 0);
    }

    #[tokio::test]
    async fn test_loop_fires_on_schedule() {
        let (publisher, orchestrator) = test_publisher();
        let task = PublishTask::start("* * * * * *", orchestrator.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(1300)).await;
        task.shutdown(&orchestrator).await;

        assert!(publisher.call_count() >= 1);
        assert!(orchestrator.stats_snapshot().total_runs >= 1);
    }
}
