//! Run Statistics
//!
//! Counters for the scheduled publication loop, plus a human-readable
//! performance report. One instance lives for the orchestrator's lifetime and
//! is mutated only at the end of each attempt; reset happens on restart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for the auto-publish loop. Monotonically non-decreasing within a
/// session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub filtered_content: u64,
    pub retry_attempts: u64,
    /// Accumulated wall-clock time across all runs, in seconds.
    pub total_execution_time: f64,
    /// Completion time of the most recent attempt, success or failure.
    pub last_run_time: Option<DateTime<Utc>>,
}

impl RunStats {
    pub fn record_start(&mut self) {
        self.total_runs += 1;
    }

    pub fn record_success(&mut self, elapsed_secs: f64) {
        self.successful_runs += 1;
        self.finish(elapsed_secs);
    }

    pub fn record_failure(&mut self, elapsed_secs: f64) {
        self.failed_runs += 1;
        self.finish(elapsed_secs);
    }

    /// A run whose content was filtered counts as failed but is tracked
    /// separately; it never reaches the publisher.
    pub fn record_filtered(&mut self, elapsed_secs: f64) {
        self.filtered_content += 1;
        self.failed_runs += 1;
        self.finish(elapsed_secs);
    }

    pub fn record_retries(&mut self, attempts: u64) {
        self.retry_attempts += attempts;
    }

    fn finish(&mut self, elapsed_secs: f64) {
        self.total_execution_time += elapsed_secs;
        self.last_run_time = Some(Utc::now());
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.successful_runs as f64 / self.total_runs as f64 * 100.0
        }
    }

    pub fn avg_execution_time(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.total_execution_time / self.total_runs as f64
        }
    }

    /// Snapshot for reporting; `None` if nothing has run yet.
    pub fn report(&self) -> Option<PerformanceReport> {
        if self.total_runs == 0 {
            return None;
        }
        Some(PerformanceReport {
            total_runs: self.total_runs,
            successful_runs: self.successful_runs,
            failed_runs: self.failed_runs,
            filtered_content: self.filtered_content,
            retry_attempts: self.retry_attempts,
            success_rate: (self.success_rate() * 100.0).round() / 100.0,
            avg_execution_time: (self.avg_execution_time() * 100.0).round() / 100.0,
            total_execution_time: (self.total_execution_time * 100.0).round() / 100.0,
            last_run_time: self.last_run_time,
        })
    }
}

/// Rendered statistics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub filtered_content: u64,
    pub retry_attempts: u64,
    pub success_rate: f64,
    pub avg_execution_time: f64,
    pub total_execution_time: f64,
    pub last_run_time: Option<DateTime<Utc>>,
}

impl std::fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "[AutoPublish] 性能监控报告：")?;
        writeln!(f, "  - 总执行次数：{}", self.total_runs)?;
        writeln!(f, "  - 成功次数：{}", self.successful_runs)?;
        writeln!(f, "  - 失败次数：{}", self.failed_runs)?;
        writeln!(f, "  - 内容过滤次数：{}", self.filtered_content)?;
        writeln!(f, "  - 重试次数：{}", self.retry_attempts)?;
        writeln!(f, "  - 成功率：{}%", self.success_rate)?;
        writeln!(f, "  - 平均执行时间：{}秒", self.avg_execution_time)?;
        write!(f, "  - 总执行时间：{}秒", self.total_execution_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats_have_no_report() {
        let stats = RunStats::default();
        assert!(stats.report().is_none());
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.avg_execution_time(), 0.0);
    }

    #[test]
    fn test_counters_accumulate() {
        let mut stats = RunStats::default();

        stats.record_start();
        stats.record_success(2.0);

        stats.record_start();
        stats.record_failure(4.0);

        stats.record_start();
        stats.record_filtered(1.0);

        stats.record_retries(3);

        assert_eq!(stats.total_runs, 3);
        assert_eq!(stats.successful_runs, 1);
        assert_eq!(stats.failed_runs, 2);
        assert_eq!(stats.filtered_content, 1);
        assert_eq!(stats.retry_attempts, 3);
        assert!((stats.total_execution_time - 7.0).abs() < f64::EPSILON);
        assert!(stats.last_run_time.is_some());
    }

    #[test]
    fn test_report_rates() {
        let mut stats = RunStats::default();
        stats.record_start();
        stats.record_success(1.0);
        stats.record_start();
        stats.record_failure(3.0);

        let report = stats.report().expect("report after runs");
        assert_eq!(report.success_rate, 50.0);
        assert_eq!(report.avg_execution_time, 2.0);
    }

    #[test]
    fn test_report_render() {
        let mut stats = RunStats::default();
        stats.record_start();
        stats.record_success(1.5);
        let rendered = stats.report().unwrap().to_string();
        assert!(rendered.contains("总执行次数：1"));
        assert!(rendered.contains("成功率：100%"));
    }
}
