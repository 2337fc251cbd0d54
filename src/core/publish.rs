//! Auto-Publish Orchestrator
//!
//! The scheduled entry point of the publication pipeline: samples generation
//! parameters, invokes the content generator, recognizes filtered output,
//! publishes, and hands failures to the classifier/retry machinery. Every
//! failure path ends in either a retry or a logged, counted no-op — nothing
//! here may affect the scheduler's next tick.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;

use crate::core::classifier::ErrorClassifier;
use crate::core::gate::{QualityGate, RejectReason};
use crate::core::generator::{sample_topic, DiaryGenerator, DiaryStyle, GenerationRequest};
use crate::core::post::{Post, Publisher};
use crate::core::retry::RetryEngine;
use crate::core::stats::{PerformanceReport, RunStats};

/// Default length bound for scheduled posts, in chars.
const DEFAULT_MAX_LENGTH: usize = 500;

/// Probability of aggregating several group chats into one request.
const MULTI_GROUP_PROBABILITY: f64 = 0.3;

/// Probability of requesting images alongside the text.
const IMAGE_PROBABILITY: f64 = 0.5;

/// Scheduled publication orchestrator.
///
/// Owns the run statistics for its lifetime; the RNG is injected so tests can
/// pin parameter sampling deterministically.
pub struct AutoPublisher {
    generator: Arc<dyn DiaryGenerator>,
    publisher: Arc<dyn Publisher>,
    gate: QualityGate,
    classifier: ErrorClassifier,
    retry: RetryEngine,
    stats: Mutex<RunStats>,
    rng: Mutex<StdRng>,
    max_length: usize,
}

impl AutoPublisher {
    pub fn new(
        generator: Arc<dyn DiaryGenerator>,
        publisher: Arc<dyn Publisher>,
        rng: StdRng,
    ) -> Self {
        Self {
            generator,
            publisher,
            gate: QualityGate::default(),
            classifier: ErrorClassifier::new(),
            retry: RetryEngine::new(),
            stats: Mutex::new(RunStats::default()),
            rng: Mutex::new(rng),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    pub fn with_gate(mut self, gate: QualityGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_retry(mut self, retry: RetryEngine) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Execute one scheduled publication attempt. Never propagates an error;
    /// the scheduler's liveness is unaffected by any outcome here.
    pub async fn run_once(&self) {
        log::info!("[AutoPublish] 执行自动发说说任务");
        let started = Instant::now();
        self.stats.lock().unwrap().record_start();

        let request = self.sample_request();
        log::debug!(
            "[AutoPublish] 风格：{}，主题：{:?}，多群聊：{}，配图：{}",
            request.style,
            request.topic,
            request.multi_group,
            request.generate_images
        );

        let diary = match self.generator.generate(&request).await {
            Ok(diary) => diary,
            Err(e) => {
                let elapsed = started.elapsed().as_secs_f64();
                log::error!("[AutoPublish] 执行任务异常：{e}，耗时：{elapsed:.2}s");
                self.stats.lock().unwrap().record_failure(elapsed);
                if self.classifier.is_retryable(&e.to_string()) {
                    self.run_retry().await;
                } else {
                    log::error!("[AutoPublish] 遇到不可重试错误，跳过本次任务");
                }
                return;
            }
        };

        // Provider-side filtering comes back in-band: a failed run, counted
        // separately, never published and never retried.
        if RejectReason::from_sentinel(&diary.text).is_some() {
            log::warn!("[AutoPublish] 内容被过滤，跳过本次发布");
            self.stats
                .lock()
                .unwrap()
                .record_filtered(started.elapsed().as_secs_f64());
            return;
        }

        let post = Post::approved(diary.text.clone()).with_images(diary.images.clone());
        match self.publisher.publish(&post).await {
            Ok(_) => {
                let elapsed = started.elapsed().as_secs_f64();
                self.stats.lock().unwrap().record_success(elapsed);
                let mode = if request.multi_group { "多群聊" } else { "单群聊" };
                let image_info = if diary.images.is_empty() {
                    "，纯文本".to_string()
                } else {
                    format!("，配图：{}张", diary.images.len())
                };
                log::info!(
                    "[AutoPublish] 说说发布成功（风格：{}，主题：{:?}，模式：{mode}{image_info}，情感：{}，话题：{}，耗时：{elapsed:.2}s）",
                    request.style,
                    request.topic,
                    diary.sentiment,
                    diary.topic
                );
            }
            Err(failure) => {
                let elapsed = started.elapsed().as_secs_f64();
                log::error!("[AutoPublish] 发说说失败：{failure}");
                self.stats.lock().unwrap().record_failure(elapsed);
                if self.classifier.is_retryable_payload(&failure.payload) {
                    self.run_retry().await;
                }
            }
        }
    }

    /// Sample fresh generation parameters for this tick.
    fn sample_request(&self) -> GenerationRequest {
        let mut rng = self.rng.lock().unwrap();
        let mut request = GenerationRequest::new(DiaryStyle::sample(&mut *rng))
            .with_max_length(self.max_length);
        if let Some(topic) = sample_topic(&mut *rng) {
            request = request.with_topic(topic);
        }
        if rng.gen::<f64>() < MULTI_GROUP_PROBABILITY {
            let max_groups = rng.gen_range(2..=4);
            request = request.with_multi_group(max_groups);
        }
        if rng.gen::<f64>() < IMAGE_PROBABILITY {
            request = request.with_images();
        }
        request
    }

    async fn run_retry(&self) {
        let outcome = self
            .retry
            .run(
                self.generator.as_ref(),
                self.publisher.as_ref(),
                &self.gate,
                &self.classifier,
            )
            .await;
        self.stats
            .lock()
            .unwrap()
            .record_retries(outcome.attempts() as u64);
    }

    /// Current counters, cloned under the lock.
    pub fn stats_snapshot(&self) -> RunStats {
        self.stats.lock().unwrap().clone()
    }

    /// Rendered performance report; `None` before the first run.
    pub fn performance_report(&self) -> Option<PerformanceReport> {
        self.stats.lock().unwrap().report()
    }

    /// Log the final report, e.g. on shutdown.
    pub fn log_performance_report(&self) {
        match self.performance_report() {
            Some(report) => log::info!("{report}"),
            None => log::info!("[AutoPublish] 性能监控：暂无执行记录"),
        }
    }
}
