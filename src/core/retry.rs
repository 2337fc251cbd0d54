//! Retry Engine
//!
//! Bounded retry over a degraded generate+publish cycle, invoked after the
//! orchestrator has already decided a failure is worth retrying. Each attempt
//! waits with capped exponential backoff, regenerates with the fallback
//! request, re-gates the content, and republishes; the classifier can abort
//! the whole loop on the first non-retryable failure.

use std::time::Duration;

use crate::core::classifier::ErrorClassifier;
use crate::core::gate::{GateVerdict, QualityGate, RejectReason};
use crate::core::generator::{DiaryGenerator, GenerationRequest};
use crate::core::post::{Post, Publisher};

/// Default number of retry attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff ceiling.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Terminal state of a retry loop. Always reported, never swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// A retry attempt published successfully.
    Recovered { attempts: u32 },
    /// All attempts used without success.
    Exhausted { attempts: u32 },
    /// The classifier vetoed further attempts.
    Aborted { attempts: u32 },
}

impl RetryOutcome {
    /// Number of retry attempts actually entered.
    pub fn attempts(&self) -> u32 {
        match *self {
            RetryOutcome::Recovered { attempts }
            | RetryOutcome::Exhausted { attempts }
            | RetryOutcome::Aborted { attempts } => attempts,
        }
    }
}

/// Backoff delay before attempt `i`: `min(2^i, cap)` seconds.
fn backoff_delay(attempt: u32, cap: Duration) -> Duration {
    let secs = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(cap)
}

/// Drives the bounded retry cycle.
#[derive(Debug, Clone)]
pub struct RetryEngine {
    max_attempts: u32,
    max_backoff: Duration,
}

impl RetryEngine {
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_backoff: MAX_BACKOFF,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Run the retry loop. The backoff sleep is the only long-lived wait; the
    /// future can be dropped at any point without partial writes.
    pub async fn run(
        &self,
        generator: &dyn DiaryGenerator,
        publisher: &dyn Publisher,
        gate: &QualityGate,
        classifier: &ErrorClassifier,
    ) -> RetryOutcome {
        for attempt in 0..self.max_attempts {
            log::info!("[AutoPublish] 重试发布，第{}次尝试", attempt + 1);
            tokio::time::sleep(backoff_delay(attempt, self.max_backoff)).await;

            let request = GenerationRequest::fallback();
            let diary = match generator.generate(&request).await {
                Ok(diary) => diary,
                Err(e) => {
                    log::error!("[AutoPublish] 重试异常：{e}");
                    if !classifier.is_retryable(&e.to_string()) {
                        log::warn!("[AutoPublish] 遇到不可重试异常，停止重试");
                        return RetryOutcome::Aborted {
                            attempts: attempt + 1,
                        };
                    }
                    continue;
                }
            };

            // Provider-side rejection or local gate rejection: skip this
            // attempt, it is not a classifier decision.
            if RejectReason::from_sentinel(&diary.text).is_some() {
                log::warn!("[AutoPublish] 重试内容被过滤");
                continue;
            }
            let text = match gate.evaluate(&diary.text, request.max_length) {
                GateVerdict::Accepted(text) => text,
                GateVerdict::Rejected(reason) => {
                    log::warn!("[AutoPublish] 重试内容被过滤（{reason}）");
                    continue;
                }
            };

            match publisher.publish(&Post::approved(text)).await {
                Ok(receipt) => {
                    log::info!("[AutoPublish] 重试发布成功（tid: {}）", receipt.tid);
                    return RetryOutcome::Recovered {
                        attempts: attempt + 1,
                    };
                }
                Err(failure) => {
                    log::error!("[AutoPublish] 重试发布失败：{failure}");
                    if !classifier.is_retryable_payload(&failure.payload) {
                        log::warn!("[AutoPublish] 遇到不可重试错误，停止重试");
                        return RetryOutcome::Aborted {
                            attempts: attempt + 1,
                        };
                    }
                }
            }
        }

        log::error!("[AutoPublish] 重试{}次后仍失败", self.max_attempts);
        RetryOutcome::Exhausted {
            attempts: self.max_attempts,
        }
    }
}

impl Default for RetryEngine {
    fn default() -> Self {
        Self::new()
    }
}
