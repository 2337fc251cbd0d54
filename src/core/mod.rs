//! Publication pipeline core.
//!
//! Module map:
//! - [`gate`]       — content quality gate and rejection sentinels
//! - [`classifier`] — retryable-vs-fatal failure classification
//! - [`retry`]      — bounded exponential-backoff retry cycle
//! - [`publish`]    — the scheduled orchestrator
//! - [`scheduler`]  — cron-driven single-flight task loop
//! - [`stats`]      — run counters and performance reporting
//! - [`quota`]      — per-user daily usage quotas for the on-demand path
//! - [`surfing`]    — the on-demand, search-augmented pipeline
//! - [`generator`]/[`post`] — contracts with the external LLM and wire client

pub mod classifier;
pub mod gate;
pub mod generator;
pub mod post;
pub mod publish;
pub mod quota;
pub mod retry;
pub mod scheduler;
pub mod stats;
pub mod surfing;

pub use classifier::ErrorClassifier;
pub use gate::{FilterConfig, GateVerdict, QualityGate, RejectReason};
pub use generator::{DiaryGenerator, DiaryStyle, GenerateError, GeneratedDiary, GenerationRequest};
pub use post::{Post, PostStatus, PublishFailure, PublishReceipt, Publisher};
pub use publish::AutoPublisher;
pub use quota::{AccessMode, QuotaDenied, SurfingPolicy, SurfingQuota, UsageStatistics};
pub use retry::{RetryEngine, RetryOutcome};
pub use scheduler::{parse_crontab, PublishTask, ScheduleError};
pub use stats::{PerformanceReport, RunStats};
pub use surfing::{SurfingDigest, SurfingGenerator, SurfingRequest, SurfingService};
