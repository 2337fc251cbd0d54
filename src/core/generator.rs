//! Content Generator Contracts
//!
//! Narrow interfaces to the external LLM-backed content generator, plus the
//! request types the orchestrator samples per tick. The generator applies
//! quality filtering internally and signals rejection in-band with one of the
//! fixed sentinel strings (see [`crate::core::gate`]) rather than raising.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Writing Styles & Topics
// ============================================================================

/// Writing style for a generated diary post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiaryStyle {
    Default,
    Poetic,
    Humorous,
    Philosophical,
    Casual,
}

impl DiaryStyle {
    pub const ALL: [DiaryStyle; 5] = [
        DiaryStyle::Default,
        DiaryStyle::Poetic,
        DiaryStyle::Humorous,
        DiaryStyle::Philosophical,
        DiaryStyle::Casual,
    ];

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl std::fmt::Display for DiaryStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiaryStyle::Default => write!(f, "default"),
            DiaryStyle::Poetic => write!(f, "poetic"),
            DiaryStyle::Humorous => write!(f, "humorous"),
            DiaryStyle::Philosophical => write!(f, "philosophical"),
            DiaryStyle::Casual => write!(f, "casual"),
        }
    }
}

/// Topic pool sampled by the scheduled loop; `None` is also an option.
pub const TOPICS: [&str; 5] = ["生活感悟", "科技发展", "情感交流", "学习心得", "娱乐休闲"];

/// Uniform sample over the fixed topics plus "no topic".
pub fn sample_topic<R: Rng>(rng: &mut R) -> Option<String> {
    let idx = rng.gen_range(0..=TOPICS.len());
    TOPICS.get(idx).map(|t| t.to_string())
}

// ============================================================================
// Generation Request
// ============================================================================

/// One generation attempt's parameters. Constructed fresh per tick and fully
/// consumed by the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub style: DiaryStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Maximum length of the generated text, in chars.
    pub max_length: usize,
    /// Aggregate messages from several group chats instead of one.
    pub multi_group: bool,
    /// Upper bound on sources when `multi_group` is set.
    pub max_groups: usize,
    pub generate_images: bool,
}

impl GenerationRequest {
    pub fn new(style: DiaryStyle) -> Self {
        Self {
            style,
            topic: None,
            max_length: 500,
            multi_group: false,
            max_groups: 3,
            generate_images: false,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_multi_group(mut self, max_groups: usize) -> Self {
        self.multi_group = true;
        self.max_groups = max_groups;
        self
    }

    pub fn with_images(mut self) -> Self {
        self.generate_images = true;
        self
    }

    /// Degraded request used during retries: casual style, no topic, shorter
    /// bound, no images. A simpler request is less likely to repeat the
    /// failure of the original one.
    pub fn fallback() -> Self {
        Self::new(DiaryStyle::Casual).with_max_length(300)
    }
}

// ============================================================================
// Generated Content
// ============================================================================

/// Output of one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDiary {
    /// The diary text, or a sentinel string if the provider-side filter
    /// rejected its own output.
    pub text: String,
    /// Image URLs or local paths; empty for text-only posts.
    pub images: Vec<String>,
    /// Sentiment tag from post-generation analysis (e.g. 积极/消极/中性/混合).
    pub sentiment: String,
    /// Topic tag from post-generation analysis.
    pub topic: String,
}

impl GeneratedDiary {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
            sentiment: "中性".to_string(),
            topic: "其他".to_string(),
        }
    }
}

/// Failure raised by the generation collaborator.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("未配置 LLM 提供商")]
    NoProvider,

    #[error("LLM 调用失败：{0}")]
    Provider(String),

    #[error("图片生成失败：{0}")]
    ImageGeneration(String),
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// The external content generator. Implementations talk to an LLM provider,
/// fetch chat context, and run their own quality filtering; rejected output
/// comes back as sentinel-bearing text, provider failures as errors.
#[async_trait]
pub trait DiaryGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDiary, GenerateError>;
}
