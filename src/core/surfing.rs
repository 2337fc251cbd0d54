//! Web Surfing Service
//!
//! The on-demand, search-augmented variant of the publication pipeline,
//! gated by identity through [`SurfingQuota`] rather than by content. Faults
//! here surface to the caller as human-readable messages and are never
//! retried automatically; the user re-invokes if they care.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::generator::GenerateError;
use crate::core::post::{Post, Publisher};
use crate::core::quota::{SurfingPolicy, SurfingQuota};

/// Parameters of one on-demand request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfingRequest {
    /// Search category (科技/娱乐/生活/社会/知识); empty means random.
    pub category: String,
    /// User-supplied topic overriding category search.
    pub custom_topic: String,
    /// Writing style (幽默/深度/简洁/文艺/实用).
    pub writing_style: String,
    pub max_length: usize,
    pub include_sources: bool,
}

impl Default for SurfingRequest {
    fn default() -> Self {
        Self {
            category: "随机".to_string(),
            custom_topic: String::new(),
            writing_style: "幽默".to_string(),
            max_length: 300,
            include_sources: true,
        }
    }
}

/// Output of the search-augmented generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfingDigest {
    pub content: String,
    /// The query that was actually searched.
    pub search_query: String,
    /// Source snippets consulted during generation.
    pub search_results: Vec<String>,
    pub images: Vec<String>,
}

/// The external search-augmented content generator.
#[async_trait]
pub trait SurfingGenerator: Send + Sync {
    async fn generate(&self, request: &SurfingRequest) -> Result<SurfingDigest, GenerateError>;

    /// Currently trending topics, for the host's suggestion UI.
    async fn trending_topics(&self) -> Result<Vec<String>, GenerateError>;
}

/// On-demand pipeline: permission check → generate → publish → record usage.
pub struct SurfingService {
    quota: Arc<SurfingQuota>,
    generator: Arc<dyn SurfingGenerator>,
    publisher: Arc<dyn Publisher>,
}

impl SurfingService {
    pub fn new(
        quota: Arc<SurfingQuota>,
        generator: Arc<dyn SurfingGenerator>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            quota,
            generator,
            publisher,
        }
    }

    pub fn quota(&self) -> &SurfingQuota {
        &self.quota
    }

    /// Handle one user invocation end to end. The returned string is the
    /// user-visible reply: a denial reason, a failure message, or the
    /// success summary. Usage is recorded only after a successful publish.
    pub async fn handle(
        &self,
        user_id: &str,
        request: &SurfingRequest,
        policy: &SurfingPolicy,
    ) -> String {
        if let Err(denied) = self.quota.check_permission(user_id, policy) {
            return denied.to_string();
        }

        let digest = match self.generator.generate(request).await {
            Ok(digest) => digest,
            Err(e) => {
                log::error!("生成上网冲浪说说失败：{e}");
                return format!("上网冲浪失败：{e}，请检查网络连接或搜索服务配置。");
            }
        };

        let post = Post::approved(digest.content.clone()).with_images(digest.images.clone());
        if let Err(failure) = self.publisher.publish(&post).await {
            log::error!("发布说说失败：{failure}");
            return format!("发布说说失败：{failure}");
        }

        self.quota.record_usage(user_id);
        let remaining = self.quota.remaining(user_id, policy);
        let remaining_text = if remaining >= 0 {
            remaining.to_string()
        } else {
            "无限制".to_string()
        };

        format!(
            "✅ 上网冲浪说说发布成功！\n\
             📝 主题：{}\n\
             🎨 风格：{}\n\
             🔍 搜索了 {} 条信息\n\
             📊 今日剩余次数：{}",
            if digest.search_query.is_empty() {
                "随机"
            } else {
                digest.search_query.as_str()
            },
            request.writing_style,
            digest.search_results.len(),
            remaining_text
        )
    }
}
