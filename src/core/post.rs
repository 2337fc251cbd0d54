//! Post & Publish Sink
//!
//! The post record handed to the publish sink, and the narrow contract with
//! the external Qzone client. The failure payload is opaque here; only the
//! error classifier's keyword matching ever looks inside it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Moderation status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Pending,
    Approved,
    Rejected,
}

/// A post handed to the publish sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub text: String,
    pub images: Vec<String>,
    pub status: PostStatus,
}

impl Post {
    /// A post that has already passed the quality gate.
    pub fn approved(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
            status: PostStatus::Approved,
        }
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// Successful publish result from the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Platform-assigned post id.
    pub tid: String,
    /// Platform timestamp of the post, when reported.
    pub create_time: Option<i64>,
}

/// Opaque failure payload from a publish attempt. Consumed only by
/// [`crate::core::classifier::ErrorClassifier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishFailure {
    pub payload: serde_json::Value,
}

impl PublishFailure {
    pub fn new(payload: serde_json::Value) -> Self {
        Self { payload }
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            payload: serde_json::Value::String(message.into()),
        }
    }
}

impl std::fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.payload {
            serde_json::Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{other}"),
        }
    }
}

/// The external publish sink (Qzone wire client).
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, post: &Post) -> Result<PublishReceipt, PublishFailure>;
}
