//! Mock collaborators with scriptable behavior.
//!
//! Each mock pops a scripted result per call and falls back to a default
//! success once the script is exhausted; call counts are tracked so tests can
//! assert exactly how many attempts were made.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::generator::{DiaryGenerator, GenerateError, GeneratedDiary, GenerationRequest};
use crate::core::post::{Post, PublishFailure, PublishReceipt, Publisher};
use crate::core::surfing::{SurfingDigest, SurfingGenerator, SurfingRequest};

/// A clean diary text that passes every gate check.
pub const CLEAN_TEXT: &str = "傍晚的风很温柔，河边的灯一盏盏亮起来，晚归的人都慢了下来";

// ============================================================================
// Mock Diary Generator
// ============================================================================

pub struct MockGenerator {
    script: Mutex<VecDeque<Result<GeneratedDiary, GenerateError>>>,
    call_count: AtomicU32,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn push_text(&self, text: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(GeneratedDiary::text_only(text)));
    }

    pub fn push_error(&self, error: GenerateError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiaryGenerator for MockGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedDiary, GenerateError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GeneratedDiary::text_only(CLEAN_TEXT)))
    }
}

// ============================================================================
// Mock Publisher
// ============================================================================

pub struct MockPublisher {
    script: Mutex<VecDeque<Result<PublishReceipt, PublishFailure>>>,
    call_count: AtomicU32,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(PublishFailure::from_message(message)));
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, _post: &Post) -> Result<PublishReceipt, PublishFailure> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(PublishReceipt {
                tid: "mock-tid".to_string(),
                create_time: None,
            })
        })
    }
}

// ============================================================================
// Mock Surfing Generator
// ============================================================================

pub struct MockSurfingGenerator {
    script: Mutex<VecDeque<Result<SurfingDigest, GenerateError>>>,
    call_count: AtomicU32,
}

impl MockSurfingGenerator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn push_digest(&self, query: &str, result_count: usize) {
        self.script.lock().unwrap().push_back(Ok(SurfingDigest {
            content: CLEAN_TEXT.to_string(),
            search_query: query.to_string(),
            search_results: vec!["snippet".to_string(); result_count],
            images: Vec::new(),
        }));
    }

    pub fn push_error(&self, error: GenerateError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SurfingGenerator for MockSurfingGenerator {
    async fn generate(&self, _request: &SurfingRequest) -> Result<SurfingDigest, GenerateError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(SurfingDigest {
                    content: CLEAN_TEXT.to_string(),
                    search_query: "随机".to_string(),
                    search_results: Vec::new(),
                    images: Vec::new(),
                })
            })
    }

    async fn trending_topics(&self) -> Result<Vec<String>, GenerateError> {
        Ok(vec!["AI发展".to_string(), "美食".to_string()])
    }
}
