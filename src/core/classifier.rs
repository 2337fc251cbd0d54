//! Error Classifier Module
//!
//! Decides whether a publish/generation failure is worth retrying. The policy
//! is an ordered list of (keyword-list, verdict) rules evaluated over a
//! lower-cased stringification of the failure; the first rule with a keyword
//! hit wins, and unknown failures default to retryable. Transient
//! infrastructure faults self-heal under retry; permission and content-policy
//! faults will not, so they fail fast.

/// One precedence level of the classification policy.
#[derive(Debug, Clone)]
struct Rule {
    keywords: &'static [&'static str],
    retryable: bool,
}

/// Network/timeout-class keywords, checked first.
const RETRYABLE_KEYWORDS: &[&str] = &["timeout", "network", "connection", "服务器", "网络"];

/// Permission/auth/content-policy-class keywords, checked second.
const NON_RETRYABLE_KEYWORDS: &[&str] = &["permission", "auth", "content", "敏感", "违规", "sensitive"];

/// Keyword-driven retryability classifier.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<Rule>,
    default_retryable: bool,
}

impl ErrorClassifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Rule {
                    keywords: RETRYABLE_KEYWORDS,
                    retryable: true,
                },
                Rule {
                    keywords: NON_RETRYABLE_KEYWORDS,
                    retryable: false,
                },
            ],
            // Unknown failures are assumed transient; the retry cap bounds
            // the cost of being wrong.
            default_retryable: true,
        }
    }

    /// Classify any failure that can be rendered as text: an opaque publish
    /// payload, an error's `Display` output, or a panic message.
    pub fn is_retryable(&self, failure: &str) -> bool {
        let haystack = failure.to_lowercase();
        for rule in &self.rules {
            if rule.keywords.iter().any(|k| haystack.contains(k)) {
                return rule.retryable;
            }
        }
        self.default_retryable
    }

    /// Classify a structured payload by its JSON rendering.
    pub fn is_retryable_payload(&self, payload: &serde_json::Value) -> bool {
        self.is_retryable(&payload.to_string())
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}
