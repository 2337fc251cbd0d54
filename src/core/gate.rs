//! Quality Gate Module
//!
//! Accept/reject classification for generated diary text before publication.
//! All checks are pure and deterministic given the configured word lists;
//! rules are applied in order and the first match wins.

use serde::{Deserialize, Serialize};

// ============================================================================
// Rejection Reasons & Sentinels
// ============================================================================

/// Why a candidate text was rejected by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Sensitive,
    LowQuality,
    TooShort,
}

/// Sentinel strings a provider-side filter embeds in generated text instead
/// of raising. Owned here so the gate, generator implementations, and the
/// orchestrator all match against the same wording.
pub const SENTINEL_SENSITIVE: &str = "内容包含敏感信息，已自动过滤";
pub const SENTINEL_LOW_QUALITY: &str = "内容质量不符合要求，已自动过滤";
pub const SENTINEL_TOO_SHORT: &str = "内容过短，已自动过滤";

impl RejectReason {
    /// The in-band sentinel text for this rejection.
    pub fn sentinel(&self) -> &'static str {
        match self {
            RejectReason::Sensitive => SENTINEL_SENSITIVE,
            RejectReason::LowQuality => SENTINEL_LOW_QUALITY,
            RejectReason::TooShort => SENTINEL_TOO_SHORT,
        }
    }

    /// Recognize a sentinel-bearing text returned by a generator.
    ///
    /// Matches by substring: providers may append detail after the sentinel.
    pub fn from_sentinel(text: &str) -> Option<Self> {
        if text.contains("内容包含敏感信息") {
            Some(RejectReason::Sensitive)
        } else if text.contains("内容质量不符合要求") {
            Some(RejectReason::LowQuality)
        } else if text.contains("内容过短") {
            Some(RejectReason::TooShort)
        } else {
            None
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Sensitive => write!(f, "sensitive"),
            RejectReason::LowQuality => write!(f, "low_quality"),
            RejectReason::TooShort => write!(f, "too_short"),
        }
    }
}

/// Outcome of gating a candidate text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    /// Text passed all checks. Already truncated to the requested length.
    Accepted(String),
    Rejected(RejectReason),
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateVerdict::Accepted(_))
    }
}

// ============================================================================
// Filter Configuration
// ============================================================================

/// A named category of sensitive keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitiveCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Word lists driving the gate. Data, not policy logic: deployments can
/// replace any list without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub sensitive_categories: Vec<SensitiveCategory>,
    pub meaningless_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sensitive_categories: vec![
                SensitiveCategory {
                    name: "政治敏感".to_string(),
                    keywords: ["政治", "政府", "领导人", "国家", "政策", "体制", "民主"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
                SensitiveCategory {
                    name: "暴力违法".to_string(),
                    keywords: ["暴力", "违法", "犯罪", "毒品", "赌博", "诈骗", "杀人"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
                SensitiveCategory {
                    name: "色情低俗".to_string(),
                    keywords: ["色情", "淫秽", "低俗", "性爱", "淫乱", "猥亵"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
            ],
            meaningless_patterns: [
                "啊啊啊啊", "哈哈哈", "。。。", "？？？", "！！！", "test", "测试",
                "hello", "你好", "123", "abc",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

// ============================================================================
// Quality Gate
// ============================================================================

/// Punctuation set for the density check.
const PUNCTUATION: &str = "，。！？；：、";

/// Consecutive-repeat threshold for the degenerate-text check.
const REPEAT_THRESHOLD: usize = 5;

/// Minimum trimmed length of an acceptable text, in chars.
const MIN_LENGTH: usize = 10;

/// Suffix appended when an accepted text is truncated.
const ELLIPSIS: &str = "...";

/// Content quality gate applied to generated text before publication.
#[derive(Debug, Clone)]
pub struct QualityGate {
    config: FilterConfig,
}

impl QualityGate {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Evaluate a candidate text. Rules in order, first match wins:
    /// sensitive keywords, low-quality heuristics, minimum length.
    /// Accepted text longer than `max_length` chars is truncated with an
    /// ellipsis; over-length alone is never grounds for rejection.
    pub fn evaluate(&self, text: &str, max_length: usize) -> GateVerdict {
        if let Some(hit) = self.find_sensitive(text) {
            log::warn!("检测到敏感内容：{} - {}", hit.0, hit.1);
            return GateVerdict::Rejected(RejectReason::Sensitive);
        }

        if self.is_low_quality(text) {
            log::warn!("内容质量过低，已过滤");
            return GateVerdict::Rejected(RejectReason::LowQuality);
        }

        if text.trim().chars().count() < MIN_LENGTH {
            log::warn!("内容过短，已过滤");
            return GateVerdict::Rejected(RejectReason::TooShort);
        }

        GateVerdict::Accepted(truncate(text, max_length))
    }

    /// First sensitive keyword occurring in the text, with its category.
    /// Case-sensitive substring match, no stemming.
    fn find_sensitive(&self, text: &str) -> Option<(&str, &str)> {
        for category in &self.config.sensitive_categories {
            for word in &category.keywords {
                if text.contains(word.as_str()) {
                    return Some((category.name.as_str(), word.as_str()));
                }
            }
        }
        None
    }

    /// Degenerate-text heuristics: long character runs, filler substrings,
    /// or punctuation density above one half.
    fn is_low_quality(&self, text: &str) -> bool {
        if has_repeated_chars(text, REPEAT_THRESHOLD) {
            return true;
        }

        for pattern in &self.config.meaningless_patterns {
            if text.contains(pattern.as_str()) {
                return true;
            }
        }

        let total = text.chars().count();
        if total > 0 {
            let punct = text.chars().filter(|c| PUNCTUATION.contains(*c)).count();
            if punct as f64 / total as f64 > 0.5 {
                return true;
            }
        }

        false
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

/// True if any character repeats at least `threshold` times consecutively.
fn has_repeated_chars(text: &str, threshold: usize) -> bool {
    let mut run = 1usize;
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if Some(c) == prev {
            run += 1;
            if run >= threshold {
                return true;
            }
        } else {
            run = 1;
            prev = Some(c);
        }
    }
    false
}

/// Truncate to exactly `max_length` chars with an ellipsis suffix, or return
/// the text unchanged if it already fits.
fn truncate(text: &str, max_length: usize) -> String {
    let ellipsis_len = ELLIPSIS.chars().count();
    if text.chars().count() <= max_length || max_length <= ellipsis_len {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_length - ellipsis_len).collect();
    out.push_str(ELLIPSIS);
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> QualityGate {
        QualityGate::default()
    }

    #[test]
    fn test_sensitive_keyword_rejected_anywhere() {
        let g = gate();
        for text in [
            "今天聊到了政治话题，大家都很感兴趣呢",
            "前缀前缀前缀，毒品，后缀后缀后缀后缀",
            "色情内容绝对不该出现在一篇说说里",
        ] {
            assert_eq!(
                g.evaluate(text, 500),
                GateVerdict::Rejected(RejectReason::Sensitive),
                "text: {text}"
            );
        }
    }

    #[test]
    fn test_repeated_chars_rejected() {
        let g = gate();
        // Otherwise long and well-formed text still fails on the run.
        let text = "今天的天气真不错呀呀呀呀呀，大家都出去玩了，我也想去公园走一走";
        assert_eq!(
            g.evaluate(text, 500),
            GateVerdict::Rejected(RejectReason::LowQuality)
        );
    }

    #[test]
    fn test_four_repeats_pass() {
        let g = gate();
        let text = "今夜星光很好好好好，适合散步聊聊天，顺便看看月亮发发呆";
        assert!(g.evaluate(text, 500).is_accepted());
    }

    #[test]
    fn test_meaningless_pattern_rejected() {
        let g = gate();
        assert_eq!(
            g.evaluate("这是一条测试说说，内容还算正常的样子", 500),
            GateVerdict::Rejected(RejectReason::LowQuality)
        );
    }

    #[test]
    fn test_punctuation_density_rejected() {
        let g = gate();
        // 8 punctuation chars out of 13 total.
        let text = "，。！？；：、，好的文字字";
        assert_eq!(
            g.evaluate(text, 500),
            GateVerdict::Rejected(RejectReason::LowQuality)
        );
    }

    #[test]
    fn test_too_short_rejected() {
        let g = gate();
        assert_eq!(
            g.evaluate("  太短了  ", 500),
            GateVerdict::Rejected(RejectReason::TooShort)
        );
    }

    #[test]
    fn test_clean_text_accepted() {
        let g = gate();
        let text = "傍晚的风很温柔，河边的灯一盏盏亮起来，像是给晚归的人引路";
        match g.evaluate(text, 500) {
            GateVerdict::Accepted(out) => assert_eq!(out, text),
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn test_overlong_text_truncated_not_rejected() {
        let g = gate();
        let text: String = std::iter::repeat("清晨散步很舒服。")
            .take(10)
            .collect();
        match g.evaluate(&text, 30) {
            GateVerdict::Accepted(out) => {
                assert_eq!(out.chars().count(), 30);
                assert!(out.ends_with("..."));
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn test_sentinel_roundtrip() {
        for reason in [
            RejectReason::Sensitive,
            RejectReason::LowQuality,
            RejectReason::TooShort,
        ] {
            assert_eq!(RejectReason::from_sentinel(reason.sentinel()), Some(reason));
        }
        assert_eq!(RejectReason::from_sentinel("正常的一条说说内容"), None);
    }

    #[test]
    fn test_sentinel_matches_with_suffix() {
        assert_eq!(
            RejectReason::from_sentinel("内容过短，已自动过滤 (长度 3)"),
            Some(RejectReason::TooShort)
        );
    }
}
