//! Guardrails around generation
//!
//! Two gates keep the bot from answering out of thin air:
//!
//! - [`SufficiencyGate`] looks at retrieved context before anything is generated
//! - [`AnswerQualityGate`] looks at a generated answer before it is returned
//!
//! Both substitute the canned redirect message when they reject. Their
//! keyword lists, thresholds and canned texts are deployment data, loaded
//! from YAML when a file is configured.

pub mod quality;
pub mod sufficiency;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BotError, Result};

pub use quality::{AnswerQualityGate, Rejection};
pub use sufficiency::{Sufficiency, SufficiencyGate};

pub const REDIRECT_MESSAGE: &str = "Em xin lỗi, thông tin này em chưa được cập nhật đầy đủ. Để được tư vấn chính xác nhất, anh/chị vui lòng:\n- Liên hệ hotline: 0385 10 10 18\n- Email: cskh@fiss.com.vn\n- Hoặc em có thể chuyển anh/chị sang tư vấn viên chuyên môn để được hỗ trợ tốt hơn ạ.";

pub const TECHNICAL_DIFFICULTY_MESSAGE: &str = "Xin lỗi, hiện tại hệ thống đang gặp sự cố kỹ thuật. Anh/chị vui lòng thử lại sau hoặc liên hệ hotline 0385 10 10 18 để được hỗ trợ ạ.";

/// Domain keywords that mark context as on-topic
const CONTEXT_KEYWORDS: &[&str] = &[
    "bảo hiểm",
    "phí",
    "giá",
    "quy định",
    "điều khoản",
    "hợp đồng",
    "bồi thường",
    "quyền lợi",
];

/// Domain keywords that mark an answer as on-topic
const ANSWER_KEYWORDS: &[&str] = &[
    "bảo hiểm",
    "phí",
    "giá",
    "quy định",
    "điều khoản",
    "hợp đồng",
    "bồi thường",
    "quyền lợi",
    "xe máy",
    "ô tô",
    "sức khỏe",
    "nhân thọ",
    "du lịch",
    "vnđ",
    "đồng",
];

const DISCLAIMER_PHRASES: &[&str] = &[
    "i'm sorry",
    "i don't know",
    "i cannot",
    "i'm not able",
    "don't have",
    "unable to",
];

const HOTLINE_MARKERS: &[&str] = &["hotline", "0385"];

const GENERIC_PHRASES: &[&str] = &[
    "it seems",
    "i understand",
    "i'm here to help",
    "let me know",
    "feel free",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The two fixed user-facing fallback texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannedMessages {
    /// Returned when the bot lacks grounded information
    pub redirect: String,
    /// Returned when an internal failure occurred
    pub technical_difficulty: String,
}

impl Default for CannedMessages {
    fn default() -> Self {
        Self {
            redirect: REDIRECT_MESSAGE.to_string(),
            technical_difficulty: TECHNICAL_DIFFICULTY_MESSAGE.to_string(),
        }
    }
}

/// Thresholds for retrieved context, in characters of the trimmed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SufficiencyConfig {
    /// Context shorter than this is always insufficient
    pub min_chars: usize,
    /// Context shorter than this must contain a domain keyword
    pub keyword_min_chars: usize,
    pub keywords: Vec<String>,
}

impl Default for SufficiencyConfig {
    fn default() -> Self {
        Self {
            min_chars: 100,
            keyword_min_chars: 200,
            keywords: owned(CONTEXT_KEYWORDS),
        }
    }
}

/// Rules for generated answers, in characters of the trimmed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Answers shorter than this are rejected outright
    pub min_chars: usize,
    pub disclaimer_phrases: Vec<String>,
    /// Any of these exempts a disclaimer answer from rejection
    pub hotline_markers: Vec<String>,
    /// Below this length, off-topic generic filler is rejected
    pub generic_max_chars: usize,
    pub keywords: Vec<String>,
    pub generic_phrases: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_chars: 50,
            disclaimer_phrases: owned(DISCLAIMER_PHRASES),
            hotline_markers: owned(HOTLINE_MARKERS),
            generic_max_chars: 100,
            keywords: owned(ANSWER_KEYWORDS),
            generic_phrases: owned(GENERIC_PHRASES),
        }
    }
}

/// All guardrail data for one deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailConfig {
    pub messages: CannedMessages,
    pub sufficiency: SufficiencyConfig,
    pub quality: QualityConfig,
}

impl GuardrailConfig {
    /// Parse from YAML; omitted sections keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| BotError::Configuration(format!("Invalid guardrail config: {}", e)))
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        info!("Loaded guardrails from {}", path.display());
        Ok(config)
    }
}

/// Lowercased copy of each phrase, for matching against lowercased text
pub(crate) fn lowercase_all(phrases: &[String]) -> Vec<String> {
    phrases.iter().map(|p| p.to_lowercase()).collect()
}

/// Whether lowercased `haystack` contains any of the lowercased `needles`
pub(crate) fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}
