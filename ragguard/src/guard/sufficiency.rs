//! Context sufficiency gate

use super::{contains_any, lowercase_all, SufficiencyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sufficiency {
    Answerable,
    Insufficient,
}

/// Decides whether retrieved context can ground an answer
///
/// Context is insufficient when it is absent, shorter than `min_chars` after
/// trimming, or shorter than `keyword_min_chars` without any domain keyword.
#[derive(Debug, Clone)]
pub struct SufficiencyGate {
    min_chars: usize,
    keyword_min_chars: usize,
    keywords: Vec<String>,
}

impl SufficiencyGate {
    pub fn new(config: &SufficiencyConfig) -> Self {
        Self {
            min_chars: config.min_chars,
            keyword_min_chars: config.keyword_min_chars,
            keywords: lowercase_all(&config.keywords),
        }
    }

    pub fn classify(&self, context: Option<&str>) -> Sufficiency {
        let Some(context) = context else {
            return Sufficiency::Insufficient;
        };

        let trimmed = context.trim();
        let length = trimmed.chars().count();
        if length < self.min_chars {
            return Sufficiency::Insufficient;
        }

        if length < self.keyword_min_chars && !contains_any(&trimmed.to_lowercase(), &self.keywords)
        {
            return Sufficiency::Insufficient;
        }

        Sufficiency::Answerable
    }
}

impl Default for SufficiencyGate {
    fn default() -> Self {
        Self::new(&SufficiencyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(chars: usize, filler: char) -> String {
        std::iter::repeat(filler).take(chars).collect()
    }

    #[test]
    fn test_absent_or_empty_context() {
        let gate = SufficiencyGate::default();
        assert_eq!(gate.classify(None), Sufficiency::Insufficient);
        assert_eq!(gate.classify(Some("")), Sufficiency::Insufficient);
        assert_eq!(gate.classify(Some("   \n\t ")), Sufficiency::Insufficient);
    }

    #[test]
    fn test_short_context_is_insufficient_even_with_keywords() {
        let gate = SufficiencyGate::default();
        let context = format!("bảo hiểm {}", text_of(80, 'x'));
        assert!(context.chars().count() < 100);
        assert_eq!(gate.classify(Some(&context)), Sufficiency::Insufficient);
    }

    #[test]
    fn test_whitespace_padding_does_not_count() {
        let gate = SufficiencyGate::default();
        let context = format!("{}{}{}", text_of(60, ' '), text_of(99, 'a'), text_of(60, ' '));
        assert_eq!(gate.classify(Some(&context)), Sufficiency::Insufficient);
    }

    #[test]
    fn test_medium_context_needs_keyword() {
        let gate = SufficiencyGate::default();

        let off_topic = text_of(150, 'z');
        assert_eq!(gate.classify(Some(&off_topic)), Sufficiency::Insufficient);

        let on_topic = format!("{} Quyền Lợi", text_of(150, 'z'));
        assert_eq!(gate.classify(Some(&on_topic)), Sufficiency::Answerable);
    }

    #[test]
    fn test_long_context_without_keyword_is_answerable() {
        let gate = SufficiencyGate::default();
        let context = text_of(200, 'q');
        assert_eq!(gate.classify(Some(&context)), Sufficiency::Answerable);
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        let gate = SufficiencyGate::default();
        // 99 multi-byte characters is still below the 100 character floor
        let context = text_of(99, 'ệ');
        assert!(context.len() > 100);
        assert_eq!(gate.classify(Some(&context)), Sufficiency::Insufficient);
    }

    #[test]
    fn test_custom_thresholds() {
        let gate = SufficiencyGate::new(&SufficiencyConfig {
            min_chars: 5,
            keyword_min_chars: 10,
            keywords: vec!["Premium".to_string()],
        });
        assert_eq!(gate.classify(Some("abcdef")), Sufficiency::Insufficient);
        assert_eq!(gate.classify(Some("a premium")), Sufficiency::Answerable);
        assert_eq!(gate.classify(Some("abcdefghijk")), Sufficiency::Answerable);
    }
}
