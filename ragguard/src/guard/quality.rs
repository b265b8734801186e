//! Answer quality gate
//!
//! Rules are checked in order against the trimmed answer; the first one that
//! fires replaces the answer with the redirect message:
//!
//! 1. shorter than `min_chars`
//! 2. contains a disclaimer phrase but no hotline marker
//! 3. shorter than `generic_max_chars`, no domain keyword, and a generic filler phrase
//!
//! The redirect message passes every rule, so applying the gate twice gives
//! the same result as applying it once.

use tracing::warn;

use super::{contains_any, lowercase_all, QualityConfig, REDIRECT_MESSAGE};

/// Why an answer was replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooShort,
    UnroutedDisclaimer,
    GenericFiller,
}

#[derive(Debug, Clone)]
pub struct AnswerQualityGate {
    min_chars: usize,
    disclaimer_phrases: Vec<String>,
    hotline_markers: Vec<String>,
    generic_max_chars: usize,
    keywords: Vec<String>,
    generic_phrases: Vec<String>,
    redirect: String,
}

impl AnswerQualityGate {
    pub fn new(config: &QualityConfig, redirect: impl Into<String>) -> Self {
        Self {
            min_chars: config.min_chars,
            disclaimer_phrases: lowercase_all(&config.disclaimer_phrases),
            hotline_markers: lowercase_all(&config.hotline_markers),
            generic_max_chars: config.generic_max_chars,
            keywords: lowercase_all(&config.keywords),
            generic_phrases: lowercase_all(&config.generic_phrases),
            redirect: redirect.into(),
        }
    }

    /// First rule the answer violates, if any
    pub fn check(&self, answer: &str) -> Option<Rejection> {
        let trimmed = answer.trim();
        let length = trimmed.chars().count();
        if length < self.min_chars {
            return Some(Rejection::TooShort);
        }

        let lower = trimmed.to_lowercase();
        if contains_any(&lower, &self.disclaimer_phrases)
            && !contains_any(&lower, &self.hotline_markers)
        {
            return Some(Rejection::UnroutedDisclaimer);
        }

        if length < self.generic_max_chars
            && !contains_any(&lower, &self.keywords)
            && contains_any(&lower, &self.generic_phrases)
        {
            return Some(Rejection::GenericFiller);
        }

        None
    }

    /// The answer itself when it passes, otherwise the redirect message
    pub fn apply(&self, answer: &str) -> String {
        match self.check(answer) {
            None => answer.to_string(),
            Some(rejection) => {
                warn!(
                    "Answer rejected ({:?}, {} chars), returning redirect",
                    rejection,
                    answer.chars().count()
                );
                self.redirect.clone()
            }
        }
    }
}

impl Default for AnswerQualityGate {
    fn default() -> Self {
        Self::new(&QualityConfig::default(), REDIRECT_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_ANSWER: &str = "Dạ, phí bảo hiểm bắt buộc xe máy dưới 50cc là 55.000 đồng/năm, trên 50cc là 60.000 đồng/năm ạ.";

    #[test]
    fn test_good_answer_passes_unchanged() {
        let gate = AnswerQualityGate::default();
        assert_eq!(gate.check(GOOD_ANSWER), None);
        assert_eq!(gate.apply(GOOD_ANSWER), GOOD_ANSWER);
    }

    #[test]
    fn test_short_answer_is_redirected() {
        let gate = AnswerQualityGate::default();
        assert_eq!(gate.check(""), Some(Rejection::TooShort));
        assert_eq!(gate.check("Dạ, có ạ."), Some(Rejection::TooShort));
        assert_eq!(gate.apply("   "), REDIRECT_MESSAGE);
    }

    #[test]
    fn test_disclaimer_without_hotline_is_redirected() {
        let gate = AnswerQualityGate::default();
        let answer = "I'm sorry, but I don't have details about that specific insurance product right now.";
        assert_eq!(gate.check(answer), Some(Rejection::UnroutedDisclaimer));
        assert_eq!(gate.apply(answer), REDIRECT_MESSAGE);
    }

    #[test]
    fn test_disclaimer_with_hotline_passes() {
        let gate = AnswerQualityGate::default();
        let answer = "I'm sorry, I don't have that information. Please call our HOTLINE for more details.";
        assert_eq!(gate.check(answer), None);

        let answer = "I'm unable to confirm the premium here, please call 0385 10 10 18 for a quote today.";
        assert_eq!(gate.check(answer), None);
    }

    #[test]
    fn test_generic_filler_is_redirected() {
        let gate = AnswerQualityGate::default();
        let answer = "It seems you have a question. Let me know what you would like.";
        assert!(answer.chars().count() < 100);
        assert_eq!(gate.check(answer), Some(Rejection::GenericFiller));
    }

    #[test]
    fn test_generic_phrase_with_keyword_passes() {
        let gate = AnswerQualityGate::default();
        let answer = "It seems anh/chị hỏi về bảo hiểm xe máy, let me know loại xe nhé.";
        assert_eq!(gate.check(answer), None);
    }

    #[test]
    fn test_long_generic_answer_passes() {
        let gate = AnswerQualityGate::default();
        let answer = format!("Feel free to ask anything. {}", "More words follow here. ".repeat(5));
        assert!(answer.trim().chars().count() >= 100);
        assert_eq!(gate.check(&answer), None);
    }

    #[test]
    fn test_gate_is_idempotent() {
        let gate = AnswerQualityGate::default();
        assert_eq!(gate.check(REDIRECT_MESSAGE), None);

        let unhelpful = "I cannot help with that, sorry about this one friend.";
        for answer in ["", "ok", GOOD_ANSWER, unhelpful] {
            let once = gate.apply(answer);
            assert_eq!(gate.apply(&once), once);
        }
    }

    #[test]
    fn test_custom_redirect_text() {
        let gate = AnswerQualityGate::new(&QualityConfig::default(), "Please call us.");
        assert_eq!(gate.apply("no"), "Please call us.");
    }
}
