//! Lexical sarcasm cues.
//!
//! A positive word only counts as sarcastic when one of its context phrases
//! also shows up. Plain substring matching on the lowercased text, no learned
//! parameters.

use crate::policy::{SarcasmCue, SarcasmPolicy};

#[derive(Debug, Clone)]
pub struct SarcasmDetector {
    enabled: bool,
    cues: Vec<SarcasmCue>,
}

impl Default for SarcasmDetector {
    fn default() -> Self {
        Self::from_policy(&SarcasmPolicy::default())
    }
}

impl SarcasmDetector {
    pub fn from_policy(policy: &SarcasmPolicy) -> Self {
        Self {
            enabled: policy.enabled,
            cues: policy
                .cues
                .iter()
                .map(|cue| SarcasmCue {
                    positive_word: cue.positive_word.to_lowercase(),
                    context_phrases: cue
                        .context_phrases
                        .iter()
                        .map(|p| p.to_lowercase())
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn detect(&self, text: &str) -> bool {
        self.matching_cue(text).is_some()
    }

    /// First cue, in table order, whose word and one of whose phrases both occur.
    pub fn matching_cue(&self, text: &str) -> Option<&SarcasmCue> {
        if !self.enabled {
            return None;
        }
        let text_lower = text.to_lowercase();
        self.cues.iter().find(|cue| {
            text_lower.contains(cue.positive_word.as_str())
                && cue
                    .context_phrases
                    .iter()
                    .any(|phrase| text_lower.contains(phrase.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_sarcastic_sample() {
        let detector = SarcasmDetector::default();
        assert!(detector.detect(
            "Oh wonderful, another day of dealing with this nonsense. Just perfect..."
        ));
    }

    #[test]
    fn test_ignores_sincere_positive() {
        let detector = SarcasmDetector::default();
        assert!(!detector.detect("This made my day! Best news ever!"));
        assert!(!detector.detect("What a great game last night"));
    }

    #[test]
    fn test_first_matching_cue_wins() {
        let detector = SarcasmDetector::default();
        let cue = detector
            .matching_cue("Oh wonderful, another day of dealing with this nonsense. Just perfect...")
            .unwrap();
        assert_eq!(cue.positive_word, "wonderful");

        let cue = detector.matching_cue("Just PERFECT.").unwrap();
        assert_eq!(cue.positive_word, "perfect");
    }

    #[test]
    fn test_word_without_context_is_not_sarcasm() {
        let detector = SarcasmDetector::default();
        assert!(!detector.detect("Amazing sunset tonight"));
        assert!(detector.detect("Amazing, another day stuck in traffic"));
    }

    #[test]
    fn test_matching_is_substring_based() {
        // "greatly" contains "great", "dealings" contains "dealing"
        let detector = SarcasmDetector::default();
        assert!(detector.detect("Greatly appreciate your dealings"));
    }

    #[test]
    fn test_disabled_policy_never_fires() {
        let policy = SarcasmPolicy {
            enabled: false,
            ..SarcasmPolicy::default()
        };
        let detector = SarcasmDetector::from_policy(&policy);
        assert!(!detector.detect("Oh wonderful, another day of this nonsense"));
    }
}
