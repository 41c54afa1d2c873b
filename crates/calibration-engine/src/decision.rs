//! Final label selection over calibrated scores.

use serde::Serialize;
use toxicity_core::{ScoreTriple, SentimentLabel};

use crate::policy::DecisionPolicy;

/// Which rule produced the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPath {
    Sarcasm,
    NearTie,
    Argmax,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub label: SentimentLabel,
    pub confidence: f64,
    pub path: DecisionPath,
}

#[derive(Debug, Clone, Default)]
pub struct DecisionRule {
    policy: DecisionPolicy,
}

impl DecisionRule {
    pub fn new(policy: DecisionPolicy) -> Self {
        Self { policy }
    }

    /// First matching rule wins: sarcasm, then neutral near-tie, then argmax.
    pub fn decide(&self, scores: &ScoreTriple, sarcasm: bool) -> Decision {
        let p = &self.policy;

        if sarcasm && scores.positive > p.sarcasm_positive_trigger {
            let confidence = if scores.negative > p.sarcasm_negative_floor {
                scores.negative
            } else {
                scores.negative.max(p.sarcasm_min_confidence)
            };
            return Decision {
                label: SentimentLabel::Negative,
                confidence,
                path: DecisionPath::Sarcasm,
            };
        }

        if self.is_near_tie(scores) {
            let negative_leaning = scores.negative > scores.positive
                || (scores.negative > p.negative_lean_min
                    && scores.positive < p.negative_lean_positive_ceiling);
            let label = if negative_leaning {
                SentimentLabel::Negative
            } else {
                SentimentLabel::Positive
            };
            return Decision {
                label,
                confidence: scores.get(label),
                path: DecisionPath::NearTie,
            };
        }

        let label = scores.argmax();
        Decision {
            label,
            confidence: scores.get(label),
            path: DecisionPath::Argmax,
        }
    }

    /// Neutral leads, but only barely, and a non-neutral class is a real contender.
    fn is_near_tie(&self, scores: &ScoreTriple) -> bool {
        let p = &self.policy;
        let runner_up = scores.max_non_neutral();

        p.near_tie_enabled
            && scores.neutral == scores.max_value()
            && scores.neutral < p.near_tie_neutral_ceiling
            && runner_up > p.near_tie_min_non_neutral
            && (scores.neutral - runner_up).abs() < p.near_tie_margin
    }
}
