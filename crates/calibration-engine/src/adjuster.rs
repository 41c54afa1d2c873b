//! Score Adjustment
//!
//! Applies, in order: temperature scaling (logit backends only), the sarcasm
//! override, and the neutral-bias correction. At most one of the two
//! corrections fires per call. Every pass that moves mass renormalises.

use serde::Serialize;
use toxicity_core::{RawOutput, ScoreTriple};

use crate::policy::{BackendProfile, NeutralBiasPolicy, SarcasmPolicy};

/// Which correction, if any, changed the scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    None,
    SarcasmOverride,
    NeutralBias,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjusted {
    pub scores: ScoreTriple,
    pub correction: Correction,
}

#[derive(Debug, Clone)]
pub struct ScoreAdjuster {
    sarcasm: SarcasmPolicy,
    neutral_bias: NeutralBiasPolicy,
}

impl Default for ScoreAdjuster {
    fn default() -> Self {
        Self::new(SarcasmPolicy::default(), NeutralBiasPolicy::default())
    }
}

impl ScoreAdjuster {
    pub fn new(sarcasm: SarcasmPolicy, neutral_bias: NeutralBiasPolicy) -> Self {
        Self {
            sarcasm,
            neutral_bias,
        }
    }

    pub fn adjust(&self, raw: RawOutput, sarcasm: bool, profile: &BackendProfile) -> Adjusted {
        let scores = match raw {
            RawOutput::Logits(logits) => ScoreTriple::from_logits(logits, profile.temperature),
            RawOutput::Probabilities(probs) => probs,
        };

        if sarcasm && scores.positive > profile.sarcasm_trigger {
            return Adjusted {
                scores: self.sarcasm_override(scores, profile),
                correction: Correction::SarcasmOverride,
            };
        }

        if self.neutral_bias_applies(&scores) {
            return Adjusted {
                scores: self.neutral_bias_correction(scores),
                correction: Correction::NeutralBias,
            };
        }

        Adjusted {
            scores,
            correction: Correction::None,
        }
    }

    /// Move up to `max_transfer` of positive mass into negative (and a little into neutral).
    fn sarcasm_override(&self, scores: ScoreTriple, profile: &BackendProfile) -> ScoreTriple {
        let reduction = self
            .sarcasm
            .max_transfer
            .min(scores.positive - profile.sarcasm_floor);
        let negative_share = self.sarcasm.negative_share;

        ScoreTriple::new(
            scores.negative + reduction * negative_share,
            scores.neutral + reduction * (1.0 - negative_share),
            (scores.positive - reduction).max(0.0),
        )
        .renormalized()
    }

    fn neutral_bias_applies(&self, scores: &ScoreTriple) -> bool {
        let policy = &self.neutral_bias;
        policy.enabled
            && scores.neutral > policy.neutral_lower
            && scores.neutral < policy.neutral_upper
            && scores.max_non_neutral() > policy.min_non_neutral
    }

    /// Shrink neutral and hand the mass to the leading non-neutral class.
    fn neutral_bias_correction(&self, scores: ScoreTriple) -> ScoreTriple {
        let policy = &self.neutral_bias;
        let reduction = if scores.neutral > policy.high_neutral_cutoff {
            policy.high_neutral_reduction
        } else {
            policy.reduction
        };
        let lead = reduction * policy.leading_share;
        let trail = reduction * (1.0 - policy.leading_share);

        // Ties favour positive, matching the strict `negative > positive` check.
        let (negative_gain, positive_gain) = if scores.negative > scores.positive {
            (lead, trail)
        } else {
            (trail, lead)
        };

        ScoreTriple::new(
            scores.negative + negative_gain,
            (scores.neutral - reduction).max(0.0),
            scores.positive + positive_gain,
        )
        .renormalized()
    }
}
