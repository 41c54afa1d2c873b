//! Calibration Engine
//!
//! Composes sarcasm detection, score adjustment and the decision rule into a
//! single pure function of (text, backend output). Holds no state between calls,
//! so one instance can be shared freely across threads.

use serde::Serialize;
use toxicity_core::{AnalysisResult, BackendKind, RawOutput, ScoreTriple};

use crate::adjuster::{Adjusted, Correction, ScoreAdjuster};
use crate::decision::{Decision, DecisionPath, DecisionRule};
use crate::policy::CalibrationPolicy;
use crate::sarcasm::SarcasmDetector;

/// Full trace of one calibration, for logging and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calibration {
    pub sarcasm: bool,
    pub correction: Correction,
    pub path: DecisionPath,
    pub result: AnalysisResult,
}

#[derive(Debug, Clone)]
pub struct CalibrationEngine {
    policy: CalibrationPolicy,
    detector: SarcasmDetector,
    adjuster: ScoreAdjuster,
    rule: DecisionRule,
}

impl Default for CalibrationEngine {
    fn default() -> Self {
        Self::new(CalibrationPolicy::default())
    }
}

impl CalibrationEngine {
    pub fn new(policy: CalibrationPolicy) -> Self {
        Self {
            detector: SarcasmDetector::from_policy(&policy.sarcasm),
            adjuster: ScoreAdjuster::new(policy.sarcasm.clone(), policy.neutral_bias),
            rule: DecisionRule::new(policy.decision),
            policy,
        }
    }

    pub fn policy(&self) -> &CalibrationPolicy {
        &self.policy
    }

    pub fn detect_sarcasm(&self, text: &str) -> bool {
        self.detector.detect(text)
    }

    pub fn adjust(&self, raw: RawOutput, sarcasm: bool, kind: BackendKind) -> Adjusted {
        self.adjuster.adjust(raw, sarcasm, self.policy.profile(kind))
    }

    pub fn decide(&self, scores: &ScoreTriple, sarcasm: bool) -> Decision {
        self.rule.decide(scores, sarcasm)
    }

    /// Detect, adjust, decide. Each step runs exactly once.
    pub fn evaluate(&self, text: &str, raw: RawOutput, kind: BackendKind) -> Calibration {
        let sarcasm = self.detect_sarcasm(text);
        let adjusted = self.adjust(raw, sarcasm, kind);
        let decision = self.decide(&adjusted.scores, sarcasm);

        tracing::debug!(
            backend = %kind,
            sarcasm,
            correction = ?adjusted.correction,
            path = ?decision.path,
            label = %decision.label,
            confidence = decision.confidence,
            "Calibrated prediction"
        );

        Calibration {
            sarcasm,
            correction: adjusted.correction,
            path: decision.path,
            result: AnalysisResult {
                label: decision.label,
                scores: adjusted.scores,
                confidence: decision.confidence,
            },
        }
    }

    pub fn calibrate(&self, text: &str, raw: RawOutput, kind: BackendKind) -> AnalysisResult {
        self.evaluate(text, raw, kind).result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toxicity_core::SentimentLabel;

    const SARCASTIC: &str = "Oh wonderful, another day of dealing with this nonsense. Just perfect...";

    fn probs(negative: f64, neutral: f64, positive: f64) -> RawOutput {
        RawOutput::Probabilities(ScoreTriple::new(negative, neutral, positive))
    }

    #[test]
    fn test_clear_insult_is_negative() {
        let engine = CalibrationEngine::default();
        let result = engine.calibrate(
            "You're such an idiot!",
            probs(0.7, 0.2, 0.1),
            BackendKind::Lexical,
        );

        assert_eq!(result.label, SentimentLabel::Negative);
        assert!((result.confidence - 0.7).abs() < 1e-9);
        assert_eq!(result.scores, ScoreTriple::new(0.7, 0.2, 0.1));
    }

    #[test]
    fn test_sarcastic_positive_becomes_negative() {
        let engine = CalibrationEngine::default();
        let calibration = engine.evaluate(SARCASTIC, probs(0.15, 0.25, 0.6), BackendKind::Lexical);

        assert!(calibration.sarcasm);
        assert_eq!(calibration.correction, Correction::SarcasmOverride);
        assert_eq!(calibration.path, DecisionPath::Sarcasm);
        assert_eq!(calibration.result.label, SentimentLabel::Negative);
        // negative lands at 0.27, under the 0.3 floor, so confidence is lifted to 0.4
        assert!((calibration.result.scores.negative - 0.27).abs() < 1e-9);
        assert!((calibration.result.confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_sarcastic_transformer_logits_become_negative() {
        let engine = CalibrationEngine::default();
        // after temperature 0.7 these soften to exactly (0.2, 0.1, 0.7)
        let logits = [0.7 * 2f64.ln(), 0.0, 0.7 * 7f64.ln()];
        let tempered = ScoreTriple::from_logits(logits, 0.7);
        assert!((tempered.positive - 0.7).abs() < 1e-9);

        let calibration = engine.evaluate(SARCASTIC, RawOutput::Logits(logits), BackendKind::Transformer);

        assert!(calibration.sarcasm);
        assert_eq!(calibration.correction, Correction::SarcasmOverride);
        assert_eq!(calibration.path, DecisionPath::Sarcasm);
        assert_eq!(calibration.result.label, SentimentLabel::Negative);
        // reduction = min(0.15, 0.7 - 0.3); negative gains 0.12, neutral 0.03
        let scores = calibration.result.scores;
        assert!((scores.negative - 0.32).abs() < 1e-9);
        assert!((scores.neutral - 0.13).abs() < 1e-9);
        assert!((scores.positive - 0.55).abs() < 1e-9);
        // negative clears the 0.3 floor, so it is reported as-is
        assert!((calibration.result.confidence - 0.32).abs() < 1e-9);
    }

    #[test]
    fn test_sarcasm_below_transformer_trigger_is_not_overridden() {
        let engine = CalibrationEngine::default();
        // tempered to (0.35, 0.2, 0.45): positive under the 0.5 transformer trigger
        let logits = [0.7 * 0.35f64.ln(), 0.7 * 0.2f64.ln(), 0.7 * 0.45f64.ln()];
        let calibration = engine.evaluate(SARCASTIC, RawOutput::Logits(logits), BackendKind::Transformer);

        assert!(calibration.sarcasm);
        assert_eq!(calibration.correction, Correction::None);
        // the decision rule still fires on its own 0.4 trigger
        assert_eq!(calibration.path, DecisionPath::Sarcasm);
        assert!((calibration.result.scores.positive - 0.45).abs() < 1e-9);
        assert!((calibration.result.confidence - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_transformer_logits_are_tempered_and_debiased() {
        let engine = CalibrationEngine::default();
        let calibration = engine.evaluate(
            "not sure how I feel about this",
            RawOutput::Logits([0.2, 0.9, 0.6]),
            BackendKind::Transformer,
        );

        assert!(!calibration.sarcasm);
        assert_eq!(calibration.correction, Correction::NeutralBias);
        assert_eq!(calibration.result.label, SentimentLabel::Positive);
        assert!(calibration.result.scores.is_distribution(1e-6));
    }

    #[test]
    fn test_passthrough_policy_keeps_neutral() {
        let engine = CalibrationEngine::new(CalibrationPolicy::passthrough());
        let calibration = engine.evaluate(
            "not sure how I feel about this",
            RawOutput::Logits([0.2, 0.9, 0.6]),
            BackendKind::Transformer,
        );

        assert_eq!(calibration.correction, Correction::None);
        assert_eq!(calibration.path, DecisionPath::Argmax);
        assert_eq!(calibration.result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_confidence_matches_label_score_outside_sarcasm() {
        let engine = CalibrationEngine::default();
        let result = engine.calibrate("meh", probs(0.2, 0.45, 0.35), BackendKind::Lexical);

        assert_eq!(result.label, SentimentLabel::Positive);
        assert_eq!(result.confidence, result.scores.get(result.label));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let engine = CalibrationEngine::default();
        let first = engine.evaluate(SARCASTIC, probs(0.15, 0.25, 0.6), BackendKind::Transformer);
        let second = engine.evaluate(SARCASTIC, probs(0.15, 0.25, 0.6), BackendKind::Transformer);
        assert_eq!(first, second);
    }
}
