//! Calibration Policy
//!
//! Every threshold and multiplier used by the sarcasm override, the
//! neutral-bias correction and the decision rule. The defaults are the
//! empirically tuned values the deployed models were fitted against.

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use toxicity_core::BackendKind;

/// A positive word and the context phrases that turn it sarcastic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarcasmCue {
    pub positive_word: String,
    pub context_phrases: Vec<String>,
}

impl SarcasmCue {
    pub fn new(positive_word: &str, context_phrases: &[&str]) -> Self {
        Self {
            positive_word: positive_word.to_string(),
            context_phrases: context_phrases.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Per-backend parameters for temperature and the sarcasm override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackendProfile {
    /// Divides logits before softmax. Ignored for backends that return probabilities.
    pub temperature: f64,
    /// Sarcasm override fires only when positive exceeds this.
    pub sarcasm_trigger: f64,
    /// Positive is never pulled below this by the override.
    pub sarcasm_floor: f64,
}

impl BackendProfile {
    pub fn transformer() -> Self {
        Self {
            temperature: 0.7,
            sarcasm_trigger: 0.5,
            sarcasm_floor: 0.3,
        }
    }

    pub fn lexical() -> Self {
        Self {
            temperature: 1.0,
            sarcasm_trigger: 0.4,
            sarcasm_floor: 0.25,
        }
    }
}

/// Partial profile as written in a policy file; unset fields keep the backend's defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileOverride {
    temperature: Option<f64>,
    sarcasm_trigger: Option<f64>,
    sarcasm_floor: Option<f64>,
}

impl ProfileOverride {
    fn apply(self, base: BackendProfile) -> BackendProfile {
        BackendProfile {
            temperature: self.temperature.unwrap_or(base.temperature),
            sarcasm_trigger: self.sarcasm_trigger.unwrap_or(base.sarcasm_trigger),
            sarcasm_floor: self.sarcasm_floor.unwrap_or(base.sarcasm_floor),
        }
    }
}

fn transformer_profile<'de, D: Deserializer<'de>>(d: D) -> Result<BackendProfile, D::Error> {
    ProfileOverride::deserialize(d).map(|o| o.apply(BackendProfile::transformer()))
}

fn lexical_profile<'de, D: Deserializer<'de>>(d: D) -> Result<BackendProfile, D::Error> {
    ProfileOverride::deserialize(d).map(|o| o.apply(BackendProfile::lexical()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarcasmPolicy {
    pub enabled: bool,
    /// Checked in order; the first matching cue wins.
    pub cues: Vec<SarcasmCue>,
    /// Upper bound on probability mass moved out of positive.
    pub max_transfer: f64,
    /// Share of the moved mass that goes to negative; the rest goes to neutral.
    pub negative_share: f64,
}

impl Default for SarcasmPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            cues: vec![
                SarcasmCue::new(
                    "wonderful",
                    &["nonsense", "dealing", "another day", "perfect"],
                ),
                SarcasmCue::new("perfect", &["nonsense", "dealing", "another day", "just"]),
                SarcasmCue::new("great", &["nonsense", "dealing", "another day"]),
                SarcasmCue::new("amazing", &["nonsense", "dealing", "another day"]),
            ],
            max_transfer: 0.15,
            negative_share: 0.8,
        }
    }
}

/// Counterweight for the models' habit of over-predicting neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralBiasPolicy {
    pub enabled: bool,
    /// Correction applies while `lower < neutral < upper`.
    pub neutral_lower: f64,
    pub neutral_upper: f64,
    /// ...and the stronger non-neutral class exceeds this.
    pub min_non_neutral: f64,
    /// Above this neutral score the smaller reduction is used.
    pub high_neutral_cutoff: f64,
    pub high_neutral_reduction: f64,
    pub reduction: f64,
    /// Share of the removed neutral mass given to the leading non-neutral class.
    pub leading_share: f64,
}

impl Default for NeutralBiasPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            neutral_lower: 0.35,
            neutral_upper: 0.6,
            min_non_neutral: 0.25,
            high_neutral_cutoff: 0.5,
            high_neutral_reduction: 0.08,
            reduction: 0.12,
            leading_share: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Sarcastic text whose calibrated positive exceeds this is reported negative.
    pub sarcasm_positive_trigger: f64,
    /// Negative score above this is reported as-is for sarcastic text.
    pub sarcasm_negative_floor: f64,
    /// Otherwise confidence is raised to at least this.
    pub sarcasm_min_confidence: f64,
    pub near_tie_enabled: bool,
    pub near_tie_neutral_ceiling: f64,
    pub near_tie_min_non_neutral: f64,
    pub near_tie_margin: f64,
    /// Negative wins a near tie when it exceeds this while positive stays under the ceiling.
    pub negative_lean_min: f64,
    pub negative_lean_positive_ceiling: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            sarcasm_positive_trigger: 0.4,
            sarcasm_negative_floor: 0.3,
            sarcasm_min_confidence: 0.4,
            near_tie_enabled: true,
            near_tie_neutral_ceiling: 0.6,
            near_tie_min_non_neutral: 0.3,
            near_tie_margin: 0.15,
            negative_lean_min: 0.25,
            negative_lean_positive_ceiling: 0.4,
        }
    }
}

/// All heuristics in one swappable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationPolicy {
    pub sarcasm: SarcasmPolicy,
    #[serde(deserialize_with = "transformer_profile")]
    pub transformer: BackendProfile,
    #[serde(deserialize_with = "lexical_profile")]
    pub lexical: BackendProfile,
    pub neutral_bias: NeutralBiasPolicy,
    pub decision: DecisionPolicy,
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            sarcasm: SarcasmPolicy::default(),
            transformer: BackendProfile::transformer(),
            lexical: BackendProfile::lexical(),
            neutral_bias: NeutralBiasPolicy::default(),
            decision: DecisionPolicy::default(),
        }
    }
}

impl CalibrationPolicy {
    /// Policy with every heuristic switched off. Only temperature scaling remains and the label is the argmax.
    pub fn passthrough() -> Self {
        let mut policy = Self::default();
        policy.sarcasm.enabled = false;
        policy.neutral_bias.enabled = false;
        policy.decision.near_tie_enabled = false;
        policy
    }

    pub fn profile(&self, kind: BackendKind) -> &BackendProfile {
        match kind {
            BackendKind::Transformer => &self.transformer,
            BackendKind::Lexical => &self.lexical,
        }
    }

    /// Parse a JSON policy. Fields left out keep their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let policy: Self = serde_json::from_str(json).context("Invalid calibration policy")?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read calibration policy {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, profile) in [("transformer", &self.transformer), ("lexical", &self.lexical)] {
            if profile.temperature.is_nan() || profile.temperature <= 0.0 {
                anyhow::bail!("{name} temperature must be positive");
            }
            if profile.sarcasm_floor > profile.sarcasm_trigger {
                anyhow::bail!("{name} sarcasm floor must not exceed its trigger");
            }
        }

        let shares = [
            ("sarcasm.negative_share", self.sarcasm.negative_share),
            ("neutral_bias.leading_share", self.neutral_bias.leading_share),
        ];
        for (name, share) in shares {
            if !(0.0..=1.0).contains(&share) {
                anyhow::bail!("{name} must be within [0, 1]");
            }
        }

        if self.sarcasm.max_transfer < 0.0 {
            anyhow::bail!("sarcasm.max_transfer must not be negative");
        }
        if self.neutral_bias.neutral_lower >= self.neutral_bias.neutral_upper {
            anyhow::bail!("neutral_bias window is empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles() {
        let policy = CalibrationPolicy::default();
        assert_eq!(policy.profile(BackendKind::Transformer).temperature, 0.7);
        assert_eq!(policy.profile(BackendKind::Transformer).sarcasm_trigger, 0.5);
        assert_eq!(policy.profile(BackendKind::Lexical).sarcasm_trigger, 0.4);
        assert_eq!(policy.profile(BackendKind::Lexical).sarcasm_floor, 0.25);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let policy = CalibrationPolicy::from_json(
            r#"{ "neutral_bias": { "enabled": false }, "lexical": { "sarcasm_trigger": 0.45 } }"#,
        )
        .unwrap();

        assert!(!policy.neutral_bias.enabled);
        assert_eq!(policy.neutral_bias.reduction, 0.12);
        assert_eq!(policy.lexical.sarcasm_trigger, 0.45);
        assert_eq!(policy.lexical.sarcasm_floor, 0.25);
        assert_eq!(policy.transformer, BackendProfile::transformer());
        assert_eq!(policy.sarcasm.cues.len(), 4);
    }

    #[test]
    fn test_empty_json_is_default() {
        let policy = CalibrationPolicy::from_json("{}").unwrap();
        assert_eq!(policy, CalibrationPolicy::default());
    }

    #[test]
    fn test_rejects_non_positive_temperature() {
        let result = CalibrationPolicy::from_json(r#"{ "transformer": { "temperature": 0.0 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_share_out_of_range() {
        let result = CalibrationPolicy::from_json(r#"{ "sarcasm": { "negative_share": 1.5 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_passthrough_disables_heuristics() {
        let policy = CalibrationPolicy::passthrough();
        assert!(!policy.sarcasm.enabled);
        assert!(!policy.neutral_bias.enabled);
        assert!(!policy.decision.near_tie_enabled);
    }
}
