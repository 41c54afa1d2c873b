use serde::{Deserialize, Serialize};
use std::fmt;

/// Reported class of a tweet. `Negative` doubles as the toxic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    /// Fixed class order. Argmax ties resolve to the earliest entry.
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Positive => "positive",
        }
    }

    /// Map a lexical classifier class id (-1, 0, 1) to a label.
    pub fn from_class_id(id: i64) -> Option<Self> {
        match id {
            -1 => Some(SentimentLabel::Negative),
            0 => Some(SentimentLabel::Neutral),
            1 => Some(SentimentLabel::Positive),
            _ => None,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability triple over {negative, neutral, positive}.
///
/// Used both for raw backend output and for calibrated scores. Values are
/// never mutated in place by the calibration passes; each pass builds a new triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoreTriple {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl ScoreTriple {
    pub const fn new(negative: f64, neutral: f64, positive: f64) -> Self {
        Self {
            negative,
            neutral,
            positive,
        }
    }

    /// Build from an array laid out as [negative, neutral, positive].
    pub fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.negative, self.neutral, self.positive]
    }

    /// Softmax over `logits / temperature`.
    pub fn from_logits(logits: [f64; 3], temperature: f64) -> Self {
        let scaled = logits.map(|l| l / temperature);
        let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps = scaled.map(|l| (l - max).exp());
        let total: f64 = exps.iter().sum();
        Self::from_array(exps.map(|e| e / total))
    }

    pub fn get(&self, label: SentimentLabel) -> f64 {
        match label {
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Positive => self.positive,
        }
    }

    pub fn sum(&self) -> f64 {
        self.negative + self.neutral + self.positive
    }

    pub fn max_value(&self) -> f64 {
        self.negative.max(self.neutral).max(self.positive)
    }

    /// Larger of the two non-neutral scores.
    pub fn max_non_neutral(&self) -> f64 {
        self.negative.max(self.positive)
    }

    /// Highest-scoring label; ties go to the first label in `SentimentLabel::ALL`.
    pub fn argmax(&self) -> SentimentLabel {
        let mut best = SentimentLabel::Negative;
        for label in SentimentLabel::ALL {
            if self.get(label) > self.get(best) {
                best = label;
            }
        }
        best
    }

    /// Scale so the coordinates sum to 1. A zero total is returned untouched.
    pub fn renormalized(&self) -> Self {
        let total = self.sum();
        if total > 0.0 {
            Self::new(
                self.negative / total,
                self.neutral / total,
                self.positive / total,
            )
        } else {
            *self
        }
    }

    /// Every coordinate in [0, 1] and the total within `tolerance` of 1.
    pub fn is_distribution(&self, tolerance: f64) -> bool {
        let in_range = self
            .to_array()
            .iter()
            .all(|v| (-tolerance..=1.0 + tolerance).contains(v));
        in_range && (self.sum() - 1.0).abs() <= tolerance
    }
}

/// Which of the two interchangeable prediction sources produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Transformer,
    Lexical,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Transformer => "transformer",
            BackendKind::Lexical => "lexical",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a backend hands back for one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawOutput {
    /// Pre-softmax logits, [negative, neutral, positive]. Temperature applies.
    Logits([f64; 3]),
    /// Already-normalised class probabilities. Temperature does not apply.
    Probabilities(ScoreTriple),
}

/// Final decision for one tweet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalysisResult {
    pub label: SentimentLabel,
    pub scores: ScoreTriple,
    /// 0.0 to 1.0
    pub confidence: f64,
}

impl AnalysisResult {
    pub fn message(&self) -> String {
        format!(
            "Tweet sentiment is {} with confidence {:.2}%.",
            self.label,
            self.confidence * 100.0
        )
    }

    pub fn is_toxic(&self) -> bool {
        self.label == SentimentLabel::Negative
    }
}
