//! TF-IDF + logistic regression baseline.
//!
//! The model is exported once from training as JSON and evaluated natively.
//! Tokenisation follows the training vectoriser: lowercase, runs of two or
//! more word characters, word n-grams joined by a single space.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use toxicity_core::{
    BackendError, BackendKind, BackendResult, RawOutput, ScoreBackend, ScoreTriple, SentimentLabel,
};

/// File name of the persisted baseline inside the models directory.
pub const LEXICAL_MODEL_FILE: &str = "baseline_tfidf_logreg.json";

/// How per-class scores become probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    /// Softmax over class scores.
    #[default]
    Multinomial,
    /// Independent sigmoids, normalised to sum to one.
    Ovr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Norm {
    L2,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelFile {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
    classes: Vec<i64>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    #[serde(default)]
    multi_class: MultiClass,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

#[derive(Debug, Clone)]
pub struct LexicalModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    l2_norm: bool,
    labels: Vec<SentimentLabel>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    multi_class: MultiClass,
}

impl LexicalModel {
    pub fn from_json(json: &str) -> BackendResult<Self> {
        let file: ModelFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    pub async fn load(path: &Path) -> BackendResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    fn from_file(file: ModelFile) -> BackendResult<Self> {
        let n_features = file.idf.len();
        let n_classes = file.classes.len();

        if n_classes == 0 {
            return Err(BackendError::InvalidModel("no classes".to_string()));
        }
        if let Some((term, idx)) = file.vocabulary.iter().find(|(_, idx)| **idx >= n_features) {
            return Err(BackendError::InvalidModel(format!(
                "term '{term}' maps to feature {idx}, but idf has {n_features} entries"
            )));
        }
        if file.coef.len() != n_classes || file.intercept.len() != n_classes {
            return Err(BackendError::InvalidModel(format!(
                "expected {n_classes} coefficient rows and intercepts, got {} and {}",
                file.coef.len(),
                file.intercept.len()
            )));
        }
        if let Some(row) = file.coef.iter().find(|row| row.len() != n_features) {
            return Err(BackendError::InvalidModel(format!(
                "coefficient row has {} weights, expected {n_features}",
                row.len()
            )));
        }
        let (min_n, max_n) = file.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(BackendError::InvalidModel(format!(
                "invalid ngram range ({min_n}, {max_n})"
            )));
        }

        let labels = file
            .classes
            .iter()
            .map(|&id| {
                SentimentLabel::from_class_id(id)
                    .ok_or_else(|| BackendError::InvalidModel(format!("unknown class id {id}")))
            })
            .collect::<BackendResult<Vec<_>>>()?;
        if let Some(dup) = labels
            .iter()
            .enumerate()
            .find_map(|(i, label)| labels[..i].contains(label).then_some(label))
        {
            return Err(BackendError::InvalidModel(format!(
                "class {dup} appears more than once"
            )));
        }

        Ok(Self {
            vocabulary: file.vocabulary,
            idf: file.idf,
            ngram_range: file.ngram_range,
            sublinear_tf: file.sublinear_tf,
            l2_norm: file.norm.is_some(),
            labels,
            coef: file.coef,
            intercept: file.intercept,
            multi_class: file.multi_class,
        })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Class probabilities in [negative, neutral, positive] order.
    /// Classes the model was not trained on read as 0.
    pub fn predict_proba(&self, text: &str) -> ScoreTriple {
        let features = self.features(text);

        let scores: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, bias)| bias + features.iter().map(|(idx, x)| row[*idx] * x).sum::<f64>())
            .collect();

        let probs = match self.multi_class {
            MultiClass::Multinomial => softmax(&scores),
            MultiClass::Ovr => normalized_sigmoids(&scores),
        };

        let mut triple = [0.0; 3];
        for (label, p) in self.labels.iter().zip(probs) {
            let slot = match label {
                SentimentLabel::Negative => 0,
                SentimentLabel::Neutral => 1,
                SentimentLabel::Positive => 2,
            };
            triple[slot] = p;
        }
        ScoreTriple::from_array(triple)
    }

    /// Sparse TF-IDF vector as (feature index, weight).
    fn features(&self, text: &str) -> Vec<(usize, f64)> {
        let tokens = tokenize(text);
        let (min_n, max_n) = self.ngram_range;

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for n in min_n..=max_n {
            for gram in tokens.windows(n) {
                if let Some(&idx) = self.vocabulary.get(&gram.join(" ")) {
                    *counts.entry(idx).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut features: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (idx, tf * self.idf[idx])
            })
            .collect();

        if self.l2_norm {
            let norm = features.iter().map(|(_, x)| x * x).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, x) in features.iter_mut() {
                    *x /= norm;
                }
            }
        }
        features
    }
}

/// Lowercased runs of two or more word characters.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn normalized_sigmoids(scores: &[f64]) -> Vec<f64> {
    let sigmoids: Vec<f64> = scores.iter().map(|s| 1.0 / (1.0 + (-s).exp())).collect();
    let total: f64 = sigmoids.iter().sum();
    if total > 0.0 {
        sigmoids.into_iter().map(|s| s / total).collect()
    } else {
        sigmoids
    }
}

#[async_trait]
impl ScoreBackend for LexicalModel {
    async fn predict_raw(&self, text: &str) -> BackendResult<RawOutput> {
        Ok(RawOutput::Probabilities(self.predict_proba(text)))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Lexical
    }
}
