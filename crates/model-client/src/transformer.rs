use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use toxicity_core::{BackendError, BackendKind, BackendResult, RawOutput, ScoreBackend, ScoreTriple};

/// Maximum token length the fine-tuned checkpoint was trained with.
const MAX_LENGTH: usize = 128;

const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize)]
struct LogitsRequest<'a> {
    text: &'a str,
    max_length: usize,
}

/// Checkpoint output, class order [negative, neutral, positive].
#[derive(Debug, Clone, Deserialize)]
struct LogitsResponse {
    #[serde(default)]
    logits: Option<Vec<f64>>,
    #[serde(default)]
    probabilities: Option<Vec<f64>>,
}

impl LogitsResponse {
    fn into_raw(self) -> BackendResult<RawOutput> {
        if let Some(logits) = self.logits {
            return Ok(RawOutput::Logits(three(&logits, "logits")?));
        }
        if let Some(probs) = self.probabilities {
            let scores = ScoreTriple::from_array(three(&probs, "probabilities")?);
            if !scores.is_distribution(PROBABILITY_TOLERANCE) {
                return Err(BackendError::InvalidResponse(format!(
                    "probabilities must lie in [0, 1] and sum to 1, got {probs:?}"
                )));
            }
            return Ok(RawOutput::Probabilities(scores));
        }
        Err(BackendError::InvalidResponse(
            "response has neither logits nor probabilities".to_string(),
        ))
    }
}

fn three(values: &[f64], field: &str) -> BackendResult<[f64; 3]> {
    match values {
        [negative, neutral, positive] if values.iter().all(|v| v.is_finite()) => {
            Ok([*negative, *neutral, *positive])
        }
        _ => Err(BackendError::InvalidResponse(format!(
            "expected 3 finite {field}, got {values:?}"
        ))),
    }
}

/// Client for the service hosting the fine-tuned transformer checkpoint.
#[derive(Clone)]
pub struct TransformerClient {
    client: reqwest::Client,
    base_url: String,
}

impl TransformerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw checkpoint output for one text
    pub async fn predict(&self, text: &str) -> BackendResult<RawOutput> {
        let request = LogitsRequest {
            text,
            max_length: MAX_LENGTH,
        };

        let response = self
            .client
            .post(format!("{}/logits", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body = response.json::<LogitsResponse>().await?;
        body.into_raw()
    }

    /// Check service health
    pub async fn health(&self) -> BackendResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl ScoreBackend for TransformerClient {
    async fn predict_raw(&self, text: &str) -> BackendResult<RawOutput> {
        self.predict(text).await
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Transformer
    }
}
