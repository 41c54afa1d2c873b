use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, warn};

use calibration_engine::CalibrationEngine;
use toxicity_core::{AnalysisResult, BackendKind, RawOutput, ScoreBackend};

use crate::chain::BackendChain;
use crate::error::{AnalyzerError, AnalyzerResult};

/// Shared analyzer. Backends are read-only after startup, so one instance
/// serves every request without locking.
pub struct TweetAnalyzer {
    chain: BackendChain,
    engine: CalibrationEngine,
    fallbacks: AtomicU64,
}

impl TweetAnalyzer {
    pub fn new(chain: BackendChain, engine: CalibrationEngine) -> Self {
        Self {
            chain,
            engine,
            fallbacks: AtomicU64::new(0),
        }
    }

    pub fn engine(&self) -> &CalibrationEngine {
        &self.engine
    }

    /// Kind of the backend tried first
    pub fn active_backend(&self) -> BackendKind {
        self.chain.primary().kind()
    }

    pub fn transformer_loaded(&self) -> bool {
        self.chain.contains(BackendKind::Transformer)
    }

    /// Number of times the primary backend failed and the fallback was tried.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub async fn analyze(&self, text: &str) -> AnalyzerResult<AnalysisResult> {
        if text.trim().is_empty() {
            return Err(AnalyzerError::EmptyInput);
        }

        let (raw, kind) = self.predict(text).await?;
        Ok(self.engine.calibrate(text, raw, kind))
    }

    async fn predict(&self, text: &str) -> AnalyzerResult<(RawOutput, BackendKind)> {
        let primary = self.chain.primary();
        let primary_err = match primary.predict_raw(text).await {
            Ok(raw) => return Ok((raw, primary.kind())),
            Err(e) => e,
        };

        let Some(fallback) = self.chain.fallback() else {
            error!("{} backend failed: {}", primary.kind(), primary_err);
            return Err(match primary.kind() {
                BackendKind::Transformer => AnalyzerError::NoModelAvailable(format!(
                    "transformer failed ({}) and no lexical baseline is loaded",
                    primary_err
                )),
                BackendKind::Lexical => AnalyzerError::Inference(primary_err),
            });
        };

        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        warn!(
            "{} backend failed, falling back to {}: {}",
            primary.kind(),
            fallback.kind(),
            primary_err
        );

        match fallback.predict_raw(text).await {
            Ok(raw) => Ok((raw, fallback.kind())),
            Err(e) => {
                error!("{} fallback also failed: {}", fallback.kind(), e);
                Err(AnalyzerError::NoModelAvailable(format!(
                    "{} failed ({}), {} failed ({})",
                    primary.kind(),
                    primary_err,
                    fallback.kind(),
                    e
                )))
            }
        }
    }
}
