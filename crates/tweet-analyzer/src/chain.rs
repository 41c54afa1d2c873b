use std::sync::Arc;
use toxicity_core::{BackendKind, ScoreBackend};

use model_client::LoadedBackends;

use crate::error::{AnalyzerError, AnalyzerResult};

/// Ordered backends: a primary, and at most one fallback tried once.
#[derive(Clone)]
pub struct BackendChain {
    primary: Arc<dyn ScoreBackend>,
    fallback: Option<Arc<dyn ScoreBackend>>,
}

impl BackendChain {
    pub fn new(primary: Arc<dyn ScoreBackend>, fallback: Option<Arc<dyn ScoreBackend>>) -> Self {
        Self { primary, fallback }
    }

    pub fn single(backend: Arc<dyn ScoreBackend>) -> Self {
        Self::new(backend, None)
    }

    /// Transformer first with the lexical baseline behind it, or whichever one loaded.
    pub fn from_loaded(backends: LoadedBackends) -> AnalyzerResult<Self> {
        let transformer = backends
            .transformer
            .map(|t| t as Arc<dyn ScoreBackend>);
        let lexical = backends.lexical.map(|l| l as Arc<dyn ScoreBackend>);

        match (transformer, lexical) {
            (Some(primary), fallback) => Ok(Self::new(primary, fallback)),
            (None, Some(lexical)) => Ok(Self::single(lexical)),
            (None, None) => Err(AnalyzerError::BackendUnavailable(
                "neither the transformer service nor the lexical baseline loaded".to_string(),
            )),
        }
    }

    pub fn primary(&self) -> &Arc<dyn ScoreBackend> {
        &self.primary
    }

    pub fn fallback(&self) -> Option<&Arc<dyn ScoreBackend>> {
        self.fallback.as_ref()
    }

    pub fn contains(&self, kind: BackendKind) -> bool {
        self.primary.kind() == kind || self.fallback.as_ref().is_some_and(|f| f.kind() == kind)
    }
}
