use async_trait::async_trait;

use crate::{BackendKind, BackendResult, RawOutput};

/// A prediction source that turns tweet text into raw class scores.
///
/// Implemented once per backend kind. Implementations are read-only after
/// construction and are shared across concurrent requests.
#[async_trait]
pub trait ScoreBackend: Send + Sync {
    async fn predict_raw(&self, text: &str) -> BackendResult<RawOutput>;

    fn kind(&self) -> BackendKind;
}
