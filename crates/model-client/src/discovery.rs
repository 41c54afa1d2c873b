use std::sync::Arc;
use tracing::{info, warn};

use crate::lexical::{LexicalModel, LEXICAL_MODEL_FILE};
use crate::transformer::TransformerClient;
use crate::BackendConfig;

/// Backends that came up at startup. Either may be missing.
#[derive(Clone, Default)]
pub struct LoadedBackends {
    pub transformer: Option<Arc<TransformerClient>>,
    pub lexical: Option<Arc<LexicalModel>>,
}

impl LoadedBackends {
    pub fn is_empty(&self) -> bool {
        self.transformer.is_none() && self.lexical.is_none()
    }
}

/// Probe the transformer service and load the lexical baseline from disk.
///
/// Failures are logged and leave the corresponding slot empty; callers decide
/// whether an empty result is fatal.
pub async fn discover_backends(config: &BackendConfig) -> LoadedBackends {
    let transformer = match &config.transformer_url {
        Some(url) => probe_transformer(url, config).await,
        None => {
            info!("No transformer service configured, skipping");
            None
        }
    };

    let path = config.models_dir.join(LEXICAL_MODEL_FILE);
    let lexical = match LexicalModel::load(&path).await {
        Ok(model) => {
            info!(
                "Loaded lexical baseline from {} ({} terms)",
                path.display(),
                model.vocabulary_size()
            );
            Some(Arc::new(model))
        }
        Err(e) => {
            warn!("Lexical baseline unavailable at {}: {}", path.display(), e);
            None
        }
    };

    LoadedBackends {
        transformer,
        lexical,
    }
}

async fn probe_transformer(url: &str, config: &BackendConfig) -> Option<Arc<TransformerClient>> {
    let client = match TransformerClient::new(url, config.transformer_timeout) {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build transformer client: {}", e);
            return None;
        }
    };

    match client.health().await {
        Ok(true) => {
            info!("Transformer service healthy at {}", client.base_url());
            Some(Arc::new(client))
        }
        Ok(false) => {
            warn!("Transformer service at {} reported unhealthy", client.base_url());
            None
        }
        Err(e) => {
            warn!("Transformer service at {} unreachable: {}", client.base_url(), e);
            None
        }
    }
}
