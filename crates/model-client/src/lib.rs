pub mod discovery;
pub mod lexical;
pub mod transformer;

pub use discovery::{discover_backends, LoadedBackends};
pub use lexical::{LexicalModel, MultiClass, LEXICAL_MODEL_FILE};
pub use transformer::TransformerClient;

use std::path::PathBuf;
use std::time::Duration;

/// Where to find the two backends.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the transformer inference service. `None` skips the transformer.
    pub transformer_url: Option<String>,
    pub transformer_timeout: Duration,
    /// Directory holding the persisted lexical model.
    pub models_dir: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            transformer_url: None,
            transformer_timeout: Duration::from_secs(10),
            models_dir: PathBuf::from("./models"),
        }
    }
}
