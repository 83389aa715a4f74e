use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration problems. Raised once, before anything renders.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error(transparent)]
    Render(#[from] chunkbrot_render::RenderError),

    #[error(transparent)]
    Core(#[from] chunkbrot_core::CoreError),
}
