//! CLI error types.

use wm_config::ConfigError;
use wm_renderer::ConversionError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Conversion(#[from] ConversionError),

    #[error("Cannot read {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },
}
