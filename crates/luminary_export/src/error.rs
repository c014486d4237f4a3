//! Export error types.

use std::path::PathBuf;

/// Errors raised while converting or writing export data.
///
/// Incomplete authored content never ends up here: every parameter lookup
/// has a fallback value. These cover broken project references and I/O.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A definition references an entity type id the project does not have.
    #[error("unknown entity type id {0}")]
    UnknownEntityType(u32),

    /// The requested scene does not exist.
    #[error("unknown scene: {0}")]
    UnknownScene(String),

    /// Writing an output file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
