//! Script build and link errors.

use std::path::PathBuf;

/// Errors raised while generating, compiling or linking script code.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// A dump line names a GOT relocation but does not follow the
    /// `address kind symbol` form.
    #[error("line {line}: malformed relocation: {text}")]
    MalformedRelocation { line: usize, text: String },

    /// The unit references the table but its first relocation is not the
    /// table base.
    #[error("first relocation is {first}, expected _GLOBAL_OFFSET_TABLE_")]
    MissingGotBase { first: String },

    #[error("unresolved relocation {scope}::{name} at 0x{address:04X}")]
    UnresolvedRelocation {
        address: u32,
        scope: String,
        name: String,
    },

    #[error("relocation at 0x{address:04X} is outside the {size} byte binary")]
    RelocationOutOfBounds { address: u32, size: usize },

    /// Table offsets are 16-bit, so the table must fit in 64 KiB.
    #[error("offset table of {entries} entries does not fit a 16-bit offset")]
    TableTooLarge { entries: usize },

    /// A table routine label has no address.
    #[error("unknown routine: {0}")]
    UnknownRoutine(String),

    /// Linking was attempted before the offset table was built.
    #[error("global offset table has not been built")]
    TableNotBuilt,

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Tool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
