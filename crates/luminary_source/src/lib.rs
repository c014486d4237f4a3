//! # luminary_source
//!
//! Reads the engine's annotated assembly source and extracts entity,
//! component and spawn-data declarations.
//!
//! Blocks are delimited by paired markers (`ENTITY_BEGIN` / `ENTITY_END` and
//! friends). Parameter lines take the form `<name> rs.w 1 [TAGS=a,b]`.

pub mod definitions;
pub mod parser;
pub mod scanner;

pub use definitions::{ComponentDef, Definitions, EntityDef, SourceError, SourceSet};
pub use parser::{ParseError, ParsedBlock, Parser};
pub use scanner::{BlockKind, ScanError, Scanner};
