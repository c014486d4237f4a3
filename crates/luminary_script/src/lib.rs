//! # luminary_script
//!
//! Entity scripts are written in C++ against generated declarations,
//! compiled with an external m68k cross-compiler and linked here.
//!
//! - [`transpiler`] generates `Components.h` and per-type headers and
//!   boilerplate sources.
//! - [`GlobalOffsetTable`] lists every script routine once; compiled code
//!   calls routines only through it.
//! - [`relocation`] parses the symbol dump of a compiled unit.
//! - [`link_program`] patches the unit's table references in place and
//!   [`ScriptLinker`] drives the whole per-unit pipeline through a
//!   [`Toolchain`].

mod io;

pub mod error;
pub mod got;
pub mod linker;
pub mod relocation;
pub mod toolchain;
pub mod transpiler;

pub use error::LinkError;
pub use got::GlobalOffsetTable;
pub use linker::{LinkStage, LinkedUnit, ScriptLinker, link_file, link_program};
pub use relocation::{
    GOT_SYMBOL, collect_addresses, find_function_offset, find_global_var_offset,
    parse_relocations,
};
pub use toolchain::{ExternalToolchain, Toolchain, ToolchainConfig};
pub use transpiler::{
    generate_component_header, generate_entity_boilerplate, generate_entity_header,
    write_script_sources,
};
