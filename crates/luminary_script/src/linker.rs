//! Script linking.
//!
//! Compiled script code is position independent and reaches routines only
//! through the global offset table. Linking patches two kinds of 16-bit
//! big-endian fields in the code:
//!
//! * the table base relocation, with the distance from the field back to
//!   the start of the table, which sits directly before the loaded code;
//! * routine relocations, with the byte offset of the routine's table slot.
//!
//! Every relocation is validated before the first byte is written, so a
//! failed link never leaves a partly patched binary.

use std::path::{Path, PathBuf};

use luminary_types::{Component, Entity, ScriptRelocation};
use tracing::{debug, error, info, warn};

use crate::error::LinkError;
use crate::got::{ENTRY_SIZE, GlobalOffsetTable};
use crate::io::write_atomic;
use crate::relocation::{GOT_SYMBOL, parse_relocation_lines, starts_with_got_base};
use crate::toolchain::Toolchain;

fn is_got_base(relocation: &ScriptRelocation) -> bool {
    relocation.scope.is_empty() && relocation.name == GOT_SYMBOL
}

/// The 16-bit value written at `relocation`.
fn patch_value(
    relocation: &ScriptRelocation,
    got_size: u16,
    load_offset: u16,
) -> Result<u16, LinkError> {
    if is_got_base(relocation) {
        return Ok(0u16
            .wrapping_sub(relocation.address as u16)
            .wrapping_sub(load_offset)
            .wrapping_sub(got_size));
    }

    let index = relocation
        .table_index
        .ok_or_else(|| LinkError::UnresolvedRelocation {
            address: relocation.address,
            scope: relocation.scope.clone(),
            name: relocation.name.clone(),
        })?;
    u16::try_from(index * ENTRY_SIZE as usize)
        .map_err(|_| LinkError::TableTooLarge { entries: index + 1 })
}

/// Patch `binary` in place. `got_size` is the table size in bytes and
/// `load_offset` where the code is loaded relative to the end of the table.
///
/// Returns the binary size.
pub fn link_program(
    binary: &mut [u8],
    relocations: &[ScriptRelocation],
    got_size: u16,
    load_offset: u16,
) -> Result<usize, LinkError> {
    let mut patches = Vec::with_capacity(relocations.len());
    for relocation in relocations {
        let at = relocation.address as usize;
        if at + 2 > binary.len() {
            return Err(LinkError::RelocationOutOfBounds {
                address: relocation.address,
                size: binary.len(),
            });
        }
        patches.push((at, patch_value(relocation, got_size, load_offset)?));
    }

    for (at, value) in patches {
        binary[at..at + 2].copy_from_slice(&value.to_be_bytes());
    }

    debug!(relocations = relocations.len(), size = binary.len(), "binary patched");
    Ok(binary.len())
}

/// [`link_program`] on the binary at `path`, rewritten in a single write.
pub fn link_file(
    path: &Path,
    relocations: &[ScriptRelocation],
    got_size: u16,
    load_offset: u16,
) -> Result<usize, LinkError> {
    let mut binary = std::fs::read(path)?;
    let size = link_program(&mut binary, relocations, got_size, load_offset)?;
    write_atomic(path, &binary)?;
    Ok(size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStage {
    BuildingTable,
    Compiling,
    ParsingRelocations,
    Patching,
    Done,
    Failed,
}

/// Outputs of one linked unit.
#[derive(Debug, Clone)]
pub struct LinkedUnit {
    pub binary: PathBuf,
    pub size: usize,
    pub relocations: Vec<ScriptRelocation>,
    /// Raw symbol dump, kept for address lookups.
    pub symbols: String,
}

/// Drives script units through compile, relocation parsing and patching
/// against one shared offset table.
pub struct ScriptLinker<'a, T: Toolchain> {
    toolchain: &'a T,
    table: Option<GlobalOffsetTable>,
    load_offset: u16,
    stage: LinkStage,
}

impl<'a, T: Toolchain> ScriptLinker<'a, T> {
    #[must_use]
    pub fn new(toolchain: &'a T, load_offset: u16) -> Self {
        Self {
            toolchain,
            table: None,
            load_offset,
            stage: LinkStage::BuildingTable,
        }
    }

    #[must_use]
    pub fn stage(&self) -> LinkStage {
        self.stage
    }

    #[must_use]
    pub fn table(&self) -> Option<&GlobalOffsetTable> {
        self.table.as_ref()
    }

    pub fn build_table(&mut self, entities: &[Entity], components: &[Component]) -> &GlobalOffsetTable {
        self.stage = LinkStage::BuildingTable;
        self.table.insert(GlobalOffsetTable::build(entities, components))
    }

    /// Compile `source` and link it. Intermediate files are written beside
    /// `out` with `.o` and `.bin` extensions.
    pub fn link_unit(&mut self, source: &Path, out: &Path) -> Result<LinkedUnit, LinkError> {
        let result = self.run_unit(source, out);
        match &result {
            Ok(unit) => {
                self.stage = LinkStage::Done;
                info!(source = %source.display(), size = unit.size, "script unit linked");
            }
            Err(e) => {
                error!(source = %source.display(), stage = ?self.stage, error = %e, "script link failed");
                self.stage = LinkStage::Failed;
            }
        }
        result
    }

    fn run_unit(&mut self, source: &Path, out: &Path) -> Result<LinkedUnit, LinkError> {
        let table = self.table.as_ref().ok_or(LinkError::TableNotBuilt)?;
        let got_size = table.offset_size()?;
        let object = out.with_extension("o");
        let binary = out.with_extension("bin");

        self.stage = LinkStage::Compiling;
        self.toolchain.compile(source, &object)?;
        self.toolchain.extract_binary(&object, &binary)?;

        self.stage = LinkStage::ParsingRelocations;
        let symbols = self.toolchain.dump_symbols(&object)?;
        let relocations = parse_relocation_lines(&symbols, table)?;
        if !relocations.is_empty() && !starts_with_got_base(&relocations) {
            warn!(count = relocations.len(), "relocation table rejected");
            return Err(LinkError::MissingGotBase {
                first: relocations[0].name.clone(),
            });
        }

        self.stage = LinkStage::Patching;
        let size = link_file(&binary, &relocations, got_size, self.load_offset)?;

        Ok(LinkedUnit {
            binary,
            size,
            relocations,
            symbols,
        })
    }
}
