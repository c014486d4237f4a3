//! The global offset table.
//!
//! Compiled script code reaches every routine through this one table: a
//! flat list of 4-byte routine addresses indexed by each routine's
//! `table_offset`.

use std::fmt::Write;

use luminary_types::{Component, Entity, ScriptFunc};
use tracing::info;

use crate::error::LinkError;

/// Bytes per table slot.
pub const ENTRY_SIZE: u32 = 4;

#[derive(Debug, Clone, Default)]
pub struct GlobalOffsetTable {
    entries: Vec<ScriptFunc>,
}

impl GlobalOffsetTable {
    /// Entity routines first, then component routines, in declaration order.
    #[must_use]
    pub fn build(entities: &[Entity], components: &[Component]) -> Self {
        let table: Self = entities
            .iter()
            .flat_map(|e| &e.script_funcs)
            .chain(components.iter().flat_map(|c| &c.script_funcs))
            .cloned()
            .collect();
        info!(entries = table.entries.len(), "global offset table built");
        table
    }

    /// Index of the routine `scope::name`. Matching is exact.
    #[must_use]
    pub fn find(&self, scope: &str, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.scope == scope && e.name == name)
    }

    #[must_use]
    pub fn entries(&self) -> &[ScriptFunc] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the encoded table in bytes.
    #[must_use]
    pub fn byte_size(&self) -> u32 {
        self.entries.len() as u32 * ENTRY_SIZE
    }

    /// [`byte_size`](Self::byte_size) as the 16-bit value written into
    /// linked code.
    pub fn offset_size(&self) -> Result<u16, LinkError> {
        u16::try_from(self.byte_size()).map_err(|_| LinkError::TableTooLarge {
            entries: self.entries.len(),
        })
    }

    /// The table as assembly, one `dc.l` per routine.
    #[must_use]
    pub fn to_asm(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(out, "\tdc.l {}\t\t; {}", entry.routine, entry.signature());
        }
        out
    }

    /// The table as big-endian addresses. `resolve` maps a routine label to
    /// its address.
    pub fn encode<F>(&self, resolve: F) -> Result<Vec<u8>, LinkError>
    where
        F: Fn(&str) -> Option<u32>,
    {
        let mut out = Vec::with_capacity(self.byte_size() as usize);
        for entry in &self.entries {
            let address =
                resolve(&entry.routine).ok_or_else(|| LinkError::UnknownRoutine(entry.routine.clone()))?;
            out.extend_from_slice(&address.to_be_bytes());
        }
        Ok(out)
    }
}

/// Assigns dense offsets in iteration order. A `(scope, name)` pair already
/// in the table is not added again.
impl FromIterator<ScriptFunc> for GlobalOffsetTable {
    fn from_iter<I: IntoIterator<Item = ScriptFunc>>(iter: I) -> Self {
        let mut table = Self::default();
        for mut entry in iter {
            if table.find(&entry.scope, &entry.name).is_some() {
                continue;
            }
            entry.table_offset = Some(table.entries.len() as u32);
            table.entries.push(entry);
        }
        table
    }
}
