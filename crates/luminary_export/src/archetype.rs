//! Archetype export.

use std::fmt::Write;
use std::path::PathBuf;

use luminary_types::Archetype;
use tracing::info;

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::writer::{spawn_params_block, write_output};

pub const ARCHETYPES_FILE: &str = "archetypes.asm";

/// One labelled spawn record per archetype, in the given order.
#[must_use]
pub fn export_archetypes(archetypes: &[Archetype], config: &ExportConfig) -> String {
    let mut out = String::new();
    for archetype in archetypes {
        let _ = writeln!(out, "{}:", archetype.label());
        spawn_params_block(
            &mut out,
            &archetype.name,
            0,
            &archetype.params,
            &archetype.components,
            config,
        );
    }
    out
}

pub fn write_archetypes(
    archetypes: &[Archetype],
    config: &ExportConfig,
) -> Result<PathBuf, ExportError> {
    let path = config.output_path(ARCHETYPES_FILE);
    write_output(&path, &export_archetypes(archetypes, config))?;
    info!(file = %path.display(), count = archetypes.len(), "archetypes exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use luminary_types::{Param, ParamSize};

    use super::*;

    #[test]
    fn test_export_archetypes() {
        let archetype = Archetype {
            name: "Fast".to_string(),
            entity_type_name: "EEnemy".to_string(),
            params: vec![Param::new("Speed", ParamSize::Word, "8")],
            components: Vec::new(),
        };
        let out = export_archetypes(&[archetype], &ExportConfig::default().without_debug_names());
        assert_eq!(
            out,
            "Archetype_EEnemy_Fast:\n\tdc.w 0x0000\t; EntitySpawnData_Id\n\tdc.w 8\t; Speed\n\n"
        );
    }

    #[test]
    fn test_write_archetypes() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig::new(dir.path());
        let path = write_archetypes(&[], &config).unwrap();
        assert_eq!(path, dir.path().join(ARCHETYPES_FILE));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "");
    }
}
