//! Prefab export.
//!
//! Three sections: a root record per prefab, the children's spawn records
//! (deduplicated across every prefab in the file), then one spawn table per
//! prefab listing each child's descriptor, spawn record and placement.

use std::fmt::Write;
use std::path::PathBuf;

use luminary_types::Prefab;
use tracing::info;

use crate::config::ExportConfig;
use crate::dedup::{Registration, SpawnDataRegistry};
use crate::error::ExportError;
use crate::writer::{hex4, spawn_params_block, write_output};

pub const PREFABS_FILE: &str = "prefabs.asm";

fn child_label(prefab: &str, child: &str) -> String {
    format!("prefabchildspawndata_{prefab}_{child}")
}

#[must_use]
pub fn export_prefabs(prefabs: &[Prefab], config: &ExportConfig) -> String {
    let mut out = String::new();

    for prefab in prefabs {
        let _ = writeln!(out, "prefabdata_{}:", prefab.name);
        let _ = writeln!(out, "\tdc.w {}\t; Prefab_TypeId", hex4(prefab.id.into()));
        let _ = writeln!(
            out,
            "\tdc.w {}\t; Prefab_ChildCount",
            hex4(prefab.children.len() as i64)
        );
        let _ = writeln!(out, "\tdc.l prefabspawntable_{}\t; Prefab_SpawnTable", prefab.name);
        let _ = writeln!(out);
    }
    let _ = writeln!(out);

    // Labels per child, in the same order the spawn tables walk them.
    let mut registry = SpawnDataRegistry::new();
    let mut labels: Vec<Vec<String>> = Vec::with_capacity(prefabs.len());
    for prefab in prefabs {
        let mut prefab_labels = Vec::with_capacity(prefab.children.len());
        for child in &prefab.children {
            let label = child_label(&prefab.name, &child.spawn_data.name);
            let label = match registry.register(label.clone(), child) {
                Registration::Alias(existing) => {
                    prefab_labels.push(existing);
                    continue;
                }
                Registration::Canonical(canonical) => canonical,
                Registration::Static => label,
            };
            let _ = writeln!(out, "{label}:");
            spawn_params_block(
                &mut out,
                &child.spawn_data.name,
                child.id,
                child.params(),
                &child.components,
                config,
            );
            prefab_labels.push(label);
        }
        labels.push(prefab_labels);
    }
    let _ = writeln!(out);

    for (prefab, prefab_labels) in prefabs.iter().zip(&labels) {
        let _ = writeln!(out, "prefabspawntable_{}:", prefab.name);
        for (child, label) in prefab.children.iter().zip(prefab_labels) {
            let extents = child.spawn_data.extents().as_ivec2();
            let centre = child.spawn_data.position + extents;
            let _ = writeln!(out, "\tdc.w {}\t; Entity descriptor", child.type_desc_symbol());
            let _ = writeln!(out, "\tdc.l {label}\t; Entity spawn data");
            let _ = writeln!(out, "\tdc.w {}\t; Position X", hex4(centre.x.into()));
            let _ = writeln!(out, "\tdc.w {}\t; Position Y", hex4(centre.y.into()));
            let _ = writeln!(out, "\tdc.w {}\t; ExtentsX", hex4(extents.x.into()));
            let _ = writeln!(out, "\tdc.w {}\t; ExtentsY", hex4(extents.y.into()));
            let _ = writeln!(out);
        }
        let _ = writeln!(out);
    }

    info!(
        prefabs = prefabs.len(),
        canonical = registry.canonical_count(),
        aliased = registry.alias_count(),
        "prefab spawn data deduplicated"
    );
    out
}

pub fn write_prefabs(prefabs: &[Prefab], config: &ExportConfig) -> Result<PathBuf, ExportError> {
    let path = config.output_path(PREFABS_FILE);
    write_output(&path, &export_prefabs(prefabs, config))?;
    info!(file = %path.display(), count = prefabs.len(), "prefabs exported");
    Ok(path)
}
