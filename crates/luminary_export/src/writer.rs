//! Assembly text primitives shared by the exporters.

use std::fmt::Write;
use std::path::Path;

use luminary_types::{Component, Entity, Param, ParamSize};

use crate::config::ExportConfig;
use crate::error::ExportError;

/// `0x` + four upper-case hex digits of the low 16 bits.
#[must_use]
pub fn hex4(value: i64) -> String {
    format!("0x{:04X}", value as u16)
}

/// `0x` + eight upper-case hex digits of the low 32 bits.
#[must_use]
pub fn hex8(value: i64) -> String {
    format!("0x{:08X}", value as u32)
}

/// Byte list for a fixed-length, zero-padded debug name. Names longer than
/// `max_len - 1` are truncated so the terminator always fits.
#[must_use]
pub fn debug_name(name: &str, max_len: usize) -> String {
    let keep = max_len.saturating_sub(1);
    let len = name.chars().count();
    if len > keep {
        let truncated: String = name.chars().take(keep).collect();
        return format!("\"{truncated}\",0");
    }

    let mut out = format!("\"{name}\"");
    for _ in 0..max_len - len {
        out.push_str(",0");
    }
    out
}

/// `\tdc.x <value>\t; <name>`
pub fn param_line(out: &mut String, param: &Param) {
    let _ = writeln!(
        out,
        "\t{} {}\t; {}",
        param.size.directive(),
        param.emitted_value(),
        param.name
    );
}

fn has_byte_field(params: &[Param]) -> bool {
    params.iter().any(|p| p.size == ParamSize::Byte)
}

fn debug_name_block(out: &mut String, name: &str, comment: &str, config: &ExportConfig) {
    if !config.debug_names {
        return;
    }
    let _ = writeln!(out, "\tIFND FINAL");
    let _ = writeln!(
        out,
        "\tdc.b {}\t; {comment}",
        debug_name(name, config.debug_name_len)
    );
    let _ = writeln!(out, "\tENDIF");
}

fn component_lines(out: &mut String, components: &[Component]) {
    for component in components.iter().filter(|c| !c.params().is_empty()) {
        let _ = writeln!(out, "\t; {}", component.name);
        for param in component.params() {
            param_line(out, param);
        }
        let _ = writeln!(out, "\teven");
    }
}

/// A spawn record: debug name, id, the entity's params, then each
/// component's params under a comment header.
pub fn spawn_params_block(
    out: &mut String,
    name: &str,
    id: u16,
    params: &[Param],
    components: &[Component],
    config: &ExportConfig,
) {
    debug_name_block(out, name, "EntitySpawnData_DebugName", config);
    let _ = writeln!(out, "\tdc.w {}\t; EntitySpawnData_Id", hex4(id.into()));

    for param in params {
        param_line(out, param);
    }
    if has_byte_field(params) {
        let _ = writeln!(out, "\teven");
    }

    component_lines(out, components);
    let _ = writeln!(out);
}

/// A fully resolved entity block for entities with no spawn-data pointer.
/// Positions are 16.16 fixed point, centred on the entity. Only the
/// entity's own params are laid out, always followed by `even`.
pub fn static_entity_block(out: &mut String, entity: &Entity, config: &ExportConfig) {
    let extents = entity.spawn_data.extents().as_ivec2();
    let centre = entity.spawn_data.position + extents;

    debug_name_block(out, &entity.spawn_data.name, "EntityBlock_DebugName", config);
    let _ = writeln!(out, "\tdc.w 0x0\t; EntityBlock_Flags");
    let _ = writeln!(out, "\tdc.w 0x0\t; EntityBlock_Next");
    let _ = writeln!(out, "\tdc.w {}\t; Entity_TypeDesc", entity.type_desc_symbol());
    let _ = writeln!(out, "\tdc.w {}\t; Entity_Id", hex4(entity.id.into()));
    let _ = writeln!(out, "\tdc.l {}\t; Entity_PosX", hex8(i64::from(centre.x) << 16));
    let _ = writeln!(out, "\tdc.l {}\t; Entity_PosY", hex8(i64::from(centre.y) << 16));
    let _ = writeln!(out, "\tdc.w {}\t; Entity_ExtentsX", hex4(extents.x.into()));
    let _ = writeln!(out, "\tdc.w {}\t; Entity_ExtentsY", hex4(extents.y.into()));

    for param in entity.params() {
        param_line(out, param);
    }
    let _ = writeln!(out, "\teven");
    let _ = writeln!(out);
}

/// Write `contents` to `path` in one go. The file is written beside its
/// destination first and renamed into place, so a failed write never
/// leaves a truncated output behind.
pub fn write_output(path: &Path, contents: &str) -> Result<(), ExportError> {
    let staging = path.with_extension("tmp");
    let result = std::fs::write(&staging, contents).and_then(|()| std::fs::rename(&staging, path));
    result.map_err(|source| {
        let _ = std::fs::remove_file(&staging);
        ExportError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}
