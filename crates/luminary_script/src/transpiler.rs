//! C++ declarations for entity scripts.
//!
//! Component and entity structures mirror the spawn-data layout field for
//! field so compiled script code can read the runtime blocks directly.

use std::collections::HashSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use luminary_types::{Component, Entity, Param, ParamSize, ScriptFunc};
use tracing::{debug, info};

use crate::error::LinkError;
use crate::io::write_atomic;

pub const COMMON_INCLUDE: &str = "Common.h";
pub const COMPONENTS_INCLUDE: &str = "Components.h";

const BANNER: &str = "\
// ============================================================================================
//   AUTOGENERATED WITH BEEHIVE - DO NOT EDIT MANUALLY
// ============================================================================================
//   http://www.bigevilcorporation.co.uk
// ============================================================================================
//   Beehive and LUMINARY Engine (c) Matt Phillips 2020
// ============================================================================================
";

const LIFECYCLE_PARAMS: &str = "const Engine& engine, const Scene& scene";
const LIFECYCLE: [&str; 3] = ["OnStart", "OnShutdown", "OnUpdate"];

fn c_type(size: ParamSize) -> &'static str {
    match size {
        ParamSize::Byte => "char",
        ParamSize::Word => "short",
        ParamSize::Long => "int",
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Field name for `param` with every occurrence of `prefix` removed.
fn field_name(param: &str, prefix: &str) -> String {
    lower_first(&param.replace(prefix, ""))
}

/// One field per param, plus a padding byte when the total is odd.
fn struct_fields(out: &mut String, params: &[Param], prefix: &str) {
    let mut size = 0;
    for param in params {
        let _ = writeln!(out, "\t{} {};", c_type(param.size), field_name(&param.name, prefix));
        size += param.size.bytes();
    }
    if size & 1 != 0 {
        let _ = writeln!(out, "\tunsigned char padding;");
    }
}

fn member_declaration(func: &ScriptFunc) -> String {
    format!("\t{} {}({});", func.return_type, func.name, func.param_list())
}

/// `Components.h`: one structure per distinct component name, first
/// occurrence wins.
#[must_use]
pub fn generate_component_header(components: &[Component]) -> String {
    let mut out = String::new();
    let mut exported = HashSet::new();

    for component in components {
        if !exported.insert(component.name.as_str()) {
            continue;
        }

        let _ = writeln!(out, "struct {} : ComponentBase", component.name);
        let _ = writeln!(out, "{{");
        struct_fields(&mut out, component.params(), &format!("{}_", component.name));

        if !component.script_funcs.is_empty() {
            let _ = writeln!(out);
            for func in &component.script_funcs {
                let _ = writeln!(out, "{}", member_declaration(func));
            }
        }
        let _ = writeln!(out, "}};");
        let _ = writeln!(out);
    }
    out
}

/// `<Type>.h`: handles for each attached component, the entity's own
/// fields and the lifecycle routine declarations.
#[must_use]
pub fn generate_entity_header(entity: &Entity) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{BANNER}");
    let _ = writeln!(out);
    let _ = writeln!(out, "#include <{COMMON_INCLUDE}>");
    let _ = writeln!(out, "#include <{COMPONENTS_INCLUDE}>");
    let _ = writeln!(out);

    let _ = writeln!(out, "struct {} : Entity", entity.type_name);
    let _ = writeln!(out, "{{");
    let _ = writeln!(out, "\tstruct Components");
    let _ = writeln!(out, "\t{{");

    let mut handles = HashSet::new();
    for component in &entity.components {
        let base = lower_first(component.name.strip_prefix("EC").unwrap_or(&component.name));
        let mut name = base.clone();
        let mut index = 1;
        while handles.contains(&name) {
            index += 1;
            name = format!("{base}{index}");
        }
        let _ = writeln!(out, "\t\tComponentHndl {name};");
        handles.insert(name);
    }
    let _ = writeln!(out, "\t}};");
    let _ = writeln!(out);

    struct_fields(&mut out, entity.params(), &format!("{}_", entity.type_name));
    let _ = writeln!(out);
    let _ = writeln!(out, "\tComponents components;");
    let _ = writeln!(out);

    for routine in LIFECYCLE {
        let _ = writeln!(out, "\tvoid {routine}({LIFECYCLE_PARAMS});");
    }
    let _ = writeln!(out, "}};");
    out
}

/// `<Type>.cpp`: empty lifecycle bodies for the script author to fill in.
#[must_use]
pub fn generate_entity_boilerplate(entity: &Entity) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#include \"{}.h\"", entity.type_name);
    let _ = writeln!(out);
    for routine in LIFECYCLE {
        let _ = writeln!(
            out,
            "void {}::{routine}({LIFECYCLE_PARAMS})",
            entity.type_name
        );
        let _ = writeln!(out, "{{");
        let _ = writeln!(out);
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);
    }
    out
}

/// Write `Components.h` plus a header and boilerplate source per entity
/// type into `dir`. Existing `.cpp` files hold authored script code and are
/// left alone.
pub fn write_script_sources(dir: &Path, entities: &[Entity]) -> Result<Vec<PathBuf>, LinkError> {
    let mut written = Vec::new();
    let mut types = HashSet::new();
    let mut components = Vec::new();

    for entity in entities {
        components.extend(entity.components.iter().cloned());
        if !types.insert(entity.type_name.as_str()) {
            continue;
        }

        let header = dir.join(format!("{}.h", entity.type_name));
        write_atomic(&header, generate_entity_header(entity).as_bytes())?;
        written.push(header);

        let source = dir.join(format!("{}.cpp", entity.type_name));
        if source.exists() {
            debug!(file = %source.display(), "keeping existing script source");
        } else {
            write_atomic(&source, generate_entity_boilerplate(entity).as_bytes())?;
            written.push(source);
        }
    }

    let path = dir.join(COMPONENTS_INCLUDE);
    write_atomic(&path, generate_component_header(&components).as_bytes())?;
    written.push(path);

    info!(types = types.len(), files = written.len(), "script sources generated");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, params: &[(&str, ParamSize)]) -> Component {
        let mut c = Component::new(name);
        for (param, size) in params {
            c.spawn_data.params.push(Param::new(*param, *size, "0"));
        }
        c
    }

    fn enemy() -> Entity {
        let mut e = Entity::new("EEnemy", 1);
        e.spawn_data
            .params
            .push(Param::new("EEnemy_Health", ParamSize::Word, "10"));
        e.spawn_data
            .params
            .push(Param::new("EEnemy_Flags", ParamSize::Byte, "0"));
        e.components.push(component("ECSprite", &[]));
        e.components.push(component("ECPhysics", &[]));
        e.components.push(component("ECSprite", &[]));
        e
    }

    #[test]
    fn test_component_header() {
        let mut sprite = component(
            "ECSprite",
            &[("ECSprite_Layer", ParamSize::Byte), ("ECSprite_Frame", ParamSize::Word)],
        );
        sprite.script_funcs.push(ScriptFunc {
            name: "Flash".to_string(),
            scope: "ECSprite".to_string(),
            return_type: "void".to_string(),
            routine: "ECSprite_Flash".to_string(),
            params: vec![("short".to_string(), "frames".to_string())],
            table_offset: None,
        });
        let duplicate = component("ECSprite", &[("ECSprite_Other", ParamSize::Long)]);

        let out = generate_component_header(&[sprite, duplicate]);
        let expected = "\
struct ECSprite : ComponentBase
{
\tchar layer;
\tshort frame;
\tunsigned char padding;

\tvoid Flash(short frames);
};

";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_even_component_has_no_padding() {
        let out = generate_component_header(&[component("ECPhysics", &[("ECPhysics_Mass", ParamSize::Word)])]);
        assert!(out.contains("\tshort mass;\n"));
        assert!(!out.contains("padding"));
    }

    #[test]
    fn test_entity_header() {
        let out = generate_entity_header(&enemy());
        assert!(out.starts_with(BANNER));
        assert!(out.contains("#include <Common.h>\n#include <Components.h>\n\n"));
        assert!(out.contains(
            "\tstruct Components\n\t{\n\t\tComponentHndl sprite;\n\t\tComponentHndl physics;\n\t\tComponentHndl sprite2;\n\t};\n"
        ));
        assert!(out.contains("\tshort health;\n\tchar flags;\n\tunsigned char padding;\n"));
        assert!(out.contains("\tComponents components;\n"));
        assert!(out.ends_with(
            "\tvoid OnStart(const Engine& engine, const Scene& scene);\n\
             \tvoid OnShutdown(const Engine& engine, const Scene& scene);\n\
             \tvoid OnUpdate(const Engine& engine, const Scene& scene);\n};\n"
        ));
    }

    #[test]
    fn test_entity_boilerplate() {
        let out = generate_entity_boilerplate(&enemy());
        assert!(out.starts_with("#include \"EEnemy.h\"\n\n"));
        assert!(out.contains("void EEnemy::OnUpdate(const Engine& engine, const Scene& scene)\n{\n\n}\n"));
    }

    #[test]
    fn test_write_script_sources_keeps_authored_code() {
        let dir = tempfile::tempdir().unwrap();
        let authored = dir.path().join("EEnemy.cpp");
        std::fs::write(&authored, "// mine\n").unwrap();

        let written = write_script_sources(dir.path(), &[enemy(), enemy()]).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(std::fs::read_to_string(authored).unwrap(), "// mine\n");
        let components = std::fs::read_to_string(dir.path().join(COMPONENTS_INCLUDE)).unwrap();
        assert_eq!(components.matches("struct ECSprite").count(), 1);
    }
}
