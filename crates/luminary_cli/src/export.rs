use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use glam::IVec2;
use luminary_export::writer::write_output;
use luminary_export::{
    Assembler, ExportConfig, ExportError, write_archetypes, write_prefabs, write_scene,
};
use luminary_project::Project;
use luminary_script::{GlobalOffsetTable, write_script_sources};
use luminary_types::{Component, Entity, ScriptAddressMap};
use tracing::{error, info};

pub const TABLE_ASM_FILE: &str = "script_table.asm";
pub const TABLE_JSON_FILE: &str = "script_table.json";

#[derive(Args)]
pub struct ExportArgs {
    /// Editor project dump (JSON)
    #[arg(short, long)]
    pub project: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "out")]
    pub out: PathBuf,

    /// Scenes to export; all scenes when omitted
    #[arg(short, long)]
    pub scene: Vec<String>,

    /// Script address map (JSON) from a previous link
    #[arg(long)]
    pub addresses: Option<PathBuf>,

    /// Directory for generated script headers; `<out>/scripts` by default
    #[arg(long)]
    pub scripts_dir: Option<PathBuf>,

    /// Sprite border added to positions, as `x,y`
    #[arg(long, value_parser = parse_border, default_value = "128,128")]
    pub sprite_border: IVec2,

    #[arg(long, default_value_t = luminary_export::config::DEFAULT_DEBUG_NAME_LEN)]
    pub debug_name_len: usize,

    /// Leave debug names out of spawn records
    #[arg(long)]
    pub no_debug_names: bool,
}

fn parse_border(text: &str) -> Result<IVec2, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {text}"))?;
    let parse = |v: &str| v.trim().parse::<i32>().map_err(|e| e.to_string());
    Ok(IVec2::new(parse(x)?, parse(y)?))
}

fn load_addresses(path: Option<&Path>) -> Result<ScriptAddressMap> {
    let Some(path) = path else {
        return Ok(ScriptAddressMap::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Counts failed steps so every file is attempted before reporting.
#[derive(Default)]
struct Report {
    failures: usize,
}

impl Report {
    fn check<T>(&mut self, step: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!(step, "{e:#}");
                self.failures += 1;
                None
            }
        }
    }
}

pub fn run(args: &ExportArgs) -> Result<()> {
    let project = Project::load_file(&args.project)
        .with_context(|| format!("loading project {}", args.project.display()))?;
    let addresses = load_addresses(args.addresses.as_deref())?;

    let mut config = ExportConfig::new(&args.out)
        .with_sprite_border(args.sprite_border)
        .with_debug_name_len(args.debug_name_len);
    if args.no_debug_names {
        config = config.without_debug_names();
    }
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let assembler = Assembler::new(&project, &addresses, &config);
    let mut report = Report::default();

    let archetypes = assembler.convert_archetypes();
    report.check("archetypes", write_archetypes(&archetypes, &config).map_err(Into::into));

    let prefabs = assembler.convert_prefabs();
    report.check("prefabs", write_prefabs(&prefabs, &config).map_err(Into::into));

    for name in scene_names(&project, &args.scene) {
        let result = export_scene(&project, &assembler, &config, &name);
        report.check(&format!("scene {name}"), result);
    }

    let scripts_dir = args
        .scripts_dir
        .clone()
        .unwrap_or_else(|| args.out.join("scripts"));
    report.check("scripts", export_scripts(&project, &assembler, &config, &scripts_dir));

    if report.failures > 0 {
        bail!("{} export step(s) failed", report.failures);
    }
    info!(out = %args.out.display(), "export complete");
    Ok(())
}

fn scene_names(project: &Project, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        project.scenes.iter().map(|s| s.name.clone()).collect()
    } else {
        requested.to_vec()
    }
}

fn export_scene<'a>(
    project: &'a Project,
    assembler: &Assembler<'a>,
    config: &ExportConfig,
    name: &str,
) -> Result<()> {
    let scene = project
        .scene(name)
        .ok_or_else(|| ExportError::UnknownScene(name.to_string()))?;
    let entities = assembler.convert_scene(scene)?;
    write_scene(&scene.name, &entities, config)?;
    Ok(())
}

/// Script headers for every non-prefab type, plus the offset table as
/// assembly and as JSON for `luminary link`.
fn export_scripts<'a>(
    project: &'a Project,
    assembler: &Assembler<'a>,
    config: &ExportConfig,
    dir: &Path,
) -> Result<()> {
    let entities: Vec<Entity> = project
        .entity_types
        .iter()
        .filter(|t| !t.is_prefab_type())
        .map(|t| assembler.convert_entity_type(t))
        .collect();
    let components: Vec<Component> = entities
        .iter()
        .flat_map(|e| e.components.iter().cloned())
        .collect();

    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_script_sources(dir, &entities)?;

    let table = GlobalOffsetTable::build(&entities, &components);
    let asm_path = config.output_path(TABLE_ASM_FILE);
    write_output(&asm_path, &table.to_asm())?;

    let json_path = config.output_path(TABLE_JSON_FILE);
    write_output(&json_path, &serde_json::to_string_pretty(table.entries())?)?;

    info!(entries = table.len(), dir = %dir.display(), "script sources exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_border() {
        assert_eq!(parse_border("128, 64"), Ok(IVec2::new(128, 64)));
        assert!(parse_border("128").is_err());
        assert!(parse_border("a,1").is_err());
    }

    #[test]
    fn test_export_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project.json");
        std::fs::write(
            &project,
            r#"{
                "entity_types": [
                    { "id": 1, "name": "EEnemy",
                      "variables": [ { "name": "Health", "size": "Word", "value": "10" } ],
                      "script_funcs": [ { "name": "OnHit", "return_type": "void", "routine": "EEnemy_OnHit" } ] }
                ],
                "scenes": [
                    { "name": "Level1", "instances": [ { "id": 5, "type_id": 1, "position": [0, 0] } ] }
                ]
            }"#,
        )
        .unwrap();

        let out = dir.path().join("out");
        let args = ExportArgs {
            project,
            out: out.clone(),
            scene: Vec::new(),
            addresses: None,
            scripts_dir: None,
            sprite_border: IVec2::new(128, 128),
            debug_name_len: 16,
            no_debug_names: false,
        };
        run(&args).unwrap();

        for file in ["archetypes.asm", "prefabs.asm", "scene_level1.asm", TABLE_ASM_FILE, TABLE_JSON_FILE] {
            assert!(out.join(file).exists(), "missing {file}");
        }
        assert!(out.join("scripts").join("EEnemy.h").exists());
        assert!(out.join("scripts").join("Components.h").exists());
        let table = std::fs::read_to_string(out.join(TABLE_ASM_FILE)).unwrap();
        assert_eq!(table, "\tdc.l EEnemy_OnHit\t\t; void EEnemy::OnHit()\n");
        assert!(!out.join("script_table.tmp").exists());
    }

    #[test]
    fn test_script_table_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project.json");
        std::fs::write(&project, r#"{ "entity_types": [] }"#).unwrap();

        // A directory where the table file should go makes the rename fail.
        let out = dir.path().join("out");
        std::fs::create_dir_all(out.join(TABLE_ASM_FILE)).unwrap();
        let args = ExportArgs {
            project,
            out: out.clone(),
            scene: Vec::new(),
            addresses: None,
            scripts_dir: None,
            sprite_border: IVec2::ZERO,
            debug_name_len: 16,
            no_debug_names: true,
        };
        assert!(run(&args).is_err());
        assert!(!out.join("script_table.tmp").exists());
        assert!(out.join("prefabs.asm").exists());
    }

    #[test]
    fn test_unknown_scene_fails_after_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project.json");
        std::fs::write(&project, r#"{ "entity_types": [] }"#).unwrap();

        let out = dir.path().join("out");
        let args = ExportArgs {
            project,
            out: out.clone(),
            scene: vec!["Missing".to_string()],
            addresses: None,
            scripts_dir: None,
            sprite_border: IVec2::ZERO,
            debug_name_len: 16,
            no_debug_names: true,
        };
        assert!(run(&args).is_err());
        assert!(out.join("archetypes.asm").exists());
        assert!(out.join(TABLE_ASM_FILE).exists());
    }
}
