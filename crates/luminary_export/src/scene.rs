//! Scene export.
//!
//! Dynamic entities get a deduplicated spawn record and a row in the entity
//! table. Static entities are written as complete entity blocks and listed
//! in a table of their own.

use std::fmt::Write;
use std::path::PathBuf;

use luminary_types::Entity;
use tracing::info;

use crate::config::ExportConfig;
use crate::dedup::{Registration, SpawnDataRegistry};
use crate::error::ExportError;
use crate::writer::{hex4, spawn_params_block, static_entity_block, write_output};

/// Output file name for `scene`.
#[must_use]
pub fn scene_file_name(scene: &str) -> String {
    format!("scene_{}.asm", scene.to_ascii_lowercase())
}

fn static_label(scene: &str, entity: &Entity) -> String {
    format!("SceneStaticEntity_{scene}_{}", entity.spawn_data.name)
}

#[must_use]
pub fn export_scene(scene: &str, entities: &[Entity], config: &ExportConfig) -> String {
    let mut out = String::new();
    let mut registry = SpawnDataRegistry::new();

    let (statics, dynamics): (Vec<&Entity>, Vec<&Entity>) =
        entities.iter().partition(|e| e.is_static);

    let mut spawn_labels = Vec::with_capacity(dynamics.len());
    for entity in &dynamics {
        let label = format!("SceneEntitySpawnData_{scene}_{}", entity.spawn_data.name);
        let label = match registry.register(label, *entity) {
            Registration::Canonical(label) => {
                let _ = writeln!(out, "{label}:");
                spawn_params_block(
                    &mut out,
                    &entity.spawn_data.name,
                    entity.id,
                    entity.params(),
                    &entity.components,
                    config,
                );
                label
            }
            Registration::Alias(label) => label,
            // Partitioned out above.
            Registration::Static => continue,
        };
        spawn_labels.push(label);
    }
    let _ = writeln!(out);

    for entity in &statics {
        let _ = writeln!(out, "{}:", static_label(scene, entity));
        static_entity_block(&mut out, entity, config);
    }

    let _ = writeln!(out, "SceneEntityData_{scene}:");
    for (entity, label) in dynamics.iter().zip(&spawn_labels) {
        let position = entity.spawn_data.position;
        let _ = writeln!(out, "\tdc.l {}\t; Entity descriptor", entity.type_desc_symbol());
        let _ = writeln!(out, "\tdc.l {label}\t; Entity spawn data");
        let _ = writeln!(out, "\tdc.w {}\t; Position X", hex4(position.x.into()));
        let _ = writeln!(out, "\tdc.w {}\t; Position Y", hex4(position.y.into()));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "SceneStaticEntityData_{scene}:");
    for entity in &statics {
        let _ = writeln!(out, "\tdc.l {}\t; Static entity", static_label(scene, entity));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "SceneData_{scene}:");
    let _ = writeln!(out, "\tdc.w {}\t; Entity count", dynamics.len());
    let _ = writeln!(out, "\tdc.l SceneEntityData_{scene}\t; Entity table");
    let _ = writeln!(out, "\tdc.w {}\t; Static entity count", statics.len());
    let _ = writeln!(out, "\tdc.l SceneStaticEntityData_{scene}\t; Static entity table");

    info!(
        scene,
        dynamic = dynamics.len(),
        statics = statics.len(),
        canonical = registry.canonical_count(),
        aliased = registry.alias_count(),
        "scene spawn data deduplicated"
    );
    out
}

pub fn write_scene(
    scene: &str,
    entities: &[Entity],
    config: &ExportConfig,
) -> Result<PathBuf, ExportError> {
    let path = config.output_path(&scene_file_name(scene));
    write_output(&path, &export_scene(scene, entities, config))?;
    info!(file = %path.display(), scene, "scene exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use glam::IVec2;
    use luminary_types::{Component, Param, ParamSize};

    use super::*;

    fn enemy(name: &str, speed: &str, position: IVec2) -> Entity {
        let mut e = Entity::new("EEnemy", 1);
        e.spawn_data.name = name.to_string();
        e.spawn_data.position = position;
        e.spawn_data
            .params
            .push(Param::new("Speed", ParamSize::Byte, speed));
        let mut sprite = Component::new("ECSprite");
        sprite
            .spawn_data
            .params
            .push(Param::new("SDSprite_Sheet", ParamSize::Long, "actor_enemy_spritesheet_walk"));
        e.components.push(sprite);
        e
    }

    fn lamp() -> Entity {
        let mut e = Entity::new("ELamp", 9);
        e.is_static = true;
        e.spawn_data.name = "Lamp".to_string();
        e
    }

    fn config() -> ExportConfig {
        ExportConfig::default().without_debug_names()
    }

    #[test]
    fn test_identical_spawn_data_shared() {
        let entities = vec![
            enemy("Enemy1", "2", IVec2::new(0x88, 0x90)),
            enemy("Enemy2", "2", IVec2::new(0x100, 0x90)),
            enemy("Enemy3", "4", IVec2::new(0x120, 0x90)),
        ];
        let out = export_scene("Level1", &entities, &config());

        assert_eq!(out.matches("SceneEntitySpawnData_Level1_Enemy1:").count(), 1);
        assert!(!out.contains("SceneEntitySpawnData_Level1_Enemy2:"));
        assert!(out.contains("SceneEntitySpawnData_Level1_Enemy3:"));
        assert_eq!(
            out.matches("\tdc.l SceneEntitySpawnData_Level1_Enemy1\t; Entity spawn data\n").count(),
            2
        );
        assert!(out.contains("\tdc.w 0x0100\t; Position X\n"));
    }

    #[test]
    fn test_static_entities_kept_out_of_dynamic_tables() {
        let entities = vec![enemy("Enemy1", "2", IVec2::ZERO), lamp()];
        let out = export_scene("Level1", &entities, &config());

        assert!(out.contains("SceneStaticEntity_Level1_Lamp:\n"));
        assert!(!out.contains("SceneEntitySpawnData_Level1_Lamp"));
        assert!(out.contains("SceneStaticEntityData_Level1:\n\tdc.l SceneStaticEntity_Level1_Lamp\t; Static entity\n"));

        let header = &out[out.find("SceneData_Level1:").unwrap()..];
        assert_eq!(
            header,
            "SceneData_Level1:\n\
             \tdc.w 1\t; Entity count\n\
             \tdc.l SceneEntityData_Level1\t; Entity table\n\
             \tdc.w 1\t; Static entity count\n\
             \tdc.l SceneStaticEntityData_Level1\t; Static entity table\n"
        );
    }

    #[test]
    fn test_width_fidelity() {
        let entities = vec![enemy("Enemy1", "300", IVec2::ZERO)];
        let out = export_scene("Level1", &entities, &config());
        assert!(out.contains("\tdc.b 300\t; Speed\n"));
        assert!(out.contains("\tdc.l actor_enemy_spritesheet_walk\t; SDSprite_Sheet\n"));
    }

    #[test]
    fn test_write_scene() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig::new(dir.path());
        let path = write_scene("Level1", &[lamp()], &config).unwrap();
        assert_eq!(path.file_name().unwrap(), "scene_level1.asm");
        assert!(std::fs::read_to_string(path).unwrap().contains("SceneData_Level1:"));
    }
}
