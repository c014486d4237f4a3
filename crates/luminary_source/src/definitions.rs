/// Definition registry: collects parsed blocks from every loaded source file
/// and pairs entities and components with their spawn-data blocks.
use std::path::Path;

use luminary_types::{Param, SpawnData, names_match};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::parser::{ParseError, ParsedBlock, Parser};
use crate::scanner::BlockKind;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: ParseError,
    },
}

const SOURCE_EXTENSIONS: &[&str] = &["asm", "s"];

#[derive(Debug, Clone, Serialize)]
pub struct ComponentDef {
    pub name: String,
    /// Runtime fields declared in the component block.
    pub params: Vec<Param>,
    pub spawn_data: SpawnData,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityDef {
    pub name: String,
    pub is_static: bool,
    pub params: Vec<Param>,
    /// Attached component names, resolved against the parsed components.
    pub components: Vec<String>,
    pub spawn_data: SpawnData,
}

/// Everything found in the engine source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Definitions {
    pub components: Vec<ComponentDef>,
    pub entities: Vec<EntityDef>,
}

impl Definitions {
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentDef> {
        self.components.iter().find(|c| names_match(&c.name, name))
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| names_match(&e.name, name))
    }
}

/// Accumulates blocks across files. Spawn-data blocks may live in a
/// different file from the entity they belong to, so matching happens in
/// [`SourceSet::resolve`] once everything is loaded.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    blocks: Vec<ParsedBlock>,
    files: usize,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one source file.
    pub fn load_file(&mut self, path: &Path) -> Result<(), SourceError> {
        let source = std::fs::read_to_string(path)?;
        let blocks = Parser::parse(&source).map_err(|source| SourceError::File {
            path: path.display().to_string(),
            source,
        })?;
        debug!(file = %path.display(), blocks = blocks.len(), "source parsed");
        self.blocks.extend(blocks);
        self.files += 1;
        Ok(())
    }

    /// Parse a source string and add its blocks.
    pub fn load_source(&mut self, source: &str) -> Result<(), SourceError> {
        self.blocks.extend(Parser::parse(source)?);
        self.files += 1;
        Ok(())
    }

    /// Recursively load every `.asm` / `.s` file under `dir`, in sorted order.
    pub fn load_dir(&mut self, dir: &Path) -> Result<(), SourceError> {
        let mut entries = std::fs::read_dir(dir)?
            .map(|e| e.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.load_dir(&path)?;
            } else if is_source_file(&path) {
                self.load_file(&path)?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Build the definitions. The first block of a given kind and name wins.
    #[must_use]
    pub fn resolve(&self) -> Definitions {
        let mut defs = Definitions::default();

        for block in self.blocks_of(&[BlockKind::Component]) {
            if defs.component(&block.name).is_some() {
                warn!(component = %block.name, line = block.line, "duplicate component ignored");
                continue;
            }
            defs.components.push(ComponentDef {
                name: block.name.clone(),
                params: block.params.clone(),
                spawn_data: self.spawn_data(BlockKind::ComponentSpawnData, &block.name),
            });
        }

        for block in self.blocks_of(&[BlockKind::Entity, BlockKind::StaticEntity]) {
            if defs.entity(&block.name).is_some() {
                warn!(entity = %block.name, line = block.line, "duplicate entity ignored");
                continue;
            }
            let mut components = Vec::new();
            for name in &block.component_refs {
                match defs.component(name) {
                    Some(component) => components.push(component.name.clone()),
                    None => warn!(entity = %block.name, component = %name, "unknown component"),
                }
            }
            defs.entities.push(EntityDef {
                name: block.name.clone(),
                is_static: block.kind == BlockKind::StaticEntity,
                params: block.params.clone(),
                components,
                spawn_data: self.spawn_data(BlockKind::EntitySpawnData, &block.name),
            });
        }

        self.report_orphans(&defs);
        info!(
            files = self.files,
            components = defs.components.len(),
            entities = defs.entities.len(),
            "engine source resolved"
        );
        defs
    }

    fn blocks_of<'a>(&'a self, kinds: &'a [BlockKind]) -> impl Iterator<Item = &'a ParsedBlock> {
        self.blocks.iter().filter(move |b| kinds.contains(&b.kind))
    }

    fn spawn_data(&self, kind: BlockKind, owner: &str) -> SpawnData {
        let mut spawn_data = SpawnData::new(owner);
        if let Some(block) = self
            .blocks
            .iter()
            .find(|b| b.kind == kind && names_match(&b.name, owner))
        {
            spawn_data.params = block.params.clone();
        }
        spawn_data
    }

    fn report_orphans(&self, defs: &Definitions) {
        for block in &self.blocks {
            let orphan = match block.kind {
                BlockKind::EntitySpawnData => defs.entity(&block.name).is_none(),
                BlockKind::ComponentSpawnData => defs.component(&block.name).is_none(),
                _ => false,
            };
            if orphan {
                warn!(kind = %block.kind, name = %block.name, "spawn data has no owner");
            }
        }
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENTS: &str = "\
ENTITY_COMPONENT_BEGIN ECSprite
SDSprite_Sheet rs.l 1
SDSprite_Frame rs.w 1
ENTITY_COMPONENT_END

COMPONENT_SPAWN_DATA_BEGIN ecsprite
SDSprite_Sheet rs.l 1 [TAGS=SPRITE_SHEET]
COMPONENT_SPAWN_DATA_END
";

    const ENTITIES: &str = "\
ENTITY_BEGIN EPlayer
ENT_COMPONENT ECSprite
ENT_COMPONENT ECMissing
Health rs.w 1
ENTITY_END

STATIC_ENTITY_BEGIN ELamp
Brightness rs.b 1
STATIC_ENTITY_END

ENTITY_SPAWN_DATA_BEGIN EPlayer
SDPlayer_Health rs.w 1
ENTITY_SPAWN_DATA_END
";

    fn resolved() -> Definitions {
        let mut set = SourceSet::new();
        set.load_source(ENTITIES).unwrap();
        set.load_source(COMPONENTS).unwrap();
        set.resolve()
    }

    #[test]
    fn test_spawn_data_matched_across_sources() {
        let defs = resolved();
        let sprite = defs.component("ECSPRITE").unwrap();
        assert_eq!(sprite.params.len(), 2);
        assert_eq!(sprite.spawn_data.params.len(), 1);
        assert_eq!(sprite.spawn_data.params[0].tags, vec!["SPRITE_SHEET"]);

        let player = defs.entity("EPlayer").unwrap();
        assert_eq!(player.spawn_data.params[0].name, "SDPlayer_Health");
    }

    #[test]
    fn test_unknown_component_refs_dropped() {
        let defs = resolved();
        assert_eq!(defs.entity("EPlayer").unwrap().components, vec!["ECSprite"]);
    }

    #[test]
    fn test_static_flag() {
        let defs = resolved();
        assert!(defs.entity("ELamp").unwrap().is_static);
        assert!(!defs.entity("EPlayer").unwrap().is_static);
        assert!(defs.entity("ELamp").unwrap().spawn_data.params.is_empty());
    }

    #[test]
    fn test_load_dir_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("components");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("entities.asm"), ENTITIES).unwrap();
        std::fs::write(nested.join("sprite.S"), COMPONENTS).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ENTITY_BEGIN Broken\n").unwrap();

        let mut set = SourceSet::new();
        set.load_dir(dir.path()).unwrap();
        assert_eq!(set.file_count(), 2);

        let defs = set.resolve();
        assert_eq!(defs.entities.len(), 2);
        assert_eq!(defs.components.len(), 1);
    }

    #[test]
    fn test_load_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.asm");
        std::fs::write(&path, "ENTITY_BEGIN EBroken\n").unwrap();

        let mut set = SourceSet::new();
        let err = set.load_file(&path).unwrap_err();
        assert!(matches!(err, SourceError::File { .. }));
        assert!(err.to_string().contains("broken.asm"));
    }

    #[test]
    fn test_definitions_serialize() {
        let json = serde_json::to_value(resolved()).unwrap();
        assert_eq!(json["entities"][0]["name"], "EPlayer");
    }
}
