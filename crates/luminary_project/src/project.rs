//! The project registry: every definition the exporters read, loaded from
//! the editor's JSON project dump.

use std::path::Path;

use glam::{IVec2, UVec2};
use luminary_types::names_match;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::actor::Actor;
use crate::variable::{ENTITY_COMPONENT_IDX, VariableTable};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid project json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate entity type id {0}")]
    DuplicateTypeId(u32),
}

fn entity_component_idx() -> i32 {
    ENTITY_COMPONENT_IDX
}

/// A script routine declared on an entity type, or on one of its components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeScriptFunc {
    pub name: String,
    pub return_type: String,
    pub routine: String,
    #[serde(default)]
    pub params: Vec<(String, String)>,
    #[serde(default = "entity_component_idx")]
    pub component_idx: i32,
}

/// A child entity placed inside a prefab.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefabChild {
    pub instance_id: u16,
    pub name: String,
    pub type_id: u32,
    #[serde(default)]
    pub relative_position: IVec2,
    #[serde(default)]
    pub sprite_actor: Option<String>,
    #[serde(default)]
    pub variables: VariableTable,
}

/// An entity type: declared parameters, script routines and, for prefab
/// types, the children the prefab expands to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityType {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub dimensions: UVec2,
    #[serde(default)]
    pub sprite_actor: Option<String>,
    #[serde(default)]
    pub variables: VariableTable,
    #[serde(default)]
    pub script_funcs: Vec<TypeScriptFunc>,
    #[serde(default)]
    pub prefab_name: Option<String>,
    #[serde(default)]
    pub prefab_children: Vec<PrefabChild>,
    #[serde(default)]
    pub is_static: bool,
}

impl EntityType {
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_prefab_type(&self) -> bool {
        self.prefab_name.is_some()
    }

    /// The prefab name, or an empty string for ordinary types.
    #[must_use]
    pub fn prefab_name(&self) -> &str {
        self.prefab_name.as_deref().unwrap_or_default()
    }
}

/// A named override set for an entity type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchetypeDef {
    pub name: String,
    pub type_id: u32,
    #[serde(default)]
    pub sprite_actor: Option<String>,
    #[serde(default)]
    pub variables: VariableTable,
}

/// An entity placed in a scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub type_id: u32,
    #[serde(default)]
    pub position: IVec2,
    /// Zero on either axis means "use the type's dimensions".
    #[serde(default)]
    pub dimensions: UVec2,
    #[serde(default)]
    pub sprite_actor: Option<String>,
    #[serde(default)]
    pub variables: VariableTable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

/// A loaded editor project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub entity_types: Vec<EntityType>,
    #[serde(default)]
    pub archetypes: Vec<ArchetypeDef>,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl Project {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a project from a JSON file.
    pub fn load_file(path: &Path) -> Result<Self, ProjectError> {
        let source = std::fs::read_to_string(path)?;
        let project = Self::from_json(&source)?;
        info!(
            file = %path.display(),
            types = project.entity_types.len(),
            archetypes = project.archetypes.len(),
            actors = project.actors.len(),
            scenes = project.scenes.len(),
            "project loaded"
        );
        Ok(project)
    }

    /// Parse a project from JSON text and check type ids are unique.
    pub fn from_json(source: &str) -> Result<Self, ProjectError> {
        let project: Project = serde_json::from_str(source)?;
        project.validate()?;
        Ok(project)
    }

    fn validate(&self) -> Result<(), ProjectError> {
        let mut seen = std::collections::HashSet::new();
        for ty in &self.entity_types {
            if !seen.insert(ty.id) {
                return Err(ProjectError::DuplicateTypeId(ty.id));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn entity_type(&self, id: u32) -> Option<&EntityType> {
        self.entity_types.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn entity_type_by_name(&self, name: &str) -> Option<&EntityType> {
        self.entity_types.iter().find(|t| names_match(&t.name, name))
    }

    #[must_use]
    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| names_match(&a.name, name))
    }

    #[must_use]
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| names_match(&s.name, name))
    }

    /// All entity types that define a prefab.
    pub fn prefab_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entity_types.iter().filter(|t| t.is_prefab_type())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const PROJECT: &str = r#"{
        "entity_types": [
            {
                "id": 1,
                "name": "EPlayer",
                "dimensions": [16, 32],
                "variables": [
                    { "name": "Health", "size": "Word", "value": "10" },
                    { "name": "SDSprite_Sheet", "size": "Long", "value": "Run",
                      "tags": ["SPRITE_SHEET"], "component_idx": 0, "component_name": "ECSprite" }
                ]
            },
            { "id": 2, "name": "ECrate", "prefab_name": "Stack" }
        ],
        "actors": [ { "name": "Player", "sprite_sheets": [ { "name": "Run" } ] } ],
        "scenes": [
            { "name": "Level1", "instances": [ { "id": 5, "type_id": 1, "position": [40, 80] } ] }
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let project = Project::from_json(PROJECT).unwrap();
        assert_eq!(project.entity_types.len(), 2);
        let player = project.entity_type(1).unwrap();
        assert_eq!(player.dimensions, UVec2::new(16, 32));
        assert_eq!(player.variables.len(), 2);
        assert_eq!(project.scene("level1").unwrap().instances[0].position, IVec2::new(40, 80));
    }

    #[test]
    fn test_lookups_are_case_insensitive() {
        let project = Project::from_json(PROJECT).unwrap();
        assert_eq!(project.entity_type_by_name("eplayer").unwrap().id, 1);
        assert!(project.actor("PLAYER").is_some());
        assert_eq!(project.prefab_types().count(), 1);
    }

    #[test]
    fn test_duplicate_type_id_rejected() {
        let json = r#"{ "entity_types": [ { "id": 1, "name": "A" }, { "id": 1, "name": "B" } ] }"#;
        assert!(matches!(
            Project::from_json(json),
            Err(ProjectError::DuplicateTypeId(1))
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PROJECT.as_bytes()).unwrap();
        let project = Project::load_file(file.path()).unwrap();
        assert_eq!(project.scenes.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Project::load_file(Path::new("/nonexistent/project.json"));
        assert!(matches!(result, Err(ProjectError::Io(_))));
    }
}
