//! Assembled entities, components, archetypes and prefabs.
//!
//! These are derived artifacts: they are rebuilt from the editor project on
//! every export pass and are not mutated once assembly finishes.

use serde::{Deserialize, Serialize};

use crate::param::Param;
use crate::script::ScriptFunc;
use crate::spawn::SpawnData;

/// A component instance attached to an entity.
///
/// For deduplication purposes a component is identified by the ordered
/// `params` of its spawn data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub spawn_data: SpawnData,
    #[serde(default)]
    pub script_funcs: Vec<ScriptFunc>,
}

impl Component {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            spawn_data: SpawnData::new(name.clone()),
            name,
            script_funcs: Vec::new(),
        }
    }

    /// The component's declared parameters.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.spawn_data.params
    }
}

/// A fully resolved entity.
///
/// Static entities have every parameter resolved at build time and are
/// written in full wherever they are placed. Dynamic entities keep a
/// spawn-data block the runtime reads through a pointer, which makes them
/// eligible for sharing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entity {
    pub type_name: String,
    pub id: u16,
    pub spawn_data: SpawnData,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub script_funcs: Vec<ScriptFunc>,
    #[serde(default)]
    pub is_static: bool,
}

impl Entity {
    #[must_use]
    pub fn new(type_name: impl Into<String>, id: u16) -> Self {
        let type_name = type_name.into();
        Self {
            spawn_data: SpawnData::new(type_name.clone()),
            type_name,
            id,
            ..Self::default()
        }
    }

    /// The entity's own parameters (component parameters excluded).
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.spawn_data.params
    }

    /// The entity's spawn data followed by each component's, in order.
    pub fn spawn_blocks(&self) -> impl Iterator<Item = &SpawnData> {
        std::iter::once(&self.spawn_data).chain(self.components.iter().map(|c| &c.spawn_data))
    }

    /// Symbol of the entity's runtime type descriptor.
    #[must_use]
    pub fn type_desc_symbol(&self) -> String {
        format!("{}_Typedesc", self.type_name)
    }
}

/// A named, reusable override set applied on top of an entity type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    pub entity_type_name: String,
    pub params: Vec<Param>,
    pub components: Vec<Component>,
}

impl Archetype {
    /// The label archetype references resolve to.
    #[must_use]
    pub fn label(&self) -> String {
        archetype_symbol(&self.entity_type_name, &self.name)
    }
}

/// Symbol for the archetype `name` of entity type `type_name`.
#[must_use]
pub fn archetype_symbol(type_name: &str, name: &str) -> String {
    format!("Archetype_{type_name}_{name}")
}

/// A named group of child entities placed relative to the prefab origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prefab {
    pub name: String,
    pub id: u16,
    pub children: Vec<Entity>,
}
