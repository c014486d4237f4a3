//! # luminary_project
//!
//! The editor's object graph as the exporters see it: a read-only project of
//! entity types, placed instances, archetypes, prefabs and sprite actors.
//!
//! Every override level (type, archetype, prefab child, instance) exposes its
//! variables as a flat [`VariableTable`]. Lookups by name, tag, actor, sheet
//! and animation are case-insensitive.

pub mod actor;
pub mod project;
pub mod variable;

pub use actor::{Actor, SpriteAnimation, SpriteSheet};
pub use project::{
    ArchetypeDef, EntityType, Instance, PrefabChild, Project, ProjectError, Scene, TypeScriptFunc,
};
pub use variable::{ENTITY_COMPONENT_IDX, Variable, VariableTable};
