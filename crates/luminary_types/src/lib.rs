//! # luminary_types
//!
//! The data model shared by every stage of the Luminary export pipeline.
//!
//! This crate provides:
//!
//! - [`Param`] and [`ParamSize`]: one resolved spawn parameter and its width.
//! - [`SpawnData`]: the ordered parameter block an entity or component is
//!   spawned from.
//! - [`Entity`], [`Component`], [`Archetype`], [`Prefab`]: assembled game
//!   objects ready for export.
//! - [`ScriptFunc`], [`ScriptRelocation`], [`ScriptAddressMap`]: script
//!   routine metadata consumed by the linker and the override resolver.
//! - [`TagType`]: the annotation tag registry.

pub mod entity;
pub mod param;
pub mod script;
pub mod spawn;
pub mod tags;

pub use entity::{Archetype, Component, Entity, Prefab};
pub use param::{Param, ParamSize};
pub use script::{ScriptAddress, ScriptAddressMap, ScriptFunc, ScriptRelocation};
pub use spawn::SpawnData;
pub use tags::{TagType, find_tag_value, has_tag};

/// Case-insensitive ASCII name comparison used for every authored name lookup.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
