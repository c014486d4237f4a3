//! Override resolution.
//!
//! A parameter's final value comes from the first override level that
//! defines it, in the order instance, prefab child, archetype, type. Tagged
//! parameters synthesise symbols instead (type descriptors, archetype
//! labels, sprite references, script addresses). Every branch has a
//! fallback, so an incomplete project still resolves.

use glam::IVec2;
use luminary_project::{Actor, ArchetypeDef, EntityType, Instance, PrefabChild, Project, Variable, VariableTable};
use luminary_types::entity::archetype_symbol;
use luminary_types::tags::{SCRIPT_FUNC_TAG, SCRIPT_GLOBAL_TAG};
use luminary_types::{Param, ScriptAddressMap, TagType, find_tag_value};
use tracing::debug;

use crate::config::DEFAULT_SPRITE_BORDER;

/// Tags checked in priority order. The first one a declaration carries
/// decides how it resolves.
const ROLE_PRIORITY: [TagType; 9] = [
    TagType::EntityDesc,
    TagType::EntityArchetype,
    TagType::PositionX,
    TagType::PositionY,
    TagType::SpriteActor,
    TagType::SpriteSheet,
    TagType::SpriteAnimation,
    TagType::ScriptData,
    TagType::PrefabData,
];

/// The override levels available while resolving one entity.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    project: &'a Project,
    entity_type: &'a EntityType,
    archetype: Option<&'a ArchetypeDef>,
    prefab_child: Option<&'a PrefabChild>,
    instance: Option<&'a Instance>,
    addresses: Option<&'a ScriptAddressMap>,
    sprite_border: IVec2,
}

impl<'a> ResolveContext<'a> {
    /// Resolve against the type's own defaults only.
    #[must_use]
    pub fn new(project: &'a Project, entity_type: &'a EntityType) -> Self {
        Self {
            project,
            entity_type,
            archetype: None,
            prefab_child: None,
            instance: None,
            addresses: None,
            sprite_border: DEFAULT_SPRITE_BORDER,
        }
    }

    #[must_use]
    pub fn with_archetype(mut self, archetype: &'a ArchetypeDef) -> Self {
        self.archetype = Some(archetype);
        self
    }

    #[must_use]
    pub fn with_prefab_child(mut self, child: &'a PrefabChild) -> Self {
        self.prefab_child = Some(child);
        self
    }

    #[must_use]
    pub fn with_instance(mut self, instance: &'a Instance) -> Self {
        self.instance = Some(instance);
        self
    }

    #[must_use]
    pub fn with_addresses(mut self, addresses: &'a ScriptAddressMap) -> Self {
        self.addresses = Some(addresses);
        self
    }

    #[must_use]
    pub fn with_sprite_border(mut self, border: IVec2) -> Self {
        self.sprite_border = border;
        self
    }

    #[must_use]
    pub fn entity_type(&self) -> &'a EntityType {
        self.entity_type
    }

    /// Resolve one declaration of the entity type into a spawn parameter.
    ///
    /// The width always comes from the declaration.
    #[must_use]
    pub fn resolve(&self, decl: &Variable) -> Param {
        let value = match ROLE_PRIORITY.into_iter().find(|tag| decl.has_tag(*tag)) {
            Some(TagType::EntityDesc) => format!("{}_TypeDesc", self.value_of(decl)),
            Some(TagType::EntityArchetype) => self.archetype_reference(decl),
            Some(TagType::PositionX) => self.position(|p| p.x),
            Some(TagType::PositionY) => self.position(|p| p.y),
            // Consumed by the sprite lookups, never emitted.
            Some(TagType::SpriteActor) => Param::DEFAULT_VALUE.to_string(),
            Some(TagType::SpriteSheet) => self.sprite_sheet_symbol(decl),
            Some(TagType::SpriteAnimation) => self.sprite_animation_symbol(decl),
            Some(TagType::ScriptData) => format!("scriptdata_{}", self.entity_type.name),
            Some(TagType::PrefabData) => format!("prefabdata_{}", self.entity_type.prefab_name()),
            None => match self.script_reference(decl) {
                Some(value) => value,
                None => self.value_of(decl).to_string(),
            },
        };

        let mut param = Param::new(decl.name.clone(), decl.size, value);
        param.tags = decl.tags.clone();
        param
    }

    /// Override tables, highest precedence first. The type's own table is
    /// not included.
    fn overrides(&self) -> impl Iterator<Item = &'a VariableTable> {
        [
            self.instance.map(|i| &i.variables),
            self.prefab_child.map(|c| &c.variables),
            self.archetype.map(|a| &a.variables),
        ]
        .into_iter()
        .flatten()
    }

    fn value_of<'s>(&'s self, decl: &'s Variable) -> &'s str {
        self.overrides()
            .find_map(|table| table.find(&decl.name, decl.component_idx))
            .map_or(decl.value.as_str(), |v| v.value.as_str())
    }

    /// First variable carrying `tag` in the given component slot, searching
    /// every level including the type.
    fn tagged(&self, tag: TagType, component_idx: i32) -> Option<&'a Variable> {
        self.overrides()
            .chain(std::iter::once(&self.entity_type.variables))
            .find_map(|table| table.find_by_tag(tag, component_idx))
    }

    fn archetype_reference(&self, decl: &Variable) -> String {
        let name = self.value_of(decl);
        if name.is_empty() || name == Param::DEFAULT_VALUE {
            return Param::DEFAULT_VALUE.to_string();
        }

        let type_name = self
            .archetype
            .and_then(|a| a.variables.find_by_tag(TagType::EntityDesc, decl.component_idx))
            .or_else(|| {
                self.instance
                    .and_then(|i| i.variables.find_by_tag(TagType::EntityDesc, decl.component_idx))
            })
            .map_or(self.entity_type.name.as_str(), |v| v.value.as_str());

        archetype_symbol(type_name, name)
    }

    fn position(&self, axis: impl Fn(IVec2) -> i32) -> String {
        match self.instance {
            Some(instance) => axis(instance.position + self.sprite_border).to_string(),
            None => Param::DEFAULT_VALUE.to_string(),
        }
    }

    fn sprite_actor(&self, component_idx: i32) -> Option<&'a Actor> {
        if let Some(actor) = self
            .tagged(TagType::SpriteActor, component_idx)
            .and_then(|var| self.project.actor(&var.value))
        {
            return Some(actor);
        }

        [
            self.instance.and_then(|i| i.sprite_actor.as_deref()),
            self.prefab_child.and_then(|c| c.sprite_actor.as_deref()),
            self.archetype.and_then(|a| a.sprite_actor.as_deref()),
            self.entity_type.sprite_actor.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find_map(|name| self.project.actor(name))
    }

    fn sprite_sheet_symbol(&self, decl: &Variable) -> String {
        let sheet_name = self.value_of(decl);
        let symbol = self.sprite_actor(decl.component_idx).and_then(|actor| {
            let sheet = actor.find_sprite_sheet(sheet_name)?;
            Some(format!("actor_{}_spritesheet_{}", actor.name, sheet.name))
        });

        symbol.unwrap_or_else(|| {
            debug!(param = %decl.name, sheet = %sheet_name, "sprite sheet unresolved");
            Param::DEFAULT_VALUE.to_string()
        })
    }

    fn sprite_animation_symbol(&self, decl: &Variable) -> String {
        let anim_name = self.value_of(decl);
        let symbol = self.sprite_actor(decl.component_idx).and_then(|actor| {
            let sheet_var = self.tagged(TagType::SpriteSheet, decl.component_idx)?;
            let sheet = actor.find_sprite_sheet(&sheet_var.value)?;
            let anim = sheet.find_animation(anim_name)?;
            Some(format!(
                "actor_{}_sheet_{}_anim_{}",
                actor.name, sheet.name, anim.name
            ))
        });

        symbol.unwrap_or_else(|| {
            debug!(param = %decl.name, anim = %anim_name, "sprite animation unresolved");
            Param::DEFAULT_VALUE.to_string()
        })
    }

    /// `SCRIPTFUNC=` / `SCRIPTGLOBAL=` references. `None` if the declaration
    /// carries neither tag.
    fn script_reference(&self, decl: &Variable) -> Option<String> {
        let target = find_tag_value(&decl.tags, SCRIPT_FUNC_TAG)
            .or_else(|| find_tag_value(&decl.tags, SCRIPT_GLOBAL_TAG))?;

        let address = self
            .addresses
            .and_then(|map| map.find(&self.entity_type.name, target));

        Some(match address {
            Some(address) => format!("0x{address:04X}"),
            None => {
                debug!(param = %decl.name, script = target, "script address unresolved");
                Param::DEFAULT_VALUE.to_string()
            }
        })
    }
}
