//! Spawn-data assembly.
//!
//! Turns editor definitions into [`Entity`], [`Archetype`] and [`Prefab`]
//! values. Every declared parameter of the entity type is resolved through a
//! [`ResolveContext`] and placed in the entity's own spawn data or in the
//! component record for its component index.

use luminary_project::{
    ArchetypeDef, EntityType, Instance, PrefabChild, Project, Scene, TypeScriptFunc, Variable,
};
use luminary_types::{
    Archetype, Component, Entity, Param, ParamSize, Prefab, ScriptAddressMap, ScriptFunc, TagType,
};
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::resolver::ResolveContext;

/// Type name of the synthetic entity a prefab spawns as.
pub const PREFAB_TYPE_NAME: &str = "EPrefab";

/// Parameter holding the prefab data pointer on the synthetic prefab type.
pub const PREFAB_DATA_PARAM: &str = "SDPrefab_Data";

/// Resolved parameters grouped by owner.
#[derive(Debug, Default)]
struct Assembled {
    params: Vec<Param>,
    /// Component records in order of first appearance, keyed by index.
    components: Vec<(i32, Component)>,
}

impl Assembled {
    fn component_mut(&mut self, idx: i32) -> Option<&mut Component> {
        self.components
            .iter_mut()
            .find(|(i, _)| *i == idx)
            .map(|(_, c)| c)
    }

    fn into_components(self) -> Vec<Component> {
        self.components.into_iter().map(|(_, c)| c).collect()
    }
}

/// Resolve every declaration of the context's entity type.
fn assemble(ctx: &ResolveContext<'_>) -> Assembled {
    let mut out = Assembled::default();

    for decl in &ctx.entity_type().variables {
        let param = ctx.resolve(decl);
        if decl.is_entity_param() {
            out.params.push(param);
            continue;
        }

        match out.component_mut(decl.component_idx) {
            Some(component) => component.spawn_data.params.push(param),
            None => {
                // Named from the first parameter seen for the index.
                let mut component = Component::new(decl.component_name.clone());
                component.spawn_data.params.push(param);
                out.components.push((decl.component_idx, component));
            }
        }
    }

    out
}

fn script_func(func: &TypeScriptFunc, scope: &str) -> ScriptFunc {
    ScriptFunc {
        name: func.name.clone(),
        scope: scope.to_string(),
        return_type: func.return_type.clone(),
        routine: func.routine.clone(),
        params: func.params.clone(),
        table_offset: None,
    }
}

/// Attach the type's script routines to the entity or to the component at
/// their component index.
fn attach_script_funcs(entity_type: &EntityType, entity: &mut Entity, assembled: &mut Assembled) {
    for func in &entity_type.script_funcs {
        if func.component_idx < 0 {
            entity
                .script_funcs
                .push(script_func(func, &entity_type.name));
            continue;
        }

        match assembled.component_mut(func.component_idx) {
            Some(component) => {
                let scoped = script_func(func, &component.name);
                component.script_funcs.push(scoped);
            }
            None => warn!(
                entity = %entity_type.name,
                func = %func.name,
                component_idx = func.component_idx,
                "script function targets a component with no parameters"
            ),
        }
    }
}

/// Converts editor definitions into assembled game objects.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'a> {
    project: &'a Project,
    addresses: &'a ScriptAddressMap,
    config: &'a ExportConfig,
}

impl<'a> Assembler<'a> {
    #[must_use]
    pub fn new(
        project: &'a Project,
        addresses: &'a ScriptAddressMap,
        config: &'a ExportConfig,
    ) -> Self {
        Self {
            project,
            addresses,
            config,
        }
    }

    fn context(&self, entity_type: &'a EntityType) -> ResolveContext<'a> {
        ResolveContext::new(self.project, entity_type)
            .with_addresses(self.addresses)
            .with_sprite_border(self.config.sprite_border)
    }

    fn entity_type(&self, id: u32) -> Result<&'a EntityType, ExportError> {
        self.project
            .entity_type(id)
            .ok_or(ExportError::UnknownEntityType(id))
    }

    /// An entity built from the type's defaults alone.
    #[must_use]
    pub fn convert_entity_type(&self, entity_type: &'a EntityType) -> Entity {
        let mut assembled = assemble(&self.context(entity_type));

        let mut entity = Entity::new(entity_type.name.clone(), entity_type.id as u16);
        entity.spawn_data.name = if entity_type.is_prefab_type() {
            entity_type.prefab_name().to_string()
        } else {
            entity_type.name.clone()
        };
        entity.spawn_data.dimensions = entity_type.dimensions;
        entity.is_static = entity_type.is_static;

        attach_script_funcs(entity_type, &mut entity, &mut assembled);
        entity.spawn_data.params = std::mem::take(&mut assembled.params);
        entity.components = assembled.into_components();
        entity
    }

    /// An entity placed in a scene, with the instance's overrides applied.
    #[must_use]
    pub fn convert_entity_instance(
        &self,
        entity_type: &'a EntityType,
        instance: &'a Instance,
    ) -> Entity {
        let mut assembled = assemble(&self.context(entity_type).with_instance(instance));

        let mut entity = Entity::new(entity_type.name.clone(), instance.id as u16);
        entity.spawn_data.name = if instance.name.is_empty() {
            format!("{}{}", entity_type.name, instance.id)
        } else {
            instance.name.clone()
        };
        entity.spawn_data.position = instance.position + self.config.sprite_border;
        entity.spawn_data.dimensions = glam::UVec2::new(
            if instance.dimensions.x > 0 {
                instance.dimensions.x
            } else {
                entity_type.dimensions.x
            },
            if instance.dimensions.y > 0 {
                instance.dimensions.y
            } else {
                entity_type.dimensions.y
            },
        );
        entity.is_static = entity_type.is_static;

        attach_script_funcs(entity_type, &mut entity, &mut assembled);
        entity.spawn_data.params = std::mem::take(&mut assembled.params);
        entity.components = assembled.into_components();
        entity
    }

    /// A prefab child with its overrides applied, positioned relative to the
    /// prefab origin.
    #[must_use]
    pub fn convert_prefab_child(&self, entity_type: &'a EntityType, child: &'a PrefabChild) -> Entity {
        let mut assembled = assemble(&self.context(entity_type).with_prefab_child(child));

        let mut entity = Entity::new(entity_type.name.clone(), child.instance_id);
        entity.spawn_data.name = child.name.clone();
        entity.spawn_data.position = child.relative_position;
        entity.spawn_data.dimensions = entity_type.dimensions;
        entity.is_static = entity_type.is_static;

        attach_script_funcs(entity_type, &mut entity, &mut assembled);
        entity.spawn_data.params = std::mem::take(&mut assembled.params);
        entity.components = assembled.into_components();
        entity
    }

    pub fn convert_archetype(&self, archetype: &'a ArchetypeDef) -> Result<Archetype, ExportError> {
        let entity_type = self.entity_type(archetype.type_id)?;
        let mut assembled = assemble(&self.context(entity_type).with_archetype(archetype));

        Ok(Archetype {
            name: archetype.name.clone(),
            entity_type_name: entity_type.name.clone(),
            params: std::mem::take(&mut assembled.params),
            components: assembled.into_components(),
        })
    }

    /// Expand a prefab type into its children. Children whose type is
    /// missing from the project are skipped.
    #[must_use]
    pub fn convert_prefab_type(&self, entity_type: &'a EntityType) -> Prefab {
        let mut children = Vec::with_capacity(entity_type.prefab_children.len());
        for child in &entity_type.prefab_children {
            match self.project.entity_type(child.type_id) {
                Some(child_type) => children.push(self.convert_prefab_child(child_type, child)),
                None => warn!(
                    prefab = %entity_type.prefab_name(),
                    child = %child.name,
                    type_id = child.type_id,
                    "prefab child has unknown type"
                ),
            }
        }

        Prefab {
            name: entity_type.prefab_name().to_string(),
            id: entity_type.id as u16,
            children,
        }
    }

    /// Every instance in the scene, in placement order.
    pub fn convert_scene(&self, scene: &'a Scene) -> Result<Vec<Entity>, ExportError> {
        let mut entities = Vec::with_capacity(scene.instances.len());
        for instance in &scene.instances {
            let entity_type = self.entity_type(instance.type_id)?;
            entities.push(self.convert_entity_instance(entity_type, instance));
        }

        let statics = entities.iter().filter(|e| e.is_static).count();
        info!(
            scene = %scene.name,
            entities = entities.len(),
            statics,
            "scene assembled"
        );
        Ok(entities)
    }

    /// Every archetype in the project. Archetypes of unknown types are
    /// reported and skipped.
    #[must_use]
    pub fn convert_archetypes(&self) -> Vec<Archetype> {
        self.project
            .archetypes
            .iter()
            .filter_map(|a| match self.convert_archetype(a) {
                Ok(archetype) => Some(archetype),
                Err(e) => {
                    warn!(archetype = %a.name, error = %e, "archetype skipped");
                    None
                }
            })
            .collect()
    }

    /// Every prefab type in the project.
    #[must_use]
    pub fn convert_prefabs(&self) -> Vec<Prefab> {
        let prefabs: Vec<Prefab> = self
            .project
            .prefab_types()
            .map(|t| self.convert_prefab_type(t))
            .collect();
        debug!(count = prefabs.len(), "prefabs assembled");
        prefabs
    }
}

/// The synthetic entity type a prefab spawns as: a single long parameter
/// pointing at the prefab's data.
#[must_use]
pub fn create_prefab_type(id: u32, prefab_name: &str) -> EntityType {
    let mut entity_type = EntityType::new(id, PREFAB_TYPE_NAME);
    entity_type.prefab_name = Some(prefab_name.to_string());
    entity_type.variables.push(
        Variable::new(
            PREFAB_DATA_PARAM,
            ParamSize::Long,
            format!("prefabdata_{prefab_name}"),
        )
        .with_tag(TagType::PrefabData.name()),
    );
    entity_type
}
