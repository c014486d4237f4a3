//! Spawn-data deduplication.
//!
//! Entities whose spawn blocks (own params plus every component's params,
//! in order) are identical share one exported record. Position and names are
//! not part of the comparison.
//!
//! The registry is a list scanned in insertion order, so the first entity
//! to produce a shape always owns its label. One registry is scoped to one
//! export call; independent scenes each get their own.

use luminary_types::{Entity, SpawnData};
use tracing::debug;

/// Outcome of registering an entity's spawn data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// First of its shape; the caller writes the record under this label.
    Canonical(String),
    /// Same shape as an earlier entity; reference this label instead.
    Alias(String),
    /// Static entities are written in full at every site and never shared.
    Static,
}

impl Registration {
    /// The label the entity's spawn data is reachable under.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Registration::Canonical(label) | Registration::Alias(label) => Some(label),
            Registration::Static => None,
        }
    }

    #[must_use]
    pub fn is_canonical(&self) -> bool {
        matches!(self, Registration::Canonical(_))
    }
}

/// One registry entry. Aliases carry no data so they never match.
#[derive(Debug)]
struct ExportedSpawnData<'a> {
    key: String,
    label: String,
    data: Vec<&'a SpawnData>,
}

#[derive(Debug, Default)]
pub struct SpawnDataRegistry<'a> {
    entries: Vec<ExportedSpawnData<'a>>,
}

impl<'a> SpawnDataRegistry<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity` under `label`, keyed by its spawn-data name.
    ///
    /// Returns the label the entity's spawn data should be referenced by.
    /// A canonical label that collides with an earlier one gets a numeric
    /// suffix.
    pub fn register(&mut self, label: impl Into<String>, entity: &'a Entity) -> Registration {
        if entity.is_static {
            return Registration::Static;
        }

        let blocks: Vec<&'a SpawnData> = entity.spawn_blocks().collect();
        let key = entity.spawn_data.name.clone();

        if let Some(existing) = self.find_shape(&blocks) {
            let label = existing.label.clone();
            debug!(entity = %key, label = %label, "spawn data aliased");
            self.entries.push(ExportedSpawnData {
                key,
                label: label.clone(),
                data: Vec::new(),
            });
            return Registration::Alias(label);
        }

        let label = self.unique_label(label.into());
        self.entries.push(ExportedSpawnData {
            key,
            label: label.clone(),
            data: blocks,
        });
        Registration::Canonical(label)
    }

    fn find_shape(&self, blocks: &[&SpawnData]) -> Option<&ExportedSpawnData<'a>> {
        self.entries.iter().find(|entry| {
            entry.data.len() == blocks.len()
                && entry
                    .data
                    .iter()
                    .zip(blocks)
                    .all(|(a, b)| a.same_shape(b))
        })
    }

    fn unique_label(&self, label: String) -> String {
        let taken = |candidate: &str| self.entries.iter().any(|e| e.label == candidate);
        if !taken(&label) {
            return label;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{label}_{n}");
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Label registered for the spawn-data name `key`. The first
    /// registration of a key wins.
    #[must_use]
    pub fn label_of(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.label.as_str())
    }

    /// Number of distinct records written.
    #[must_use]
    pub fn canonical_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.data.is_empty()).count()
    }

    #[must_use]
    pub fn alias_count(&self) -> usize {
        self.entries.len() - self.canonical_count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec2;
    use luminary_types::{Component, Param, ParamSize};

    use super::*;

    fn entity(name: &str, speed: &str, sheet: &str) -> Entity {
        let mut e = Entity::new("EEnemy", 1);
        e.spawn_data.name = name.to_string();
        e.spawn_data
            .params
            .push(Param::new("Speed", ParamSize::Word, speed));
        let mut sprite = Component::new("ECSprite");
        sprite
            .spawn_data
            .params
            .push(Param::new("SDSprite_Sheet", ParamSize::Long, sheet));
        e.components.push(sprite);
        e
    }

    #[test]
    fn test_first_registration_wins() {
        let a = entity("A", "1", "walk");
        let mut b = entity("B", "1", "walk");
        b.spawn_data.position = IVec2::new(400, 12);

        let mut registry = SpawnDataRegistry::new();
        assert_eq!(
            registry.register("Spawn_A", &a),
            Registration::Canonical("Spawn_A".to_string())
        );
        assert_eq!(
            registry.register("Spawn_B", &b),
            Registration::Alias("Spawn_A".to_string())
        );
        assert_eq!(registry.label_of("B"), Some("Spawn_A"));
        assert_eq!(registry.canonical_count(), 1);
        assert_eq!(registry.alias_count(), 1);
    }

    #[test]
    fn test_swapped_order_changes_owner_only() {
        let a = entity("A", "1", "walk");
        let b = entity("B", "1", "walk");

        let mut registry = SpawnDataRegistry::new();
        assert!(registry.register("Spawn_B", &b).is_canonical());
        assert_eq!(registry.register("Spawn_A", &a).label(), Some("Spawn_B"));
        assert_eq!(registry.canonical_count(), 1);
    }

    #[test]
    fn test_distinct_shapes_do_not_affect_aliasing() {
        let a = entity("A", "1", "walk");
        let b = entity("B", "1", "walk");
        let x = entity("X", "2", "walk");
        let y = entity("Y", "1", "run");

        let order_one: Vec<&Entity> = vec![&x, &a, &y, &b];
        let order_two: Vec<&Entity> = vec![&a, &y, &b, &x];

        let labels = |order: &[&Entity]| {
            let mut registry = SpawnDataRegistry::new();
            for e in order {
                registry.register(format!("Spawn_{}", e.spawn_data.name), *e);
            }
            ["A", "B", "X", "Y"].map(|k| registry.label_of(k).map(str::to_string))
        };

        assert_eq!(labels(&order_one), labels(&order_two));
    }

    #[test]
    fn test_component_count_is_part_of_shape() {
        let a = entity("A", "1", "walk");
        let mut b = entity("B", "1", "walk");
        b.components.push(Component::new("ECPhysics"));

        let mut registry = SpawnDataRegistry::new();
        registry.register("Spawn_A", &a);
        assert!(registry.register("Spawn_B", &b).is_canonical());
    }

    #[test]
    fn test_static_entities_never_registered() {
        let a = entity("A", "1", "walk");
        let mut lamp = entity("Lamp", "1", "walk");
        lamp.is_static = true;

        let mut registry = SpawnDataRegistry::new();
        assert_eq!(registry.register("Static_Lamp", &lamp), Registration::Static);
        assert!(registry.is_empty());

        registry.register("Spawn_A", &a);
        assert_eq!(registry.register("Static_Lamp", &lamp), Registration::Static);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.label_of("Lamp"), None);
    }

    #[test]
    fn test_colliding_labels_get_suffix() {
        let a = entity("Crate", "1", "walk");
        let b = entity("Crate", "2", "walk");
        let c = entity("Crate", "3", "walk");

        let mut registry = SpawnDataRegistry::new();
        registry.register("Spawn_Crate", &a);
        assert_eq!(
            registry.register("Spawn_Crate", &b),
            Registration::Canonical("Spawn_Crate_2".to_string())
        );
        assert_eq!(
            registry.register("Spawn_Crate", &c),
            Registration::Canonical("Spawn_Crate_3".to_string())
        );
        assert_eq!(registry.label_of("Crate"), Some("Spawn_Crate"));
    }
}
