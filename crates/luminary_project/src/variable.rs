//! Authored variables and the flat tables that hold them.

use luminary_types::{ParamSize, TagType, names_match};
use serde::{Deserialize, Serialize};

/// Component index of a variable that belongs to the entity itself.
pub const ENTITY_COMPONENT_IDX: i32 = -1;

fn entity_component_idx() -> i32 {
    ENTITY_COMPONENT_IDX
}

fn default_value() -> String {
    "0".to_string()
}

/// A parameter declaration or override as authored in the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub size: ParamSize,
    #[serde(default = "default_value")]
    pub value: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Owning component slot, or [`ENTITY_COMPONENT_IDX`].
    #[serde(default = "entity_component_idx")]
    pub component_idx: i32,
    #[serde(default)]
    pub component_name: String,
}

impl Variable {
    /// An entity-level variable.
    #[must_use]
    pub fn new(name: impl Into<String>, size: ParamSize, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            value: value.into(),
            tags: Vec::new(),
            component_idx: ENTITY_COMPONENT_IDX,
            component_name: String::new(),
        }
    }

    /// Move the variable onto component slot `idx`.
    #[must_use]
    pub fn in_component(mut self, idx: i32, component_name: impl Into<String>) -> Self {
        self.component_idx = idx;
        self.component_name = component_name.into();
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn has_tag(&self, tag: TagType) -> bool {
        luminary_types::has_tag(&self.tags, tag)
    }

    #[must_use]
    pub fn is_entity_param(&self) -> bool {
        self.component_idx < 0
    }

    fn in_slot(&self, component_idx: i32) -> bool {
        component_idx == ENTITY_COMPONENT_IDX || component_idx == self.component_idx
    }
}

/// One override level's variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableTable(pub Vec<Variable>);

impl VariableTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a variable by name. A `component_idx` of
    /// [`ENTITY_COMPONENT_IDX`] matches every slot.
    #[must_use]
    pub fn find(&self, name: &str, component_idx: i32) -> Option<&Variable> {
        self.0
            .iter()
            .find(|v| v.in_slot(component_idx) && names_match(&v.name, name))
    }

    /// Find the first variable carrying `tag` in the given slot.
    #[must_use]
    pub fn find_by_tag(&self, tag: TagType, component_idx: i32) -> Option<&Variable> {
        self.0
            .iter()
            .find(|v| v.in_slot(component_idx) && v.has_tag(tag))
    }

    pub fn push(&mut self, variable: Variable) {
        self.0.push(variable);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Variable> for VariableTable {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a VariableTable {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
