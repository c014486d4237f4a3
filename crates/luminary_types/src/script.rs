//! Script routine metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An externally compiled script routine declared on an entity or component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFunc {
    pub name: String,
    /// Owning entity type or component name.
    pub scope: String,
    pub return_type: String,
    /// Label of the compiled routine.
    pub routine: String,
    /// `(type, name)` pairs in declaration order.
    #[serde(default)]
    pub params: Vec<(String, String)>,
    /// Slot in the global offset table. Only assigned while the table is built.
    #[serde(default)]
    pub table_offset: Option<u32>,
}

impl ScriptFunc {
    /// Comma separated `type name` parameter list.
    #[must_use]
    pub fn param_list(&self) -> String {
        self.params
            .iter()
            .map(|(ty, name)| format!("{ty} {name}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `ret Scope::Name(params)` as written in listings.
    #[must_use]
    pub fn signature(&self) -> String {
        format!(
            "{} {}::{}({})",
            self.return_type,
            self.scope,
            self.name,
            self.param_list()
        )
    }
}

/// A reference into the global offset table found in a compiled object.
///
/// Relocations are only produced by parsing symbol-dump output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRelocation {
    /// Offset of the 16-bit field inside the compiled code.
    pub address: u32,
    /// Empty for unscoped globals such as the table base symbol.
    pub scope: String,
    pub name: String,
    /// Index of the matching table entry, `None` if nothing matched.
    pub table_index: Option<usize>,
}

/// The resolved address of a compiled routine or global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptAddress {
    pub name: String,
    pub address: u32,
}

/// Per-entity-type routine/global addresses, filled in after linking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptAddressMap {
    types: BTreeMap<String, Vec<ScriptAddress>>,
}

impl ScriptAddressMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the address of `name` within `type_name`.
    pub fn insert(&mut self, type_name: impl Into<String>, name: impl Into<String>, address: u32) {
        self.types
            .entry(type_name.into())
            .or_default()
            .push(ScriptAddress {
                name: name.into(),
                address,
            });
    }

    /// Look up the address of `name` within `type_name`.
    #[must_use]
    pub fn find(&self, type_name: &str, name: &str) -> Option<u32> {
        self.types
            .iter()
            .find(|(ty, _)| crate::names_match(ty, type_name))?
            .1
            .iter()
            .find(|a| crate::names_match(&a.name, name))
            .map(|a| a.address)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature() {
        let func = ScriptFunc {
            name: "OnHit".to_string(),
            scope: "EPlayer".to_string(),
            return_type: "void".to_string(),
            routine: "EPlayer_OnHit".to_string(),
            params: vec![
                ("int".to_string(), "damage".to_string()),
                ("short".to_string(), "source".to_string()),
            ],
            table_offset: None,
        };
        assert_eq!(func.signature(), "void EPlayer::OnHit(int damage, short source)");
    }

    #[test]
    fn test_address_map_lookup() {
        let mut map = ScriptAddressMap::new();
        map.insert("EPlayer", "OnHit", 0x40);
        map.insert("EPlayer", "g_score", 0x1F0);
        assert_eq!(map.find("EPlayer", "onhit"), Some(0x40));
        assert_eq!(map.find("eplayer", "g_score"), Some(0x1F0));
        assert_eq!(map.find("EEnemy", "OnHit"), None);
    }
}
