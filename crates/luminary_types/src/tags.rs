//! Parameter annotation tags.
//!
//! Tags attach a semantic role to a parameter declaration. Names compare
//! case-insensitively. Valued tags (`SCRIPTFUNC=OnHit`) carry their payload
//! after an `=`.

use serde::{Deserialize, Serialize};

/// The semantic role a tag assigns to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagType {
    PositionX,
    PositionY,
    SpriteActor,
    SpriteSheet,
    SpriteAnimation,
    EntityDesc,
    EntityArchetype,
    ScriptData,
    PrefabData,
}

const TAGS: &[(&str, TagType)] = &[
    ("POSITION_X", TagType::PositionX),
    ("POSITION_Y", TagType::PositionY),
    ("SPRITE_ACTOR", TagType::SpriteActor),
    ("SPRITE_SHEET", TagType::SpriteSheet),
    ("SPRITE_ANIM", TagType::SpriteAnimation),
    ("ENTITY_DESC", TagType::EntityDesc),
    ("ENTITY_ARCHETYPE", TagType::EntityArchetype),
    ("SCRIPT_DATA", TagType::ScriptData),
    ("PREFAB_DATA", TagType::PrefabData),
];

/// Valued tag naming a script routine whose address the parameter holds.
pub const SCRIPT_FUNC_TAG: &str = "SCRIPTFUNC";

/// Valued tag naming a script global whose address the parameter holds.
pub const SCRIPT_GLOBAL_TAG: &str = "SCRIPTGLOBAL";

impl TagType {
    /// The annotation name of this tag.
    #[must_use]
    pub fn name(self) -> &'static str {
        TAGS.iter()
            .find(|(_, ty)| *ty == self)
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }

    /// Look up a tag by annotation name.
    #[must_use]
    pub fn find(name: &str) -> Option<Self> {
        TAGS.iter()
            .find(|(tag, _)| tag.eq_ignore_ascii_case(name))
            .map(|(_, ty)| *ty)
    }
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns `true` if `tags` contains `tag`.
#[must_use]
pub fn has_tag(tags: &[String], tag: TagType) -> bool {
    tags.iter().any(|t| TagType::find(t) == Some(tag))
}

/// Returns the payload of the valued tag `key` (`KEY=payload`), if present.
#[must_use]
pub fn find_tag_value<'a>(tags: &'a [String], key: &str) -> Option<&'a str> {
    tags.iter().find_map(|t| {
        let (name, value) = t.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case(key)
            .then(|| value.trim())
    })
}
