//! Sprite actors, their sheets and animations.

use luminary_types::names_match;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteAnimation {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub name: String,
    #[serde(default)]
    pub animations: Vec<SpriteAnimation>,
}

impl SpriteSheet {
    #[must_use]
    pub fn find_animation(&self, name: &str) -> Option<&SpriteAnimation> {
        self.animations.iter().find(|a| names_match(&a.name, name))
    }
}

/// A sprite actor: a named set of sprite sheets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    #[serde(default)]
    pub sprite_sheets: Vec<SpriteSheet>,
}

impl Actor {
    #[must_use]
    pub fn find_sprite_sheet(&self, name: &str) -> Option<&SpriteSheet> {
        self.sprite_sheets.iter().find(|s| names_match(&s.name, name))
    }
}
