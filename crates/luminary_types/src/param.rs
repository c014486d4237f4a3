//! Spawn parameters.
//!
//! A [`Param`] is a single named, sized value inside a spawn-data block. The
//! value is kept as text: it is either a literal (`"0"`, `"0x0010"`) or a
//! symbol the target assembler resolves (`"EPlayer_TypeDesc"`).

use serde::{Deserialize, Serialize};

/// Width of a parameter in the target's memory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamSize {
    Byte = 1,
    Word = 2,
    Long = 4,
}

impl ParamSize {
    /// Size in bytes.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        self as u32
    }

    /// The data directive that emits one value of this width.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            ParamSize::Byte => "dc.b",
            ParamSize::Word => "dc.w",
            ParamSize::Long => "dc.l",
        }
    }

    /// Parse an `rs.b` / `rs.w` / `rs.l` structure directive (case-insensitive).
    #[must_use]
    pub fn from_rs_directive(directive: &str) -> Option<Self> {
        match directive.to_ascii_lowercase().as_str() {
            "rs.b" => Some(ParamSize::Byte),
            "rs.w" => Some(ParamSize::Word),
            "rs.l" => Some(ParamSize::Long),
            _ => None,
        }
    }
}

/// A resolved spawn parameter.
///
/// Equality is structural over `name`, `size` and `value` only. Tags describe
/// how the value was produced and never affect deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub size: ParamSize,
    pub value: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Param {
    /// Default literal for a parameter nothing resolved a value for.
    pub const DEFAULT_VALUE: &'static str = "0";

    #[must_use]
    pub fn new(name: impl Into<String>, size: ParamSize, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            value: value.into(),
            tags: Vec::new(),
        }
    }

    /// The value to emit. A blank value is written as `0`.
    #[must_use]
    pub fn emitted_value(&self) -> &str {
        if self.value.is_empty() {
            Self::DEFAULT_VALUE
        } else {
            &self.value
        }
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.size == other.size && self.value == other.value
    }
}

impl Eq for Param {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_tags() {
        let mut a = Param::new("SDSprite_Sheet", ParamSize::Long, "actor_player_spritesheet_run");
        let b = a.clone();
        a.tags.push("SPRITE_SHEET".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_includes_size() {
        let a = Param::new("Speed", ParamSize::Byte, "4");
        let b = Param::new("Speed", ParamSize::Word, "4");
        assert_ne!(a, b);
    }

    #[test]
    fn test_blank_value_emits_zero() {
        let p = Param::new("Health", ParamSize::Word, "");
        assert_eq!(p.emitted_value(), "0");
    }

    #[test]
    fn test_rs_directive_parsing() {
        assert_eq!(ParamSize::from_rs_directive("RS.B"), Some(ParamSize::Byte));
        assert_eq!(ParamSize::from_rs_directive("rs.w"), Some(ParamSize::Word));
        assert_eq!(ParamSize::from_rs_directive("rs.l"), Some(ParamSize::Long));
        assert_eq!(ParamSize::from_rs_directive("dc.l"), None);
    }

    #[test]
    fn test_directive_matches_width() {
        assert_eq!(ParamSize::Byte.directive(), "dc.b");
        assert_eq!(ParamSize::Word.directive(), "dc.w");
        assert_eq!(ParamSize::Long.directive(), "dc.l");
        assert_eq!(ParamSize::Long.bytes(), 4);
    }
}
