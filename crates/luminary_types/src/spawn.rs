//! Spawn-data blocks.

use glam::{IVec2, UVec2};
use serde::{Deserialize, Serialize};

use crate::param::Param;

/// The ordered parameter block a runtime reads when it instantiates an
/// entity or component.
///
/// Position and dimensions travel alongside the block but are never part of
/// its identity: two blocks with the same `params` are interchangeable no
/// matter where their owners stand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnData {
    pub name: String,
    pub position: IVec2,
    pub dimensions: UVec2,
    pub params: Vec<Param>,
}

impl SpawnData {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Half the dimensions, as used for centred positions.
    #[must_use]
    pub fn extents(&self) -> UVec2 {
        self.dimensions / 2
    }

    /// Returns `true` if both blocks carry identical parameter sequences.
    #[must_use]
    pub fn same_shape(&self, other: &SpawnData) -> bool {
        self.params == other.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamSize;

    #[test]
    fn test_shape_ignores_position_and_name() {
        let mut a = SpawnData::new("Player1");
        a.position = IVec2::new(10, 20);
        a.params.push(Param::new("Speed", ParamSize::Word, "2"));

        let mut b = SpawnData::new("Player2");
        b.position = IVec2::new(300, 40);
        b.params.push(Param::new("Speed", ParamSize::Word, "2"));

        assert!(a.same_shape(&b));
    }

    #[test]
    fn test_extents() {
        let mut s = SpawnData::new("Box");
        s.dimensions = UVec2::new(32, 17);
        assert_eq!(s.extents(), UVec2::new(16, 8));
    }
}
