use serde::{Deserialize, Serialize};

use crate::BlockPosition;

/// Rotation around the vertical axis, applied clockwise when viewed from
/// above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    CounterClockwise90,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mirror {
    #[default]
    None,
    /// Flips along x (the mirror plane spans y/z).
    LeftRight,
    /// Flips along z (the mirror plane spans x/y).
    FrontBack,
}

/// Where and how a schematic region sits in the world. Transform order is
/// fixed: mirror first, then rotation, then translation by `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchematicPlacement {
    pub origin: (i32, i32, i32),
    pub rotation: Rotation,
    pub mirror: Mirror,
}

impl SchematicPlacement {
    pub fn new(origin: (i32, i32, i32)) -> Self {
        SchematicPlacement {
            origin,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mirror(mut self, mirror: Mirror) -> Self {
        self.mirror = mirror;
        self
    }

    /// Maps a schematic-relative position to world coordinates.
    pub fn to_world(&self, relative: BlockPosition) -> BlockPosition {
        let (mut x, y, mut z) = (relative.x, relative.y, relative.z);

        match self.mirror {
            Mirror::None => {}
            Mirror::LeftRight => x = -x,
            Mirror::FrontBack => z = -z,
        }

        let (x, z) = match self.rotation {
            Rotation::None => (x, z),
            Rotation::Clockwise90 => (-z, x),
            Rotation::Clockwise180 => (-x, -z),
            Rotation::CounterClockwise90 => (z, -x),
        };

        BlockPosition::new(
            x + self.origin.0,
            y + self.origin.1,
            z + self.origin.2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_placement() {
        let placement = SchematicPlacement::new((10, 64, -5));
        assert_eq!(
            placement.to_world(BlockPosition::new(1, 2, 3)),
            BlockPosition::new(11, 66, -2)
        );
    }

    #[test]
    fn test_rotation_cycle() {
        let p = BlockPosition::new(1, 0, 2);
        let cw90 = SchematicPlacement::new((0, 0, 0)).with_rotation(Rotation::Clockwise90);
        let cw180 = SchematicPlacement::new((0, 0, 0)).with_rotation(Rotation::Clockwise180);
        let ccw90 = SchematicPlacement::new((0, 0, 0)).with_rotation(Rotation::CounterClockwise90);

        assert_eq!(cw90.to_world(p), BlockPosition::new(-2, 0, 1));
        assert_eq!(cw180.to_world(p), BlockPosition::new(-1, 0, -2));
        assert_eq!(ccw90.to_world(p), BlockPosition::new(2, 0, -1));

        // four quarter turns are the identity
        let mut q = p;
        for _ in 0..4 {
            q = cw90.to_world(q);
        }
        assert_eq!(q, p);
    }

    #[test]
    fn test_mirror_applies_before_rotation() {
        let placement = SchematicPlacement::new((0, 0, 0))
            .with_mirror(Mirror::LeftRight)
            .with_rotation(Rotation::Clockwise90);

        // (1,0,2) mirrors to (-1,0,2), then rotates to (-2,0,-1)
        assert_eq!(
            placement.to_world(BlockPosition::new(1, 0, 2)),
            BlockPosition::new(-2, 0, -1)
        );
    }

    #[test]
    fn test_front_back_mirror() {
        let placement = SchematicPlacement::new((5, 0, 5)).with_mirror(Mirror::FrontBack);
        assert_eq!(
            placement.to_world(BlockPosition::new(0, 0, 3)),
            BlockPosition::new(5, 0, 2)
        );
    }
}
