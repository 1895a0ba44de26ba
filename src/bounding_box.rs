use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: (i32, i32, i32),
    pub max: (i32, i32, i32),
}

impl BoundingBox {
    pub fn new(min: (i32, i32, i32), max: (i32, i32, i32)) -> Self {
        BoundingBox { min, max }
    }

    /// Builds the box covered by a position + signed size pair. A negative
    /// size component extends the box towards negative coordinates, so the
    /// anchor corner can be any of the eight corners.
    pub fn from_position_and_size(position: (i32, i32, i32), size: (i32, i32, i32)) -> Self {
        let (x1, x2) = Self::axis_range(position.0, size.0);
        let (y1, y2) = Self::axis_range(position.1, size.1);
        let (z1, z2) = Self::axis_range(position.2, size.2);
        BoundingBox {
            min: (x1, y1, z1),
            max: (x2, y2, z2),
        }
    }

    fn axis_range(pos: i32, size: i32) -> (i32, i32) {
        if size >= 0 {
            (pos, pos + size.max(1) - 1)
        } else {
            (pos + size + 1, pos)
        }
    }

    pub fn contains(&self, point: (i32, i32, i32)) -> bool {
        point.0 >= self.min.0
            && point.0 <= self.max.0
            && point.1 >= self.min.1
            && point.1 <= self.max.1
            && point.2 >= self.min.2
            && point.2 <= self.max.2
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.0 <= other.max.0
            && self.max.0 >= other.min.0
            && self.min.1 <= other.max.1
            && self.max.1 >= other.min.1
            && self.min.2 <= other.max.2
            && self.max.2 >= other.min.2
    }

    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BoundingBox {
            min: (
                self.min.0.max(other.min.0),
                self.min.1.max(other.min.1),
                self.min.2.max(other.min.2),
            ),
            max: (
                self.max.0.min(other.max.0),
                self.max.1.min(other.max.1),
                self.max.2.min(other.max.2),
            ),
        })
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: (
                self.min.0.min(other.min.0),
                self.min.1.min(other.min.1),
                self.min.2.min(other.min.2),
            ),
            max: (
                self.max.0.max(other.max.0),
                self.max.1.max(other.max.1),
                self.max.2.max(other.max.2),
            ),
        }
    }

    pub fn get_dimensions(&self) -> (i32, i32, i32) {
        (
            self.max.0 - self.min.0 + 1,
            self.max.1 - self.min.1 + 1,
            self.max.2 - self.min.2 + 1,
        )
    }

    pub fn volume(&self) -> u64 {
        let (width, height, length) = self.get_dimensions();
        width as u64 * height as u64 * length as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_position_and_size_negative() {
        // A (1,0,1) anchor with size (-2,2,-2) covers (0..=1, 0..=1, 0..=1)
        let bb = BoundingBox::from_position_and_size((1, 0, 1), (-2, 2, -2));
        assert_eq!(bb.min, (0, 0, 0));
        assert_eq!(bb.max, (1, 1, 1));

        let bb = BoundingBox::from_position_and_size((1, 0, 1), (-3, 3, -3));
        assert_eq!(bb.min, (-1, 0, -1));
        assert_eq!(bb.max, (1, 2, 1));
    }

    #[test]
    fn test_union_and_intersection() {
        let a = BoundingBox::new((0, 0, 0), (1, 1, 1));
        let b = BoundingBox::new((1, 1, 1), (3, 3, 3));
        assert!(a.intersects(&b));
        assert_eq!(a.union(&b), BoundingBox::new((0, 0, 0), (3, 3, 3)));
        assert_eq!(
            a.intersection(&b),
            Some(BoundingBox::new((1, 1, 1), (1, 1, 1)))
        );

        let c = BoundingBox::new((5, 5, 5), (6, 6, 6));
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_volume() {
        let bb = BoundingBox::new((0, 0, 0), (3, 2, 1));
        assert_eq!(bb.get_dimensions(), (4, 3, 2));
        assert_eq!(bb.volume(), 24);
    }
}
