use serde::{Deserialize, Serialize};

use crate::bounding_box::BoundingBox;

/// A named pair of opposing world corners. The corners are kept exactly as
/// selected; `size` preserves the per-axis sign encoding which corner the
/// selection was dragged from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionBox {
    pub name: String,
    pub pos1: (i32, i32, i32),
    pub pos2: (i32, i32, i32),
}

impl SelectionBox {
    pub fn new(name: String, pos1: (i32, i32, i32), pos2: (i32, i32, i32)) -> Self {
        SelectionBox { name, pos1, pos2 }
    }

    /// Signed size anchored at `pos1`. Each component has magnitude
    /// `|pos2 - pos1| + 1` and carries the sign of the corner delta.
    pub fn size(&self) -> (i32, i32, i32) {
        (
            signed_extent(self.pos1.0, self.pos2.0),
            signed_extent(self.pos1.1, self.pos2.1),
            signed_extent(self.pos1.2, self.pos2.2),
        )
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_size(self.pos1, self.size())
    }
}

fn signed_extent(from: i32, to: i32) -> i32 {
    let delta = to - from;
    if delta < 0 {
        delta - 1
    } else {
        delta + 1
    }
}

/// A named group of selection boxes sharing one origin. The origin is the
/// anchor point subtracted from each box corner when the selection becomes
/// schematic regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSelection {
    pub name: String,
    pub origin: (i32, i32, i32),
    pub boxes: Vec<SelectionBox>,
}

impl AreaSelection {
    pub fn new(name: String, origin: (i32, i32, i32)) -> Self {
        AreaSelection {
            name,
            origin,
            boxes: Vec::new(),
        }
    }

    pub fn add_box(&mut self, selection: SelectionBox) {
        self.boxes.push(selection);
    }

    /// Enclosing box over all selection boxes.
    pub fn enclosing_box(&self) -> Option<BoundingBox> {
        let mut boxes = self.boxes.iter().map(|b| b.bounding_box());
        let first = boxes.next()?;
        Some(boxes.fold(first, |acc, b| acc.union(&b)))
    }
}
