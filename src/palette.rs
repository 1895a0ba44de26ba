use std::collections::HashMap;

use quartz_nbt::{NbtList, NbtTag};
use serde::{Deserialize, Serialize};

use crate::error::SchematicError;
use crate::BlockState;

/// Litematic-style palettes never pack below two bits per entry, even for a
/// single-state palette.
pub const MIN_BITS_PER_ENTRY: usize = 2;

/// Per-region dictionary mapping block states to compact indices.
///
/// Indices are assigned in insertion order and never removed; a freshly
/// created palette holds `minecraft:air` at index 0 so empty cells decode to
/// air without special-casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    states: Vec<BlockState>,
    #[serde(skip)]
    state_to_index: HashMap<BlockState, usize>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    pub fn new() -> Self {
        let air = BlockState::air();
        let mut state_to_index = HashMap::new();
        state_to_index.insert(air.clone(), 0);
        Palette {
            states: vec![air],
            state_to_index,
        }
    }

    /// Rebuilds a palette from an explicit ordered state list, as read from a
    /// schematic file. The list must be bijective: a duplicated state means
    /// the file's index mapping is ambiguous and the region is unreadable.
    pub fn from_states(states: Vec<BlockState>) -> Result<Self, SchematicError> {
        let mut state_to_index = HashMap::with_capacity(states.len());
        for (index, state) in states.iter().enumerate() {
            if state_to_index.insert(state.clone(), index).is_some() {
                return Err(SchematicError::InvalidFormat(format!(
                    "duplicate palette entry '{}' at index {}",
                    state.name, index
                )));
            }
        }
        Ok(Palette {
            states,
            state_to_index,
        })
    }

    /// Returns the index for `state`, inserting it if absent.
    pub fn id_for_state(&mut self, state: &BlockState) -> usize {
        if let Some(&index) = self.state_to_index.get(state) {
            index
        } else {
            let index = self.states.len();
            self.states.push(state.clone());
            self.state_to_index.insert(state.clone(), index);
            index
        }
    }

    /// Looks up an already-assigned index without inserting.
    pub fn id_of(&self, state: &BlockState) -> Option<usize> {
        self.state_to_index.get(state).copied()
    }

    pub fn state_for_id(&self, index: usize) -> Result<&BlockState, SchematicError> {
        self.states.get(index).ok_or(SchematicError::CorruptPalette {
            index,
            palette_size: self.states.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Bit width needed to store any index of this palette.
    pub fn bits(&self) -> usize {
        bits_for_palette_len(self.states.len())
    }

    pub fn states(&self) -> &[BlockState] {
        &self.states
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockState> {
        self.states.iter()
    }

    pub fn to_nbt(&self) -> NbtList {
        NbtList::from(
            self.states
                .iter()
                .map(|state| state.to_nbt())
                .collect::<Vec<NbtTag>>(),
        )
    }

    pub fn from_nbt(list: &NbtList) -> Result<Self, SchematicError> {
        let mut states = Vec::with_capacity(list.len());
        for tag in list.iter() {
            match tag {
                NbtTag::Compound(compound) => {
                    states.push(BlockState::from_nbt(compound).map_err(SchematicError::InvalidFormat)?);
                }
                other => {
                    return Err(SchematicError::InvalidFormat(format!(
                        "palette entry is not a compound: {:?}",
                        other
                    )))
                }
            }
        }
        Palette::from_states(states)
    }
}

/// ceil(log2(len)) clamped to the litematic minimum of 2 bits.
pub fn bits_for_palette_len(len: usize) -> usize {
    if len <= 1 {
        MIN_BITS_PER_ENTRY
    } else {
        let needed = (usize::BITS - (len - 1).leading_zeros()) as usize;
        needed.max(MIN_BITS_PER_ENTRY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_operations() {
        let mut palette = Palette::new();

        let stone = BlockState::new("minecraft:stone".to_string());
        let dirt = BlockState::new("minecraft:dirt".to_string());

        assert_eq!(palette.id_for_state(&stone), 1);
        assert_eq!(palette.id_for_state(&dirt), 2);
        assert_eq!(palette.id_for_state(&stone), 1);

        assert_eq!(palette.state_for_id(0).unwrap(), &BlockState::air());
        assert_eq!(palette.state_for_id(1).unwrap(), &stone);
        assert_eq!(palette.state_for_id(2).unwrap(), &dirt);
        assert!(matches!(
            palette.state_for_id(3),
            Err(SchematicError::CorruptPalette {
                index: 3,
                palette_size: 3
            })
        ));

        assert_eq!(palette.len(), 3);
    }

    #[test]
    fn test_id_state_roundtrip() {
        let mut palette = Palette::new();
        for i in 0..40 {
            let state = BlockState::new(format!("minecraft:block{}", i))
                .with_property("axis".to_string(), if i % 2 == 0 { "x" } else { "y" }.to_string());
            let id = palette.id_for_state(&state);
            assert_eq!(palette.state_for_id(id).unwrap(), &state);
        }
    }

    #[test]
    fn test_bit_width_growth() {
        // palette sizes 3, 5, 17, 33 force widths 2, 3, 5, 6
        for (len, expected_bits) in [(1, 2), (2, 2), (3, 2), (4, 2), (5, 3), (8, 3), (9, 4), (17, 5), (33, 6), (256, 8)] {
            assert_eq!(bits_for_palette_len(len), expected_bits, "for palette size {}", len);
        }
    }

    #[test]
    fn test_from_states_rejects_duplicates() {
        let stone = BlockState::new("minecraft:stone".to_string());
        let result = Palette::from_states(vec![BlockState::air(), stone.clone(), stone]);
        assert!(matches!(result, Err(SchematicError::InvalidFormat(_))));
    }

    #[test]
    fn test_nbt_roundtrip() {
        let mut palette = Palette::new();
        palette.id_for_state(&BlockState::new("minecraft:stone".to_string()));
        palette.id_for_state(
            &BlockState::new("minecraft:oak_log".to_string())
                .with_property("axis".to_string(), "y".to_string()),
        );

        let parsed = Palette::from_nbt(&palette.to_nbt()).unwrap();
        assert_eq!(palette.states(), parsed.states());
        // the reverse index must be rebuilt too
        assert_eq!(
            parsed.id_of(&BlockState::new("minecraft:stone".to_string())),
            Some(1)
        );
    }
}
