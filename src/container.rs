use serde::{Deserialize, Serialize};

use crate::error::SchematicError;
use crate::palette::{bits_for_palette_len, MIN_BITS_PER_ENTRY};

/// Dense 3D array of palette indices packed into 64-bit words at
/// `bits_per_entry` granularity.
///
/// Entries are written least-significant-bit first and may straddle a word
/// boundary; this layout is exactly the litematic `BlockStates` long array,
/// so `as_long_array`/`from_long_array` are byte-for-byte format bridges.
/// Linear ordering is `(y * size_z + z) * size_x + x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedBlockStateContainer {
    size: (usize, usize, usize),
    bits_per_entry: usize,
    data: Vec<u64>,
}

impl PackedBlockStateContainer {
    pub fn new(size_x: usize, size_y: usize, size_z: usize) -> Self {
        Self::with_bits(size_x, size_y, size_z, MIN_BITS_PER_ENTRY)
    }

    pub fn with_bits(size_x: usize, size_y: usize, size_z: usize, bits: usize) -> Self {
        assert!(size_x >= 1 && size_y >= 1 && size_z >= 1, "container dimensions must be >= 1");
        let bits = bits.max(MIN_BITS_PER_ENTRY);
        let volume = size_x * size_y * size_z;
        PackedBlockStateContainer {
            size: (size_x, size_y, size_z),
            bits_per_entry: bits,
            data: vec![0u64; word_count(volume, bits)],
        }
    }

    /// Rehydrates a container from an on-disk long array. The array length
    /// must match the packed volume exactly.
    pub fn from_long_array(
        size_x: usize,
        size_y: usize,
        size_z: usize,
        bits: usize,
        words: &[i64],
    ) -> Result<Self, SchematicError> {
        let bits = bits.max(MIN_BITS_PER_ENTRY);
        let volume = size_x * size_y * size_z;
        let expected = word_count(volume, bits);
        if words.len() != expected {
            return Err(SchematicError::InvalidFormat(format!(
                "packed block state array has {} words, expected {} for {}x{}x{} at {} bits",
                words.len(),
                expected,
                size_x,
                size_y,
                size_z,
                bits
            )));
        }
        Ok(PackedBlockStateContainer {
            size: (size_x, size_y, size_z),
            bits_per_entry: bits,
            data: words.iter().map(|&w| w as u64).collect(),
        })
    }

    pub fn size(&self) -> (usize, usize, usize) {
        self.size
    }

    pub fn volume(&self) -> usize {
        self.size.0 * self.size.1 * self.size.2
    }

    pub fn bits_per_entry(&self) -> usize {
        self.bits_per_entry
    }

    pub fn as_long_array(&self) -> Vec<i64> {
        self.data.iter().map(|&w| w as i64).collect()
    }

    fn linear_index(&self, x: i32, y: i32, z: i32) -> Result<usize, SchematicError> {
        let (sx, sy, sz) = self.size;
        if x < 0 || y < 0 || z < 0 || x as usize >= sx || y as usize >= sy || z as usize >= sz {
            return Err(SchematicError::out_of_bounds(x, y, z, self.size));
        }
        Ok((y as usize * sz + z as usize) * sx + x as usize)
    }

    pub fn get(&self, x: i32, y: i32, z: i32) -> Result<usize, SchematicError> {
        Ok(self.get_at(self.linear_index(x, y, z)?))
    }

    /// Unchecked-by-position read at a linear index in scan order.
    pub fn get_at(&self, index: usize) -> usize {
        debug_assert!(index < self.volume());
        read_entry(&self.data, self.bits_per_entry, index)
    }

    /// Writes a palette index. If `index` does not fit the current bit width
    /// the whole backing buffer is re-packed at the smallest width that does;
    /// widths only ever grow.
    pub fn set(&mut self, x: i32, y: i32, z: i32, index: usize) -> Result<(), SchematicError> {
        let linear = self.linear_index(x, y, z)?;
        self.set_at(linear, index);
        Ok(())
    }

    pub fn set_at(&mut self, linear: usize, index: usize) {
        debug_assert!(linear < self.volume());
        let needed = bits_for_index(index);
        if needed > self.bits_per_entry {
            self.grow(needed);
        }
        write_entry(&mut self.data, self.bits_per_entry, linear, index as u64);
    }

    fn grow(&mut self, new_bits: usize) {
        let volume = self.volume();
        let mut new_data = vec![0u64; word_count(volume, new_bits)];
        for i in 0..volume {
            let value = read_entry(&self.data, self.bits_per_entry, i);
            write_entry(&mut new_data, new_bits, i, value as u64);
        }
        tracing::debug!(
            old_bits = self.bits_per_entry,
            new_bits,
            volume,
            "re-packing block state container"
        );
        self.bits_per_entry = new_bits;
        self.data = new_data;
    }

    /// Remaps every stored index through `remap` and re-packs at the width
    /// required by `new_palette_len`. Used when unioning palettes during
    /// region merges.
    pub fn swap_and_resize(
        &mut self,
        remap: &[usize],
        new_palette_len: usize,
    ) -> Result<(), SchematicError> {
        let new_bits = bits_for_palette_len(new_palette_len).max(self.bits_per_entry);
        let volume = self.volume();
        let mut new_data = vec![0u64; word_count(volume, new_bits)];
        for i in 0..volume {
            let old = read_entry(&self.data, self.bits_per_entry, i);
            let mapped = *remap.get(old).ok_or(SchematicError::CorruptPalette {
                index: old,
                palette_size: remap.len(),
            })?;
            write_entry(&mut new_data, new_bits, i, mapped as u64);
        }
        self.bits_per_entry = new_bits;
        self.data = new_data;
        Ok(())
    }
}

fn word_count(volume: usize, bits: usize) -> usize {
    (volume * bits + 63) / 64
}

/// Minimum width able to hold `index`, clamped to the format floor.
fn bits_for_index(index: usize) -> usize {
    if index == 0 {
        MIN_BITS_PER_ENTRY
    } else {
        ((usize::BITS - index.leading_zeros()) as usize).max(MIN_BITS_PER_ENTRY)
    }
}

// The two functions below are the only place that knows how entries straddle
// word boundaries. Everything else treats the buffer as width-agnostic.

fn read_entry(data: &[u64], bits: usize, index: usize) -> usize {
    let mask = (1u64 << bits) - 1;
    let bit_index = index * bits;
    let word = bit_index >> 6;
    let offset = bit_index & 63;

    if offset + bits <= 64 {
        ((data[word] >> offset) & mask) as usize
    } else {
        let low = data[word] >> offset;
        let high = data[word + 1] << (64 - offset);
        ((low | high) & mask) as usize
    }
}

fn write_entry(data: &mut [u64], bits: usize, index: usize, value: u64) {
    let mask = (1u64 << bits) - 1;
    let value = value & mask;
    let bit_index = index * bits;
    let word = bit_index >> 6;
    let offset = bit_index & 63;

    data[word] = (data[word] & !(mask << offset)) | (value << offset);

    if offset + bits > 64 {
        let spill = bits - (64 - offset);
        let spill_mask = (1u64 << spill) - 1;
        data[word + 1] = (data[word + 1] & !spill_mask) | (value >> (64 - offset));
    }
}
