use std::collections::HashMap;

use crate::block_entity::BlockEntity;
use crate::bounding_box::BoundingBox;
use crate::container::PackedBlockStateContainer;
use crate::entity::Entity;
use crate::error::SchematicError;
use crate::palette::Palette;
use crate::tick::ScheduledTick;
use crate::BlockPosition;
use crate::BlockState;

/// One named cuboid sub-region: palette + packed container + per-position
/// auxiliary data.
///
/// `position` is the first selection corner and `size` keeps its per-axis
/// sign, so the original selection orientation survives save/load. Cell
/// coordinates passed to `get_block`/`set_block` are relative to the
/// *minimum* corner of the covered volume, in `[0, abs(size))` per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub position: (i32, i32, i32),
    pub size: (i32, i32, i32),
    palette: Palette,
    container: PackedBlockStateContainer,
    pub block_entities: HashMap<(i32, i32, i32), BlockEntity>,
    pub block_ticks: HashMap<(i32, i32, i32), ScheduledTick>,
    pub entities: Vec<Entity>,
}

impl Region {
    pub fn new(name: String, position: (i32, i32, i32), size: (i32, i32, i32)) -> Self {
        let (sx, sy, sz) = abs_dimensions(size);
        Region {
            name,
            position,
            size,
            palette: Palette::new(),
            container: PackedBlockStateContainer::new(sx, sy, sz),
            block_entities: HashMap::new(),
            block_ticks: HashMap::new(),
            entities: Vec::new(),
        }
    }

    /// Reassembles a region from loaded parts, validating that the container
    /// matches the declared size.
    pub fn from_parts(
        name: String,
        position: (i32, i32, i32),
        size: (i32, i32, i32),
        palette: Palette,
        container: PackedBlockStateContainer,
    ) -> Result<Self, SchematicError> {
        if container.size() != abs_dimensions(size) {
            return Err(SchematicError::InvalidFormat(format!(
                "container size {:?} does not match region size {:?}",
                container.size(),
                size
            )));
        }
        Ok(Region {
            name,
            position,
            size,
            palette,
            container,
            block_entities: HashMap::new(),
            block_ticks: HashMap::new(),
            entities: Vec::new(),
        })
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_size(self.position, self.size)
    }

    /// Absolute dimensions of the covered volume.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        self.container.size()
    }

    pub fn volume(&self) -> usize {
        self.container.volume()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn container(&self) -> &PackedBlockStateContainer {
        &self.container
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: &BlockState) -> Result<(), SchematicError> {
        let index = self.palette.id_for_state(block);
        self.container.set(x, y, z, index)
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Result<&BlockState, SchematicError> {
        let index = self.container.get(x, y, z)?;
        self.palette.state_for_id(index)
    }

    /// State at a linear scan-order index. Scan order is y-outer, then z,
    /// then x, matching the packed layout.
    pub fn get_block_at(&self, linear: usize) -> Result<&BlockState, SchematicError> {
        self.palette.state_for_id(self.container.get_at(linear))
    }

    pub fn coords_to_index(&self, x: i32, y: i32, z: i32) -> Result<usize, SchematicError> {
        let (sx, sy, sz) = self.container.size();
        if x < 0 || y < 0 || z < 0 || x as usize >= sx || y as usize >= sy || z as usize >= sz {
            return Err(SchematicError::out_of_bounds(x, y, z, (sx, sy, sz)));
        }
        Ok((y as usize * sz + z as usize) * sx + x as usize)
    }

    pub fn index_to_coords(&self, index: usize) -> (i32, i32, i32) {
        let (sx, _, sz) = self.container.size();
        let x = index % sx;
        let z = (index / sx) % sz;
        let y = index / (sx * sz);
        (x as i32, y as i32, z as i32)
    }

    pub fn iter_blocks(&self) -> impl Iterator<Item = (BlockPosition, &BlockState)> {
        (0..self.volume()).map(move |i| {
            let (x, y, z) = self.index_to_coords(i);
            let state = self
                .palette
                .state_for_id(self.container.get_at(i))
                .expect("container holds an index outside its own palette");
            (BlockPosition::new(x, y, z), state)
        })
    }

    /// Number of non-air cells.
    pub fn count_blocks(&self) -> usize {
        let air_ids: Vec<bool> = self.palette.iter().map(|s| s.is_air()).collect();
        (0..self.volume())
            .filter(|&i| !air_ids.get(self.container.get_at(i)).copied().unwrap_or(false))
            .count()
    }

    pub fn count_block_types(&self) -> HashMap<BlockState, usize> {
        let mut counts = HashMap::new();
        for (_, state) in self.iter_blocks() {
            *counts.entry(state.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn add_block_entity(&mut self, block_entity: BlockEntity) {
        self.block_entities.insert(block_entity.position, block_entity);
    }

    pub fn add_block_tick(&mut self, position: (i32, i32, i32), tick: ScheduledTick) {
        self.block_ticks.insert(position, tick);
    }

    /// Merges `other` into this region over their world-space union. Both
    /// palettes are unioned and every stored index of this region is remapped
    /// through `swap_and_resize`; `other`'s non-air cells then overwrite.
    /// The merged region is min-corner anchored, so selection orientation is
    /// not preserved across a merge.
    pub fn merge(&mut self, other: &Region) -> Result<(), SchematicError> {
        let old_box = self.bounding_box();
        let union_box = old_box.union(&other.bounding_box());
        let (ux, uy, uz) = union_box.get_dimensions();

        // union palette, with remap tables for both sides
        let mut palette = self.palette.clone();
        let remap_other: Vec<usize> = other
            .palette
            .iter()
            .map(|state| palette.id_for_state(state))
            .collect();
        let identity: Vec<usize> = (0..self.palette.len()).collect();

        if union_box == old_box {
            self.container.swap_and_resize(&identity, palette.len())?;
        } else {
            let mut container =
                PackedBlockStateContainer::new(ux as usize, uy as usize, uz as usize);
            for i in 0..self.volume() {
                let (x, y, z) = self.index_to_coords(i);
                let world = (
                    old_box.min.0 + x,
                    old_box.min.1 + y,
                    old_box.min.2 + z,
                );
                container.set(
                    world.0 - union_box.min.0,
                    world.1 - union_box.min.1,
                    world.2 - union_box.min.2,
                    self.container.get_at(i),
                )?;
            }
            // auxiliary data is keyed relative to the min corner, which moved
            let delta = (
                old_box.min.0 - union_box.min.0,
                old_box.min.1 - union_box.min.1,
                old_box.min.2 - union_box.min.2,
            );
            self.translate_aux(delta);
            self.container = container;
            self.container.swap_and_resize(&identity, palette.len())?;
        }

        let other_box = other.bounding_box();
        for i in 0..other.volume() {
            let index = other.container().get_at(i);
            let state = other.palette.state_for_id(index)?;
            if state.is_air() {
                continue;
            }
            let (x, y, z) = other.index_to_coords(i);
            self.container.set(
                other_box.min.0 + x - union_box.min.0,
                other_box.min.1 + y - union_box.min.1,
                other_box.min.2 + z - union_box.min.2,
                remap_other[index],
            )?;
        }

        let other_delta = (
            other_box.min.0 - union_box.min.0,
            other_box.min.1 - union_box.min.1,
            other_box.min.2 - union_box.min.2,
        );
        for (pos, be) in &other.block_entities {
            let pos = (pos.0 + other_delta.0, pos.1 + other_delta.1, pos.2 + other_delta.2);
            let mut be = be.clone();
            be.position = pos;
            self.block_entities.insert(pos, be);
        }
        for (pos, tick) in &other.block_ticks {
            let pos = (pos.0 + other_delta.0, pos.1 + other_delta.1, pos.2 + other_delta.2);
            self.block_ticks.insert(pos, tick.clone());
        }
        for entity in &other.entities {
            let mut entity = entity.clone();
            entity.position = (
                entity.position.0 + other_delta.0 as f64,
                entity.position.1 + other_delta.1 as f64,
                entity.position.2 + other_delta.2 as f64,
            );
            self.entities.push(entity);
        }

        self.palette = palette;
        self.position = union_box.min;
        self.size = union_box.get_dimensions();
        Ok(())
    }

    fn translate_aux(&mut self, delta: (i32, i32, i32)) {
        if delta == (0, 0, 0) {
            return;
        }
        self.block_entities = self
            .block_entities
            .drain()
            .map(|(pos, mut be)| {
                let pos = (pos.0 + delta.0, pos.1 + delta.1, pos.2 + delta.2);
                be.position = pos;
                (pos, be)
            })
            .collect();
        self.block_ticks = self
            .block_ticks
            .drain()
            .map(|(pos, tick)| ((pos.0 + delta.0, pos.1 + delta.1, pos.2 + delta.2), tick))
            .collect();
        for entity in &mut self.entities {
            entity.position = (
                entity.position.0 + delta.0 as f64,
                entity.position.1 + delta.1 as f64,
                entity.position.2 + delta.2 as f64,
            );
        }
    }
}

fn abs_dimensions(size: (i32, i32, i32)) -> (usize, usize, usize) {
    (
        (size.0.unsigned_abs() as usize).max(1),
        (size.1.unsigned_abs() as usize).max(1),
        (size.2.unsigned_abs() as usize).max(1),
    )
}
