use std::collections::HashSet;

use crate::bounding_box::BoundingBox;
use crate::entity::Entity;
use crate::error::SchematicError;
use crate::region::Region;
use crate::selection::AreaSelection;
use crate::tick::ScheduledTick;
use crate::universal_schematic::UniversalSchematic;
use crate::world::{FeedbackSink, Severity, WorldView};
use crate::block_entity::BlockEntity;
use crate::BlockPosition;

const CHUNK_SIZE: i32 = 16;

#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureOptions {
    pub ignore_entities: bool,
}

/// Builds an all-air schematic shaped like `area`, one region per selection
/// box, with creation timestamps set.
pub fn create_empty_schematic(
    area: &AreaSelection,
    author: &str,
) -> Result<UniversalSchematic, SchematicError> {
    let mut schematic = UniversalSchematic::new(area.name.clone());
    schematic.metadata.author = Some(author.to_string());
    let now = chrono::Utc::now().timestamp_millis();
    schematic.metadata.created = Some(now);
    schematic.metadata.modified = Some(now);

    for selection in &area.boxes {
        let position = (
            selection.pos1.0 - area.origin.0,
            selection.pos1.1 - area.origin.1,
            selection.pos1.2 - area.origin.2,
        );
        schematic.add_region(Region::new(selection.name.clone(), position, selection.size()))?;
    }
    Ok(schematic)
}

/// Captures the world content of `area` into a new schematic. Each selection
/// box becomes one region; a box that fails to capture is reported through
/// `feedback` and skipped without aborting its siblings.
pub fn capture_from_world(
    world: &dyn WorldView,
    area: &AreaSelection,
    author: &str,
    options: CaptureOptions,
    feedback: &mut dyn FeedbackSink,
) -> Result<UniversalSchematic, SchematicError> {
    let mut schematic = UniversalSchematic::new(area.name.clone());
    schematic.metadata.author = Some(author.to_string());
    let now = chrono::Utc::now().timestamp_millis();
    schematic.metadata.created = Some(now);
    schematic.metadata.modified = Some(now);

    // shared across regions so an entity straddling two boxes is captured once
    let mut seen_entities: HashSet<u128> = HashSet::new();

    for selection in &area.boxes {
        // capture with the region anchored in world space, then re-anchor it
        // relative to the selection origin once its contents are in
        let mut region = Region::new(selection.name.clone(), selection.pos1, selection.size());
        let bounds = selection.bounding_box();

        let result = capture_blocks_within_volume(world, &mut region, &bounds).and_then(|_| {
            if options.ignore_entities {
                Ok(())
            } else {
                capture_entities_within_volume(world, &mut region, &bounds, &mut seen_entities)
            }
        });
        region.position = (
            region.position.0 - area.origin.0,
            region.position.1 - area.origin.1,
            region.position.2 - area.origin.2,
        );

        match result.and_then(|_| schematic.add_region(region)) {
            Ok(()) => {}
            Err(err) => {
                feedback.report(
                    Severity::Error,
                    &format!("failed to capture region '{}': {}", selection.name, err),
                );
            }
        }
    }

    tracing::info!(
        regions = schematic.regions().len(),
        total_blocks = schematic.total_blocks(),
        "captured schematic '{}'",
        area.name
    );
    Ok(schematic)
}

/// Copies blocks, block entities and pending ticks from `bounds` in the
/// world into `region`. The volume is walked one chunk column at a time;
/// within each column the order is y-outer, then z, then x.
///
/// `bounds` may be a clamped slice of the region's volume; stored positions
/// are always relative to the region's own minimum corner, so tiled passes
/// over disjoint slices assemble the same region as one full pass.
pub fn capture_blocks_within_volume(
    world: &dyn WorldView,
    region: &mut Region,
    bounds: &BoundingBox,
) -> Result<(), SchematicError> {
    let region_min = region.bounding_box().min;
    for (chunk_min, chunk_max) in chunk_columns(bounds) {
        for y in bounds.min.1..=bounds.max.1 {
            for z in chunk_min.1..=chunk_max.1 {
                for x in chunk_min.0..=chunk_max.0 {
                    let world_pos = BlockPosition::new(x, y, z);
                    let rel = (x - region_min.0, y - region_min.1, z - region_min.2);
                    if let Some(state) = world.block_state_at(world_pos) {
                        if !state.is_air() {
                            region.set_block(rel.0, rel.1, rel.2, &state)?;
                        }
                        if let Some(data) = world.block_entity_at(world_pos) {
                            let id = data
                                .get::<_, &str>("id")
                                .map(String::from)
                                .unwrap_or_default();
                            let mut block_entity = BlockEntity::new(id, rel);
                            block_entity.data = data;
                            region.add_block_entity(block_entity);
                        }
                    }
                }
            }
        }
    }

    for (pos, block, delay, priority) in world.pending_ticks_in(bounds) {
        let rel = (pos.x - region_min.0, pos.y - region_min.1, pos.z - region_min.2);
        region.add_block_tick(rel, ScheduledTick::new(block, delay, priority));
    }
    Ok(())
}

/// Copies entities inside `bounds` into `region`, converting positions to
/// offsets from the region's minimum corner even when `bounds` is a clamped
/// slice of the region. `seen` carries UUIDs already captured so repeated or
/// overlapping passes never duplicate an entity.
pub fn capture_entities_within_volume(
    world: &dyn WorldView,
    region: &mut Region,
    bounds: &BoundingBox,
    seen: &mut HashSet<u128>,
) -> Result<(), SchematicError> {
    let region_min = region.bounding_box().min;
    for world_entity in world.entities_in(bounds) {
        if !seen.insert(world_entity.uuid) {
            continue;
        }
        let mut entity = Entity::new(
            world_entity.id,
            world_entity.uuid,
            (
                world_entity.position.0 - region_min.0 as f64,
                world_entity.position.1 - region_min.1 as f64,
                world_entity.position.2 - region_min.2 as f64,
            ),
        );
        entity.data = world_entity.data;
        region.add_entity(entity);
    }
    Ok(())
}

/// Splits `bounds` into its intersections with 16x16 chunk columns,
/// yielding ((min_x, min_z), (max_x, max_z)) pairs in z-then-x chunk order.
fn chunk_columns(bounds: &BoundingBox) -> Vec<((i32, i32), (i32, i32))> {
    let mut columns = Vec::new();
    let chunk_z_start = bounds.min.2.div_euclid(CHUNK_SIZE);
    let chunk_z_end = bounds.max.2.div_euclid(CHUNK_SIZE);
    let chunk_x_start = bounds.min.0.div_euclid(CHUNK_SIZE);
    let chunk_x_end = bounds.max.0.div_euclid(CHUNK_SIZE);

    for cz in chunk_z_start..=chunk_z_end {
        for cx in chunk_x_start..=chunk_x_end {
            let min = (
                (cx * CHUNK_SIZE).max(bounds.min.0),
                (cz * CHUNK_SIZE).max(bounds.min.2),
            );
            let max = (
                (cx * CHUNK_SIZE + CHUNK_SIZE - 1).min(bounds.max.0),
                (cz * CHUNK_SIZE + CHUNK_SIZE - 1).min(bounds.max.2),
            );
            columns.push((min, max));
        }
    }
    columns
}
