use std::collections::HashMap;

use quartz_nbt::NbtCompound;

use crate::bounding_box::BoundingBox;
use crate::BlockPosition;
use crate::BlockState;

/// Read-only view of a block world. Capture and verification query the
/// world through this trait; `None` from `block_state_at` means the
/// position is not loaded, which callers treat differently from air.
pub trait WorldView {
    fn block_state_at(&self, position: BlockPosition) -> Option<BlockState>;

    fn block_entity_at(&self, position: BlockPosition) -> Option<NbtCompound>;

    /// Entities whose position lies within `bounds`.
    fn entities_in(&self, bounds: &BoundingBox) -> Vec<WorldEntity>;

    /// Scheduled block ticks within `bounds`, as (position, block id,
    /// remaining delay, priority). Worlds without tick access return none.
    fn pending_ticks_in(&self, _bounds: &BoundingBox) -> Vec<(BlockPosition, String, i32, i32)> {
        Vec::new()
    }
}

/// An entity as read from a world, in absolute coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldEntity {
    pub id: String,
    pub uuid: u128,
    pub position: (f64, f64, f64),
    pub data: NbtCompound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Receives user-facing progress and failure messages from long-running
/// operations. Failures reported here are non-fatal; the operation skips
/// the affected piece and continues.
pub trait FeedbackSink {
    fn report(&mut self, severity: Severity, message: &str);
}

/// Forwards feedback to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingFeedback;

impl FeedbackSink for TracingFeedback {
    fn report(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!("{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }
    }
}

/// Collects feedback in memory, mainly for tests.
#[derive(Debug, Default)]
pub struct CollectingFeedback {
    pub messages: Vec<(Severity, String)>,
}

impl FeedbackSink for CollectingFeedback {
    fn report(&mut self, severity: Severity, message: &str) {
        self.messages.push((severity, message.to_string()));
    }
}

/// Sparse in-memory world. Positions without an explicit entry are loaded
/// air by default; positions listed in `unloaded` report as not loaded.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    blocks: HashMap<BlockPosition, BlockState>,
    block_entities: HashMap<BlockPosition, NbtCompound>,
    entities: Vec<WorldEntity>,
    ticks: Vec<(BlockPosition, String, i32, i32)>,
    unloaded: std::collections::HashSet<BlockPosition>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        MemoryWorld::default()
    }

    pub fn set_block(&mut self, position: BlockPosition, state: BlockState) {
        self.blocks.insert(position, state);
    }

    pub fn set_block_entity(&mut self, position: BlockPosition, data: NbtCompound) {
        self.block_entities.insert(position, data);
    }

    pub fn add_entity(&mut self, entity: WorldEntity) {
        self.entities.push(entity);
    }

    pub fn add_pending_tick(&mut self, position: BlockPosition, block: String, delay: i32, priority: i32) {
        self.ticks.push((position, block, delay, priority));
    }

    pub fn mark_unloaded(&mut self, position: BlockPosition) {
        self.unloaded.insert(position);
    }
}

impl WorldView for MemoryWorld {
    fn block_state_at(&self, position: BlockPosition) -> Option<BlockState> {
        if self.unloaded.contains(&position) {
            return None;
        }
        Some(
            self.blocks
                .get(&position)
                .cloned()
                .unwrap_or_else(BlockState::air),
        )
    }

    fn block_entity_at(&self, position: BlockPosition) -> Option<NbtCompound> {
        self.block_entities.get(&position).cloned()
    }

    fn entities_in(&self, bounds: &BoundingBox) -> Vec<WorldEntity> {
        self.entities
            .iter()
            .filter(|e| {
                bounds.contains((
                    e.position.0.floor() as i32,
                    e.position.1.floor() as i32,
                    e.position.2.floor() as i32,
                ))
            })
            .cloned()
            .collect()
    }

    fn pending_ticks_in(&self, bounds: &BoundingBox) -> Vec<(BlockPosition, String, i32, i32)> {
        self.ticks
            .iter()
            .filter(|(pos, _, _, _)| bounds.contains((pos.x, pos.y, pos.z)))
            .cloned()
            .collect()
    }
}
