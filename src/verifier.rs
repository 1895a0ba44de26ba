use rustc_hash::FxHashMap;

use crate::error::SchematicError;
use crate::placement::SchematicPlacement;
use crate::region::Region;
use crate::world::WorldView;
use crate::BlockPosition;
use crate::BlockState;

pub const DEFAULT_BATCH_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Outcome category for a single verified position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchType {
    Correct,
    Missing,
    Extra,
    WrongBlock,
    WrongState,
    Ignored,
}

impl MismatchType {
    pub const ALL: [MismatchType; 6] = [
        MismatchType::Correct,
        MismatchType::Missing,
        MismatchType::Extra,
        MismatchType::WrongBlock,
        MismatchType::WrongState,
        MismatchType::Ignored,
    ];

    fn index(self) -> usize {
        match self {
            MismatchType::Correct => 0,
            MismatchType::Missing => 1,
            MismatchType::Extra => 2,
            MismatchType::WrongBlock => 3,
            MismatchType::WrongState => 4,
            MismatchType::Ignored => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: MismatchType,
    pub expected: BlockState,
    pub found: Option<BlockState>,
}

/// Compares a region against the world a batch at a time, so a large scan
/// can be spread over many calls without blocking. Results accumulate
/// incrementally; counts and per-type position lists are O(1) to read at
/// any point during the scan.
///
/// Positions are reported in world coordinates, listed per type in scan
/// order (y-outer, then z, then x).
#[derive(Debug)]
pub struct RegionVerifier {
    state: VerifierState,
    cursor: usize,
    total: usize,
    batch_size: usize,
    classifications: FxHashMap<BlockPosition, Classification>,
    by_type: [Vec<BlockPosition>; 6],
    counts: [usize; 6],
}

impl Default for RegionVerifier {
    fn default() -> Self {
        RegionVerifier::new()
    }
}

impl RegionVerifier {
    pub fn new() -> Self {
        Self::with_batch_size(DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        RegionVerifier {
            state: VerifierState::Idle,
            cursor: 0,
            total: 0,
            batch_size: batch_size.max(1),
            classifications: FxHashMap::default(),
            by_type: Default::default(),
            counts: [0; 6],
        }
    }

    pub fn state(&self) -> VerifierState {
        self.state
    }

    /// (positions processed, total positions). Total is 0 until the first
    /// step call.
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.total)
    }

    /// Processes up to one batch of positions. The first call moves the
    /// verifier from `Idle` to `Running`; calls while `Paused` or `Finished`
    /// are no-ops. Returns the state after the batch.
    pub fn step(
        &mut self,
        region: &Region,
        world: &dyn WorldView,
        placement: &SchematicPlacement,
    ) -> Result<VerifierState, SchematicError> {
        match self.state {
            VerifierState::Idle => {
                self.total = region.volume();
                self.state = VerifierState::Running;
            }
            VerifierState::Running => {}
            VerifierState::Paused | VerifierState::Finished => return Ok(self.state),
        }

        let region_min = region.bounding_box().min;
        let end = (self.cursor + self.batch_size).min(self.total);
        while self.cursor < end {
            let (x, y, z) = region.index_to_coords(self.cursor);
            let expected = region.get_block_at(self.cursor)?.clone();
            let relative = BlockPosition::new(region_min.0 + x, region_min.1 + y, region_min.2 + z);
            let world_pos = placement.to_world(relative);
            let found = world.block_state_at(world_pos);

            let kind = classify(&expected, found.as_ref());
            self.counts[kind.index()] += 1;
            self.by_type[kind.index()].push(world_pos);
            self.classifications
                .insert(world_pos, Classification { kind, expected, found });
            self.cursor += 1;
        }

        if self.cursor == self.total {
            self.state = VerifierState::Finished;
            tracing::debug!(
                total = self.total,
                correct = self.counts[MismatchType::Correct.index()],
                "region verification finished"
            );
        }
        Ok(self.state)
    }

    /// Runs the scan to completion.
    pub fn run_to_end(
        &mut self,
        region: &Region,
        world: &dyn WorldView,
        placement: &SchematicPlacement,
    ) -> Result<(), SchematicError> {
        while self.step(region, world, placement)? != VerifierState::Finished {
            if self.state == VerifierState::Paused {
                break;
            }
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == VerifierState::Running {
            self.state = VerifierState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == VerifierState::Paused {
            self.state = VerifierState::Running;
        }
    }

    /// Discards all results and returns to `Idle`. Valid from any state.
    pub fn reset(&mut self) {
        self.state = VerifierState::Idle;
        self.cursor = 0;
        self.total = 0;
        self.classifications.clear();
        for list in &mut self.by_type {
            list.clear();
        }
        self.counts = [0; 6];
    }

    pub fn count(&self, kind: MismatchType) -> usize {
        self.counts[kind.index()]
    }

    pub fn mismatch_counts(&self) -> [(MismatchType, usize); 6] {
        let mut out = [(MismatchType::Correct, 0); 6];
        for (i, kind) in MismatchType::ALL.into_iter().enumerate() {
            out[i] = (kind, self.counts[kind.index()]);
        }
        out
    }

    pub fn positions_for_type(&self, kind: MismatchType) -> &[BlockPosition] {
        &self.by_type[kind.index()]
    }

    pub fn classification_at(&self, position: BlockPosition) -> Option<&Classification> {
        self.classifications.get(&position)
    }
}

/// `None` for `found` means the position is not loaded. An expected state
/// named `minecraft:structure_void` accepts any loaded world content.
fn classify(expected: &BlockState, found: Option<&BlockState>) -> MismatchType {
    let found = match found {
        Some(found) => found,
        None => return MismatchType::Ignored,
    };
    if expected.is_any() {
        return MismatchType::Correct;
    }
    match (expected.is_air(), found.is_air()) {
        (true, true) => MismatchType::Correct,
        (true, false) => MismatchType::Extra,
        (false, true) => MismatchType::Missing,
        (false, false) => {
            if expected == found {
                MismatchType::Correct
            } else if expected.name == found.name {
                MismatchType::WrongState
            } else {
                MismatchType::WrongBlock
            }
        }
    }
}
