mod block_entity;
mod block_position;
mod block_state;
mod bounding_box;
mod capture;
mod container;
mod entity;
mod error;
mod metadata;
mod palette;
mod placement;
mod print_utils;
mod region;
mod selection;
mod tick;
mod universal_schematic;
mod verifier;
mod world;

pub mod formats;

// Public re-exports
pub use block_entity::BlockEntity;
pub use block_position::BlockPosition;
pub use block_state::{BlockState, ANY_STATE_NAME};
pub use bounding_box::BoundingBox;
pub use capture::{
    capture_blocks_within_volume, capture_entities_within_volume, capture_from_world,
    create_empty_schematic, CaptureOptions,
};
pub use container::PackedBlockStateContainer;
pub use entity::Entity;
pub use error::SchematicError;
pub use formats::{convert, load, save_to_file, SchematicFormat};
pub use metadata::Metadata;
pub use palette::{bits_for_palette_len, Palette, MIN_BITS_PER_ENTRY};
pub use placement::{Mirror, Rotation, SchematicPlacement};
pub use print_utils::{format_mismatch_summary, format_schematic};
pub use region::Region;
pub use selection::{AreaSelection, SelectionBox};
pub use tick::ScheduledTick;
pub use universal_schematic::UniversalSchematic;
pub use verifier::{
    Classification, MismatchType, RegionVerifier, VerifierState, DEFAULT_BATCH_SIZE,
};
pub use world::{
    CollectingFeedback, FeedbackSink, MemoryWorld, Severity, TracingFeedback, WorldEntity,
    WorldView,
};
