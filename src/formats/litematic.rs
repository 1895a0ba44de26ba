use std::io::BufReader;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};

use crate::block_entity::BlockEntity;
use crate::container::PackedBlockStateContainer;
use crate::entity::Entity;
use crate::error::SchematicError;
use crate::palette::{bits_for_palette_len, Palette};
use crate::region::Region;
use crate::tick::ScheduledTick;
use crate::universal_schematic::UniversalSchematic;

const VERSION: i32 = 6;
const SUB_VERSION: i32 = 1;
const DEFAULT_DATA_VERSION: i32 = 3700;

/// Level 3 trades a slightly larger file for a much faster encode.
const COMPRESSION: flate2::Compression = flate2::Compression::new(3);

pub fn is_litematic(data: &[u8]) -> bool {
    let mut gz = GzDecoder::new(BufReader::new(data));
    let (root, _) = match quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed) {
        Ok(result) => result,
        Err(_) => return false,
    };
    root.get::<_, i32>("Version").is_ok()
        && root.get::<_, &NbtCompound>("Metadata").is_ok()
        && root.get::<_, &NbtCompound>("Regions").is_ok()
}

pub fn to_litematic(schematic: &UniversalSchematic) -> Result<Vec<u8>, SchematicError> {
    let mut root = NbtCompound::new();
    root.insert("Version", NbtTag::Int(VERSION));
    root.insert("SubVersion", NbtTag::Int(SUB_VERSION));
    root.insert(
        "MinecraftDataVersion",
        NbtTag::Int(schematic.metadata.mc_version.unwrap_or(DEFAULT_DATA_VERSION)),
    );
    root.insert("Metadata", NbtTag::Compound(create_metadata(schematic)));

    let mut regions = NbtCompound::new();
    for region in schematic.regions() {
        regions.insert(&region.name, NbtTag::Compound(region_to_nbt(region)?));
    }
    root.insert("Regions", NbtTag::Compound(regions));

    let mut encoder = GzEncoder::new(Vec::new(), COMPRESSION);
    quartz_nbt::io::write_nbt(&mut encoder, None, &root, Flavor::Uncompressed)
        .map_err(SchematicError::conversion)?;
    encoder.finish().map_err(SchematicError::conversion)
}

pub fn from_litematic(data: &[u8]) -> Result<UniversalSchematic, SchematicError> {
    let mut gz = GzDecoder::new(BufReader::new(data));
    let (root, _) = quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed)
        .map_err(SchematicError::conversion)?;

    let metadata_nbt = root
        .get::<_, &NbtCompound>("Metadata")
        .map_err(SchematicError::conversion)?;
    let mut schematic = UniversalSchematic::new(
        metadata_nbt
            .get::<_, &str>("Name")
            .map(String::from)
            .unwrap_or_else(|_| "Unnamed".to_string()),
    );
    let aggregate = crate::metadata::Metadata::from_nbt(metadata_nbt);
    schematic.metadata.author = aggregate.author;
    schematic.metadata.description = aggregate.description;
    schematic.metadata.created = aggregate.created;
    schematic.metadata.modified = aggregate.modified;
    schematic.metadata.mc_version = root.get::<_, i32>("MinecraftDataVersion").ok();
    schematic.metadata.schematic_version = root.get::<_, i32>("Version").ok();

    let regions = root
        .get::<_, &NbtCompound>("Regions")
        .map_err(SchematicError::conversion)?;
    for (name, tag) in regions.inner() {
        if let NbtTag::Compound(region_nbt) = tag {
            schematic.add_region(region_from_nbt(name.clone(), region_nbt)?)?;
        }
    }
    Ok(schematic)
}

fn create_metadata(schematic: &UniversalSchematic) -> NbtCompound {
    let mut metadata = schematic.metadata.to_nbt();
    let now = chrono::Utc::now().timestamp_millis();
    if schematic.metadata.created.is_none() {
        metadata.insert("TimeCreated", NbtTag::Long(now));
    }
    if schematic.metadata.modified.is_none() {
        metadata.insert(
            "TimeModified",
            NbtTag::Long(schematic.metadata.created.unwrap_or(now)),
        );
    }
    metadata.insert("Software", NbtTag::String("minecraft_schematic_engine".to_string()));
    metadata
}

fn region_to_nbt(region: &Region) -> Result<NbtCompound, SchematicError> {
    let mut nbt = NbtCompound::new();
    nbt.insert("Position", xyz_compound(region.position));
    nbt.insert("Size", xyz_compound(region.size));

    // Readers derive the packed width from the palette length and expect
    // air at index 0, so re-pack through a normalized palette.
    let (palette, container) = air_first_palette(region)?;
    nbt.insert("BlockStatePalette", NbtTag::List(palette.to_nbt()));
    nbt.insert("BlockStates", NbtTag::LongArray(container.as_long_array()));

    let entities = NbtList::from(
        region
            .entities
            .iter()
            .map(Entity::to_nbt)
            .collect::<Vec<NbtTag>>(),
    );
    nbt.insert("Entities", NbtTag::List(entities));

    let tile_entities = NbtList::from(
        region
            .block_entities
            .values()
            .map(BlockEntity::to_nbt)
            .collect::<Vec<NbtTag>>(),
    );
    nbt.insert("TileEntities", NbtTag::List(tile_entities));

    let mut block_ticks: Vec<(&(i32, i32, i32), &ScheduledTick)> =
        region.block_ticks.iter().collect();
    block_ticks.sort_by_key(|(pos, _)| **pos);
    let pending = NbtList::from(
        block_ticks
            .into_iter()
            .map(|(pos, tick)| tick.to_nbt(*pos))
            .collect::<Vec<NbtTag>>(),
    );
    nbt.insert("PendingBlockTicks", NbtTag::List(pending));
    nbt.insert("PendingFluidTicks", NbtTag::List(NbtList::new()));
    Ok(nbt)
}

fn region_from_nbt(name: String, nbt: &NbtCompound) -> Result<Region, SchematicError> {
    let position = read_xyz(nbt, "Position")?;
    let size = read_xyz(nbt, "Size")?;

    let palette_list = nbt
        .get::<_, &NbtList>("BlockStatePalette")
        .map_err(SchematicError::conversion)?;
    let palette = Palette::from_nbt(palette_list)?;

    let words = nbt
        .get::<_, &[i64]>("BlockStates")
        .map_err(SchematicError::conversion)?;
    let (sx, sy, sz) = (
        size.0.unsigned_abs() as usize,
        size.1.unsigned_abs() as usize,
        size.2.unsigned_abs() as usize,
    );
    let container = PackedBlockStateContainer::from_long_array(
        sx.max(1),
        sy.max(1),
        sz.max(1),
        bits_for_palette_len(palette.len()),
        words,
    )?;

    let mut region = Region::from_parts(name, position, size, palette, container)?;

    if let Ok(entities) = nbt.get::<_, &NbtList>("Entities") {
        for tag in entities.iter() {
            if let NbtTag::Compound(compound) = tag {
                let entity = Entity::from_nbt(compound).map_err(SchematicError::InvalidFormat)?;
                region.add_entity(entity);
            }
        }
    }
    if let Ok(tile_entities) = nbt.get::<_, &NbtList>("TileEntities") {
        for tag in tile_entities.iter() {
            if let NbtTag::Compound(compound) = tag {
                let block_entity =
                    BlockEntity::from_nbt(compound).map_err(SchematicError::InvalidFormat)?;
                region.add_block_entity(block_entity);
            }
        }
    }
    if let Ok(ticks) = nbt.get::<_, &NbtList>("PendingBlockTicks") {
        for tag in ticks.iter() {
            if let NbtTag::Compound(compound) = tag {
                let (pos, tick) =
                    ScheduledTick::from_nbt(compound).map_err(SchematicError::InvalidFormat)?;
                region.add_block_tick(pos, tick);
            }
        }
    }
    Ok(region)
}

/// Returns the region's palette and container with air guaranteed at index
/// 0 and the container packed at exactly the width the palette implies.
fn air_first_palette(
    region: &Region,
) -> Result<(Palette, PackedBlockStateContainer), SchematicError> {
    let mut palette = Palette::new();
    let remap: Vec<usize> = region
        .palette()
        .iter()
        .map(|state| palette.id_for_state(state))
        .collect();
    let mut container = region.container().clone();
    container.swap_and_resize(&remap, palette.len())?;
    Ok((palette, container))
}

fn xyz_compound(value: (i32, i32, i32)) -> NbtTag {
    let mut compound = NbtCompound::new();
    compound.insert("x", NbtTag::Int(value.0));
    compound.insert("y", NbtTag::Int(value.1));
    compound.insert("z", NbtTag::Int(value.2));
    NbtTag::Compound(compound)
}

fn read_xyz(nbt: &NbtCompound, key: &str) -> Result<(i32, i32, i32), SchematicError> {
    let compound = nbt
        .get::<_, &NbtCompound>(key)
        .map_err(SchematicError::conversion)?;
    Ok((
        compound.get::<_, i32>("x").map_err(SchematicError::conversion)?,
        compound.get::<_, i32>("y").map_err(SchematicError::conversion)?,
        compound.get::<_, i32>("z").map_err(SchematicError::conversion)?,
    ))
}
