use std::io::{BufReader, Cursor, Read};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};

use crate::block_entity::BlockEntity;
use crate::entity::Entity;
use crate::error::SchematicError;
use crate::region::Region;
use crate::universal_schematic::UniversalSchematic;
use crate::BlockState;

const VERSION: i32 = 2;
const DEFAULT_DATA_VERSION: i32 = 3700;

pub fn is_schematic(data: &[u8]) -> bool {
    let mut gz = GzDecoder::new(BufReader::new(data));
    let (root, _) = match quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed) {
        Ok(result) => result,
        Err(_) => return false,
    };
    root.get::<_, i16>("Width").is_ok()
        && root.get::<_, i16>("Height").is_ok()
        && root.get::<_, i16>("Length").is_ok()
        && root.get::<_, &NbtCompound>("Palette").is_ok()
}

/// Serializes to Sponge .schem version 2. All regions are merged into one
/// volume; the per-region structure does not survive this format.
pub fn to_schematic(schematic: &UniversalSchematic) -> Result<Vec<u8>, SchematicError> {
    let merged = schematic.get_merged_region()?;
    let (width, height, length) = merged.dimensions();

    let mut root = NbtCompound::new();
    root.insert("Version", NbtTag::Int(VERSION));
    root.insert(
        "DataVersion",
        NbtTag::Int(schematic.metadata.mc_version.unwrap_or(DEFAULT_DATA_VERSION)),
    );
    root.insert("Width", NbtTag::Short(width as i16));
    root.insert("Height", NbtTag::Short(height as i16));
    root.insert("Length", NbtTag::Short(length as i16));
    root.insert(
        "Offset",
        NbtTag::IntArray(vec![merged.position.0, merged.position.1, merged.position.2]),
    );

    let mut palette = NbtCompound::new();
    for (id, state) in merged.palette().iter().enumerate() {
        palette.insert(&palette_key(state), NbtTag::Int(id as i32));
    }
    root.insert("PaletteMax", NbtTag::Int(merged.palette().len() as i32));
    root.insert("Palette", NbtTag::Compound(palette));

    // x-fastest, then z, then y, which is the container's linear order
    let mut block_data = Vec::new();
    for i in 0..merged.volume() {
        encode_varint(merged.container().get_at(i) as i32, &mut block_data);
    }
    root.insert(
        "BlockData",
        NbtTag::ByteArray(block_data.iter().map(|&b| b as i8).collect()),
    );

    let mut block_entities = NbtList::new();
    for block_entity in merged.block_entities.values() {
        let mut nbt = block_entity.data.clone();
        nbt.insert("Id", NbtTag::String(block_entity.id.clone()));
        nbt.insert(
            "Pos",
            NbtTag::IntArray(vec![
                block_entity.position.0,
                block_entity.position.1,
                block_entity.position.2,
            ]),
        );
        block_entities.push(NbtTag::Compound(nbt));
    }
    root.insert("BlockEntities", NbtTag::List(block_entities));

    let entities = NbtList::from(
        merged
            .entities
            .iter()
            .map(Entity::to_nbt)
            .collect::<Vec<NbtTag>>(),
    );
    root.insert("Entities", NbtTag::List(entities));
    root.insert("Metadata", NbtTag::Compound(schematic.metadata.to_nbt()));

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    quartz_nbt::io::write_nbt(&mut encoder, None, &root, Flavor::Uncompressed)
        .map_err(SchematicError::conversion)?;
    encoder.finish().map_err(SchematicError::conversion)
}

pub fn from_schematic(data: &[u8]) -> Result<UniversalSchematic, SchematicError> {
    let mut gz = GzDecoder::new(BufReader::new(data));
    let (root, _) = quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed)
        .map_err(SchematicError::conversion)?;

    let name = root
        .get::<_, &NbtCompound>("Metadata")
        .ok()
        .and_then(|m| m.get::<_, &str>("Name").ok().map(String::from))
        .unwrap_or_else(|| "Unnamed".to_string());
    let mut schematic = UniversalSchematic::new(name);
    schematic.metadata.mc_version = root.get::<_, i32>("DataVersion").ok();
    schematic.metadata.schematic_version = root.get::<_, i32>("Version").ok();

    let width = root.get::<_, i16>("Width").map_err(SchematicError::conversion)? as i32;
    let height = root.get::<_, i16>("Height").map_err(SchematicError::conversion)? as i32;
    let length = root.get::<_, i16>("Length").map_err(SchematicError::conversion)? as i32;
    if width <= 0 || height <= 0 || length <= 0 {
        return Err(SchematicError::InvalidFormat(format!(
            "non-positive dimensions {}x{}x{}",
            width, height, length
        )));
    }
    let position = root
        .get::<_, &[i32]>("Offset")
        .ok()
        .filter(|o| o.len() == 3)
        .map(|o| (o[0], o[1], o[2]))
        .unwrap_or((0, 0, 0));

    let states = parse_palette(&root)?;
    let mut region = Region::new("Main".to_string(), position, (width, height, length));

    let raw = root
        .get::<_, &[i8]>("BlockData")
        .map_err(SchematicError::conversion)?;
    let bytes: Vec<u8> = raw.iter().map(|&b| b as u8).collect();
    let mut reader = Cursor::new(bytes);
    for i in 0..(width * height * length) as usize {
        let id = decode_varint(&mut reader)? as usize;
        let state = states.get(id).ok_or(SchematicError::CorruptPalette {
            index: id,
            palette_size: states.len(),
        })?;
        if !state.is_air() {
            let x = (i % width as usize) as i32;
            let z = ((i / width as usize) % length as usize) as i32;
            let y = (i / (width as usize * length as usize)) as i32;
            region.set_block(x, y, z, state)?;
        }
    }

    if let Ok(list) = root.get::<_, &NbtList>("BlockEntities") {
        for tag in list.iter() {
            if let NbtTag::Compound(compound) = tag {
                region.add_block_entity(parse_block_entity(compound)?);
            }
        }
    }
    if let Ok(list) = root.get::<_, &NbtList>("Entities") {
        for tag in list.iter() {
            if let NbtTag::Compound(compound) = tag {
                let entity = Entity::from_nbt(compound).map_err(SchematicError::InvalidFormat)?;
                region.add_entity(entity);
            }
        }
    }

    schematic.add_region(region)?;
    Ok(schematic)
}

/// `name[k1=v1,k2=v2]` with keys sorted, or the bare name when there are no
/// properties.
fn palette_key(state: &BlockState) -> String {
    if state.properties.is_empty() {
        return state.name.clone();
    }
    let mut props: Vec<(&String, &String)> = state.properties.iter().collect();
    props.sort();
    format!(
        "{}[{}]",
        state.name,
        props
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",")
    )
}

fn parse_palette_key(key: &str) -> Result<BlockState, SchematicError> {
    let Some(open) = key.find('[') else {
        return Ok(BlockState::new(key.to_string()));
    };
    let name = &key[..open];
    let props = key[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| SchematicError::InvalidFormat(format!("malformed palette key '{}'", key)))?;

    let mut state = BlockState::new(name.to_string());
    for pair in props.split(',').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').ok_or_else(|| {
            SchematicError::InvalidFormat(format!("malformed palette key '{}'", key))
        })?;
        state = state.with_property(k.to_string(), v.to_string());
    }
    Ok(state)
}

/// Inverts the name-to-id palette compound into a dense id-indexed table.
fn parse_palette(root: &NbtCompound) -> Result<Vec<BlockState>, SchematicError> {
    let palette = root
        .get::<_, &NbtCompound>("Palette")
        .map_err(SchematicError::conversion)?;
    let mut states: Vec<Option<BlockState>> = vec![None; palette.inner().len()];
    for (key, value) in palette.inner() {
        let NbtTag::Int(id) = value else {
            return Err(SchematicError::InvalidFormat(format!(
                "palette entry '{}' has a non-int id",
                key
            )));
        };
        let slot = states.get_mut(*id as usize).ok_or_else(|| {
            SchematicError::InvalidFormat(format!("palette id {} out of range", id))
        })?;
        if slot.is_some() {
            return Err(SchematicError::InvalidFormat(format!(
                "palette id {} assigned twice",
                id
            )));
        }
        *slot = Some(parse_palette_key(key)?);
    }
    states
        .into_iter()
        .enumerate()
        .map(|(id, state)| {
            state.ok_or_else(|| SchematicError::InvalidFormat(format!("palette id {} unassigned", id)))
        })
        .collect()
}

fn parse_block_entity(compound: &NbtCompound) -> Result<BlockEntity, SchematicError> {
    let id = compound
        .get::<_, &str>("Id")
        .or_else(|_| compound.get::<_, &str>("id"))
        .map(String::from)
        .map_err(SchematicError::conversion)?;
    let pos = compound
        .get::<_, &[i32]>("Pos")
        .map_err(SchematicError::conversion)?;
    if pos.len() != 3 {
        return Err(SchematicError::InvalidFormat(
            "block entity Pos must have 3 elements".to_string(),
        ));
    }
    let mut block_entity = BlockEntity::new(id, (pos[0], pos[1], pos[2]));
    let mut data = compound.clone();
    data.inner_mut().remove("Id");
    data.inner_mut().remove("id");
    data.inner_mut().remove("Pos");
    block_entity.data = data;
    Ok(block_entity)
}

fn encode_varint(value: i32, out: &mut Vec<u8>) {
    let mut val = value as u32;
    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }
}

fn decode_varint<R: Read>(reader: &mut R) -> Result<i32, SchematicError> {
    let mut result = 0i32;
    let mut shift = 0;
    loop {
        let mut byte = [0u8; 1];
        reader
            .read_exact(&mut byte)
            .map_err(SchematicError::conversion)?;
        result |= ((byte[0] & 0x7f) as i32) << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 32 {
            return Err(SchematicError::InvalidFormat("varint is too long".to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_roundtrip() {
        for value in [0, 1, 127, 128, 300, 16383, 16384, i32::MAX] {
            let mut bytes = Vec::new();
            encode_varint(value, &mut bytes);
            let decoded = decode_varint(&mut Cursor::new(bytes)).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_palette_key_roundtrip() {
        let plain = BlockState::new("minecraft:stone".to_string());
        assert_eq!(palette_key(&plain), "minecraft:stone");
        assert_eq!(parse_palette_key("minecraft:stone").unwrap(), plain);

        let lever = BlockState::new("minecraft:lever".to_string())
            .with_property("face".to_string(), "wall".to_string())
            .with_property("powered".to_string(), "true".to_string());
        let key = palette_key(&lever);
        assert_eq!(key, "minecraft:lever[face=wall,powered=true]");
        assert_eq!(parse_palette_key(&key).unwrap(), lever);
    }

    #[test]
    fn test_malformed_palette_key() {
        assert!(parse_palette_key("minecraft:lever[face=wall").is_err());
        assert!(parse_palette_key("minecraft:lever[face]").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut schematic = UniversalSchematic::new("Test".to_string());
        let mut region = Region::new("Main".to_string(), (0, 0, 0), (3, 2, 2));
        let stone = BlockState::new("minecraft:stone".to_string());
        let slab = BlockState::new("minecraft:oak_slab".to_string())
            .with_property("type".to_string(), "top".to_string());
        region.set_block(0, 0, 0, &stone).unwrap();
        region.set_block(2, 1, 1, &slab).unwrap();
        schematic.add_region(region).unwrap();

        let data = to_schematic(&schematic).unwrap();
        assert!(is_schematic(&data));

        let parsed = from_schematic(&data).unwrap();
        let region = parsed.get_region("Main").unwrap();
        assert_eq!(region.dimensions(), (3, 2, 2));
        assert_eq!(region.get_block(0, 0, 0).unwrap(), &stone);
        assert_eq!(region.get_block(2, 1, 1).unwrap(), &slab);
        assert_eq!(region.count_blocks(), 2);
    }

    #[test]
    fn test_region_anchor_survives_roundtrip() {
        let mut schematic = UniversalSchematic::new("Test".to_string());
        let mut region = Region::new("Main".to_string(), (100, 64, -20), (2, 2, 2));
        region.set_block(0, 0, 0, &BlockState::new("minecraft:stone".to_string())).unwrap();
        schematic.add_region(region).unwrap();

        let data = to_schematic(&schematic).unwrap();
        let parsed = from_schematic(&data).unwrap();
        let region = parsed.get_region("Main").unwrap();

        assert_eq!(region.position, (100, 64, -20));
        assert_eq!(region.bounding_box().min, (100, 64, -20));
    }

    #[test]
    fn test_multi_region_schematic_is_merged() {
        let mut schematic = UniversalSchematic::new("Test".to_string());
        let stone = BlockState::new("minecraft:stone".to_string());

        let mut a = Region::new("A".to_string(), (0, 0, 0), (2, 1, 1));
        a.set_block(0, 0, 0, &stone).unwrap();
        let mut b = Region::new("B".to_string(), (4, 0, 0), (2, 1, 1));
        b.set_block(1, 0, 0, &stone).unwrap();
        schematic.add_region(a).unwrap();
        schematic.add_region(b).unwrap();

        let data = to_schematic(&schematic).unwrap();
        let parsed = from_schematic(&data).unwrap();
        let region = parsed.get_region("Main").unwrap();

        assert_eq!(region.dimensions(), (6, 1, 1));
        assert_eq!(region.get_block(0, 0, 0).unwrap(), &stone);
        assert_eq!(region.get_block(5, 0, 0).unwrap(), &stone);
        assert_eq!(region.count_blocks(), 2);
    }

    #[test]
    fn test_block_entities_roundtrip() {
        let mut schematic = UniversalSchematic::new("Test".to_string());
        let mut region = Region::new("Main".to_string(), (0, 0, 0), (2, 2, 2));
        let mut chest = BlockEntity::new("minecraft:chest".to_string(), (1, 0, 1));
        chest.data.insert("Lock", "secret");
        region.add_block_entity(chest);
        schematic.add_region(region).unwrap();

        let data = to_schematic(&schematic).unwrap();
        let parsed = from_schematic(&data).unwrap();
        let region = parsed.get_region("Main").unwrap();

        let chest = region.block_entities.get(&(1, 0, 1)).unwrap();
        assert_eq!(chest.id, "minecraft:chest");
        assert_eq!(chest.data.get::<_, &str>("Lock").unwrap(), "secret");
    }
}
