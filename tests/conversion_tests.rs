use std::collections::HashSet;

use minecraft_schematic_engine::formats::{litematic, schematic};
use minecraft_schematic_engine::{
    capture_from_world, AreaSelection, BlockPosition, BlockState, CaptureOptions,
    CollectingFeedback, MemoryWorld, MismatchType, Region, RegionVerifier, SchematicFormat,
    SchematicPlacement, SelectionBox, UniversalSchematic, WorldEntity,
};
use quartz_nbt::NbtCompound;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn stone() -> BlockState {
    BlockState::new("minecraft:stone".to_string())
}

fn build_test_schematic() -> UniversalSchematic {
    let mut schematic = UniversalSchematic::new("Conversion Test".to_string());
    schematic.metadata.author = Some("Test Author".to_string());
    schematic.metadata.created = Some(1000);
    schematic.metadata.modified = Some(2000);

    let mut region = Region::new("Main".to_string(), (0, 0, 0), (4, 3, 4));
    let lever = BlockState::new("minecraft:lever".to_string())
        .with_property("face".to_string(), "wall".to_string())
        .with_property("powered".to_string(), "true".to_string());
    for x in 0..4 {
        for z in 0..4 {
            region.set_block(x, 0, z, &stone()).unwrap();
        }
    }
    region.set_block(2, 1, 2, &lever).unwrap();
    schematic.add_region(region).unwrap();
    schematic
}

#[test]
fn litematic_roundtrip_preserves_blocks() {
    let original = build_test_schematic();
    let data = litematic::to_litematic(&original).expect("Failed to convert to litematic");
    let parsed = litematic::from_litematic(&data).expect("Failed to parse litematic");

    assert_eq!(parsed.metadata.name, original.metadata.name);
    assert_eq!(parsed.metadata.author, original.metadata.author);

    let original_region = original.get_region("Main").unwrap();
    let parsed_region = parsed.get_region("Main").unwrap();
    assert_eq!(parsed_region.dimensions(), original_region.dimensions());
    for x in 0..4 {
        for y in 0..3 {
            for z in 0..4 {
                assert_eq!(
                    parsed_region.get_block(x, y, z).unwrap(),
                    original_region.get_block(x, y, z).unwrap(),
                    "block mismatch at ({}, {}, {})",
                    x,
                    y,
                    z
                );
            }
        }
    }
}

#[test]
fn litematic_to_schem_and_back() {
    let original = build_test_schematic();

    let litematic_data = litematic::to_litematic(&original).expect("Failed to convert to litematic");
    let from_litematic = litematic::from_litematic(&litematic_data).expect("Failed to parse");

    let schem_data = schematic::to_schematic(&from_litematic).expect("Failed to convert to schem");
    let from_schem = schematic::from_schematic(&schem_data).expect("Failed to parse schem");

    // .schem merges regions, so compare at the merged level
    let merged = original.get_merged_region().unwrap();
    let converted = from_schem.get_merged_region().unwrap();
    assert_eq!(converted.dimensions(), merged.dimensions());
    assert_eq!(converted.count_blocks(), merged.count_blocks());
    for x in 0..4 {
        for y in 0..3 {
            for z in 0..4 {
                assert_eq!(
                    converted.get_block(x, y, z).unwrap(),
                    merged.get_block(x, y, z).unwrap()
                );
            }
        }
    }
}

#[test]
fn anchor_survives_litematic_to_schem_to_litematic() {
    let mut original = UniversalSchematic::new("Anchored".to_string());
    let mut region = Region::new("Main".to_string(), (100, 64, -20), (3, 2, 3));
    region.set_block(1, 0, 1, &stone()).unwrap();
    original.add_region(region).unwrap();

    let litematic_data = litematic::to_litematic(&original).expect("litematic write failed");
    let step1 = litematic::from_litematic(&litematic_data).expect("litematic read failed");

    let schem_data = schematic::to_schematic(&step1).expect("schem write failed");
    let step2 = schematic::from_schematic(&schem_data).expect("schem read failed");

    let litematic_data = litematic::to_litematic(&step2).expect("litematic rewrite failed");
    let reloaded = litematic::from_litematic(&litematic_data).expect("litematic reread failed");

    let region = reloaded.get_merged_region().unwrap();
    assert_eq!(region.bounding_box().min, (100, 64, -20));
    assert_eq!(region.get_block(1, 0, 1).unwrap(), &stone());
}

#[test]
fn format_detection_roundtrip() {
    let original = build_test_schematic();
    for format in SchematicFormat::ALL {
        let data = format.write(&original).expect("write failed");
        assert_eq!(SchematicFormat::detect(&data), Some(format));
        let parsed = minecraft_schematic_engine::load(&data).expect("load failed");
        assert_eq!(parsed.total_blocks(), original.total_blocks());
    }
}

fn populated_world() -> MemoryWorld {
    let mut world = MemoryWorld::new();
    for x in 0..20 {
        for z in 0..20 {
            world.set_block(BlockPosition::new(x, 0, z), stone());
        }
    }
    world.set_block(
        BlockPosition::new(5, 1, 5),
        BlockState::new("minecraft:dirt".to_string()),
    );
    let mut chest = NbtCompound::new();
    chest.insert("id", "minecraft:chest");
    world.set_block_entity(BlockPosition::new(3, 1, 3), chest);
    world.add_entity(WorldEntity {
        id: "minecraft:pig".to_string(),
        uuid: 0xfeed_beef,
        position: (4.5, 1.0, 4.5),
        data: NbtCompound::new(),
    });
    world
}

#[test]
fn capture_convert_capture_is_stable() {
    init_tracing();
    let world = populated_world();
    let mut area = AreaSelection::new("Farm".to_string(), (0, 0, 0));
    area.add_box(SelectionBox::new("Main".to_string(), (0, 0, 0), (19, 3, 19)));

    let mut feedback = CollectingFeedback::default();
    let captured =
        capture_from_world(&world, &area, "Steve", CaptureOptions::default(), &mut feedback)
            .expect("capture failed");
    assert!(feedback.messages.is_empty());

    let data = litematic::to_litematic(&captured).expect("conversion failed");
    let reloaded = litematic::from_litematic(&data).expect("parse failed");

    let before = captured.get_region("Main").unwrap();
    let after = reloaded.get_region("Main").unwrap();
    assert_eq!(after.count_blocks(), before.count_blocks());
    assert_eq!(after.entities.len(), 1);
    assert_eq!(after.entities[0].uuid, 0xfeed_beef);
    assert!(after.block_entities.contains_key(&(3, 1, 3)));
    assert_eq!(
        after.get_block(5, 1, 5).unwrap().name,
        "minecraft:dirt"
    );
}

#[test]
fn overlapping_captures_do_not_duplicate_entities() {
    let world = populated_world();
    let mut seen: HashSet<u128> = HashSet::new();

    let mut first = Region::new("First".to_string(), (0, 0, 0), (10, 4, 10));
    let bounds = first.bounding_box();
    minecraft_schematic_engine::capture_entities_within_volume(&world, &mut first, &bounds, &mut seen)
        .unwrap();
    assert_eq!(first.entities.len(), 1);

    // second overlapping pass reuses the same seen-set
    let mut second = Region::new("Second".to_string(), (2, 0, 2), (10, 4, 10));
    let bounds = second.bounding_box();
    minecraft_schematic_engine::capture_entities_within_volume(&world, &mut second, &bounds, &mut seen)
        .unwrap();
    assert!(second.entities.is_empty());
}

#[test]
fn verifier_reports_single_wrong_block() {
    let mut schematic_region = Region::new("Main".to_string(), (0, 0, 0), (2, 2, 2));
    for x in 0..2 {
        for y in 0..2 {
            for z in 0..2 {
                schematic_region.set_block(x, y, z, &stone()).unwrap();
            }
        }
    }

    let mut world = MemoryWorld::new();
    for x in 0..2 {
        for y in 0..2 {
            for z in 0..2 {
                world.set_block(BlockPosition::new(x, y, z), stone());
            }
        }
    }
    world.set_block(
        BlockPosition::new(1, 0, 1),
        BlockState::new("minecraft:dirt".to_string()),
    );

    let placement = SchematicPlacement::new((0, 0, 0));
    let mut verifier = RegionVerifier::new();
    verifier
        .run_to_end(&schematic_region, &world, &placement)
        .unwrap();

    assert_eq!(verifier.count(MismatchType::Correct), 7);
    assert_eq!(verifier.count(MismatchType::WrongBlock), 1);
    assert_eq!(
        verifier.positions_for_type(MismatchType::WrongBlock),
        &[BlockPosition::new(1, 0, 1)]
    );

    let total: usize = MismatchType::ALL
        .iter()
        .map(|&kind| verifier.count(kind))
        .sum();
    assert_eq!(total, schematic_region.volume());
}

#[test]
fn verify_captured_schematic_against_source_world() {
    let world = populated_world();
    let mut area = AreaSelection::new("Check".to_string(), (0, 0, 0));
    area.add_box(SelectionBox::new("Main".to_string(), (0, 0, 0), (19, 3, 19)));

    let mut feedback = CollectingFeedback::default();
    let captured =
        capture_from_world(&world, &area, "Steve", CaptureOptions::default(), &mut feedback)
            .expect("capture failed");
    let region = captured.get_region("Main").unwrap();

    let placement = SchematicPlacement::new((0, 0, 0));
    let mut verifier = RegionVerifier::new();
    verifier.run_to_end(region, &world, &placement).unwrap();

    assert_eq!(verifier.count(MismatchType::Correct), region.volume());
    assert_eq!(verifier.count(MismatchType::Missing), 0);
    assert_eq!(verifier.count(MismatchType::Extra), 0);
}
