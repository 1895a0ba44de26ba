use std::fmt::Write;

use crate::metadata::Metadata;
use crate::region::Region;
use crate::universal_schematic::UniversalSchematic;
use crate::verifier::{MismatchType, RegionVerifier};
use crate::BlockState;

pub fn format_block_state(block: &BlockState) -> String {
    if block.properties.is_empty() {
        return block.name.clone();
    }
    let mut props: Vec<(&String, &String)> = block.properties.iter().collect();
    props.sort();
    let props = props
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} {{{}}}", block.name, props)
}

pub fn format_metadata(metadata: &Metadata) -> String {
    let mut out = String::from("Metadata:\n");
    if let Some(name) = &metadata.name {
        let _ = writeln!(out, "  Name: {}", name);
    }
    if let Some(author) = &metadata.author {
        let _ = writeln!(out, "  Author: {}", author);
    }
    if let Some(description) = &metadata.description {
        let _ = writeln!(out, "  Description: {}", description);
    }
    if let Some(created) = metadata.created {
        let _ = writeln!(out, "  Created: {}", created);
    }
    if let Some(modified) = metadata.modified {
        let _ = writeln!(out, "  Modified: {}", modified);
    }
    if let Some(mc_version) = metadata.mc_version {
        let _ = writeln!(out, "  Minecraft Version: {}", mc_version);
    }
    out
}

pub fn format_region(region: &Region) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Region: {}", region.name);
    let _ = writeln!(out, "    Position: {:?}", region.position);
    let _ = writeln!(out, "    Size: {:?}", region.size);
    let _ = writeln!(
        out,
        "    Blocks: {} / {}",
        region.count_blocks(),
        region.volume()
    );
    let _ = writeln!(out, "    Palette:");
    for (i, block) in region.palette().iter().enumerate() {
        let _ = writeln!(out, "      {}: {}", i, format_block_state(block));
    }
    out
}

pub fn format_schematic(schematic: &UniversalSchematic) -> String {
    let mut out = String::from("Schematic:\n");
    out.push_str(&format_metadata(&schematic.metadata));
    out.push_str("Regions:\n");
    for region in schematic.regions() {
        out.push_str(&format_region(region));
    }
    out
}

/// One line per outcome type, skipping empty ones, plus a progress line
/// while the scan is still running.
pub fn format_mismatch_summary(verifier: &RegionVerifier) -> String {
    let mut out = String::new();
    let (done, total) = verifier.progress();
    if done < total {
        let _ = writeln!(out, "Verified {} / {} positions", done, total);
    }
    for (kind, count) in verifier.mismatch_counts() {
        if count == 0 {
            continue;
        }
        let label = match kind {
            MismatchType::Correct => "correct",
            MismatchType::Missing => "missing",
            MismatchType::Extra => "extra",
            MismatchType::WrongBlock => "wrong block",
            MismatchType::WrongState => "wrong state",
            MismatchType::Ignored => "ignored",
        };
        let _ = writeln!(out, "  {}: {}", label, count);
    }
    out
}
