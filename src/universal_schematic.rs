use std::collections::HashMap;

use crate::bounding_box::BoundingBox;
use crate::error::SchematicError;
use crate::metadata::Metadata;
use crate::region::Region;
use crate::BlockState;

/// Format-independent schematic model: metadata plus an ordered list of
/// named regions. Insertion order is preserved so serialized output is
/// deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct UniversalSchematic {
    pub metadata: Metadata,
    regions: Vec<Region>,
}

impl UniversalSchematic {
    pub fn new(name: String) -> Self {
        UniversalSchematic {
            metadata: Metadata {
                name: Some(name),
                ..Default::default()
            },
            regions: Vec::new(),
        }
    }

    /// Adds a region. Region names are unique within a schematic.
    pub fn add_region(&mut self, region: Region) -> Result<(), SchematicError> {
        if self.regions.iter().any(|r| r.name == region.name) {
            return Err(SchematicError::InvalidFormat(format!(
                "duplicate region name '{}'",
                region.name
            )));
        }
        self.regions.push(region);
        self.refresh_metadata();
        Ok(())
    }

    pub fn remove_region(&mut self, name: &str) -> Option<Region> {
        let index = self.regions.iter().position(|r| r.name == name)?;
        let region = self.regions.remove(index);
        self.refresh_metadata();
        Some(region)
    }

    pub fn get_region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn get_region_mut(&mut self, name: &str) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.name == name)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Enclosing box over all regions, or `None` when the schematic is empty.
    pub fn get_bounding_box(&self) -> Option<BoundingBox> {
        let mut boxes = self.regions.iter().map(|r| r.bounding_box());
        let first = boxes.next()?;
        Some(boxes.fold(first, |acc, b| acc.union(&b)))
    }

    /// Collapses all regions into a single min-corner-anchored region named
    /// after the schematic. Later regions win on overlap.
    pub fn get_merged_region(&self) -> Result<Region, SchematicError> {
        let mut iter = self.regions.iter();
        let first = iter
            .next()
            .ok_or_else(|| SchematicError::MissingRegionData("schematic has no regions".to_string()))?;
        let mut merged = first.clone();
        for region in iter {
            merged.merge(region)?;
        }
        merged.name = self
            .metadata
            .name
            .clone()
            .unwrap_or_else(|| "Merged".to_string());
        Ok(merged)
    }

    pub fn total_blocks(&self) -> i64 {
        self.regions.iter().map(|r| r.count_blocks() as i64).sum()
    }

    pub fn total_volume(&self) -> i64 {
        self.regions.iter().map(|r| r.volume() as i64).sum()
    }

    pub fn count_block_types(&self) -> HashMap<BlockState, usize> {
        let mut counts = HashMap::new();
        for region in &self.regions {
            for (state, count) in region.count_block_types() {
                *counts.entry(state).or_insert(0) += count;
            }
        }
        counts
    }

    fn refresh_metadata(&mut self) {
        self.metadata.region_count = self.regions.len() as i32;
        self.metadata.total_volume = self.total_volume();
        self.metadata.total_blocks = self.total_blocks();
        self.metadata.enclosing_size = self
            .get_bounding_box()
            .map(|b| b.get_dimensions())
            .unwrap_or((0, 0, 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get_region() {
        let mut schematic = UniversalSchematic::new("Test".to_string());
        let region = Region::new("Main".to_string(), (0, 0, 0), (2, 2, 2));
        schematic.add_region(region).unwrap();

        assert!(schematic.get_region("Main").is_some());
        assert!(schematic.get_region("Other").is_none());
        assert_eq!(schematic.metadata.region_count, 1);
        assert_eq!(schematic.metadata.total_volume, 8);
        assert_eq!(schematic.metadata.enclosing_size, (2, 2, 2));
    }

    #[test]
    fn test_duplicate_region_name_rejected() {
        let mut schematic = UniversalSchematic::new("Test".to_string());
        schematic
            .add_region(Region::new("Main".to_string(), (0, 0, 0), (2, 2, 2)))
            .unwrap();
        let result = schematic.add_region(Region::new("Main".to_string(), (4, 0, 0), (2, 2, 2)));
        assert!(matches!(result, Err(SchematicError::InvalidFormat(_))));
        assert_eq!(schematic.regions().len(), 1);
    }

    #[test]
    fn test_remove_region_refreshes_metadata() {
        let mut schematic = UniversalSchematic::new("Test".to_string());
        schematic
            .add_region(Region::new("A".to_string(), (0, 0, 0), (2, 2, 2)))
            .unwrap();
        schematic
            .add_region(Region::new("B".to_string(), (10, 0, 0), (2, 2, 2)))
            .unwrap();
        assert_eq!(schematic.metadata.enclosing_size, (12, 2, 2));

        schematic.remove_region("B").unwrap();
        assert_eq!(schematic.metadata.region_count, 1);
        assert_eq!(schematic.metadata.enclosing_size, (2, 2, 2));
    }

    #[test]
    fn test_merged_region_overlap_later_wins() {
        let mut schematic = UniversalSchematic::new("Test".to_string());
        let stone = BlockState::new("minecraft:stone".to_string());
        let dirt = BlockState::new("minecraft:dirt".to_string());

        let mut a = Region::new("A".to_string(), (0, 0, 0), (2, 1, 1));
        a.set_block(0, 0, 0, &stone).unwrap();
        a.set_block(1, 0, 0, &stone).unwrap();
        let mut b = Region::new("B".to_string(), (1, 0, 0), (2, 1, 1));
        b.set_block(0, 0, 0, &dirt).unwrap();

        schematic.add_region(a).unwrap();
        schematic.add_region(b).unwrap();

        let merged = schematic.get_merged_region().unwrap();
        assert_eq!(merged.name, "Test");
        assert_eq!(merged.dimensions(), (3, 1, 1));
        assert_eq!(merged.get_block(0, 0, 0).unwrap(), &stone);
        assert_eq!(merged.get_block(1, 0, 0).unwrap(), &dirt);
        assert_eq!(merged.get_block(2, 0, 0).unwrap(), &BlockState::air());
    }

    #[test]
    fn test_merged_region_empty_schematic() {
        let schematic = UniversalSchematic::new("Test".to_string());
        assert!(matches!(
            schematic.get_merged_region(),
            Err(SchematicError::MissingRegionData(_))
        ));
    }

    #[test]
    fn test_count_block_types_across_regions() {
        let mut schematic = UniversalSchematic::new("Test".to_string());
        let stone = BlockState::new("minecraft:stone".to_string());

        let mut a = Region::new("A".to_string(), (0, 0, 0), (1, 1, 1));
        a.set_block(0, 0, 0, &stone).unwrap();
        let mut b = Region::new("B".to_string(), (5, 0, 0), (1, 1, 1));
        b.set_block(0, 0, 0, &stone).unwrap();
        schematic.add_region(a).unwrap();
        schematic.add_region(b).unwrap();

        let counts = schematic.count_block_types();
        assert_eq!(counts.get(&stone), Some(&2));
    }
}
