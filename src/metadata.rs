use quartz_nbt::NbtCompound;
use serde::{Deserialize, Serialize};

/// Schematic-level metadata. Optional fields are omitted from serialized
/// output when unset; the cached aggregate fields are refreshed by the
/// owning schematic whenever its regions change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Unix millis.
    pub created: Option<i64>,
    pub modified: Option<i64>,
    pub mc_version: Option<i32>,
    pub schematic_version: Option<i32>,

    pub region_count: i32,
    pub total_volume: i64,
    pub total_blocks: i64,
    pub enclosing_size: (i32, i32, i32),
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            name: None,
            author: None,
            description: None,
            created: None,
            modified: None,
            mc_version: None,
            schematic_version: None,
            region_count: 0,
            total_volume: 0,
            total_blocks: 0,
            enclosing_size: (0, 0, 0),
        }
    }
}

impl Metadata {
    pub fn with_author(author: &str) -> Self {
        Metadata {
            author: Some(author.to_string()),
            ..Default::default()
        }
    }

    pub fn to_json_string(&self) -> Result<String, crate::error::SchematicError> {
        serde_json::to_string_pretty(self).map_err(crate::error::SchematicError::conversion)
    }

    pub fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        nbt.insert("Name", self.name.clone().unwrap_or_else(|| "Unnamed".to_string()));
        nbt.insert("Author", self.author.clone().unwrap_or_else(|| "Unknown".to_string()));
        nbt.insert("Description", self.description.clone().unwrap_or_default());
        if let Some(created) = self.created {
            nbt.insert("TimeCreated", created);
        }
        if let Some(modified) = self.modified {
            nbt.insert("TimeModified", modified);
        }
        nbt.insert("RegionCount", self.region_count);
        // the format stores these as ints; saturate rather than wrap
        nbt.insert(
            "TotalVolume",
            i32::try_from(self.total_volume).unwrap_or(i32::MAX),
        );
        nbt.insert(
            "TotalBlocks",
            i32::try_from(self.total_blocks).unwrap_or(i32::MAX),
        );

        let mut enclosing = NbtCompound::new();
        enclosing.insert("x", self.enclosing_size.0);
        enclosing.insert("y", self.enclosing_size.1);
        enclosing.insert("z", self.enclosing_size.2);
        nbt.insert("EnclosingSize", enclosing);
        nbt
    }

    pub fn from_nbt(nbt: &NbtCompound) -> Self {
        let enclosing_size = nbt
            .get::<_, &NbtCompound>("EnclosingSize")
            .ok()
            .and_then(|c| {
                Some((
                    c.get::<_, i32>("x").ok()?,
                    c.get::<_, i32>("y").ok()?,
                    c.get::<_, i32>("z").ok()?,
                ))
            })
            .unwrap_or((0, 0, 0));

        Metadata {
            name: nbt.get::<_, &str>("Name").ok().map(String::from),
            author: nbt.get::<_, &str>("Author").ok().map(String::from),
            description: nbt.get::<_, &str>("Description").ok().map(String::from),
            created: nbt.get::<_, i64>("TimeCreated").ok(),
            modified: nbt.get::<_, i64>("TimeModified").ok(),
            mc_version: None,
            schematic_version: None,
            region_count: nbt.get::<_, i32>("RegionCount").unwrap_or(0),
            total_volume: nbt.get::<_, i32>("TotalVolume").unwrap_or(0) as i64,
            total_blocks: nbt.get::<_, i32>("TotalBlocks").unwrap_or(0) as i64,
            enclosing_size,
        }
    }
}
