use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};

/// Name used as the "don't care" marker in partial schematics. Positions
/// holding this state always verify as correct, whatever the world contains.
pub const ANY_STATE_NAME: &str = "minecraft:structure_void";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    pub name: String,
    pub properties: HashMap<String, String>,
}

impl Hash for BlockState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        // Property order must not affect the hash
        let mut props: Vec<_> = self.properties.iter().collect();
        props.sort();
        for (k, v) in props {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl BlockState {
    pub fn new(name: String) -> Self {
        BlockState {
            name,
            properties: HashMap::new(),
        }
    }

    pub fn air() -> Self {
        BlockState::new("minecraft:air".to_string())
    }

    pub fn with_property(mut self, key: String, value: String) -> Self {
        self.properties.insert(key, value);
        self
    }

    pub fn is_air(&self) -> bool {
        matches!(
            self.name.as_str(),
            "minecraft:air" | "minecraft:cave_air" | "minecraft:void_air"
        )
    }

    /// Whether this state is the wildcard marker that matches any world state.
    pub fn is_any(&self) -> bool {
        self.name == ANY_STATE_NAME
    }

    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("Name", self.name.clone());

        if !self.properties.is_empty() {
            let mut properties = NbtCompound::new();
            for (key, value) in &self.properties {
                properties.insert(key, value.clone());
            }
            compound.insert("Properties", properties);
        }

        NbtTag::Compound(compound)
    }

    pub fn from_nbt(compound: &NbtCompound) -> Result<Self, String> {
        let name = compound
            .get::<_, &str>("Name")
            .map_err(|e| format!("Failed to get Name: {}", e))?
            .to_string();

        let mut properties = HashMap::new();
        if let Ok(props) = compound.get::<_, &NbtCompound>("Properties") {
            for (key, value) in props.inner() {
                if let NbtTag::String(value_str) = value {
                    properties.insert(key.clone(), value_str.clone());
                }
            }
        }

        Ok(BlockState { name, properties })
    }
}

#[cfg(test)]
mod tests {
    use super::BlockState;

    #[test]
    fn test_block_state_creation() {
        let block = BlockState::new("minecraft:stone".to_string())
            .with_property("variant".to_string(), "granite".to_string());

        assert_eq!(block.name, "minecraft:stone");
        assert_eq!(block.properties.get("variant"), Some(&"granite".to_string()));
    }

    #[test]
    fn test_air_and_wildcard_detection() {
        assert!(BlockState::air().is_air());
        assert!(BlockState::new("minecraft:cave_air".to_string()).is_air());
        assert!(!BlockState::new("minecraft:stone".to_string()).is_air());

        assert!(BlockState::new("minecraft:structure_void".to_string()).is_any());
        assert!(!BlockState::air().is_any());
    }

    #[test]
    fn test_nbt_roundtrip_with_properties() {
        let block = BlockState::new("minecraft:oak_stairs".to_string())
            .with_property("facing".to_string(), "north".to_string())
            .with_property("half".to_string(), "top".to_string());

        let nbt = block.to_nbt();
        let parsed = match nbt {
            quartz_nbt::NbtTag::Compound(c) => BlockState::from_nbt(&c).unwrap(),
            _ => panic!("Expected compound"),
        };
        assert_eq!(block, parsed);
    }
}
