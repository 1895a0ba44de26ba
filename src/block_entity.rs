use quartz_nbt::{NbtCompound, NbtTag};

/// Block entity data captured at one region-relative position.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntity {
    pub id: String,
    /// Position relative to the owning region's minimum corner.
    pub position: (i32, i32, i32),
    pub data: NbtCompound,
}

impl BlockEntity {
    pub fn new(id: String, position: (i32, i32, i32)) -> Self {
        BlockEntity {
            id,
            position,
            data: NbtCompound::new(),
        }
    }

    pub fn with_data(mut self, data: NbtCompound) -> Self {
        self.data = data;
        self
    }

    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = self.data.clone();
        compound.insert("id", NbtTag::String(self.id.clone()));
        compound.insert("x", NbtTag::Int(self.position.0));
        compound.insert("y", NbtTag::Int(self.position.1));
        compound.insert("z", NbtTag::Int(self.position.2));
        NbtTag::Compound(compound)
    }

    pub fn from_nbt(nbt: &NbtCompound) -> Result<Self, String> {
        let id = nbt
            .get::<_, &str>("id")
            .map_err(|e| format!("Failed to get block entity id: {}", e))?
            .to_string();

        let position = (
            nbt.get::<_, i32>("x").map_err(|e| format!("Failed to get x: {}", e))?,
            nbt.get::<_, i32>("y").map_err(|e| format!("Failed to get y: {}", e))?,
            nbt.get::<_, i32>("z").map_err(|e| format!("Failed to get z: {}", e))?,
        );

        let mut data = nbt.clone();
        data.inner_mut().remove("id");
        data.inner_mut().remove("x");
        data.inner_mut().remove("y");
        data.inner_mut().remove("z");

        Ok(BlockEntity { id, position, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_entity_nbt_roundtrip() {
        let mut payload = NbtCompound::new();
        payload.insert("CustomName", NbtTag::String("Loot".to_string()));

        let block_entity =
            BlockEntity::new("minecraft:chest".to_string(), (1, 2, 3)).with_data(payload);

        let nbt = block_entity.to_nbt();
        let parsed = match nbt {
            NbtTag::Compound(c) => BlockEntity::from_nbt(&c).unwrap(),
            _ => panic!("Expected compound"),
        };

        assert_eq!(block_entity, parsed);
    }
}
