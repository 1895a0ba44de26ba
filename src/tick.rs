use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};

/// A pending block update captured from the world. The delay is stored
/// relative to capture time, not as an absolute world tick, so it survives
/// being pasted into a world with a different clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTick {
    pub block: String,
    pub delay: i32,
    pub priority: i32,
}

impl ScheduledTick {
    pub fn new(block: String, delay: i32, priority: i32) -> Self {
        ScheduledTick {
            block,
            delay,
            priority,
        }
    }

    pub fn to_nbt(&self, position: (i32, i32, i32)) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("Block", NbtTag::String(self.block.clone()));
        compound.insert("Priority", NbtTag::Int(self.priority));
        compound.insert("Time", NbtTag::Int(self.delay));
        compound.insert("x", NbtTag::Int(position.0));
        compound.insert("y", NbtTag::Int(position.1));
        compound.insert("z", NbtTag::Int(position.2));
        NbtTag::Compound(compound)
    }

    pub fn from_nbt(nbt: &NbtCompound) -> Result<((i32, i32, i32), Self), String> {
        let block = nbt
            .get::<_, &str>("Block")
            .map_err(|e| format!("Failed to get tick block: {}", e))?
            .to_string();
        let priority = nbt.get::<_, i32>("Priority").unwrap_or(0);
        let delay = nbt.get::<_, i32>("Time").unwrap_or(0);
        let position = (
            nbt.get::<_, i32>("x").map_err(|e| format!("Failed to get x: {}", e))?,
            nbt.get::<_, i32>("y").map_err(|e| format!("Failed to get y: {}", e))?,
            nbt.get::<_, i32>("z").map_err(|e| format!("Failed to get z: {}", e))?,
        );

        Ok((position, ScheduledTick::new(block, delay, priority)))
    }
}
