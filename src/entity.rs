use quartz_nbt::{NbtCompound, NbtList, NbtTag};

/// One captured entity: identity, region-relative offset and the full
/// serialized payload the world handed us. The payload is opaque to the
/// engine and round-trips through schematic files unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub uuid: u128,
    /// Offset from the owning region's minimum corner.
    pub position: (f64, f64, f64),
    pub data: NbtCompound,
}

impl Entity {
    pub fn new(id: String, uuid: u128, position: (f64, f64, f64)) -> Self {
        Entity {
            id,
            uuid,
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
        compound.insert("UUIDMost", NbtTag::Long((self.uuid >> 64) as i64));
        compound.insert("UUIDLeast", NbtTag::Long(self.uuid as i64));

        let pos_list = NbtList::from(vec![
            NbtTag::Double(self.position.0),
            NbtTag::Double(self.position.1),
            NbtTag::Double(self.position.2),
        ]);
        compound.insert("Pos", NbtTag::List(pos_list));

        NbtTag::Compound(compound)
    }

    pub fn from_nbt(nbt: &NbtCompound) -> Result<Self, String> {
        let id = nbt
            .get::<_, &str>("id")
            .map_err(|e| format!("Failed to get entity id: {}", e))?
            .to_string();

        let pos_list = nbt
            .get::<_, &NbtList>("Pos")
            .map_err(|e| format!("Failed to get entity position: {}", e))?;
        if pos_list.len() != 3 {
            return Err("Invalid entity position data".to_string());
        }
        let position = (
            pos_list.get::<f64>(0).map_err(|e| format!("Failed to get X position: {}", e))?,
            pos_list.get::<f64>(1).map_err(|e| format!("Failed to get Y position: {}", e))?,
            pos_list.get::<f64>(2).map_err(|e| format!("Failed to get Z position: {}", e))?,
        );

        let most = nbt.get::<_, i64>("UUIDMost").unwrap_or(0);
        let least = nbt.get::<_, i64>("UUIDLeast").unwrap_or(0);
        let uuid = ((most as u64 as u128) << 64) | least as u64 as u128;

        let mut data = nbt.clone();
        // identity and position live in dedicated fields, not the payload
        data.inner_mut().remove("id");
        data.inner_mut().remove("Pos");
        data.inner_mut().remove("UUIDMost");
        data.inner_mut().remove("UUIDLeast");

        Ok(Entity {
            id,
            uuid,
            position,
            data,
        })
    }
}
