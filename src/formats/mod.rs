use std::fs;
use std::path::Path;

use crate::error::SchematicError;
use crate::universal_schematic::UniversalSchematic;

pub mod litematic;
pub mod schematic;

/// The serialization formats the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchematicFormat {
    Litematic,
    Sponge,
}

impl SchematicFormat {
    pub const ALL: [SchematicFormat; 2] = [SchematicFormat::Litematic, SchematicFormat::Sponge];

    pub fn extension(self) -> &'static str {
        match self {
            SchematicFormat::Litematic => "litematic",
            SchematicFormat::Sponge => "schem",
        }
    }

    /// Sniffs the format of raw bytes by attempting to parse their headers.
    pub fn detect(data: &[u8]) -> Option<SchematicFormat> {
        if litematic::is_litematic(data) {
            Some(SchematicFormat::Litematic)
        } else if schematic::is_schematic(data) {
            Some(SchematicFormat::Sponge)
        } else {
            None
        }
    }

    pub fn read(self, data: &[u8]) -> Result<UniversalSchematic, SchematicError> {
        match self {
            SchematicFormat::Litematic => litematic::from_litematic(data),
            SchematicFormat::Sponge => schematic::from_schematic(data),
        }
    }

    pub fn write(self, schematic: &UniversalSchematic) -> Result<Vec<u8>, SchematicError> {
        match self {
            SchematicFormat::Litematic => litematic::to_litematic(schematic),
            SchematicFormat::Sponge => schematic::to_schematic(schematic),
        }
    }
}

/// Serializes `schematic` into `target`, surfacing any failure as a
/// `Conversion` error. Nothing is written on failure.
pub fn convert(
    schematic: &UniversalSchematic,
    target: SchematicFormat,
) -> Result<Vec<u8>, SchematicError> {
    target.write(schematic).map_err(|err| match err {
        err @ SchematicError::Conversion(_) => err,
        other => SchematicError::conversion(other.to_string()),
    })
}

/// Parses raw bytes, auto-detecting the format.
pub fn load(data: &[u8]) -> Result<UniversalSchematic, SchematicError> {
    let format = SchematicFormat::detect(data).ok_or_else(|| {
        SchematicError::InvalidFormat("data does not match any known schematic format".to_string())
    })?;
    format.read(data)
}

/// Converts and writes to disk. The file is only created once the full
/// serialization has succeeded, so a failed conversion leaves no partial
/// output behind.
pub fn save_to_file(
    schematic: &UniversalSchematic,
    target: SchematicFormat,
    path: &Path,
) -> Result<(), SchematicError> {
    let bytes = convert(schematic, target)?;
    fs::write(path, &bytes).map_err(SchematicError::conversion)?;
    tracing::info!(bytes = bytes.len(), path = %path.display(), "saved schematic");
    Ok(())
}
