use thiserror::Error;

/// Error taxonomy for the engine.
///
/// `OutOfBounds` and `CorruptPalette` are fatal to the call that raised them.
/// `MissingRegionData` is a per-region failure during batched capture and is
/// routed through the feedback sink so sibling regions keep going.
/// `Conversion` aborts the whole conversion and leaves the source untouched.
#[derive(Debug, Error)]
pub enum SchematicError {
    #[error("position ({x}, {y}, {z}) is outside the {size_x}x{size_y}x{size_z} volume")]
    OutOfBounds {
        x: i32,
        y: i32,
        z: i32,
        size_x: usize,
        size_y: usize,
        size_z: usize,
    },

    #[error("palette index {index} is not assigned (palette size {palette_size})")]
    CorruptPalette { index: usize, palette_size: usize },

    #[error("sub-region '{0}' is missing its container or metadata maps")]
    MissingRegionData(String),

    #[error("schematic conversion failed: {0}")]
    Conversion(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid schematic data: {0}")]
    InvalidFormat(String),
}

impl SchematicError {
    pub(crate) fn out_of_bounds(x: i32, y: i32, z: i32, size: (usize, usize, usize)) -> Self {
        SchematicError::OutOfBounds {
            x,
            y,
            z,
            size_x: size.0,
            size_y: size.1,
            size_z: size.2,
        }
    }

    pub(crate) fn conversion<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        SchematicError::Conversion(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SchematicError::out_of_bounds(2, 0, -1, (2, 2, 2));
        assert_eq!(
            err.to_string(),
            "position (2, 0, -1) is outside the 2x2x2 volume"
        );

        let err = SchematicError::CorruptPalette {
            index: 7,
            palette_size: 3,
        };
        assert!(err.to_string().contains("palette index 7"));
    }
}
