use std::io;
use std::path::PathBuf;

use thiserror::Error;
use worldread_anvil::{ChunkPos, RegionError};
use worldread_nbt::{AccessError, NbtError};

/// Why a chunk (or `level.dat`) could not be turned into a typed view.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed tag tree: {0}")]
    Nbt(#[from] NbtError),

    #[error("unexpected structure: {0}")]
    Schema(#[from] AccessError),

    #[error("no block storage: neither a section list nor a flat block array")]
    UnknownLayout,

    #[error("{what} has {found} entries, expected {expected}")]
    BadLength {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("section {section}: palette index {index} out of range for {len} entries")]
    BadPaletteIndex { section: i32, index: u16, len: usize },

    #[error("{what} {y} is outside the section range")]
    BadSectionY { what: &'static str, y: i64 },

    #[error("{what}: {longs} longs do not hold {count} entries of {bits} bits")]
    BadPacking {
        what: &'static str,
        longs: usize,
        count: usize,
        bits: u32,
    },

    #[error("invalid compressed stream: {0}")]
    Decompress(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("corrupt region file {}: {source}", path.display())]
    CorruptRegion { path: PathBuf, source: RegionError },

    #[error("corrupt chunk {pos}: {source}")]
    CorruptChunk { pos: ChunkPos, source: DecodeError },

    #[error("chunk {pos} not found")]
    ChunkNotFound { pos: ChunkPos },

    #[error("block ({x}, {y}, {z}) is outside chunk {pos}")]
    OutOfRange { pos: ChunkPos, x: i32, y: i32, z: i32 },

    #[error("i/o error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("corrupt level.dat {}: {source}", path.display())]
    CorruptLevel { path: PathBuf, source: DecodeError },
}

impl Error {
    /// Splits region failures into file system errors and bad data.
    pub(crate) fn region(path: impl Into<PathBuf>, err: RegionError) -> Self {
        match err {
            RegionError::Io(source) => Self::Io {
                path: path.into(),
                source,
            },
            source => Self::CorruptRegion {
                path: path.into(),
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ChunkNotFound { .. })
    }

    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::CorruptRegion { .. } | Self::CorruptChunk { .. } | Self::CorruptLevel { .. }
        )
    }
}
