//! Minecraft world saves, read-only.
//!
//! [`WorldFolder`] indexes the region files of one dimension and decodes
//! chunks on demand into [`Chunk`] views that answer block, height and
//! biome queries across the McRegion, legacy Anvil and palette eras.

pub mod chunk;
mod error;
mod folder;
mod level;
mod options;
#[cfg(test)]
mod testkit;

pub use chunk::{Biome, Block, BlockState, Chunk, ColumnStorage, Era, HeightMap};
pub use error::{DecodeError, Error};
pub use folder::{ChunkIter, WorldFolder};
pub use level::LevelInfo;
pub use options::{Dimension, UnknownDimension, WorldOptions};
pub use worldread_anvil::{BlockRange, BoundingBox, ChunkPos, LocalPos, RegionFormat, RegionPos};
pub use worldread_nbt::{Compound, List, NamedTag, Tag, TagKind};
