//! Minecraft region files (.mca / .mcr).
//!
//! Region files contain 32x32 chunks in a specific binary format:
//! - Bytes 0-4095: Location table (1024 entries × 4 bytes)
//! - Bytes 4096-8191: Timestamp table (1024 entries × 4 bytes)
//! - Bytes 8192+: Chunk data, each payload starting on a 4 KiB sector
//!
//! This crate reads the tables and hands back decompressed chunk bytes.
//! It never looks inside a payload.

#[cfg(any(test, feature = "testkit"))]
mod builder;
mod compression;
pub mod coords;
mod error;
mod header;
mod region;

#[cfg(any(test, feature = "testkit"))]
pub use builder::RegionBuilder;
#[cfg(any(test, feature = "testkit"))]
pub use compression::compress;
pub use compression::{Compression, EXTERNAL_FLAG, decompress};
pub use coords::{BlockRange, BoundingBox, ChunkPos, LocalPos, REGION_SIZE, RegionPos};
pub use error::RegionError;
pub use header::{CHUNKS_PER_REGION, HEADER_SIZE, Location, RegionHeader, SECTOR_SIZE};
pub use region::{RawChunk, RegionFile, RegionFormat, RegionReader};
