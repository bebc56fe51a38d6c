//! Chunk, region and block coordinates.
//!
//! World coordinates may be negative, so every conversion uses floor
//! division and a non-negative remainder: chunk -1 lives in region -1 at
//! local 31, never in region 0 at local -1.

use std::fmt;

use crate::RegionFormat;

/// Number of chunks per region dimension.
pub const REGION_SIZE: i32 = 32;

/// Number of blocks per chunk dimension.
pub const CHUNK_WIDTH: i32 = 16;

/// Convert chunk coordinates to region coordinates.
#[inline]
pub fn chunk_to_region(chunk_coord: i32) -> i32 {
    chunk_coord.div_euclid(REGION_SIZE)
}

/// Convert chunk coordinates to local region coordinates (0-31).
#[inline]
pub fn chunk_to_local(chunk_coord: i32) -> i32 {
    chunk_coord.rem_euclid(REGION_SIZE)
}

/// World-space chunk coordinates.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing block column (`x`, `z`).
    pub fn from_block(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_WIDTH),
            z: z.div_euclid(CHUNK_WIDTH),
        }
    }

    pub fn region(self) -> RegionPos {
        RegionPos::new(chunk_to_region(self.x), chunk_to_region(self.z))
    }

    pub fn local(self) -> LocalPos {
        // rem_euclid keeps both in 0..32
        LocalPos {
            x: chunk_to_local(self.x) as u8,
            z: chunk_to_local(self.z) as u8,
        }
    }

    /// Blocks covered by this chunk column.
    pub fn block_range(self) -> BlockRange {
        let min_x = i64::from(self.x) * i64::from(CHUNK_WIDTH);
        let min_z = i64::from(self.z) * i64::from(CHUNK_WIDTH);
        BlockRange {
            min_x,
            max_x: min_x + 15,
            min_z,
            max_z: min_z + 15,
        }
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Region file coordinates (parsed from filename like "r.0.-1.mca").
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Parse region position from filename (e.g., "r.0.-1.mca" or "r.2.3.mcr").
    pub fn from_filename(name: &str) -> Option<(Self, RegionFormat)> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() != 4 || parts[0] != "r" {
            return None;
        }
        let format = RegionFormat::from_extension(parts[3])?;
        let x = parts[1].parse().ok()?;
        let z = parts[2].parse().ok()?;
        Some((Self { x, z }, format))
    }

    pub fn filename(self, format: RegionFormat) -> String {
        format!("r.{}.{}.{}", self.x, self.z, format.extension())
    }

    /// Convert local chunk coordinates to world chunk coordinates.
    pub fn chunk(self, local: LocalPos) -> ChunkPos {
        ChunkPos::new(
            self.x * REGION_SIZE + i32::from(local.x),
            self.z * REGION_SIZE + i32::from(local.z),
        )
    }
}

impl fmt::Display for RegionPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Chunk coordinates within one region, both in 0..32.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct LocalPos {
    x: u8,
    z: u8,
}

impl LocalPos {
    pub fn new(x: u8, z: u8) -> Option<Self> {
        (x < REGION_SIZE as u8 && z < REGION_SIZE as u8).then_some(Self { x, z })
    }

    pub fn x(self) -> u8 {
        self.x
    }

    pub fn z(self) -> u8 {
        self.z
    }

    /// Linear index for a chunk within a region (0-1023), `x + z * 32`.
    #[inline]
    pub fn index(self) -> usize {
        usize::from(self.z) * REGION_SIZE as usize + usize::from(self.x)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        let size = REGION_SIZE as usize;
        (index < size * size).then(|| Self {
            x: (index % size) as u8,
            z: (index / size) as u8,
        })
    }

    /// Every slot of a region in header order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..(REGION_SIZE * REGION_SIZE) as usize).filter_map(Self::from_index)
    }
}

impl fmt::Display for LocalPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Inclusive block extents in the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub min_x: i64,
    pub max_x: i64,
    pub min_z: i64,
    pub max_z: i64,
}

/// Axis-aligned extents in chunk units, inclusive on both ends.
///
/// [`BoundingBox::EMPTY`] has min > max, so any union replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub minx: i32,
    pub maxx: i32,
    pub minz: i32,
    pub maxz: i32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        minx: i32::MAX,
        maxx: i32::MIN,
        minz: i32::MAX,
        maxz: i32::MIN,
    };

    pub fn single(pos: ChunkPos) -> Self {
        Self {
            minx: pos.x,
            maxx: pos.x,
            minz: pos.z,
            maxz: pos.z,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.minx > self.maxx || self.minz > self.maxz
    }

    #[must_use]
    pub fn union(self, pos: ChunkPos) -> Self {
        self.merge(Self::single(pos))
    }

    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            minx: self.minx.min(other.minx),
            maxx: self.maxx.max(other.maxx),
            minz: self.minz.min(other.minz),
            maxz: self.maxz.max(other.maxz),
        }
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        (self.minx..=self.maxx).contains(&pos.x) && (self.minz..=self.maxz).contains(&pos.z)
    }

    /// Extent along x in chunks.
    pub fn width(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (i64::from(self.maxx) - i64::from(self.minx) + 1) as u64
    }

    /// Extent along z in chunks.
    pub fn length(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (i64::from(self.maxz) - i64::from(self.minz) + 1) as u64
    }

    /// The chunk at the floored midpoint of each axis.
    pub fn center(&self) -> Option<ChunkPos> {
        if self.is_empty() {
            return None;
        }
        let mid = |lo: i32, hi: i32| (i64::from(lo) + i64::from(hi)).div_euclid(2) as i32;
        Some(ChunkPos::new(mid(self.minx, self.maxx), mid(self.minz, self.maxz)))
    }

    pub fn block_range(&self) -> Option<BlockRange> {
        if self.is_empty() {
            return None;
        }
        let min = ChunkPos::new(self.minx, self.minz).block_range();
        let max = ChunkPos::new(self.maxx, self.maxz).block_range();
        Some(BlockRange {
            min_x: min.min_x,
            max_x: max.max_x,
            min_z: min.min_z,
            max_z: max.max_z,
        })
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<empty>");
        }
        write!(f, "x {}..={}, z {}..={}", self.minx, self.maxx, self.minz, self.maxz)
    }
}
