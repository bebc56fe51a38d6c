use worldread_nbt::{AccessError, Compound, Tag, TagKind};

use super::packed::{Packing, ceil_log2, unpack};
use crate::DecodeError;

const COLUMNS: usize = 256;

/// Per-column surface heights, absolute y of the first air block above the
/// surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightMap {
    values: Vec<i32>,
}

impl HeightMap {
    /// `Level.HeightMap`: an int array (Anvil) or unsigned bytes (McRegion).
    pub(crate) fn from_legacy(level: &Compound) -> Result<Option<Self>, DecodeError> {
        let values: Vec<i32> = match level.get("HeightMap") {
            None => return Ok(None),
            Some(Tag::IntArray(values)) => values.clone(),
            Some(Tag::ByteArray(values)) => values.iter().map(|&b| i32::from(b as u8)).collect(),
            Some(other) => return Err(AccessError::mismatch("HeightMap", TagKind::IntArray, other.kind()).into()),
        };
        if values.len() != COLUMNS {
            return Err(DecodeError::BadLength {
                what: "HeightMap",
                expected: COLUMNS,
                found: values.len(),
            });
        }
        Ok(Some(Self { values }))
    }

    /// `Heightmaps.WORLD_SURFACE` (or `MOTION_BLOCKING`), packed relative to
    /// `min_y`.
    pub(crate) fn from_packed(
        body: &Compound,
        min_y: i32,
        max_y: i32,
        data_version: Option<i32>,
    ) -> Result<Option<Self>, DecodeError> {
        let Some(maps) = body.find_as::<&Compound>("Heightmaps")? else {
            return Ok(None);
        };
        let longs = match maps.find_as::<&[i64]>("WORLD_SURFACE")? {
            Some(longs) => longs,
            None => match maps.find_as::<&[i64]>("MOTION_BLOCKING")? {
                Some(longs) => longs,
                None => return Ok(None),
            },
        };
        let height = (max_y - min_y).max(1) as usize;
        let bits = ceil_log2(height + 1);
        let packed = unpack(longs, bits, COLUMNS, Packing::for_data_version(data_version)).ok_or(
            DecodeError::BadPacking {
                what: "Heightmaps",
                longs: longs.len(),
                count: COLUMNS,
                bits,
            },
        )?;
        Ok(Some(Self {
            values: packed.into_iter().map(|v| min_y + i32::from(v)).collect(),
        }))
    }

    pub fn get(&self, x: usize, z: usize) -> Option<i32> {
        if x >= 16 || z >= 16 {
            return None;
        }
        self.values.get(z * 16 + x).copied()
    }

    /// Row-major, `z * 16 + x`.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn max(&self) -> Option<i32> {
        self.values.iter().copied().max()
    }
}
