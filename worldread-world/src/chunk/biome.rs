use std::collections::BTreeMap;
use std::fmt;

use worldread_nbt::{AccessError, AccessErrorKind, Compound, List, Tag, TagKind};

use super::packed::{Packing, ceil_log2, unpack};
use super::storage::section_y;
use crate::DecodeError;

const COLUMNS: usize = 256;
const CELLS_PER_LAYER: usize = 16;
const CELLS_PER_SECTION: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Biome<'a> {
    /// Numeric biome id (before 1.18).
    Id(i32),
    /// Namespaced biome name (1.18 and later).
    Named(&'a str),
}

impl fmt::Display for Biome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Biome::Id(id) => write!(f, "{id}"),
            Biome::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BiomeSection {
    palette: Vec<String>,
    indices: Option<Vec<u16>>,
}

/// The biome storage of a chunk.
#[derive(Debug, Clone, Default)]
pub enum BiomeLayout {
    #[default]
    Absent,
    /// One id per column, `z * 16 + x`.
    Columns(Vec<i32>),
    /// One id per 4x4x4 cell, `cy * 16 + cz * 4 + cx`, counted from `min_y`.
    Cells { ids: Vec<i32>, min_y: i32 },
    /// Per-section palettes of names, keyed by section y.
    Sectioned(BTreeMap<i32, BiomeSection>),
}

impl BiomeLayout {
    pub(crate) fn read(body: &Compound, sections: Option<&List>, min_y: i32) -> Result<Self, DecodeError> {
        match body.get("Biomes") {
            None => {}
            // vanilla writes an empty array for chunks without biomes
            Some(Tag::ByteArray(ids)) => {
                return match ids.len() {
                    0 => Ok(Self::Absent),
                    COLUMNS => Ok(Self::Columns(ids.iter().map(|&b| i32::from(b as u8)).collect())),
                    found => Err(bad_length(found)),
                };
            }
            Some(Tag::IntArray(ids)) => {
                return match ids.len() {
                    0 => Ok(Self::Absent),
                    COLUMNS => Ok(Self::Columns(ids.clone())),
                    found if found % CELLS_PER_LAYER == 0 => Ok(Self::Cells {
                        ids: ids.clone(),
                        min_y,
                    }),
                    found => Err(bad_length(found)),
                };
            }
            Some(other) => return Err(AccessError::mismatch("Biomes", TagKind::IntArray, other.kind()).into()),
        }

        let mut by_section = BTreeMap::new();
        for compound in sections.into_iter().flat_map(List::compounds) {
            let Some(biomes) = compound.find_as::<&Compound>("biomes")? else {
                continue;
            };
            let y = section_y(compound)?;
            if let Some(section) = read_section(biomes, y)? {
                by_section.insert(y, section);
            }
        }
        if by_section.is_empty() {
            Ok(Self::Absent)
        } else {
            Ok(Self::Sectioned(by_section))
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Whether the biome varies with height.
    pub fn is_3d(&self) -> bool {
        matches!(self, Self::Cells { .. } | Self::Sectioned(_))
    }

    /// `x`, `z` in 0..16. Cells outside the stored range clamp to the nearest
    /// stored layer.
    pub fn sample(&self, x: usize, y: i32, z: usize) -> Option<Biome<'_>> {
        let cell = (z / 4) * 4 + x / 4;
        match self {
            Self::Absent => None,
            Self::Columns(ids) => ids.get(z * 16 + x).copied().map(Biome::Id),
            Self::Cells { ids, min_y } => {
                let layers = ids.len() / CELLS_PER_LAYER;
                let layer = ((y - min_y).div_euclid(4)).clamp(0, layers as i32 - 1) as usize;
                ids.get(layer * CELLS_PER_LAYER + cell).copied().map(Biome::Id)
            }
            Self::Sectioned(sections) => {
                let section = sections.get(&y.div_euclid(16))?;
                let layer = (y.rem_euclid(16) / 4) as usize;
                let entry = match &section.indices {
                    None => section.palette.first()?,
                    Some(indices) => section
                        .palette
                        .get(usize::from(*indices.get(layer * CELLS_PER_LAYER + cell)?))?,
                };
                Some(Biome::Named(entry))
            }
        }
    }
}

fn bad_length(found: usize) -> DecodeError {
    DecodeError::BadLength {
        what: "Biomes",
        expected: COLUMNS,
        found,
    }
}

fn read_section(biomes: &Compound, y: i32) -> Result<Option<BiomeSection>, DecodeError> {
    let Some(list) = biomes.find_as::<&List>("palette")? else {
        return Ok(None);
    };
    if !list.is_empty() && list.kind() != TagKind::String {
        return Err(AccessError::mismatch("biomes.palette", TagKind::String, list.kind()).into());
    }
    let palette: Vec<String> = list.iter().filter_map(Tag::as_str).map(str::to_owned).collect();
    match palette.len() {
        0 => Ok(None),
        1 => Ok(Some(BiomeSection {
            palette,
            indices: None,
        })),
        len => {
            let data = biomes
                .find_as::<&[i64]>("data")?
                .ok_or_else(|| AccessError::new("biomes.data", AccessErrorKind::Missing))?;
            let bits = ceil_log2(len);
            let indices = unpack(data, bits, CELLS_PER_SECTION, Packing::Aligned).ok_or(DecodeError::BadPacking {
                what: "biomes",
                longs: data.len(),
                count: CELLS_PER_SECTION,
                bits,
            })?;
            if let Some(&index) = indices.iter().find(|&&i| usize::from(i) >= len) {
                return Err(DecodeError::BadPaletteIndex { section: y, index, len });
            }
            Ok(Some(BiomeSection {
                palette,
                indices: Some(indices),
            }))
        }
    }
}
