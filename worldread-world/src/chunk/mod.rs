//! Typed view over one decoded chunk.
//!
//! Three storage eras are told apart by the structure of the tree:
//! - McRegion: a flat `Level.Blocks` column, 128 high.
//! - Legacy Anvil: `Level.Sections` carrying numeric `Blocks`, 256 high.
//! - Palette: sections carrying `Palette`/`BlockStates` (1.13 to 1.17,
//!   still under `Level`) or `block_states` (1.18 and later, at the root).

mod biome;
mod block;
mod heightmap;
mod legacy;
pub(crate) mod packed;
mod palette;
mod storage;

use std::sync::OnceLock;

use worldread_anvil::{ChunkPos, LocalPos, RegionPos};
use worldread_nbt::{AccessError, Compound, List, NamedTag, Tag, TagKind};

pub use biome::{Biome, BiomeLayout, BiomeSection};
pub use block::{Block, BlockState};
pub use heightmap::HeightMap;
pub use legacy::{LegacyFlatStorage, LegacyLayout};
pub use packed::Packing;
pub use palette::SectionedPaletteStorage;
pub use storage::{BlockStorage, ColumnStorage};

use crate::{DecodeError, Error};

/// DataVersion of 17w47a, where numeric ids gave way to block states.
const FLATTENING_SINCE: i32 = 1451;

/// Sea level; 2D biome queries sample 3D layouts here.
const BIOME_SAMPLE_Y: i32 = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    McRegion,
    LegacyAnvil,
    Palette,
}

impl std::fmt::Display for Era {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Era::McRegion => "mcregion",
            Era::LegacyAnvil => "anvil (numeric ids)",
            Era::Palette => "anvil (palette)",
        })
    }
}

#[derive(Debug)]
pub struct Chunk {
    pos: ChunkPos,
    timestamp: u32,
    nbt: NamedTag,
    data_version: Option<i32>,
    era: Era,
    storage: BlockStorage,
    height_map: Option<HeightMap>,
    biomes: BiomeLayout,
    max_height: OnceLock<Option<i32>>,
}

impl Chunk {
    /// Parses an uncompressed payload.
    pub fn from_bytes(pos: ChunkPos, timestamp: u32, data: &[u8]) -> Result<Self, DecodeError> {
        Self::from_nbt(pos, timestamp, worldread_nbt::from_bytes(data)?)
    }

    /// `pos` is the slot the chunk was read from.
    pub fn from_nbt(pos: ChunkPos, timestamp: u32, nbt: NamedTag) -> Result<Self, DecodeError> {
        let root = nbt
            .compound()
            .ok_or_else(|| AccessError::mismatch("", TagKind::Compound, nbt.tag.kind()))?;
        let data_version = root.find_as::<i32>("DataVersion")?;
        let body = root.find_as::<&Compound>("Level")?.unwrap_or(root);
        check_position(pos, body);

        let sections = match body.find_as::<&List>("sections")? {
            Some(list) => Some(list),
            None => body.find_as::<&List>("Sections")?,
        };
        let era = detect_era(body, sections, data_version)?;

        let storage = match (era, sections) {
            (Era::McRegion, _) => BlockStorage::LegacyFlat(LegacyFlatStorage::from_column(body)?),
            (Era::LegacyAnvil, Some(list)) => BlockStorage::LegacyFlat(LegacyFlatStorage::from_sections(list)?),
            (Era::LegacyAnvil, None) => BlockStorage::LegacyFlat(LegacyFlatStorage::from_sections(&List::default())?),
            (Era::Palette, _) => {
                let y_pos = body
                    .get("yPos")
                    .and_then(Tag::as_i64)
                    .map(|y| storage::checked_section_y("yPos", y))
                    .transpose()?;
                BlockStorage::SectionedPalette(SectionedPaletteStorage::from_sections(sections, data_version, y_pos)?)
            }
        };

        let height_map = match era {
            Era::McRegion | Era::LegacyAnvil => HeightMap::from_legacy(body)?,
            Era::Palette => HeightMap::from_packed(body, storage.min_y(), storage.max_y(), data_version)?,
        };
        let biomes = BiomeLayout::read(body, sections, storage.min_y())?;

        log::debug!("decoded chunk {pos}: {era}, {} sections", storage.section_ys().len());
        Ok(Self {
            pos,
            timestamp,
            data_version,
            era,
            storage,
            height_map,
            biomes,
            max_height: OnceLock::new(),
            nbt,
        })
    }

    /// `x`, `z` local in 0..16, `y` absolute in `min_y()..max_y()`.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Result<Block<'_>, Error> {
        if !(0..16).contains(&x) || !(0..16).contains(&z) || !(self.min_y()..self.max_y()).contains(&y) {
            return Err(Error::OutOfRange { pos: self.pos, x, y, z });
        }
        Ok(self.storage.block(x as usize, y, z as usize))
    }

    /// The y of the highest non-air block, `None` for an empty chunk.
    pub fn get_max_height(&self) -> Option<i32> {
        *self.max_height.get_or_init(|| self.storage.highest_block())
    }

    pub fn height_map(&self) -> Option<&HeightMap> {
        self.height_map.as_ref()
    }

    pub fn get_biome(&self, x: i32, z: i32) -> Option<Biome<'_>> {
        let y = if self.biomes.is_3d() {
            BIOME_SAMPLE_Y.clamp(self.min_y(), self.max_y() - 1)
        } else {
            0
        };
        self.biome_at(x, y, z)
    }

    pub fn biome_at(&self, x: i32, y: i32, z: i32) -> Option<Biome<'_>> {
        if !(0..16).contains(&x) || !(0..16).contains(&z) {
            return None;
        }
        self.biomes.sample(x as usize, y, z as usize)
    }

    pub fn biomes(&self) -> &BiomeLayout {
        &self.biomes
    }

    pub fn data_version(&self) -> Option<i32> {
        self.data_version
    }

    /// Generation status, e.g. `minecraft:full` or `full`.
    pub fn status(&self) -> Option<&str> {
        self.body()?.get("Status").and_then(Tag::as_str)
    }

    /// Last write time from the region header, in epoch seconds.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn section_ys(&self) -> Vec<i32> {
        self.storage.section_ys()
    }

    pub fn era(&self) -> Era {
        self.era
    }

    pub fn min_y(&self) -> i32 {
        self.storage.min_y()
    }

    pub fn max_y(&self) -> i32 {
        self.storage.max_y()
    }

    pub fn storage(&self) -> &BlockStorage {
        &self.storage
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn region(&self) -> RegionPos {
        self.pos.region()
    }

    pub fn local(&self) -> LocalPos {
        self.pos.local()
    }

    pub fn nbt(&self) -> &NamedTag {
        &self.nbt
    }

    fn body(&self) -> Option<&Compound> {
        let root = self.nbt.compound()?;
        Some(root.get("Level").and_then(Tag::as_compound).unwrap_or(root))
    }
}

fn detect_era(body: &Compound, sections: Option<&List>, data_version: Option<i32>) -> Result<Era, DecodeError> {
    if body.contains_key("Blocks") {
        return Ok(Era::McRegion);
    }
    let Some(sections) = sections else {
        // proto chunks may have no sections yet
        return match data_version {
            Some(_) => Ok(Era::Palette),
            None => Err(DecodeError::UnknownLayout),
        };
    };
    if sections.compounds().any(|s| s.contains_key("Blocks")) {
        return Ok(Era::LegacyAnvil);
    }
    if sections
        .compounds()
        .any(|s| s.contains_key("Palette") || s.contains_key("block_states"))
    {
        return Ok(Era::Palette);
    }
    // light-only sections say nothing; fall back to the version
    match data_version {
        Some(v) if v >= FLATTENING_SINCE => Ok(Era::Palette),
        _ => Ok(Era::LegacyAnvil),
    }
}

fn check_position(pos: ChunkPos, body: &Compound) {
    let stored_x = body.get("xPos").and_then(Tag::as_i64);
    let stored_z = body.get("zPos").and_then(Tag::as_i64);
    if let (Some(x), Some(z)) = (stored_x, stored_z) {
        if x != i64::from(pos.x) || z != i64::from(pos.z) {
            log::warn!("chunk in slot {pos} says it is at ({x}, {z}), keeping the slot position");
        }
    }
}
