//! Palette sections (1.13 and later).
//!
//! Each 16x16x16 section holds a palette of block states and a packed array
//! of palette indices. Until 1.17 they sit in `Level.Sections` as `Palette`
//! and `BlockStates`; from 1.18 in the root `sections` as
//! `block_states { palette, data }`.

use std::collections::BTreeMap;

use worldread_nbt::{AccessError, AccessErrorKind, Compound, List, TagKind};

use super::packed::{Packing, ceil_log2, unpack};
use super::storage::{SECTION_HEIGHT, SECTION_VOLUME, section_index, section_y};
use super::{Block, BlockState, ColumnStorage};
use crate::DecodeError;

/// DataVersion of 1.18, where the overworld floor moved to -64.
const DEEP_WORLD_SINCE: i32 = 2860;

#[derive(Debug, Clone)]
struct PaletteSection {
    palette: Vec<BlockState>,
    /// `None` for a single-entry palette.
    indices: Option<Vec<u16>>,
}

impl PaletteSection {
    fn state(&self, index: usize) -> Option<&BlockState> {
        match &self.indices {
            None => self.palette.first(),
            Some(indices) => self.palette.get(usize::from(*indices.get(index)?)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionedPaletteStorage {
    min_y: i32,
    max_y: i32,
    sections: BTreeMap<i32, PaletteSection>,
    air: BlockState,
}

/// Vertical range of a palette chunk before looking at its sections.
pub(crate) fn base_range(data_version: Option<i32>, y_pos: Option<i32>) -> (i32, i32) {
    let min_y = match (y_pos, data_version) {
        (Some(y), _) => y * SECTION_HEIGHT,
        (None, Some(v)) if v >= DEEP_WORLD_SINCE => -64,
        _ => 0,
    };
    let height = if min_y < 0 { 384 } else { 256 };
    (min_y, min_y + height)
}

pub(crate) fn read_palette(list: &List, what: &str) -> Result<Vec<BlockState>, AccessError> {
    if !list.is_empty() && list.kind() != TagKind::Compound {
        return Err(AccessError::mismatch(what, TagKind::Compound, list.kind()));
    }
    list.compounds().map(BlockState::from_compound).collect()
}

impl SectionedPaletteStorage {
    /// `sections` may be absent for proto chunks that have none yet.
    pub fn from_sections(
        list: Option<&List>,
        data_version: Option<i32>,
        y_pos: Option<i32>,
    ) -> Result<Self, DecodeError> {
        let hint = Packing::for_data_version(data_version);
        let mut sections = BTreeMap::new();

        for compound in list.into_iter().flat_map(List::compounds) {
            let y = section_y(compound)?;
            let Some(section) = read_section(compound, y, hint)? else {
                continue;
            };
            if sections.insert(y, section).is_some() {
                log::warn!("section {y} appears twice, keeping the last one");
            }
        }

        let (mut min_y, mut max_y) = base_range(data_version, y_pos);
        if let Some(&lowest) = sections.keys().next() {
            min_y = min_y.min(lowest * SECTION_HEIGHT);
        }
        if let Some(&top) = sections.keys().next_back() {
            max_y = max_y.max((top + 1) * SECTION_HEIGHT);
        }
        Ok(Self {
            min_y,
            max_y,
            sections,
            air: BlockState::air(),
        })
    }

    pub fn palette(&self, section_y: i32) -> Option<&[BlockState]> {
        self.sections.get(&section_y).map(|s| s.palette.as_slice())
    }
}

/// `None` for a section without blocks (light only, or all air).
fn read_section(section: &Compound, y: i32, hint: Packing) -> Result<Option<PaletteSection>, DecodeError> {
    let (palette, data, data_path) = match section.find_as::<&Compound>("block_states")? {
        Some(states) => (
            states.find_as::<&List>("palette")?,
            states.find_as::<&[i64]>("data")?,
            "block_states.data",
        ),
        None => (
            section.find_as::<&List>("Palette")?,
            section.find_as::<&[i64]>("BlockStates")?,
            "BlockStates",
        ),
    };
    let Some(palette) = palette else {
        return Ok(None);
    };
    let palette = read_palette(palette, "Palette")?;
    if palette.iter().all(BlockState::is_air) {
        return Ok(None);
    }
    if palette.len() == 1 {
        return Ok(Some(PaletteSection {
            palette,
            indices: None,
        }));
    }

    let data = data.ok_or_else(|| AccessError::new(data_path, AccessErrorKind::Missing))?;
    let bits = ceil_log2(palette.len()).max(4);
    let indices = unpack(data, bits, SECTION_VOLUME, hint).ok_or(DecodeError::BadPacking {
        what: "block states",
        longs: data.len(),
        count: SECTION_VOLUME,
        bits,
    })?;
    if let Some(&index) = indices.iter().find(|&&i| usize::from(i) >= palette.len()) {
        return Err(DecodeError::BadPaletteIndex {
            section: y,
            index,
            len: palette.len(),
        });
    }
    Ok(Some(PaletteSection {
        palette,
        indices: Some(indices),
    }))
}

impl ColumnStorage for SectionedPaletteStorage {
    fn min_y(&self) -> i32 {
        self.min_y
    }

    fn max_y(&self) -> i32 {
        self.max_y
    }

    fn block(&self, x: usize, y: i32, z: usize) -> Block<'_> {
        let state = self
            .sections
            .get(&y.div_euclid(SECTION_HEIGHT))
            .and_then(|s| s.state(section_index(x, y, z)))
            .unwrap_or(&self.air);
        Block::State(state)
    }

    fn section_ys(&self) -> Vec<i32> {
        self.sections.keys().copied().collect()
    }
}
