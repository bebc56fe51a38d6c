use worldread_nbt::{AccessError, AccessErrorKind, Compound, Tag, TagKind};

use super::{Block, LegacyFlatStorage, SectionedPaletteStorage};
use crate::DecodeError;

pub(crate) const SECTION_HEIGHT: i32 = 16;
pub(crate) const SECTION_VOLUME: usize = 4096;

/// Index of (x, y, z) inside a 16x16x16 section, YZX order.
#[inline]
pub(crate) fn section_index(x: usize, y: i32, z: usize) -> usize {
    (y.rem_euclid(SECTION_HEIGHT) as usize) * 256 + z * 16 + x
}

/// Section `Y`, stored as a byte by vanilla but accepted as any narrower int.
pub(crate) fn section_y(section: &Compound) -> Result<i32, DecodeError> {
    match section.get("Y") {
        Some(Tag::Byte(y)) => Ok(i32::from(*y)),
        Some(Tag::Short(y)) => checked_section_y("Y", i64::from(*y)),
        Some(Tag::Int(y)) => checked_section_y("Y", i64::from(*y)),
        Some(other) => Err(AccessError::mismatch("Y", TagKind::Byte, other.kind()).into()),
        None => Err(AccessError::new("Y", AccessErrorKind::Missing).into()),
    }
}

/// Section indices must fit the byte vanilla writes, so that block y
/// arithmetic on them cannot overflow.
pub(crate) fn checked_section_y(what: &'static str, y: i64) -> Result<i32, DecodeError> {
    i8::try_from(y)
        .map(i32::from)
        .map_err(|_| DecodeError::BadSectionY { what, y })
}

/// Vertical extent and block lookup shared by every storage era.
pub trait ColumnStorage {
    /// Lowest valid y.
    fn min_y(&self) -> i32;

    /// One past the highest valid y.
    fn max_y(&self) -> i32;

    /// `x` and `z` must be in 0..16 and `y` in `min_y..max_y`.
    fn block(&self, x: usize, y: i32, z: usize) -> Block<'_>;

    /// Section indices that hold any non-air block, ascending.
    fn section_ys(&self) -> Vec<i32>;

    /// The y of the highest non-air block.
    fn highest_block(&self) -> Option<i32> {
        for section in self.section_ys().into_iter().rev() {
            let bottom = (section * SECTION_HEIGHT).max(self.min_y());
            let top = (section * SECTION_HEIGHT + SECTION_HEIGHT - 1).min(self.max_y() - 1);
            for y in (bottom..=top).rev() {
                for z in 0..16 {
                    for x in 0..16 {
                        if !self.block(x, y, z).is_air() {
                            return Some(y);
                        }
                    }
                }
            }
        }
        None
    }
}

/// The block storage of one chunk, chosen from its structure at decode time.
#[derive(Debug, Clone)]
pub enum BlockStorage {
    LegacyFlat(LegacyFlatStorage),
    SectionedPalette(SectionedPaletteStorage),
}

impl ColumnStorage for BlockStorage {
    fn min_y(&self) -> i32 {
        match self {
            Self::LegacyFlat(s) => s.min_y(),
            Self::SectionedPalette(s) => s.min_y(),
        }
    }

    fn max_y(&self) -> i32 {
        match self {
            Self::LegacyFlat(s) => s.max_y(),
            Self::SectionedPalette(s) => s.max_y(),
        }
    }

    fn block(&self, x: usize, y: i32, z: usize) -> Block<'_> {
        match self {
            Self::LegacyFlat(s) => s.block(x, y, z),
            Self::SectionedPalette(s) => s.block(x, y, z),
        }
    }

    fn section_ys(&self) -> Vec<i32> {
        match self {
            Self::LegacyFlat(s) => s.section_ys(),
            Self::SectionedPalette(s) => s.section_ys(),
        }
    }

    fn highest_block(&self) -> Option<i32> {
        match self {
            Self::LegacyFlat(s) => s.highest_block(),
            Self::SectionedPalette(s) => s.highest_block(),
        }
    }
}
