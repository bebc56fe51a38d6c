//! Numeric block ids from before the 1.13 flattening.
//!
//! McRegion stores one 16x16x128 column under `Level.Blocks`, indexed
//! `y + z * 128 + x * 2048`. Anvil splits the column into 16-high sections
//! with `Blocks`, an optional `Add` nibble array for ids above 255, and a
//! `Data` nibble array, all indexed `y * 256 + z * 16 + x`. Both are
//! normalized into the Anvil section layout here.

use std::collections::BTreeMap;

use worldread_nbt::{Compound, List};

use super::storage::{SECTION_HEIGHT, SECTION_VOLUME, section_index, section_y};
use super::{Block, ColumnStorage};
use crate::DecodeError;

const MCREGION_HEIGHT: i32 = 128;
const ANVIL_HEIGHT: i32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyLayout {
    /// One flat column, 128 high.
    McRegion,
    /// Numeric sections, 256 high.
    Anvil,
}

#[derive(Debug, Clone)]
struct NumericSection {
    ids: Vec<u16>,
    data: Vec<u8>,
}

impl NumericSection {
    fn empty() -> Self {
        Self {
            ids: vec![0; SECTION_VOLUME],
            data: vec![0; SECTION_VOLUME],
        }
    }

    fn is_air(&self) -> bool {
        self.ids.iter().all(|&id| id == 0)
    }
}

#[inline]
fn nibble(array: &[i8], index: usize) -> u8 {
    let byte = array[index / 2] as u8;
    if index % 2 == 0 { byte & 0x0F } else { byte >> 4 }
}

fn checked<'a>(array: Option<&'a [i8]>, what: &'static str, expected: usize) -> Result<Option<&'a [i8]>, DecodeError> {
    match array {
        Some(a) if a.len() != expected => Err(DecodeError::BadLength {
            what,
            expected,
            found: a.len(),
        }),
        other => Ok(other),
    }
}

#[derive(Debug, Clone)]
pub struct LegacyFlatStorage {
    layout: LegacyLayout,
    min_y: i32,
    max_y: i32,
    sections: BTreeMap<i32, NumericSection>,
}

impl LegacyFlatStorage {
    /// From a McRegion `Level` compound holding `Blocks` and `Data`.
    pub fn from_column(level: &Compound) -> Result<Self, DecodeError> {
        let volume = 16 * 16 * MCREGION_HEIGHT as usize;
        let blocks = level.get_as::<&[i8]>("Blocks")?;
        if blocks.len() != volume {
            return Err(DecodeError::BadLength {
                what: "Blocks",
                expected: volume,
                found: blocks.len(),
            });
        }
        let data = checked(level.find_as::<&[i8]>("Data")?, "Data", volume / 2)?;

        let mut sections: BTreeMap<i32, NumericSection> = BTreeMap::new();
        for x in 0..16 {
            for z in 0..16 {
                for y in 0..MCREGION_HEIGHT {
                    let src = y as usize + z * MCREGION_HEIGHT as usize + x * 16 * MCREGION_HEIGHT as usize;
                    let section = sections
                        .entry(y / SECTION_HEIGHT)
                        .or_insert_with(NumericSection::empty);
                    let dst = section_index(x, y, z);
                    section.ids[dst] = u16::from(blocks[src] as u8);
                    section.data[dst] = data.map_or(0, |d| nibble(d, src));
                }
            }
        }
        sections.retain(|_, s| !s.is_air());

        Ok(Self {
            layout: LegacyLayout::McRegion,
            min_y: 0,
            max_y: MCREGION_HEIGHT,
            sections,
        })
    }

    /// From an Anvil `Sections` list. Sections without `Blocks` carry only
    /// light and are skipped.
    pub fn from_sections(list: &List) -> Result<Self, DecodeError> {
        let mut sections = BTreeMap::new();
        for compound in list.compounds() {
            let y = section_y(compound)?;
            let Some(blocks) = checked(compound.find_as::<&[i8]>("Blocks")?, "Blocks", SECTION_VOLUME)? else {
                continue;
            };
            let add = checked(compound.find_as::<&[i8]>("Add")?, "Add", SECTION_VOLUME / 2)?;
            let data = checked(compound.find_as::<&[i8]>("Data")?, "Data", SECTION_VOLUME / 2)?;

            let mut section = NumericSection::empty();
            for i in 0..SECTION_VOLUME {
                let high = add.map_or(0, |a| u16::from(nibble(a, i)));
                section.ids[i] = u16::from(blocks[i] as u8) | (high << 8);
                section.data[i] = data.map_or(0, |d| nibble(d, i));
            }
            if section.is_air() {
                continue;
            }
            if sections.insert(y, section).is_some() {
                log::warn!("section {y} appears twice, keeping the last one");
            }
        }

        let min_y = sections
            .keys()
            .next()
            .map_or(0, |&lowest| (lowest * SECTION_HEIGHT).min(0));
        let max_y = sections
            .keys()
            .next_back()
            .map_or(ANVIL_HEIGHT, |&top| ((top + 1) * SECTION_HEIGHT).max(ANVIL_HEIGHT));
        Ok(Self {
            layout: LegacyLayout::Anvil,
            min_y,
            max_y,
            sections,
        })
    }

    pub fn layout(&self) -> LegacyLayout {
        self.layout
    }
}

impl ColumnStorage for LegacyFlatStorage {
    fn min_y(&self) -> i32 {
        self.min_y
    }

    fn max_y(&self) -> i32 {
        self.max_y
    }

    fn block(&self, x: usize, y: i32, z: usize) -> Block<'_> {
        match self.sections.get(&y.div_euclid(SECTION_HEIGHT)) {
            Some(section) => {
                let i = section_index(x, y, z);
                Block::Legacy {
                    id: section.ids[i],
                    data: section.data[i],
                }
            }
            None => Block::Legacy { id: 0, data: 0 },
        }
    }

    fn section_ys(&self) -> Vec<i32> {
        self.sections.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use worldread_nbt::{Tag, TagKind};

    use super::*;

    fn set_nibble(array: &mut [i8], index: usize, value: u8) {
        let byte = array[index / 2] as u8;
        array[index / 2] = if index % 2 == 0 {
            (byte & 0xF0) | value
        } else {
            (byte & 0x0F) | (value << 4)
        } as i8;
    }

    #[test]
    fn test_mcregion_column_index() {
        let mut blocks = vec![0i8; 32768];
        let mut data = vec![0i8; 16384];
        // x = 2, y = 70, z = 5
        let i = 70 + 5 * 128 + 2 * 2048;
        blocks[i] = 35;
        set_nibble(&mut data, i, 14);
        blocks[0] = 7;
        let level = Compound::new().with("Blocks", blocks).with("Data", data);

        let storage = LegacyFlatStorage::from_column(&level).unwrap();
        assert_eq!(storage.max_y(), 128);
        assert_eq!(storage.block(2, 70, 5), Block::Legacy { id: 35, data: 14 });
        assert_eq!(storage.block(5, 70, 2), Block::Legacy { id: 0, data: 0 });
        assert_eq!(storage.block(0, 0, 0).id(), Some(7));
        assert_eq!(storage.section_ys(), vec![0, 4]);
        assert_eq!(storage.highest_block(), Some(70));
    }

    #[test]
    fn test_mcregion_wrong_length() {
        let level = Compound::new().with("Blocks", vec![0i8; 4096]);
        let err = LegacyFlatStorage::from_column(&level).unwrap_err();
        assert!(matches!(err, DecodeError::BadLength { what: "Blocks", expected: 32768, found: 4096 }));
    }

    #[test]
    fn test_anvil_add_nibble() {
        let mut blocks = vec![0i8; 4096];
        let mut add = vec![0i8; 2048];
        let i = 3 * 256 + 4 * 16 + 1;
        blocks[i] = 0x10;
        set_nibble(&mut add, i, 1);

        let mut list = List::new(TagKind::Compound);
        list.push(Compound::new().with("Y", 2i8).with("Blocks", blocks).with("Add", add))
            .unwrap();
        // light-only section
        list.push(Compound::new().with("Y", 3i8).with("BlockLight", vec![0i8; 2048]))
            .unwrap();

        let storage = LegacyFlatStorage::from_sections(&list).unwrap();
        assert_eq!(storage.layout(), LegacyLayout::Anvil);
        assert_eq!(storage.max_y(), 256);
        assert_eq!(storage.block(1, 35, 4).id(), Some(0x110));
        assert_eq!(storage.section_ys(), vec![2]);
        assert_eq!(storage.highest_block(), Some(35));
    }

    #[test]
    fn test_anvil_section_needs_y() {
        let mut list = List::new(TagKind::Compound);
        list.push(Tag::Compound(Compound::new().with("Blocks", vec![1i8; 4096])))
            .unwrap();
        assert!(matches!(
            LegacyFlatStorage::from_sections(&list),
            Err(DecodeError::Schema(_))
        ));
    }
}
