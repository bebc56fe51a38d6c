//! The 8 KiB region header.
//!
//! The header consists of two tables:
//! - Location table: where each chunk is stored
//! - Timestamp table: when each chunk was last saved

use std::io::Read;

use crate::{LocalPos, RegionError};

/// Size of one sector in bytes (4 KB).
pub const SECTOR_SIZE: usize = 4096;

/// Total header size (location table + timestamp table).
pub const HEADER_SIZE: usize = SECTOR_SIZE * 2; // 8192 bytes

pub const CHUNKS_PER_REGION: usize = 1024;

/// One location table entry: `[offset: 3 bytes][count: 1 byte]`, big endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub sector_offset: u32,
    pub sector_count: u8,
}

impl Location {
    pub fn from_raw(raw: [u8; 4]) -> Self {
        Self {
            sector_offset: u32::from_be_bytes([0, raw[0], raw[1], raw[2]]),
            sector_count: raw[3],
        }
    }

    pub fn to_raw(self) -> [u8; 4] {
        let [_, a, b, c] = self.sector_offset.to_be_bytes();
        [a, b, c, self.sector_count]
    }

    /// A zero offset marks an absent chunk, whatever the count says.
    pub fn is_present(self) -> bool {
        self.sector_offset != 0
    }

    pub fn byte_offset(self) -> u64 {
        u64::from(self.sector_offset) * SECTOR_SIZE as u64
    }

    /// Bytes reserved for the payload, which may exceed what it uses.
    pub fn byte_len(self) -> u64 {
        u64::from(self.sector_count) * SECTOR_SIZE as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHeader {
    locations: Vec<Location>,
    timestamps: Vec<u32>,
}

impl Default for RegionHeader {
    fn default() -> Self {
        Self::empty()
    }
}

impl RegionHeader {
    /// A header with every slot absent, as in a zero-length region file.
    pub fn empty() -> Self {
        Self {
            locations: vec![Location::default(); CHUNKS_PER_REGION],
            timestamps: vec![0; CHUNKS_PER_REGION],
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, RegionError> {
        if bytes.len() < HEADER_SIZE {
            return Err(RegionError::HeaderTruncated {
                len: bytes.len() as u64,
            });
        }
        let (locations, timestamps) = bytes[..HEADER_SIZE].split_at(SECTOR_SIZE);
        Ok(Self {
            locations: locations
                .chunks_exact(4)
                .map(|e| Location::from_raw([e[0], e[1], e[2], e[3]]))
                .collect(),
            timestamps: timestamps
                .chunks_exact(4)
                .map(|e| u32::from_be_bytes([e[0], e[1], e[2], e[3]]))
                .collect(),
        })
    }

    /// Reads the header from the start of `reader`.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, RegionError> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        reader.take(HEADER_SIZE as u64).read_to_end(&mut bytes)?;
        Self::parse(&bytes)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        for location in &self.locations {
            out.extend_from_slice(&location.to_raw());
        }
        for timestamp in &self.timestamps {
            out.extend_from_slice(&timestamp.to_be_bytes());
        }
        out
    }

    pub fn location(&self, local: LocalPos) -> Location {
        self.locations[local.index()]
    }

    /// Seconds since the epoch of the last save, 0 if never recorded.
    pub fn timestamp(&self, local: LocalPos) -> u32 {
        self.timestamps[local.index()]
    }

    pub fn set(&mut self, local: LocalPos, location: Location, timestamp: u32) {
        self.locations[local.index()] = location;
        self.timestamps[local.index()] = timestamp;
    }

    pub fn chunk_count(&self) -> usize {
        self.locations.iter().filter(|l| l.is_present()).count()
    }

    /// Present slots in header order.
    pub fn present(&self) -> impl Iterator<Item = (LocalPos, Location)> + '_ {
        self.locations
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_present())
            .filter_map(|(i, &l)| Some((LocalPos::from_index(i)?, l)))
    }
}
