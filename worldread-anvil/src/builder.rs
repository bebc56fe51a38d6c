//! Region file writer for test fixtures.

use std::io;
use std::path::Path;

use crate::compression::{Compression, compress};
use crate::header::{CHUNKS_PER_REGION, HEADER_SIZE, Location, RegionHeader, SECTOR_SIZE};
use crate::LocalPos;

#[derive(Debug, Clone, Default)]
struct Slot {
    /// Compression byte followed by the stored bytes.
    body: Vec<u8>,
    timestamp: u32,
    declared_len: Option<u32>,
    raw_location: Option<[u8; 4]>,
}

/// Lays chunks out in header order, each starting on a fresh sector.
#[derive(Debug, Clone)]
pub struct RegionBuilder {
    slots: Vec<Option<Slot>>,
}

impl Default for RegionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionBuilder {
    pub fn new() -> Self {
        Self {
            slots: vec![None; CHUNKS_PER_REGION],
        }
    }

    /// Stores `data` (uncompressed NBT) compressed with `scheme`.
    pub fn insert(&mut self, local: LocalPos, data: &[u8], scheme: Compression) -> io::Result<&mut Self> {
        let compressed = compress(scheme, data)?;
        Ok(self.insert_raw(local, scheme.id(), &compressed))
    }

    /// Stores `body` behind an arbitrary compression byte.
    pub fn insert_raw(&mut self, local: LocalPos, id: u8, body: &[u8]) -> &mut Self {
        let mut stored = Vec::with_capacity(body.len() + 1);
        stored.push(id);
        stored.extend_from_slice(body);
        let slot = self.slot(local);
        slot.body = stored;
        self
    }

    pub fn timestamp(&mut self, local: LocalPos, timestamp: u32) -> &mut Self {
        self.slot(local).timestamp = timestamp;
        self
    }

    /// Overrides the 4-byte length prefix written before the payload.
    pub fn declared_len(&mut self, local: LocalPos, len: u32) -> &mut Self {
        self.slot(local).declared_len = Some(len);
        self
    }

    /// Overrides the location table entry, leaving the payload area alone.
    pub fn set_location_raw(&mut self, local: LocalPos, raw: [u8; 4]) -> &mut Self {
        self.slot(local).raw_location = Some(raw);
        self
    }

    fn slot(&mut self, local: LocalPos) -> &mut Slot {
        self.slots[local.index()].get_or_insert_with(Slot::default)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut header = RegionHeader::empty();
        let mut out = vec![0u8; HEADER_SIZE];
        for (local, slot) in LocalPos::all().zip(&self.slots) {
            let Some(slot) = slot else { continue };
            let mut location = Location::default();
            if !slot.body.is_empty() {
                let start = out.len();
                let len = slot.declared_len.unwrap_or(slot.body.len() as u32);
                out.extend_from_slice(&len.to_be_bytes());
                out.extend_from_slice(&slot.body);
                let sectors = (out.len() - start).div_ceil(SECTOR_SIZE);
                out.resize(start + sectors * SECTOR_SIZE, 0);
                location = Location {
                    sector_offset: (start / SECTOR_SIZE) as u32,
                    sector_count: sectors.min(255) as u8,
                };
            }
            if let Some(raw) = slot.raw_location {
                location = Location::from_raw(raw);
            }
            header.set(local, location, slot.timestamp);
        }
        out[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        out
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.build())
    }
}
