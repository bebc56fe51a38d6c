use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::compression::{Compression, EXTERNAL_FLAG, decompress};
use crate::header::{HEADER_SIZE, Location, RegionHeader, SECTOR_SIZE};
use crate::{ChunkPos, LocalPos, RegionError, RegionPos};

/// Which filename family a region file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionFormat {
    /// `r.X.Z.mca`, 1.2 and later.
    Anvil,
    /// `r.X.Z.mcr`, Beta 1.3 to 1.1.
    McRegion,
}

impl RegionFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Anvil => "mca",
            Self::McRegion => "mcr",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mca" => Some(Self::Anvil),
            "mcr" => Some(Self::McRegion),
            _ => None,
        }
    }
}

/// One chunk's payload, decompressed but not parsed.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub local: LocalPos,
    pub timestamp: u32,
    pub compression: Compression,
    /// Payload came from a `c.X.Z.mcc` file.
    pub external: bool,
    pub compressed_len: usize,
    pub data: Vec<u8>,
}

/// A region file on disk: its position, path and parsed header.
///
/// No handle is kept open; each [`RegionFile::read_chunk`] opens the file,
/// reads one payload and closes it again.
#[derive(Debug, Clone)]
pub struct RegionFile {
    pos: RegionPos,
    path: PathBuf,
    format: RegionFormat,
    len: u64,
    header: RegionHeader,
}

impl RegionFile {
    /// Reads the header of the file at `path`. A zero-length file is an
    /// empty region.
    pub fn open(pos: RegionPos, format: RegionFormat, path: impl Into<PathBuf>) -> Result<Self, RegionError> {
        let path = path.into();
        let mut file = File::open(&path)?;
        let len = file.metadata()?.len();
        let header = if len == 0 {
            RegionHeader::empty()
        } else {
            RegionHeader::read_from(&mut file)?
        };
        if len > 0 && len % SECTOR_SIZE as u64 != 0 {
            log::debug!("{} is not sector aligned ({len} bytes)", path.display());
        }
        log::debug!(
            "opened region {pos} at {} with {} chunks",
            path.display(),
            header.chunk_count()
        );
        Ok(Self {
            pos,
            path,
            format,
            len,
            header,
        })
    }

    pub fn pos(&self) -> RegionPos {
        self.pos
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> RegionFormat {
        self.format
    }

    pub fn is_empty(&self) -> bool {
        self.header.chunk_count() == 0
    }

    pub fn header(&self) -> &RegionHeader {
        &self.header
    }

    pub fn chunk_count(&self) -> usize {
        self.header.chunk_count()
    }

    pub fn has_chunk(&self, local: LocalPos) -> bool {
        self.header.location(local).is_present()
    }

    /// World positions of every populated slot, in header order.
    pub fn chunk_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.header.present().map(|(local, _)| self.pos.chunk(local))
    }

    /// Path of the oversized-chunk file for `local`, next to this region.
    pub fn external_path(&self, local: LocalPos) -> PathBuf {
        let chunk = self.pos.chunk(local);
        let name = format!("c.{}.{}.mcc", chunk.x, chunk.z);
        match self.path.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Returns `Ok(None)` for an absent slot.
    pub fn read_chunk(&self, local: LocalPos) -> Result<Option<RawChunk>, RegionError> {
        let location = self.header.location(local);
        if !location.is_present() {
            return Ok(None);
        }
        let mut file = File::open(&self.path)?;
        let external = self.external_path(local);
        read_payload(
            &mut file,
            self.len,
            local,
            location,
            self.header.timestamp(local),
            Some(&external),
        )
        .map(Some)
    }
}

/// Region reading over any seekable byte source.
///
/// External `.mcc` payloads cannot be resolved without a directory and
/// fail with [`RegionError::ExternalUnavailable`].
pub struct RegionReader<R> {
    inner: R,
    len: u64,
    header: RegionHeader,
}

impl<R: Read + Seek> RegionReader<R> {
    pub fn new(mut inner: R) -> Result<Self, RegionError> {
        let len = inner.seek(SeekFrom::End(0))?;
        let header = if len == 0 {
            RegionHeader::empty()
        } else {
            inner.seek(SeekFrom::Start(0))?;
            RegionHeader::read_from(&mut inner)?
        };
        Ok(Self { inner, len, header })
    }

    pub fn header(&self) -> &RegionHeader {
        &self.header
    }

    pub fn read_chunk(&mut self, local: LocalPos) -> Result<Option<RawChunk>, RegionError> {
        let location = self.header.location(local);
        if !location.is_present() {
            return Ok(None);
        }
        let timestamp = self.header.timestamp(local);
        read_payload(&mut self.inner, self.len, local, location, timestamp, None).map(Some)
    }
}

/// Reads `[length: 4][compression: 1][data: length - 1]` at `location`.
fn read_payload<R: Read + Seek>(
    source: &mut R,
    source_len: u64,
    local: LocalPos,
    location: Location,
    timestamp: u32,
    external: Option<&Path>,
) -> Result<RawChunk, RegionError> {
    if location.byte_offset() < HEADER_SIZE as u64 {
        return Err(RegionError::SectorInHeader {
            local,
            sector: location.sector_offset,
        });
    }
    let offset = location.byte_offset();
    let available = source_len.saturating_sub(offset);
    if available < 4 {
        return Err(RegionError::LengthOverrun {
            local,
            offset,
            declared: 4,
            available,
        });
    }

    source.seek(SeekFrom::Start(offset))?;
    let mut len_bytes = [0u8; 4];
    source.read_exact(&mut len_bytes)?;
    let declared = u64::from(u32::from_be_bytes(len_bytes));
    if declared == 0 {
        return Err(RegionError::EmptyPayload { local });
    }
    if declared > available - 4 {
        return Err(RegionError::LengthOverrun {
            local,
            offset,
            declared,
            available: available - 4,
        });
    }
    if declared + 4 > location.byte_len() {
        log::warn!(
            "chunk {local} payload of {declared} bytes overflows its {} allocated sectors",
            location.sector_count
        );
    }

    let mut payload = vec![0u8; declared as usize];
    source.read_exact(&mut payload)?;
    let id = payload[0];
    let scheme = Compression::from_id(id & !EXTERNAL_FLAG).ok_or(RegionError::UnknownCompression { local, id })?;
    let is_external = id & EXTERNAL_FLAG != 0;

    let compressed = if is_external {
        let path = external.ok_or(RegionError::ExternalUnavailable { local })?;
        log::debug!("chunk {local} is stored externally in {}", path.display());
        std::fs::read(path).map_err(|source| RegionError::External {
            local,
            path: path.to_path_buf(),
            source,
        })?
    } else {
        payload.drain(..1);
        payload
    };

    let data = decompress(scheme, &compressed).map_err(|source| RegionError::Decompress { local, scheme, source })?;
    log::debug!(
        "read chunk {local}: {} {scheme} bytes -> {} bytes",
        compressed.len(),
        data.len()
    );
    Ok(RawChunk {
        local,
        timestamp,
        compression: scheme,
        external: is_external,
        compressed_len: compressed.len(),
        data,
    })
}
