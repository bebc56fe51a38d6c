use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::{Compression, LocalPos};

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("region header truncated: file has {len} of 8192 header bytes")]
    HeaderTruncated { len: u64 },

    #[error("chunk {local} points at sector {sector}, inside the header")]
    SectorInHeader { local: LocalPos, sector: u32 },

    #[error("chunk {local} at byte {offset} declares {declared} bytes but only {available} remain")]
    LengthOverrun {
        local: LocalPos,
        offset: u64,
        declared: u64,
        available: u64,
    },

    #[error("chunk {local} has a zero-length payload")]
    EmptyPayload { local: LocalPos },

    #[error("chunk {local} uses unknown compression type {id}")]
    UnknownCompression { local: LocalPos, id: u8 },

    #[error("chunk {local}: invalid {scheme} stream: {source}")]
    Decompress {
        local: LocalPos,
        scheme: Compression,
        source: io::Error,
    },

    #[error("chunk {local}: cannot read external payload {}: {source}", path.display())]
    External {
        local: LocalPos,
        path: PathBuf,
        source: io::Error,
    },

    #[error("chunk {local} is stored in an external file, but the source has no directory")]
    ExternalUnavailable { local: LocalPos },
}

impl RegionError {
    /// True when the bytes themselves are bad, false for failures of the
    /// underlying file system.
    pub fn is_corruption(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
