use std::fmt;
use std::io::{self, Read};

/// Set on the compression byte when the payload lives in a `c.X.Z.mcc` file.
pub const EXTERNAL_FLAG: u8 = 0x80;

/// Compression types used in region files, same ids as vanilla.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zlib,
    None,
    Lz4,
}

impl Compression {
    /// Parses a scheme id with the external flag already stripped.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Gzip),
            2 => Some(Self::Zlib),
            3 => Some(Self::None),
            4 => Some(Self::Lz4),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Self::Gzip => 1,
            Self::Zlib => 2,
            Self::None => 3,
            Self::Lz4 => 4,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gzip => "gzip",
            Self::Zlib => "zlib",
            Self::None => "uncompressed",
            Self::Lz4 => "lz4",
        })
    }
}

/// Inflates a chunk payload. The decompressed size is not recorded anywhere,
/// so success depends on the stream alone.
pub fn decompress(scheme: Compression, data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    match scheme {
        Compression::Zlib => {
            flate2::read::ZlibDecoder::new(data).read_to_end(&mut decompressed)?;
        }
        Compression::Gzip => {
            flate2::read::GzDecoder::new(data).read_to_end(&mut decompressed)?;
        }
        Compression::None => decompressed.extend_from_slice(data),
        Compression::Lz4 => {
            // Java's LZ4BlockOutputStream framing
            lz4_java_wrc::Lz4BlockInput::new(data).read_to_end(&mut decompressed)?;
        }
    }
    Ok(decompressed)
}

#[cfg(any(test, feature = "testkit"))]
pub fn compress(scheme: Compression, data: &[u8]) -> io::Result<Vec<u8>> {
    use std::io::Write;

    match scheme {
        Compression::Zlib => {
            let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Compression::Gzip => {
            let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Compression::None => Ok(data.to_vec()),
        Compression::Lz4 => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "lz4 fixtures are not supported",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids() {
        for id in 1..=4 {
            assert_eq!(Compression::from_id(id).map(Compression::id), Some(id));
        }
        assert_eq!(Compression::from_id(0), None);
        assert_eq!(Compression::from_id(2 | EXTERNAL_FLAG), None);
    }

    #[test]
    fn test_flate_round_trip() {
        let payload = b"\x0a\x00\x00\x00".repeat(64);
        for scheme in [Compression::Gzip, Compression::Zlib, Compression::None] {
            let packed = compress(scheme, &payload).unwrap();
            assert_eq!(decompress(scheme, &packed).unwrap(), payload, "{scheme}");
        }
    }

    #[test]
    fn test_invalid_streams_fail() {
        let garbage = [0xDE; 32];
        assert!(decompress(Compression::Zlib, &garbage).is_err());
        assert!(decompress(Compression::Gzip, &garbage).is_err());
        assert!(decompress(Compression::Lz4, &garbage).is_err());
    }
}
