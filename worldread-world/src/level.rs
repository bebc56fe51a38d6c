//! `level.dat`: world-wide metadata, a gzipped tag tree with a `Data` root.

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use worldread_nbt::{Compound, NamedTag, Tag};

use crate::{DecodeError, Error};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone)]
pub struct LevelInfo {
    pub name: Option<String>,
    pub spawn: Option<(i32, i32, i32)>,
    pub data_version: Option<i32>,
    /// `Version.Name`, e.g. `1.20.4`.
    pub version_name: Option<String>,
    /// Storage format `version` (19132 McRegion, 19133 Anvil).
    pub storage_version: Option<i32>,
    /// Epoch milliseconds.
    pub last_played: Option<i64>,
    pub seed: Option<i64>,
    pub nbt: NamedTag,
}

impl LevelInfo {
    pub fn read(path: &Path) -> Result<Self, Error> {
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes).map_err(|source| Error::CorruptLevel {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Accepts gzip or raw tag bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let nbt = if bytes.starts_with(&GZIP_MAGIC) {
            let mut raw = Vec::new();
            GzDecoder::new(bytes)
                .read_to_end(&mut raw)
                .map_err(DecodeError::Decompress)?;
            worldread_nbt::from_bytes(&raw)?
        } else {
            worldread_nbt::from_bytes(bytes)?
        };
        let data = nbt.tag.at_as::<&Compound>("Data")?;
        let text = |path: &str| nbt.tag.at(path).ok().and_then(Tag::as_str).map(str::to_owned);
        let int = |name: &str| data.get(name).and_then(Tag::as_i64);

        let spawn = match (int("SpawnX"), int("SpawnY"), int("SpawnZ")) {
            (Some(x), Some(y), Some(z)) => Some((x as i32, y as i32, z as i32)),
            _ => None,
        };
        // moved under WorldGenSettings in 1.16
        let seed = int("RandomSeed").or_else(|| nbt.tag.at("Data.WorldGenSettings.seed").ok().and_then(Tag::as_i64));
        let name = text("Data.LevelName");
        let version_name = text("Data.Version.Name");
        let data_version = int("DataVersion").map(|v| v as i32);
        let storage_version = int("version").map(|v| v as i32);
        let last_played = int("LastPlayed");

        let info = Self {
            name,
            spawn,
            data_version,
            version_name,
            storage_version,
            last_played,
            seed,
            nbt,
        };
        Ok(info)
    }
}
