use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use worldread_metrics::ReadMetrics;

/// Which dimension's region files to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
    End,
}

impl Dimension {
    /// Where this dimension keeps its region files inside `world`.
    pub fn region_dir(self, world: &Path) -> PathBuf {
        match self {
            Self::Overworld => world.join("region"),
            Self::Nether => world.join("DIM-1").join("region"),
            Self::End => world.join("DIM1").join("region"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown dimension `{0}` (expected overworld, nether or end)")]
pub struct UnknownDimension(pub String);

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().trim_start_matches("minecraft:") {
            "overworld" | "0" => Ok(Self::Overworld),
            "nether" | "the_nether" | "-1" => Ok(Self::Nether),
            "end" | "the_end" | "1" => Ok(Self::End),
            _ => Err(UnknownDimension(s.to_owned())),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overworld => "overworld",
            Self::Nether => "nether",
            Self::End => "end",
        })
    }
}

/// How a [`WorldFolder`](crate::WorldFolder) is opened.
#[derive(Debug, Clone)]
pub struct WorldOptions {
    pub dimension: Dimension,
    /// Chunks remembered by `get_chunk`; 0 disables the cache.
    pub cache_capacity: usize,
    pub metrics: Option<Arc<ReadMetrics>>,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            dimension: Dimension::Overworld,
            cache_capacity: 256,
            metrics: None,
        }
    }
}
