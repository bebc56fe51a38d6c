//! A world directory: its region files, chunk lookup and the chunk cache.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use lru::LruCache;
use worldread_anvil::{BoundingBox, CHUNKS_PER_REGION, ChunkPos, LocalPos, RawChunk, RegionFile, RegionFormat, RegionPos};
use worldread_metrics::ReadMetrics;
use worldread_nbt::NamedTag;

use crate::chunk::Chunk;
use crate::level::LevelInfo;
use crate::options::{Dimension, WorldOptions};
use crate::Error;

type ChunkCache = Mutex<LruCache<ChunkPos, Weak<Chunk>>>;

/// Read access to one dimension of a world save.
///
/// Opening scans the region directory and reads every region header, but
/// no chunk is decoded until it is asked for.
pub struct WorldFolder {
    path: PathBuf,
    region_dir: PathBuf,
    dimension: Dimension,
    format: Option<RegionFormat>,
    /// Sorted by (z, x).
    regions: Vec<RegionFile>,
    index: HashMap<RegionPos, usize>,
    /// Holds weak references only; callers own the decoded chunks.
    cache: Option<ChunkCache>,
    metrics: Option<Arc<ReadMetrics>>,
}

impl WorldFolder {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_with(path, WorldOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: WorldOptions) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let WorldOptions {
            dimension,
            cache_capacity,
            metrics,
        } = options;

        let mut region_dir = dimension.region_dir(&path);
        let mut missing_is_empty = true;
        if dimension == Dimension::Overworld && !region_dir.is_dir() {
            // a bare region directory
            region_dir = path.clone();
            missing_is_empty = false;
        }

        let found = discover(&region_dir, missing_is_empty)?;
        let format = if found.iter().any(|(_, f, _)| *f == RegionFormat::Anvil) {
            Some(RegionFormat::Anvil)
        } else if found.is_empty() {
            None
        } else {
            Some(RegionFormat::McRegion)
        };

        let mut regions = Vec::new();
        for (pos, region_format, file) in found {
            if Some(region_format) != format {
                log::debug!("skipping {}, world uses {:?}", file.display(), format);
                continue;
            }
            let region = RegionFile::open(pos, region_format, &file).map_err(|e| Error::region(&file, e))?;
            regions.push(region);
        }
        regions.sort_by_key(|r| (r.pos().z, r.pos().x));
        let index = regions.iter().enumerate().map(|(i, r)| (r.pos(), i)).collect();

        let world = Self {
            path,
            region_dir,
            dimension,
            format,
            regions,
            index,
            cache: NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            metrics,
        };
        log::info!(
            "opened {} ({}): {} region files, {} chunks",
            world.path.display(),
            world.dimension,
            world.regions.len(),
            world.chunk_count()
        );
        Ok(world)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory the region files were read from.
    pub fn region_dir(&self) -> &Path {
        &self.region_dir
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// `None` when there are no region files.
    pub fn format(&self) -> Option<RegionFormat> {
        self.format
    }

    pub fn regions(&self) -> &[RegionFile] {
        &self.regions
    }

    pub fn metrics(&self) -> Option<&Arc<ReadMetrics>> {
        self.metrics.as_ref()
    }

    /// Populated slots across all regions, from the headers alone.
    pub fn chunk_count(&self) -> usize {
        self.regions.iter().map(RegionFile::chunk_count).sum()
    }

    /// Extent of the populated slots, [`BoundingBox::EMPTY`] for an empty world.
    pub fn get_boundingbox(&self) -> BoundingBox {
        self.chunk_positions().fold(BoundingBox::EMPTY, BoundingBox::union)
    }

    /// Every populated slot in iteration order. Decodes nothing.
    pub fn chunk_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.regions.iter().flat_map(|r| r.chunk_positions())
    }

    pub fn has_chunk(&self, x: i32, z: i32) -> bool {
        let pos = ChunkPos::new(x, z);
        self.region(pos.region()).is_some_and(|r| r.has_chunk(pos.local()))
    }

    pub fn region(&self, pos: RegionPos) -> Option<&RegionFile> {
        self.index.get(&pos).map(|&i| &self.regions[i])
    }

    /// Decodes the chunk at chunk coordinates (`x`, `z`), or returns the
    /// cached copy if a caller still holds it.
    pub fn get_chunk(&self, x: i32, z: i32) -> Result<Arc<Chunk>, Error> {
        let pos = ChunkPos::new(x, z);
        if let Some(cache) = &self.cache {
            if let Some(chunk) = lock(cache).get(&pos).and_then(Weak::upgrade) {
                if let Some(metrics) = &self.metrics {
                    metrics.record_cache_hit();
                }
                return Ok(chunk);
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_cache_miss();
            }
        }

        let chunk = Arc::new(self.decode(pos)?);
        if let Some(cache) = &self.cache {
            lock(cache).put(pos, Arc::downgrade(&chunk));
        }
        Ok(chunk)
    }

    /// The chunk's raw tag tree, without the typed view.
    pub fn get_nbt(&self, x: i32, z: i32) -> Result<NamedTag, Error> {
        let pos = ChunkPos::new(x, z);
        let raw = self.read_raw(pos)?;
        worldread_nbt::from_bytes(&raw.data).map_err(|e| Error::CorruptChunk { pos, source: e.into() })
    }

    /// Lazily decodes every chunk, regions in (z, x) order and slots in header
    /// order. Clone the iterator to restart it.
    pub fn iter_chunks(&self) -> ChunkIter<'_> {
        ChunkIter {
            world: self,
            region: 0,
            slot: 0,
        }
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            lock(cache).clear();
        }
    }

    /// Reads `level.dat` from the world root; `Ok(None)` if there is none.
    pub fn level(&self) -> Result<Option<LevelInfo>, Error> {
        let path = self.path.join("level.dat");
        if !path.is_file() {
            return Ok(None);
        }
        LevelInfo::read(&path).map(Some)
    }

    fn read_raw(&self, pos: ChunkPos) -> Result<RawChunk, Error> {
        let region = self.region(pos.region()).ok_or(Error::ChunkNotFound { pos })?;
        match region.read_chunk(pos.local()) {
            Ok(Some(raw)) => Ok(raw),
            Ok(None) => Err(Error::ChunkNotFound { pos }),
            Err(e) => Err(Error::region(region.path(), e)),
        }
    }

    fn decode(&self, pos: ChunkPos) -> Result<Chunk, Error> {
        let started = Instant::now();
        let result = self.read_raw(pos).and_then(|raw| {
            let chunk = Chunk::from_bytes(pos, raw.timestamp, &raw.data)
                .map_err(|source| Error::CorruptChunk { pos, source })?;
            Ok((chunk, raw.compressed_len, raw.data.len()))
        });

        match (result, &self.metrics) {
            (Ok((chunk, compressed, inflated)), Some(metrics)) => {
                metrics.record_decode(started.elapsed(), compressed, inflated);
                Ok(chunk)
            }
            (Ok((chunk, ..)), None) => Ok(chunk),
            (Err(e), Some(metrics)) if e.is_corruption() => {
                metrics.record_failure();
                Err(e)
            }
            (Err(e), _) => Err(e),
        }
    }
}

fn lock(cache: &ChunkCache) -> MutexGuard<'_, LruCache<ChunkPos, Weak<Chunk>>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Region files in `dir`, unsorted. Names that are not `r.<x>.<z>.mca` or
/// `.mcr` are ignored.
fn discover(dir: &Path, missing_is_empty: bool) -> Result<Vec<(RegionPos, RegionFormat, PathBuf)>, Error> {
    let io_error = |source: io::Error| Error::Io {
        path: dir.to_path_buf(),
        source,
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if missing_is_empty && e.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} does not exist, no regions", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(io_error(e)),
    };

    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(io_error)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match RegionPos::from_filename(name) {
            Some((pos, format)) if path.is_file() => {
                log::debug!("found region {pos} at {}", path.display());
                found.push((pos, format, path));
            }
            _ => log::debug!("ignoring {}", path.display()),
        }
    }
    Ok(found)
}

/// Iterator returned by [`WorldFolder::iter_chunks`].
///
/// Only the current position is held; each chunk is decoded when reached.
/// A corrupt chunk is yielded as an error and iteration carries on.
#[derive(Clone)]
pub struct ChunkIter<'w> {
    world: &'w WorldFolder,
    region: usize,
    slot: usize,
}

impl Iterator for ChunkIter<'_> {
    type Item = Result<Arc<Chunk>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(region) = self.world.regions.get(self.region) {
            while self.slot < CHUNKS_PER_REGION {
                let local = LocalPos::from_index(self.slot)?;
                self.slot += 1;
                if region.has_chunk(local) {
                    let pos = region.pos().chunk(local);
                    return Some(self.world.get_chunk(pos.x, pos.z));
                }
            }
            self.region += 1;
            self.slot = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use worldread_anvil::{Compression, RegionBuilder};

    use super::*;
    use crate::testkit;

    fn open(dir: &tempfile::TempDir) -> WorldFolder {
        WorldFolder::open(dir.path()).unwrap()
    }

    #[test]
    fn test_empty_world() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("region")).unwrap();
        let world = open(&dir);
        assert_eq!(world.chunk_count(), 0);
        assert!(world.get_boundingbox().is_empty());
        assert_eq!(world.format(), None);
        assert_eq!(world.iter_chunks().count(), 0);
        assert!(world.get_chunk(0, 0).unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_world_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = WorldFolder::open(dir.path().join("nope"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_single_chunk_bounding_box() {
        let dir = testkit::world(&[ChunkPos::new(5, -3)]);
        let world = open(&dir);
        assert_eq!(world.chunk_count(), 1);
        let bbox = world.get_boundingbox();
        assert_eq!((bbox.minx, bbox.maxx, bbox.minz, bbox.maxz), (5, 5, -3, -3));

        let chunk = world.get_chunk(5, -3).unwrap();
        assert_eq!(chunk.region(), RegionPos::new(0, -1));
        assert_eq!(chunk.local(), LocalPos::new(5, 29).unwrap());
        assert_eq!(chunk.pos(), ChunkPos::new(5, -3));
        assert_eq!(chunk.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_negative_coordinates() {
        let dir = testkit::world(&[ChunkPos::new(-1, -1), ChunkPos::new(0, 0)]);
        let world = open(&dir);
        assert!(world.region(RegionPos::new(-1, -1)).is_some());
        let chunk = world.get_chunk(-1, -1).unwrap();
        assert_eq!(chunk.region(), RegionPos::new(-1, -1));
        assert_eq!(chunk.local(), LocalPos::new(31, 31).unwrap());
        assert!(world.has_chunk(-1, -1));
        assert!(!world.has_chunk(-1, 0));
    }

    #[test]
    fn test_absent_slot_is_not_found() {
        let dir = testkit::world(&[ChunkPos::new(0, 0)]);
        let world = open(&dir);
        for (x, z) in [(1, 0), (0, 31), (100, 100), (-5, -5)] {
            let err = world.get_chunk(x, z).unwrap_err();
            assert!(matches!(err, Error::ChunkNotFound { .. }), "{err}");
            assert!(!err.is_corruption());
        }
    }

    #[test]
    fn test_length_past_end_of_file_is_corrupt_region() {
        let dir = tempfile::tempdir().unwrap();
        let region_dir = dir.path().join("region");
        fs::create_dir(&region_dir).unwrap();
        let local = LocalPos::new(0, 0).unwrap();
        let data = testkit::modern_chunk_bytes(ChunkPos::new(0, 0));
        let mut builder = RegionBuilder::new();
        builder.insert(local, &data, Compression::Zlib).unwrap();
        builder.declared_len(local, 10_000_000);
        builder.write_to(region_dir.join("r.0.0.mca")).unwrap();

        let world = open(&dir);
        assert_eq!(world.chunk_count(), 1);
        let err = world.get_chunk(0, 0).unwrap_err();
        assert!(matches!(err, Error::CorruptRegion { .. }), "{err}");
        assert!(err.is_corruption());
    }

    #[test]
    fn test_garbage_payload_is_corrupt_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let region_dir = dir.path().join("region");
        let local = LocalPos::new(2, 0).unwrap();
        testkit::write_region(&region_dir, RegionPos::new(0, 0), RegionFormat::Anvil, &[(local, vec![0x0A, 0x00])]);

        let world = open(&dir);
        let err = world.get_chunk(2, 0).unwrap_err();
        assert!(matches!(err, Error::CorruptChunk { .. }), "{err}");
    }

    #[test]
    fn test_iteration_order_and_restart() {
        let positions = [
            ChunkPos::new(40, 0),
            ChunkPos::new(1, 1),
            ChunkPos::new(0, 1),
            ChunkPos::new(3, 0),
            ChunkPos::new(-2, -40),
        ];
        let dir = testkit::world(&positions);
        let world = open(&dir);

        let expected = vec![
            ChunkPos::new(-2, -40),
            ChunkPos::new(3, 0),
            ChunkPos::new(0, 1),
            ChunkPos::new(1, 1),
            ChunkPos::new(40, 0),
        ];
        assert_eq!(world.chunk_positions().collect::<Vec<_>>(), expected);

        let mut iter = world.iter_chunks();
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.pos(), expected[0]);
        let restarted = iter.clone();
        let rest: Vec<_> = iter.map(|c| c.unwrap().pos()).collect();
        assert_eq!(rest, expected[1..]);
        assert_eq!(restarted.count(), 4);
        assert_eq!(world.iter_chunks().count(), 5);
    }

    #[test]
    fn test_corrupt_chunk_does_not_stop_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let region_dir = dir.path().join("region");
        let good = testkit::modern_chunk_bytes(ChunkPos::new(1, 0));
        testkit::write_region(
            &region_dir,
            RegionPos::new(0, 0),
            RegionFormat::Anvil,
            &[(LocalPos::new(0, 0).unwrap(), vec![0xFF]), (LocalPos::new(1, 0).unwrap(), good)],
        );

        let world = open(&dir);
        let results: Vec<_> = world.iter_chunks().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].as_ref().is_err_and(Error::is_corruption));
        assert_eq!(results[1].as_ref().unwrap().pos(), ChunkPos::new(1, 0));
    }

    #[test]
    fn test_ignores_unrelated_files() {
        let dir = testkit::world(&[ChunkPos::new(0, 0)]);
        let region_dir = dir.path().join("region");
        fs::write(region_dir.join("r.0.mca"), b"junk").unwrap();
        fs::write(region_dir.join("r.a.b.mca"), b"junk").unwrap();
        fs::write(region_dir.join("notes.txt"), b"junk").unwrap();
        fs::create_dir(region_dir.join("r.9.9.mca")).unwrap();

        let world = open(&dir);
        assert_eq!(world.regions().len(), 1);
        assert_eq!(world.chunk_count(), 1);
    }

    #[test]
    fn test_cache_shares_live_chunks() {
        let metrics = Arc::new(ReadMetrics::new());
        let dir = testkit::world(&[ChunkPos::new(0, 0)]);
        let options = WorldOptions {
            metrics: Some(metrics.clone()),
            ..WorldOptions::default()
        };
        let world = WorldFolder::open_with(dir.path(), options).unwrap();

        let a = world.get_chunk(0, 0).unwrap();
        let b = world.get_chunk(0, 0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(metrics.chunks_decoded(), 1);
        assert_eq!(metrics.cache_hits(), 1);

        world.clear_cache();
        let c = world.get_chunk(0, 0).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));

        // the cache never keeps a chunk alive on its own
        drop((a, b, c));
        let _ = world.get_chunk(0, 0).unwrap();
        assert_eq!(metrics.chunks_decoded(), 3);
        assert_eq!(metrics.cache_misses(), 3);
    }

    #[test]
    fn test_cache_disabled() {
        let dir = testkit::world(&[ChunkPos::new(0, 0)]);
        let options = WorldOptions {
            cache_capacity: 0,
            ..WorldOptions::default()
        };
        let world = WorldFolder::open_with(dir.path(), options).unwrap();
        let a = world.get_chunk(0, 0).unwrap();
        let b = world.get_chunk(0, 0).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_level_dat() {
        let dir = testkit::world(&[ChunkPos::new(0, 0)]);
        let world = open(&dir);
        assert!(world.level().unwrap().is_none());

        fs::write(dir.path().join("level.dat"), testkit::level_dat(true)).unwrap();
        let level = world.level().unwrap().unwrap();
        assert_eq!(level.spawn, Some((10, 64, -20)));

        fs::write(dir.path().join("level.dat"), b"\x1f\x8bnot gzip").unwrap();
        assert!(matches!(world.level(), Err(Error::CorruptLevel { .. })));
    }

    #[test]
    fn test_mcregion_world() {
        let dir = tempfile::tempdir().unwrap();
        let region_dir = dir.path().join("region");
        let pos = ChunkPos::new(-3, 7);
        let data = testkit::encode(&testkit::mcregion_chunk(pos));
        testkit::write_region(&region_dir, pos.region(), RegionFormat::McRegion, &[(pos.local(), data)]);

        let world = open(&dir);
        assert_eq!(world.format(), Some(RegionFormat::McRegion));
        let chunk = world.get_chunk(-3, 7).unwrap();
        assert_eq!(chunk.get_block(0, 0, 0).unwrap().id(), Some(7));
    }

    #[test]
    fn test_anvil_files_win_over_mcregion() {
        let dir = testkit::world(&[ChunkPos::new(0, 0)]);
        let region_dir = dir.path().join("region");
        let stale = ChunkPos::new(40, 40);
        let data = testkit::encode(&testkit::mcregion_chunk(stale));
        testkit::write_region(&region_dir, stale.region(), RegionFormat::McRegion, &[(stale.local(), data)]);

        let world = open(&dir);
        assert_eq!(world.format(), Some(RegionFormat::Anvil));
        assert_eq!(world.chunk_count(), 1);
        assert!(!world.has_chunk(40, 40));
    }

    #[test]
    fn test_bare_region_directory() {
        let dir = testkit::world(&[ChunkPos::new(2, 2)]);
        let world = WorldFolder::open(dir.path().join("region")).unwrap();
        assert_eq!(world.chunk_count(), 1);
        assert_eq!(world.region_dir(), dir.path().join("region"));
    }

    #[test]
    fn test_nether_dimension() {
        let dir = testkit::world_in("DIM-1/region", &[ChunkPos::new(1, 1), ChunkPos::new(2, 1)]);
        let nether = WorldOptions {
            dimension: Dimension::Nether,
            ..WorldOptions::default()
        };
        let world = WorldFolder::open_with(dir.path(), nether).unwrap();
        assert_eq!(world.chunk_count(), 2);

        let end = WorldOptions {
            dimension: Dimension::End,
            ..WorldOptions::default()
        };
        let world = WorldFolder::open_with(dir.path(), end).unwrap();
        assert_eq!(world.chunk_count(), 0);
    }

    #[test]
    fn test_center_chunk_smoke() {
        let positions: Vec<_> = (-2..=2).flat_map(|x| (-2..=2).map(move |z| ChunkPos::new(x, z))).collect();
        let dir = testkit::world(&positions);
        let world = open(&dir);
        assert_eq!(world.chunk_count(), 25);

        let center = world.get_boundingbox().center().unwrap();
        let chunk = world.get_chunk(center.x, center.z).unwrap();
        let height = chunk.get_max_height().unwrap();
        assert!(height > 0 && height < chunk.max_y());
        assert!(chunk.get_block(0, 0, 0).is_ok());
        let nbt = world.get_nbt(center.x, center.z).unwrap();
        assert!(nbt.tag.at("sections[0].Y").is_ok());
    }
}
