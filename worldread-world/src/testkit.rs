//! Fixture chunks and world directories.
//!
//! Modern chunks are serialized from serde structs with fastnbt, so the
//! decoder is checked against an encoder it shares no code with. Legacy
//! chunks are built with the tag tree API.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;

use fastnbt::LongArray;
use flate2::Compression as GzLevel;
use flate2::write::GzEncoder;
use serde::Serialize;
use tempfile::TempDir;
use worldread_anvil::{ChunkPos, Compression, LocalPos, RegionBuilder, RegionFormat, RegionPos};
use worldread_nbt::{Compound, List, NamedTag, TagKind};

use crate::chunk::packed::pack_aligned;

/// 1.20.4
pub(crate) const MODERN_DATA_VERSION: i32 = 3578;

#[derive(Serialize)]
struct ChunkData {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "xPos")]
    x_pos: i32,
    #[serde(rename = "zPos")]
    z_pos: i32,
    #[serde(rename = "yPos")]
    y_pos: i32,
    #[serde(rename = "Status")]
    status: String,
    sections: Vec<Section>,
    #[serde(rename = "Heightmaps")]
    heightmaps: Heightmaps,
}

#[derive(Serialize)]
struct Section {
    #[serde(rename = "Y")]
    y: i8,
    block_states: BlockStates,
    biomes: Biomes,
}

#[derive(Serialize)]
struct BlockStates {
    palette: Vec<PaletteEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<LongArray>,
}

#[derive(Serialize)]
struct PaletteEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties", skip_serializing_if = "Option::is_none")]
    properties: Option<HashMap<String, String>>,
}

#[derive(Serialize)]
struct Biomes {
    palette: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<LongArray>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct Heightmaps {
    world_surface: LongArray,
    motion_blocking: LongArray,
}

fn entry(name: &str) -> PaletteEntry {
    PaletteEntry {
        name: name.to_owned(),
        properties: None,
    }
}

/// Sixteen longs of 4-bit `value`: one 16x16 layer.
fn layer(value: i64) -> Vec<i64> {
    let word = (0..16).fold(0u64, |acc, i| acc | ((value as u64) << (i * 4)));
    vec![word as i64; 16]
}

/// A 1.20 chunk, sections -4..=19:
/// - y -64 bedrock, then stone up to y 63;
/// - dirt at y 64..=66 under grass at y 67, air above;
/// - plains everywhere except river in the 4-wide strip x 0..4 of section 3;
/// - WORLD_SURFACE and MOTION_BLOCKING at 68.
pub(crate) fn modern_chunk_bytes(pos: ChunkPos) -> Vec<u8> {
    let plains = || Biomes {
        palette: vec!["minecraft:plains".to_owned()],
        data: None,
    };
    let mut sections = Vec::new();
    for y in -4i8..=19 {
        let block_states = match y {
            -4 => BlockStates {
                palette: vec![entry("minecraft:bedrock"), entry("minecraft:stone")],
                data: Some(LongArray::new([layer(0), vec![layer(1)[0]; 240]].concat())),
            },
            -3..=3 => BlockStates {
                palette: vec![entry("minecraft:stone")],
                data: None,
            },
            4 => {
                let grass = PaletteEntry {
                    name: "minecraft:grass_block".to_owned(),
                    properties: Some(HashMap::from([("snowy".to_owned(), "false".to_owned())])),
                };
                let data = [layer(1), layer(1), layer(1), layer(2), vec![0; 192]].concat();
                BlockStates {
                    palette: vec![entry("minecraft:air"), entry("minecraft:dirt"), grass],
                    data: Some(LongArray::new(data)),
                }
            }
            _ => BlockStates {
                palette: vec![entry("minecraft:air")],
                data: None,
            },
        };
        let biomes = if y == 3 {
            Biomes {
                palette: vec!["minecraft:plains".to_owned(), "minecraft:river".to_owned()],
                data: Some(LongArray::new(vec![0x1111_1111_1111_1111])),
            }
        } else {
            plains()
        };
        sections.push(Section {
            y,
            block_states,
            biomes,
        });
    }

    let surface = pack_aligned(&[132; 256], 9);
    let chunk = ChunkData {
        data_version: MODERN_DATA_VERSION,
        x_pos: pos.x,
        z_pos: pos.z,
        y_pos: -4,
        status: "minecraft:full".to_owned(),
        sections,
        heightmaps: Heightmaps {
            world_surface: LongArray::new(surface.clone()),
            motion_blocking: LongArray::new(surface),
        },
    };
    fastnbt::to_bytes(&chunk).unwrap()
}

fn set_nibble(array: &mut [i8], index: usize, value: u8) {
    let byte = array[index / 2] as u8;
    array[index / 2] = if index % 2 == 0 {
        (byte & 0xF0) | value
    } else {
        (byte & 0x0F) | (value << 4)
    } as i8;
}

/// A 1.12 chunk: bedrock at y 0, stone at y 1..=3 with one granite (1:1)
/// at (1, 1, 1), and red wool (35:14) at (3, 70, 5).
pub(crate) fn legacy_anvil_chunk(pos: ChunkPos) -> NamedTag {
    let mut bottom = vec![0i8; 4096];
    bottom[..256].fill(7);
    bottom[256..1024].fill(1);
    let mut bottom_data = vec![0i8; 2048];
    set_nibble(&mut bottom_data, 256 + 16 + 1, 1);

    let mut upper = vec![0i8; 4096];
    let mut upper_data = vec![0i8; 2048];
    let wool = 6 * 256 + 5 * 16 + 3;
    upper[wool] = 35;
    set_nibble(&mut upper_data, wool, 14);

    let mut sections = List::new(TagKind::Compound);
    sections
        .push(
            Compound::new()
                .with("Y", 0i8)
                .with("Blocks", bottom)
                .with("Data", bottom_data)
                .with("SkyLight", vec![0i8; 2048]),
        )
        .unwrap();
    sections
        .push(
            Compound::new()
                .with("Y", 4i8)
                .with("Blocks", upper)
                .with("Data", upper_data),
        )
        .unwrap();

    let level = Compound::new()
        .with("xPos", pos.x)
        .with("zPos", pos.z)
        .with("LastUpdate", 1000i64)
        .with("TerrainPopulated", 1i8)
        .with("Sections", sections)
        .with("HeightMap", vec![71i32; 256])
        .with("Biomes", vec![1i8; 256]);
    NamedTag::new(
        "",
        Compound::new().with("DataVersion", 1343i32).with("Level", level),
    )
}

/// A Beta 1.3 chunk: bedrock at y 0, stone up to y 62, grass at y 63.
pub(crate) fn mcregion_chunk(pos: ChunkPos) -> NamedTag {
    let mut blocks = vec![0i8; 32768];
    for x in 0..16 {
        for z in 0..16 {
            let column = z * 128 + x * 2048;
            blocks[column] = 7;
            blocks[column + 1..column + 63].fill(1);
            blocks[column + 63] = 2;
        }
    }
    let level = Compound::new()
        .with("xPos", pos.x)
        .with("zPos", pos.z)
        .with("Blocks", blocks)
        .with("Data", vec![0i8; 16384])
        .with("HeightMap", vec![64i8; 256]);
    NamedTag::new("", Compound::new().with("Level", level))
}

pub(crate) fn encode(tag: &NamedTag) -> Vec<u8> {
    worldread_nbt::to_bytes(tag).unwrap()
}

/// Writes `chunks` (uncompressed NBT) into one zlib region file.
pub(crate) fn write_region(dir: &Path, pos: RegionPos, format: RegionFormat, chunks: &[(LocalPos, Vec<u8>)]) {
    let mut builder = RegionBuilder::new();
    for (local, data) in chunks {
        builder.insert(*local, data, Compression::Zlib).unwrap();
        builder.timestamp(*local, 1_700_000_000);
    }
    fs::create_dir_all(dir).unwrap();
    builder.write_to(dir.join(pos.filename(format))).unwrap();
}

/// A world directory holding a modern chunk at each of `chunks`, in
/// `<root>/<subdir>`.
pub(crate) fn world_in(subdir: &str, chunks: &[ChunkPos]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mut by_region: BTreeMap<(i32, i32), Vec<(LocalPos, Vec<u8>)>> = BTreeMap::new();
    for &pos in chunks {
        let region = pos.region();
        by_region
            .entry((region.x, region.z))
            .or_default()
            .push((pos.local(), modern_chunk_bytes(pos)));
    }
    let region_dir = dir.path().join(subdir);
    fs::create_dir_all(&region_dir).unwrap();
    for ((x, z), items) in by_region {
        write_region(&region_dir, RegionPos::new(x, z), RegionFormat::Anvil, &items);
    }
    dir
}

pub(crate) fn world(chunks: &[ChunkPos]) -> TempDir {
    world_in("region", chunks)
}

pub(crate) fn level_dat(gzip: bool) -> Vec<u8> {
    let data = Compound::new()
        .with("LevelName", "Fixture World")
        .with("SpawnX", 10i32)
        .with("SpawnY", 64i32)
        .with("SpawnZ", -20i32)
        .with("DataVersion", MODERN_DATA_VERSION)
        .with("version", 19133i32)
        .with("LastPlayed", 1_700_000_000_000i64)
        .with("Version", Compound::new().with("Name", "1.20.4").with("Id", MODERN_DATA_VERSION))
        .with("WorldGenSettings", Compound::new().with("seed", 42i64));
    let raw = encode(&NamedTag::new("", Compound::new().with("Data", data)));
    if !gzip {
        return raw;
    }
    let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
    encoder.write_all(&raw).unwrap();
    encoder.finish().unwrap()
}
