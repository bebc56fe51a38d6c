use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use worldread_metrics::ReadMetrics;
use worldread_world::{ChunkPos, Dimension, WorldFolder, WorldOptions};

#[derive(Parser)]
#[command(name = "worldread", about = "Read-only inspector for Minecraft world saves")]
pub struct Args {
    /// World directory, or a bare region directory
    #[arg(short, long, env = "WORLD", default_value = ".")]
    pub world: PathBuf,

    /// Dimension: "overworld", "nether" or "end"
    #[arg(short, long, env = "DIMENSION", default_value = "overworld")]
    pub dimension: Dimension,

    /// Chunks kept by the cache (0 disables it)
    #[arg(long, env = "CHUNK_CACHE", default_value = "256")]
    pub cache_size: usize,

    /// Print read metrics before exiting
    #[arg(long, env = "BENCHMARK")]
    pub benchmark: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Region files, chunk count, bounds and level.dat summary
    Info,
    /// One chunk, by chunk coordinates
    #[command(allow_negative_numbers = true)]
    Chunk {
        x: i32,
        z: i32,
        /// Dump the whole tag tree
        #[arg(long)]
        nbt: bool,
    },
    /// One block, by world block coordinates
    #[command(allow_negative_numbers = true)]
    Block { x: i32, y: i32, z: i32 },
    /// Decode every chunk and list the corrupt ones
    Scan,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let metrics = args.benchmark.then(|| Arc::new(ReadMetrics::new()));
    let options = WorldOptions {
        dimension: args.dimension,
        cache_capacity: args.cache_size,
        metrics: metrics.clone(),
    };
    let world = WorldFolder::open_with(&args.world, options)
        .with_context(|| format!("failed to open world {}", args.world.display()))?;

    match args.command {
        Command::Info => info(&world)?,
        Command::Chunk { x, z, nbt } => chunk(&world, x, z, nbt)?,
        Command::Block { x, y, z } => block(&world, x, y, z)?,
        Command::Scan => scan(&world)?,
    }

    if let Some(metrics) = metrics {
        println!();
        println!("{}", metrics.generate_report());
    }
    Ok(())
}

fn or_unknown<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

fn info(world: &WorldFolder) -> Result<()> {
    println!("World:        {}", world.path().display());
    println!("Regions from: {}", world.region_dir().display());
    println!("Dimension:    {}", world.dimension());
    println!("Format:       {}", or_unknown(world.format().map(|f| f.extension())));
    println!("Regions:      {}", world.regions().len());
    println!("Chunks:       {}", world.chunk_count());

    let bbox = world.get_boundingbox();
    println!("Bounds:       {bbox}");
    if let Some(center) = bbox.center() {
        println!("Center:       {center}");
    }
    if let Some(range) = bbox.block_range() {
        println!(
            "Block range:  x {}..={}, z {}..={}",
            range.min_x, range.max_x, range.min_z, range.max_z
        );
    }

    match world.level().context("failed to read level.dat")? {
        Some(level) => {
            println!("Level name:   {}", or_unknown(level.name.as_deref()));
            println!("Version:      {}", or_unknown(level.version_name.as_deref()));
            println!("DataVersion:  {}", or_unknown(level.data_version));
            println!("Storage:      {}", or_unknown(level.storage_version));
            println!(
                "Spawn:        {}",
                or_unknown(level.spawn.map(|(x, y, z)| format!("{x}, {y}, {z}")))
            );
            println!("Seed:         {}", or_unknown(level.seed));
            println!("Last played:  {}", or_unknown(level.last_played));
        }
        None => println!("level.dat:    not found"),
    }
    Ok(())
}

fn chunk(world: &WorldFolder, x: i32, z: i32, nbt: bool) -> Result<()> {
    let chunk = world
        .get_chunk(x, z)
        .with_context(|| format!("failed to read chunk ({x}, {z})"))?;

    println!("Chunk:        {}", chunk.pos());
    println!("Slot:         region {} local {}", chunk.region(), chunk.local());
    println!("Era:          {}", chunk.era());
    println!("DataVersion:  {}", or_unknown(chunk.data_version()));
    println!("Status:       {}", or_unknown(chunk.status()));
    println!("Saved at:     {}", chunk.timestamp());
    println!("Height range: {}..{}", chunk.min_y(), chunk.max_y());
    println!("Sections:     {:?}", chunk.section_ys());
    println!("Max height:   {}", or_unknown(chunk.get_max_height()));
    println!("Biome (8, 8): {}", or_unknown(chunk.get_biome(8, 8)));
    if nbt {
        println!();
        println!("{}", chunk.nbt().pretty());
    }
    Ok(())
}

fn block(world: &WorldFolder, x: i32, y: i32, z: i32) -> Result<()> {
    let pos = ChunkPos::from_block(x, z);
    let chunk = world
        .get_chunk(pos.x, pos.z)
        .with_context(|| format!("failed to read chunk {pos}"))?;
    let block = chunk.get_block(x.rem_euclid(16), y, z.rem_euclid(16))?;
    println!("({x}, {y}, {z}) in chunk {pos}: {block}");
    Ok(())
}

fn scan(world: &WorldFolder) -> Result<()> {
    let mut decoded = 0usize;
    let mut corrupt = Vec::new();
    for result in world.iter_chunks() {
        match result {
            Ok(_) => decoded += 1,
            Err(e) if e.is_corruption() => {
                log::warn!("{e}");
                corrupt.push(e);
            }
            Err(e) => return Err(e).context("scan aborted"),
        }
    }

    println!("Decoded:      {decoded}");
    println!("Corrupt:      {}", corrupt.len());
    for e in &corrupt {
        println!("  {e}");
    }
    Ok(())
}
