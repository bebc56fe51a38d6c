//! NBT (Named Binary Tag) trees.
//!
//! Chunk payloads and `level.dat` are stored as one big-endian tag tree:
//! - every value is prefixed by a 1-byte type id
//! - values inside a compound also carry a 2-byte length-prefixed name
//! - list elements share one declared type and carry neither id nor name
//!
//! This crate parses that format into [`Tag`] values, encodes them back,
//! and offers typed path lookups so callers never walk the tree by hand.

mod error;
mod mutf8;
mod path;
mod pretty;
mod reader;
mod tag;
mod writer;

pub use error::NbtError;
pub use path::{AccessError, AccessErrorKind, FromTag, Segment, parse_path};
pub use reader::{MAX_DEPTH, from_bytes, from_reader};
pub use tag::{Compound, List, NamedTag, Tag, TagKind};
pub use writer::{to_bytes, write_to};
