use std::io::Read;

use crate::{Compound, List, NamedTag, NbtError, Tag, TagKind, mutf8};

/// Deepest list/compound nesting accepted, matching vanilla's limit.
pub const MAX_DEPTH: usize = 512;

/// Parses one named root tag from decompressed bytes.
///
/// Bytes after the root are ignored.
pub fn from_bytes(data: &[u8]) -> Result<NamedTag, NbtError> {
    Reader::new(data).read_root()
}

pub fn from_reader<R: Read>(mut reader: R) -> Result<NamedTag, NbtError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    from_bytes(&data)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], NbtError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(NbtError::Truncated {
                offset: self.pos,
                needed: n - remaining,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], NbtError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_kind(&mut self) -> Result<TagKind, NbtError> {
        let offset = self.pos;
        let [id] = self.array::<1>()?;
        TagKind::from_id(id).ok_or(NbtError::UnknownTag { id, offset })
    }

    fn read_root(&mut self) -> Result<NamedTag, NbtError> {
        let kind = self.read_kind()?;
        if kind == TagKind::End {
            return Err(NbtError::EmptyRoot);
        }
        let name = self.read_string()?;
        let tag = self.read_payload(kind)?;
        Ok(NamedTag { name, tag })
    }

    fn read_string(&mut self) -> Result<String, NbtError> {
        let offset = self.pos;
        let len = u16::from_be_bytes(self.array()?) as usize;
        let bytes = self.take(len)?;
        mutf8::decode(bytes).ok_or(NbtError::InvalidString { offset })
    }

    fn read_len(&mut self) -> Result<usize, NbtError> {
        let offset = self.pos;
        let len = i32::from_be_bytes(self.array()?);
        usize::try_from(len).map_err(|_| NbtError::NegativeLength { len, offset })
    }

    /// Fails early when `count` elements of at least `width` bytes cannot fit.
    fn check_room(&self, count: usize, width: usize) -> Result<(), NbtError> {
        let needed = count.saturating_mul(width);
        let remaining = self.remaining();
        if needed > remaining {
            return Err(NbtError::Truncated {
                offset: self.pos,
                needed: needed - remaining,
            });
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), NbtError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(NbtError::TooDeep {
                offset: self.pos,
                max: MAX_DEPTH,
            });
        }
        Ok(())
    }

    fn read_payload(&mut self, kind: TagKind) -> Result<Tag, NbtError> {
        Ok(match kind {
            TagKind::End => return Err(NbtError::UnexpectedEnd { offset: self.pos }),
            TagKind::Byte => Tag::Byte(i8::from_be_bytes(self.array()?)),
            TagKind::Short => Tag::Short(i16::from_be_bytes(self.array()?)),
            TagKind::Int => Tag::Int(i32::from_be_bytes(self.array()?)),
            TagKind::Long => Tag::Long(i64::from_be_bytes(self.array()?)),
            TagKind::Float => Tag::Float(f32::from_be_bytes(self.array()?)),
            TagKind::Double => Tag::Double(f64::from_be_bytes(self.array()?)),
            TagKind::ByteArray => {
                let len = self.read_len()?;
                let bytes = self.take(len)?;
                Tag::ByteArray(bytes.iter().map(|&b| b as i8).collect())
            }
            TagKind::String => Tag::String(self.read_string()?),
            TagKind::List => Tag::List(self.read_list()?),
            TagKind::Compound => Tag::Compound(self.read_compound()?),
            TagKind::IntArray => {
                let len = self.read_len()?;
                self.check_room(len, 4)?;
                let bytes = self.take(len * 4)?;
                Tag::IntArray(
                    bytes
                        .chunks_exact(4)
                        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                        .collect(),
                )
            }
            TagKind::LongArray => {
                let len = self.read_len()?;
                self.check_room(len, 8)?;
                let bytes = self.take(len * 8)?;
                Tag::LongArray(
                    bytes
                        .chunks_exact(8)
                        .map(|c| i64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                        .collect(),
                )
            }
        })
    }

    fn read_list(&mut self) -> Result<List, NbtError> {
        self.enter()?;
        let kind = self.read_kind()?;
        let offset = self.pos;
        let count = i32::from_be_bytes(self.array()?);
        if count < 0 {
            return Err(NbtError::NegativeLength { len: count, offset });
        }
        if kind == TagKind::End && count > 0 {
            return Err(NbtError::InvalidList { count, offset });
        }
        let count = count as usize;
        self.check_room(count, min_payload_width(kind))?;

        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_payload(kind)?);
        }
        self.depth -= 1;
        Ok(List::from_parts(kind, items))
    }

    fn read_compound(&mut self) -> Result<Compound, NbtError> {
        self.enter()?;
        let mut compound = Compound::new();
        loop {
            let offset = self.pos;
            let kind = self.read_kind()?;
            if kind == TagKind::End {
                break;
            }
            let name = self.read_string()?;
            let tag = self.read_payload(kind)?;
            if compound.contains_key(&name) {
                log::warn!("duplicate key {name:?} in compound at byte {offset}, keeping the last value");
            }
            compound.insert(name, tag);
        }
        self.depth -= 1;
        Ok(compound)
    }
}

/// Smallest encoded size of one list element of `kind`.
fn min_payload_width(kind: TagKind) -> usize {
    match kind {
        TagKind::End => 0,
        TagKind::Byte | TagKind::Compound => 1,
        TagKind::Short | TagKind::String => 2,
        TagKind::Int | TagKind::Float => 4,
        TagKind::ByteArray | TagKind::IntArray | TagKind::LongArray => 4,
        TagKind::List => 5,
        TagKind::Long | TagKind::Double => 8,
    }
}
