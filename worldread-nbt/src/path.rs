//! Typed lookups into a tag tree.
//!
//! A path is a dotted list of compound keys with optional list indices,
//! e.g. `Level.Sections[2].Y`. Lookups never panic: a missing child or a
//! child of the wrong kind becomes an [`AccessError`] naming the path.

use std::fmt;

use thiserror::Error;

use crate::{Compound, List, Tag, TagKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessErrorKind {
    Missing,
    TypeMismatch { expected: TagKind, found: TagKind },
    IndexOutOfBounds { len: usize },
    BadPath,
}

impl fmt::Display for AccessErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::TypeMismatch { expected, found } => write!(f, "expected {expected}, found {found}"),
            Self::IndexOutOfBounds { len } => write!(f, "index out of bounds for list of {len}"),
            Self::BadPath => f.write_str("malformed path"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("`{path}`: {kind}")]
pub struct AccessError {
    pub path: String,
    pub kind: AccessErrorKind,
}

impl AccessError {
    pub fn new(path: impl Into<String>, kind: AccessErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn mismatch(path: impl Into<String>, expected: TagKind, found: TagKind) -> Self {
        Self::new(path, AccessErrorKind::TypeMismatch { expected, found })
    }
}

/// Borrowed view of a tag as a concrete Rust type.
pub trait FromTag<'a>: Sized {
    const KIND: TagKind;

    fn from_tag(tag: &'a Tag) -> Option<Self>;
}

macro_rules! from_tag_copy {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> FromTag<'a> for $ty {
                const KIND: TagKind = TagKind::$variant;

                fn from_tag(tag: &'a Tag) -> Option<Self> {
                    match tag {
                        Tag::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

macro_rules! from_tag_ref {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> FromTag<'a> for &'a $ty {
                const KIND: TagKind = TagKind::$variant;

                fn from_tag(tag: &'a Tag) -> Option<Self> {
                    match tag {
                        Tag::$variant(v) => {
                            let v: &'a $ty = v;
                            Some(v)
                        }
                        _ => None,
                    }
                }
            }
        )*
    };
}

from_tag_copy! {
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

from_tag_ref! {
    str => String,
    Compound => Compound,
    List => List,
    [i8] => ByteArray,
    [i32] => IntArray,
    [i64] => LongArray,
}

impl<'a> FromTag<'a> for &'a Tag {
    // Never reported: every tag converts.
    const KIND: TagKind = TagKind::End;

    fn from_tag(tag: &'a Tag) -> Option<Self> {
        Some(tag)
    }
}

fn convert<'a, T: FromTag<'a>>(tag: &'a Tag, path: &str) -> Result<T, AccessError> {
    T::from_tag(tag).ok_or_else(|| AccessError::mismatch(path, T::KIND, tag.kind()))
}

impl Compound {
    /// A required child of type `T`.
    pub fn get_as<'a, T: FromTag<'a>>(&'a self, name: &str) -> Result<T, AccessError> {
        let tag = self
            .get(name)
            .ok_or_else(|| AccessError::new(name, AccessErrorKind::Missing))?;
        convert(tag, name)
    }

    /// An optional child: absent is `Ok(None)`, present with the wrong kind
    /// is still an error.
    pub fn find_as<'a, T: FromTag<'a>>(&'a self, name: &str) -> Result<Option<T>, AccessError> {
        match self.get(name) {
            Some(tag) => convert(tag, name).map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'p> {
    Key(&'p str),
    Index(usize),
}

pub fn parse_path(path: &str) -> Result<Vec<Segment<'_>>, AccessError> {
    let bad = || AccessError::new(path, AccessErrorKind::BadPath);
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (key, mut rest) = match part.find('[') {
            Some(i) => part.split_at(i),
            None => (part, ""),
        };
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        } else if rest.is_empty() {
            return Err(bad());
        }
        while !rest.is_empty() {
            let inner = rest.strip_prefix('[').ok_or_else(bad)?;
            let close = inner.find(']').ok_or_else(bad)?;
            let index = inner[..close].parse::<usize>().map_err(|_| bad())?;
            segments.push(Segment::Index(index));
            rest = &inner[close + 1..];
        }
    }
    Ok(segments)
}

impl Tag {
    /// Resolves a path relative to this tag.
    pub fn at(&self, path: &str) -> Result<&Tag, AccessError> {
        let mut current = self;
        let mut walked = String::new();
        for segment in parse_path(path)? {
            match segment {
                Segment::Key(key) => {
                    if !walked.is_empty() {
                        walked.push('.');
                    }
                    walked.push_str(key);
                    let compound: &Compound = convert(current, &walked)?;
                    current = compound
                        .get(key)
                        .ok_or_else(|| AccessError::new(walked.clone(), AccessErrorKind::Missing))?;
                }
                Segment::Index(index) => {
                    walked.push_str(&format!("[{index}]"));
                    let list: &List = convert(current, &walked)?;
                    current = list.get(index).ok_or_else(|| {
                        AccessError::new(walked.clone(), AccessErrorKind::IndexOutOfBounds { len: list.len() })
                    })?;
                }
            }
        }
        Ok(current)
    }

    pub fn at_as<'a, T: FromTag<'a>>(&'a self, path: &str) -> Result<T, AccessError> {
        convert(self.at(path)?, path)
    }
}
