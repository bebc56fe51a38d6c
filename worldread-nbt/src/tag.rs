use std::collections::HashMap;
use std::fmt;

use crate::NbtError;

/// Type id of a tag, as written before every named value and once per list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagKind {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => Self::End,
            1 => Self::Byte,
            2 => Self::Short,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::ByteArray,
            8 => Self::String,
            9 => Self::List,
            10 => Self::Compound,
            11 => Self::IntArray,
            12 => Self::LongArray,
            _ => return None,
        })
    }

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::End => "TAG_End",
            Self::Byte => "TAG_Byte",
            Self::Short => "TAG_Short",
            Self::Int => "TAG_Int",
            Self::Long => "TAG_Long",
            Self::Float => "TAG_Float",
            Self::Double => "TAG_Double",
            Self::ByteArray => "TAG_Byte_Array",
            Self::String => "TAG_String",
            Self::List => "TAG_List",
            Self::Compound => "TAG_Compound",
            Self::IntArray => "TAG_Int_Array",
            Self::LongArray => "TAG_Long_Array",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One node of a tag tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::String(_) => TagKind::String,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
            Tag::IntArray(_) => TagKind::IntArray,
            Tag::LongArray(_) => TagKind::LongArray,
        }
    }

    /// Any integer kind, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Tag::Byte(v) => Some(v.into()),
            Tag::Short(v) => Some(v.into()),
            Tag::Int(v) => Some(v.into()),
            Tag::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }
}

macro_rules! tag_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Tag {
                fn from(value: $ty) -> Self {
                    Tag::$variant(value)
                }
            }
        )*
    };
}

tag_from! {
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Vec<i8> => ByteArray,
    String => String,
    List => List,
    Compound => Compound,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::String(value.to_owned())
    }
}

/// A homogeneous sequence of tags sharing one element kind.
///
/// An empty list may declare any kind; vanilla writes `TAG_End` for those.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    kind: TagKind,
    items: Vec<Tag>,
}

impl Default for List {
    fn default() -> Self {
        Self::new(TagKind::End)
    }
}

impl List {
    pub fn new(kind: TagKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Builds a list, failing if any item differs from `kind`.
    pub fn from_tags(kind: TagKind, items: Vec<Tag>) -> Result<Self, NbtError> {
        if let Some(bad) = items.iter().find(|t| t.kind() != kind) {
            return Err(NbtError::MixedList {
                expected: kind,
                found: bad.kind(),
            });
        }
        Ok(Self { kind, items })
    }

    /// Parser-side constructor; the reader guarantees homogeneity.
    pub(crate) fn from_parts(kind: TagKind, items: Vec<Tag>) -> Self {
        Self { kind, items }
    }

    /// Appends an item. An empty `TAG_End` list adopts the item's kind.
    pub fn push(&mut self, tag: impl Into<Tag>) -> Result<(), NbtError> {
        let tag = tag.into();
        if self.items.is_empty() && self.kind == TagKind::End {
            self.kind = tag.kind();
        }
        if tag.kind() != self.kind {
            return Err(NbtError::MixedList {
                expected: self.kind,
                found: tag.kind(),
            });
        }
        self.items.push(tag);
        Ok(())
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    /// Iterates the elements of a compound list; a list of any other kind
    /// yields nothing.
    pub fn compounds(&self) -> impl Iterator<Item = &Compound> {
        self.items.iter().filter_map(Tag::as_compound)
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Named children in insertion order; names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
    /// Position of each name in `entries`.
    index: HashMap<String, usize>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a child. An existing child of the same name is replaced in
    /// place (last write wins) and returned.
    pub fn insert(&mut self, name: impl Into<String>, tag: impl Into<Tag>) -> Option<Tag> {
        let name = name.into();
        let tag = tag.into();
        match self.index.get(&name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, tag)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, tag));
                None
            }
        }
    }

    /// Builder form of [`Compound::insert`].
    pub fn with(mut self, name: impl Into<String>, tag: impl Into<Tag>) -> Self {
        self.insert(name, tag);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

/// The root of a tag tree: one tag with its name (usually empty).
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTag {
    pub name: String,
    pub tag: Tag,
}

impl NamedTag {
    pub fn new(name: impl Into<String>, tag: impl Into<Tag>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }

    pub fn compound(&self) -> Option<&Compound> {
        self.tag.as_compound()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ids_round_trip() {
        for id in 0..=12u8 {
            let kind = TagKind::from_id(id).expect("known id");
            assert_eq!(kind.id(), id);
        }
        assert_eq!(TagKind::from_id(13), None);
        assert_eq!(TagKind::from_id(0xFF), None);
    }

    #[test]
    fn test_compound_last_write_wins_keeps_position() {
        let mut c = Compound::new().with("a", 1i32).with("b", 2i32);
        let old = c.insert("a", 3i32);

        assert_eq!(old, Some(Tag::Int(1)));
        assert_eq!(c.len(), 2);
        assert_eq!(c.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(c.get("a"), Some(&Tag::Int(3)));
    }

    #[test]
    fn test_compound_many_keys() {
        let mut c = Compound::new();
        for i in 0..10_000 {
            c.insert(format!("k{i}"), i);
        }
        assert_eq!(c.insert("k5000", -1i32), Some(Tag::Int(5000)));
        assert_eq!(c.len(), 10_000);
        assert_eq!(c.get("k5000"), Some(&Tag::Int(-1)));
        assert_eq!(c.get("k9999"), Some(&Tag::Int(9999)));
        assert!(!c.contains_key("k10000"));
        assert_eq!(c.keys().nth(5000), Some("k5000"));
    }

    #[test]
    fn test_list_rejects_mixed_kinds() {
        let mut list = List::default();
        list.push(1i32).unwrap();
        assert_eq!(list.kind(), TagKind::Int);

        let err = list.push("nope").unwrap_err();
        assert!(matches!(
            err,
            NbtError::MixedList {
                expected: TagKind::Int,
                found: TagKind::String
            }
        ));
        assert!(List::from_tags(TagKind::Byte, vec![Tag::Byte(1), Tag::Short(1)]).is_err());
    }

    #[test]
    fn test_as_i64_widens_integers_only() {
        assert_eq!(Tag::Byte(-3).as_i64(), Some(-3));
        assert_eq!(Tag::Long(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(Tag::Float(1.0).as_i64(), None);
    }
}
