use thiserror::Error;

use crate::TagKind;

/// Structural failure while decoding or encoding a tag tree.
#[derive(Debug, Error)]
pub enum NbtError {
    #[error("unexpected end of data at byte {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    #[error("unknown tag type {id} at byte {offset}")]
    UnknownTag { id: u8, offset: usize },

    #[error("TAG_End where a value was expected at byte {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("negative length {len} at byte {offset}")]
    NegativeLength { len: i32, offset: usize },

    #[error("list of TAG_End declares {count} elements at byte {offset}")]
    InvalidList { count: i32, offset: usize },

    #[error("invalid modified UTF-8 string at byte {offset}")]
    InvalidString { offset: usize },

    #[error("root tag is TAG_End")]
    EmptyRoot,

    #[error("nesting deeper than {max} levels at byte {offset}")]
    TooDeep { offset: usize, max: usize },

    #[error("list holds {expected} elements, cannot add {found}")]
    MixedList { expected: TagKind, found: TagKind },

    #[error("string of {len} bytes exceeds the 65535 byte limit")]
    StringTooLong { len: usize },

    #[error("sequence of {len} elements exceeds the i32 length limit")]
    SequenceTooLong { len: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
