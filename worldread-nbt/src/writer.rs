use std::io::Write;

use crate::{NamedTag, NbtError, Tag, mutf8};

pub fn to_bytes(root: &NamedTag) -> Result<Vec<u8>, NbtError> {
    let mut out = Vec::new();
    write_to(&mut out, root)?;
    Ok(out)
}

/// Encodes `root` uncompressed, exactly as [`crate::from_bytes`] reads it.
pub fn write_to<W: Write>(w: &mut W, root: &NamedTag) -> Result<(), NbtError> {
    w.write_all(&[root.tag.kind().id()])?;
    write_string(w, &root.name)?;
    write_payload(w, &root.tag)
}

fn write_string<W: Write>(w: &mut W, s: &str) -> Result<(), NbtError> {
    let encoded = mutf8::encode(s);
    let len = u16::try_from(encoded.len()).map_err(|_| NbtError::StringTooLong { len: encoded.len() })?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(&encoded)?;
    Ok(())
}

fn write_len<W: Write>(w: &mut W, len: usize) -> Result<(), NbtError> {
    let len = i32::try_from(len).map_err(|_| NbtError::SequenceTooLong { len })?;
    w.write_all(&len.to_be_bytes())?;
    Ok(())
}

fn write_payload<W: Write>(w: &mut W, tag: &Tag) -> Result<(), NbtError> {
    match tag {
        Tag::Byte(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Short(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Int(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Long(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Float(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Double(v) => w.write_all(&v.to_be_bytes())?,
        Tag::ByteArray(values) => {
            write_len(w, values.len())?;
            let bytes: Vec<u8> = values.iter().map(|&b| b as u8).collect();
            w.write_all(&bytes)?;
        }
        Tag::String(s) => write_string(w, s)?,
        Tag::List(list) => {
            w.write_all(&[list.kind().id()])?;
            write_len(w, list.len())?;
            for item in list {
                write_payload(w, item)?;
            }
        }
        Tag::Compound(compound) => {
            for (name, child) in compound.iter() {
                w.write_all(&[child.kind().id()])?;
                write_string(w, name)?;
                write_payload(w, child)?;
            }
            w.write_all(&[0])?;
        }
        Tag::IntArray(values) => {
            write_len(w, values.len())?;
            for v in values {
                w.write_all(&v.to_be_bytes())?;
            }
        }
        Tag::LongArray(values) => {
            write_len(w, values.len())?;
            for v in values {
                w.write_all(&v.to_be_bytes())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Compound, List, TagKind, from_bytes};

    fn every_kind() -> Compound {
        let mut sections = List::new(TagKind::Compound);
        for y in -1i8..=1 {
            sections
                .push(Compound::new().with("Y", y).with("data", vec![y as i64, i64::MIN]))
                .unwrap();
        }
        let mut nested = List::new(TagKind::List);
        nested.push(List::from_tags(TagKind::Int, vec![Tag::Int(1), Tag::Int(2)]).unwrap()).unwrap();
        nested.push(List::new(TagKind::End)).unwrap();

        Compound::new()
            .with("byte", i8::MIN)
            .with("short", -12345i16)
            .with("int", i32::MAX)
            .with("long", -1i64)
            .with("float", 1.5f32)
            .with("double", -0.25f64)
            .with("bytes", vec![0i8, -1, 127])
            .with("string", "minecraft:deepslate")
            .with("empty", List::default())
            .with("sections", sections)
            .with("nested", nested)
            .with("child", Compound::new().with("z", 9i32))
            .with("ints", vec![i32::MIN, 0, 7])
            .with("longs", Vec::<i64>::new())
    }

    #[test]
    fn test_round_trip_every_kind() {
        let root = NamedTag::new("Level", every_kind());
        let bytes = to_bytes(&root).unwrap();
        let parsed = from_bytes(&bytes).unwrap();

        assert_eq!(parsed, root);
        let names: Vec<_> = parsed.compound().unwrap().keys().collect();
        assert_eq!(names.first(), Some(&"byte"));
        assert_eq!(names.last(), Some(&"longs"));
    }

    #[test]
    fn test_round_trip_modified_utf8_names() {
        let root = NamedTag::new("", Compound::new().with("nul\0key", "🌍 ok"));
        let parsed = from_bytes(&to_bytes(&root).unwrap()).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn test_empty_list_encodes_end_kind() {
        let root = NamedTag::new("", Compound::new().with("e", List::default()));
        let bytes = to_bytes(&root).unwrap();
        // 10 00 00 | 09 00 01 'e' | 00 | 00 00 00 00 | 00
        assert_eq!(bytes, vec![10, 0, 0, 9, 0, 1, b'e', 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_fastnbt_reads_our_encoding() {
        let bytes = to_bytes(&NamedTag::new("", every_kind())).unwrap();
        let value: fastnbt::Value = fastnbt::from_bytes(&bytes).unwrap();

        let fastnbt::Value::Compound(map) = value else {
            panic!("root should be a compound");
        };
        assert_eq!(map.get("int"), Some(&fastnbt::Value::Int(i32::MAX)));
        assert_eq!(map.get("string"), Some(&fastnbt::Value::String("minecraft:deepslate".into())));
        match map.get("sections") {
            Some(fastnbt::Value::List(items)) => assert_eq!(items.len(), 3),
            other => panic!("sections decoded as {other:?}"),
        }
    }

    #[test]
    fn test_we_read_fastnbt_encoding() {
        let mut inner = std::collections::HashMap::new();
        inner.insert("DataVersion".to_string(), fastnbt::Value::Int(3578));
        inner.insert("Status".to_string(), fastnbt::Value::String("minecraft:full".into()));
        inner.insert(
            "Heights".to_string(),
            fastnbt::Value::LongArray(fastnbt::LongArray::new(vec![1, 2, 3])),
        );
        let bytes = fastnbt::to_bytes(&fastnbt::Value::Compound(inner)).unwrap();

        let parsed = from_bytes(&bytes).unwrap();
        let c = parsed.compound().unwrap();
        assert_eq!(c.get("DataVersion"), Some(&Tag::Int(3578)));
        assert_eq!(c.get("Heights"), Some(&Tag::LongArray(vec![1, 2, 3])));
    }

    #[test]
    fn test_string_too_long() {
        let root = NamedTag::new("", Compound::new().with("s", "x".repeat(70_000)));
        assert!(matches!(to_bytes(&root), Err(NbtError::StringTooLong { len: 70_000 })));
    }
}
