use std::fmt::Write;

use crate::{NamedTag, Tag};

impl NamedTag {
    /// Indented, human-readable dump of the whole tree.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        write_tag(&mut out, Some(&self.name), &self.tag, 0);
        out
    }
}

impl Tag {
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        write_tag(&mut out, None, self, 0);
        out
    }
}

fn write_tag(out: &mut String, name: Option<&str>, tag: &Tag, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = match name {
        Some(name) => format!("{indent}{}('{name}')", tag.kind()),
        None => format!("{indent}{}", tag.kind()),
    };
    // writing into a String cannot fail
    let _ = match tag {
        Tag::Byte(v) => writeln!(out, "{label}: {v}"),
        Tag::Short(v) => writeln!(out, "{label}: {v}"),
        Tag::Int(v) => writeln!(out, "{label}: {v}"),
        Tag::Long(v) => writeln!(out, "{label}: {v}L"),
        Tag::Float(v) => writeln!(out, "{label}: {v}f"),
        Tag::Double(v) => writeln!(out, "{label}: {v}d"),
        Tag::String(s) => writeln!(out, "{label}: {s:?}"),
        Tag::ByteArray(v) => writeln!(out, "{label}: [{} bytes]", v.len()),
        Tag::IntArray(v) => writeln!(out, "{label}: [{} ints]", v.len()),
        Tag::LongArray(v) => writeln!(out, "{label}: [{} longs]", v.len()),
        Tag::List(list) => {
            let _ = writeln!(out, "{label}: {} entries of {} {{", list.len(), list.kind());
            for item in list {
                write_tag(out, None, item, depth + 1);
            }
            writeln!(out, "{indent}}}")
        }
        Tag::Compound(compound) => {
            let _ = writeln!(out, "{label}: {} entries {{", compound.len());
            for (child_name, child) in compound.iter() {
                write_tag(out, Some(child_name), child, depth + 1);
            }
            writeln!(out, "{indent}}}")
        }
    };
}
