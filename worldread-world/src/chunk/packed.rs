//! Fixed-width integers packed into `i64` words, least significant bits first.

/// How entries are laid out across long boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packing {
    /// Entries run on from one long into the next (before 20w17a).
    Spanning,
    /// Each long holds `64 / bits` whole entries; the leftover high bits are
    /// padding.
    Aligned,
}

/// DataVersion of 20w17a, the first snapshot writing [`Packing::Aligned`].
pub const ALIGNED_SINCE: i32 = 2529;

impl Packing {
    pub fn for_data_version(data_version: Option<i32>) -> Self {
        match data_version {
            Some(v) if v >= ALIGNED_SINCE => Self::Aligned,
            _ => Self::Spanning,
        }
    }

    pub fn longs_needed(self, bits: u32, count: usize) -> usize {
        let bits = bits as usize;
        match self {
            Self::Spanning => (count * bits).div_ceil(64),
            Self::Aligned => count.div_ceil(64 / bits),
        }
    }

    /// Infers the layout from the array length. When both layouts need the
    /// same number of longs, `hint` decides.
    pub fn detect(len: usize, bits: u32, count: usize, hint: Packing) -> Option<Packing> {
        let spanning = Self::Spanning.longs_needed(bits, count) == len;
        let aligned = Self::Aligned.longs_needed(bits, count) == len;
        match (spanning, aligned) {
            (true, true) => Some(hint),
            (true, false) => Some(Self::Spanning),
            (false, true) => Some(Self::Aligned),
            (false, false) => None,
        }
    }
}

/// Smallest `b` with `2^b >= n`.
pub fn ceil_log2(n: usize) -> u32 {
    if n <= 1 { 0 } else { usize::BITS - (n - 1).leading_zeros() }
}

/// Unpacks `count` entries of `bits` each. `None` if the array length fits
/// neither layout or `bits` is outside 1..=16.
pub fn unpack(longs: &[i64], bits: u32, count: usize, hint: Packing) -> Option<Vec<u16>> {
    if !(1..=16).contains(&bits) {
        return None;
    }
    let packing = Packing::detect(longs.len(), bits, count, hint)?;
    let mask = (1u64 << bits) - 1;
    let bits = bits as usize;
    let mut out = Vec::with_capacity(count);

    match packing {
        Packing::Spanning => {
            for i in 0..count {
                let bit = i * bits;
                let (word, offset) = (bit / 64, bit % 64);
                let mut value = longs[word] as u64 >> offset;
                if offset + bits > 64 {
                    value |= (longs[word + 1] as u64) << (64 - offset);
                }
                out.push((value & mask) as u16);
            }
        }
        Packing::Aligned => {
            let per_long = 64 / bits;
            for i in 0..count {
                let offset = (i % per_long) * bits;
                out.push(((longs[i / per_long] as u64 >> offset) & mask) as u16);
            }
        }
    }
    Some(out)
}

#[cfg(test)]
pub(crate) fn pack_aligned(values: &[u16], bits: u32) -> Vec<i64> {
    let per_long = 64 / bits as usize;
    values
        .chunks(per_long)
        .map(|group| {
            group
                .iter()
                .enumerate()
                .fold(0u64, |acc, (i, &v)| acc | (u64::from(v) << (i * bits as usize))) as i64
        })
        .collect()
}
