use crate::number::U24;
use crate::read::{Readable, Reader};
use crate::write::Writer;

/// A CFF2 INDEX: a length-prefixed sequence of variable-length byte strings,
/// addressed through an array of one-based offsets.
#[derive(Clone, Copy, Debug)]
pub struct Index<'a> {
    /// The full serialized bytes of the INDEX, for verbatim copies.
    raw: &'a [u8],
    offsets: VarOffsets<'a>,
    data: &'a [u8],
}

impl<'a> Index<'a> {
    /// Parse an INDEX, consuming exactly its serialized bytes from the reader.
    pub fn parse(r: &mut Reader<'a>) -> Option<Index<'a>> {
        let all = r.tail()?;
        let start = r.offset();

        let count = r.read::<u32>()?;
        if count == 0 {
            // An empty INDEX is just the count.
            return Some(Index {
                raw: all.get(..4)?,
                offsets: VarOffsets::default(),
                data: &[],
            });
        }

        let offset_size = r.read::<OffsetSize>()?;
        let offsets_len =
            (count as usize).checked_add(1)?.checked_mul(offset_size.to_usize())?;
        let offsets = VarOffsets { data: r.read_bytes(offsets_len)?, offset_size };

        // The last offset indicates the data size.
        let data = r.read_bytes(offsets.last()? as usize)?;
        let raw = all.get(..r.offset() - start)?;

        Some(Index { raw, offsets, data })
    }

    /// Parse an INDEX at a specific position.
    pub fn parse_at(data: &'a [u8], offset: usize) -> Option<Index<'a>> {
        let mut r = Reader::new_at(data, offset);
        Self::parse(&mut r)
    }

    #[inline]
    pub fn len(&self) -> u32 {
        // The last offset points past the end of the data, skip it.
        self.offsets.len().saturating_sub(1)
    }

    pub fn get(&self, index: u32) -> Option<&'a [u8]> {
        let next_index = index.checked_add(1)?;
        let start = self.offsets.get(index)? as usize;
        let end = self.offsets.get(next_index)? as usize;
        self.data.get(start..end)
    }

    /// The full serialized bytes.
    #[inline]
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// The full serialized size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.raw.len()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VarOffsets<'a> {
    pub data: &'a [u8],
    pub offset_size: OffsetSize,
}

impl Default for VarOffsets<'_> {
    #[inline]
    fn default() -> Self {
        VarOffsets { data: &[], offset_size: OffsetSize::Size1 }
    }
}

impl VarOffsets<'_> {
    pub fn get(&self, index: u32) -> Option<u32> {
        if index >= self.len() {
            return None;
        }

        let start = index as usize * self.offset_size.to_usize();
        let mut r = Reader::new_at(self.data, start);
        let n: u32 = match self.offset_size {
            OffsetSize::Size1 => u32::from(r.read::<u8>()?),
            OffsetSize::Size2 => u32::from(r.read::<u16>()?),
            OffsetSize::Size3 => r.read::<U24>()?.0,
            OffsetSize::Size4 => r.read::<u32>()?,
        };

        // Offsets are offset by one byte in the font,
        // so we have to shift them back.
        n.checked_sub(1)
    }

    #[inline]
    pub fn last(&self) -> Option<u32> {
        if self.len() > 0 {
            self.get(self.len() - 1)
        } else {
            None
        }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.data.len() as u32 / self.offset_size.to_u32()
    }
}

/// The width of the offsets in an INDEX offset array.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OffsetSize {
    Size1 = 1,
    Size2 = 2,
    Size3 = 3,
    Size4 = 4,
}

impl OffsetSize {
    /// The smallest width that can hold `value`.
    pub fn for_value(value: usize) -> Self {
        let mut size = 1;
        let mut rest = value >> 8;
        while rest != 0 {
            size += 1;
            rest >>= 8;
        }

        match size {
            1 => OffsetSize::Size1,
            2 => OffsetSize::Size2,
            3 => OffsetSize::Size3,
            _ => OffsetSize::Size4,
        }
    }

    #[inline]
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn to_usize(self) -> usize {
        self as usize
    }
}

impl Readable<'_> for OffsetSize {
    const SIZE: usize = 1;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        match r.read::<u8>()? {
            1 => Some(OffsetSize::Size1),
            2 => Some(OffsetSize::Size2),
            3 => Some(OffsetSize::Size3),
            4 => Some(OffsetSize::Size4),
            _ => None,
        }
    }
}

/// The serialized size of an INDEX over `count` items with `data_size` total
/// data bytes, using `offset_size` wide offsets.
pub fn serialized_size(count: usize, data_size: usize, offset_size: OffsetSize) -> usize {
    if count == 0 {
        return 4;
    }

    4 + 1 + (count + 1) * offset_size.to_usize() + data_size
}

/// Serialize an INDEX over the given items. The caller chooses the offset
/// size so that sizing and writing cannot disagree.
pub fn serialize_index<T: AsRef<[u8]>>(
    items: &[T],
    offset_size: OffsetSize,
    w: &mut Writer,
) {
    w.write::<u32>(items.len() as u32);
    if items.is_empty() {
        return;
    }

    w.write::<u8>(offset_size.to_usize() as u8);

    let mut offset = 1u32;
    write_offset(offset, offset_size, w);
    for item in items {
        offset += item.as_ref().len() as u32;
        write_offset(offset, offset_size, w);
    }

    for item in items {
        w.extend(item.as_ref());
    }
}

fn write_offset(value: u32, offset_size: OffsetSize, w: &mut Writer) {
    match offset_size {
        OffsetSize::Size1 => w.write::<u8>(value as u8),
        OffsetSize::Size2 => w.write::<u16>(value as u16),
        OffsetSize::Size3 => w.write(U24(value)),
        OffsetSize::Size4 => w.write::<u32>(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_size_boundaries() {
        assert_eq!(OffsetSize::for_value(1), OffsetSize::Size1);
        assert_eq!(OffsetSize::for_value(255), OffsetSize::Size1);
        assert_eq!(OffsetSize::for_value(256), OffsetSize::Size2);
        assert_eq!(OffsetSize::for_value(65535), OffsetSize::Size2);
        assert_eq!(OffsetSize::for_value(65536), OffsetSize::Size3);
        assert_eq!(OffsetSize::for_value(16777216), OffsetSize::Size4);
    }

    #[test]
    fn empty_roundtrip() {
        let mut w = Writer::new();
        serialize_index::<&[u8]>(&[], OffsetSize::Size1, &mut w);
        let buffer = w.finish();
        assert_eq!(buffer, [0, 0, 0, 0]);
        assert_eq!(buffer.len(), serialized_size(0, 0, OffsetSize::Size1));

        let index = Index::parse_at(&buffer, 0).unwrap();
        assert_eq!(index.len(), 0);
        assert_eq!(index.size(), 4);
    }

    #[test]
    fn roundtrip() {
        let items: &[&[u8]] = &[b"ab", b"", b"cde"];
        for offset_size in [OffsetSize::Size1, OffsetSize::Size2] {
            let data_size = items.iter().map(|i| i.len()).sum();
            let mut w = Writer::new();
            serialize_index(items, offset_size, &mut w);
            let buffer = w.finish();
            assert_eq!(buffer.len(), serialized_size(items.len(), data_size, offset_size));

            let index = Index::parse_at(&buffer, 0).unwrap();
            assert_eq!(index.len(), 3);
            assert_eq!(index.size(), buffer.len());
            for (i, item) in items.iter().enumerate() {
                assert_eq!(index.get(i as u32).unwrap(), *item);
            }
        }
    }
}
