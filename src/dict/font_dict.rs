use crate::dict::operators::*;
use crate::dict::private_dict::parse_subr_offset;
use crate::dict::{DictionaryParser, MAX_OPERANDS};
use crate::index::Index;
use crate::number::{IntegerNumber, Number};
use crate::write::Writer;

/// A font dict together with the private dict and local subroutine index
/// it references.
#[derive(Default, Clone, Debug)]
pub(crate) struct FontDict<'a> {
    /// The raw bytes of the font dict itself.
    pub raw: &'a [u8],
    /// The raw bytes of the private dict, empty if the font dict has none.
    pub private_dict: &'a [u8],
    /// The local subroutine index referenced by the private dict.
    pub local_subrs: Option<Index<'a>>,
}

pub(crate) fn parse_font_dict<'a>(
    table_data: &'a [u8],
    dict_data: &'a [u8],
) -> Option<FontDict<'a>> {
    let mut font_dict = FontDict { raw: dict_data, ..FontDict::default() };

    let mut operands_buffer = [Number::zero(); MAX_OPERANDS];
    let mut dict_parser = DictionaryParser::new(dict_data, &mut operands_buffer);
    while let Some(operator) = dict_parser.parse_next() {
        if operator == PRIVATE {
            let private_dict_range = dict_parser.parse_range()?;
            let private_dict_data = table_data.get(private_dict_range.clone())?;
            font_dict.private_dict = private_dict_data;

            // Local subroutine offsets are relative to the private dict.
            if let Some(subrs_offset) = parse_subr_offset(private_dict_data) {
                let start = private_dict_range.start.checked_add(subrs_offset)?;
                font_dict.local_subrs = Some(Index::parse_at(table_data, start)?);
            }
        }
    }

    Some(font_dict)
}

/// Rewrites a font dict operator by operator. The private dict reference is
/// re-encoded as a fixed-width size and offset pair; everything else keeps
/// its source bytes.
pub(crate) struct FontDictTranscoder<'a> {
    data: &'a [u8],
}

impl<'a> FontDictTranscoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// The exact number of bytes `write` will emit.
    pub fn size(&self) -> usize {
        let mut operands_buffer = [Number::zero(); MAX_OPERANDS];
        let mut dict_parser = DictionaryParser::new(self.data, &mut operands_buffer);

        let mut size = 0;
        while let Some(operator) = dict_parser.parse_next() {
            size += match operator {
                // A 3-byte size, a 5-byte offset and the operator itself.
                PRIVATE => 3 + 5 + PRIVATE.as_bytes().len(),
                _ => dict_parser.record().len(),
            };
        }

        size
    }

    pub fn write(&self, private_size: usize, private_offset: usize, w: &mut Writer) {
        let mut operands_buffer = [Number::zero(); MAX_OPERANDS];
        let mut dict_parser = DictionaryParser::new(self.data, &mut operands_buffer);

        while let Some(operator) = dict_parser.parse_next() {
            match operator {
                PRIVATE => {
                    IntegerNumber(private_size as i32).write_as_3_bytes(w);
                    IntegerNumber(private_offset as i32).write_as_5_bytes(w);
                    w.extend(PRIVATE.as_bytes());
                }
                _ => w.extend(&self.data[dict_parser.record()]),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_matches_write() {
        let mut w = Writer::new();
        w.write(IntegerNumber(20));
        w.write(IntegerNumber(1200));
        w.extend(PRIVATE.as_bytes());
        let data = w.finish();

        let transcoder = FontDictTranscoder::new(&data);
        let mut w = Writer::new();
        transcoder.write(64, 90000, &mut w);
        let written = w.finish();

        assert_eq!(written.len(), transcoder.size());
        assert_eq!(written, [28, 0, 64, 29, 0, 1, 95, 144, 18]);
    }
}
