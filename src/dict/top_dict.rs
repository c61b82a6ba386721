use crate::dict::operators::*;
use crate::dict::{DictionaryParser, MAX_OPERANDS};
use crate::number::{IntegerNumber, Number};
use crate::write::Writer;

/// The section offsets recorded in the source top dict.
#[derive(Default, Debug, Clone)]
pub(crate) struct TopDictData {
    pub char_strings: Option<usize>,
    pub fd_array: Option<usize>,
    pub fd_select: Option<usize>,
    pub var_store: Option<usize>,
}

pub(crate) fn parse_top_dict(data: &[u8]) -> Option<TopDictData> {
    let mut top_dict = TopDictData::default();

    let mut operands_buffer = [Number::zero(); MAX_OPERANDS];
    let mut dict_parser = DictionaryParser::new(data, &mut operands_buffer);

    while let Some(operator) = dict_parser.parse_next() {
        match operator {
            CHAR_STRINGS => top_dict.char_strings = Some(dict_parser.parse_offset()?),
            FD_ARRAY => top_dict.fd_array = Some(dict_parser.parse_offset()?),
            FD_SELECT => top_dict.fd_select = Some(dict_parser.parse_offset()?),
            VSTORE => top_dict.var_store = Some(dict_parser.parse_offset()?),
            _ => {}
        }
    }

    Some(top_dict)
}

/// The final section offsets that replace the ones in the source top dict.
/// Offsets of sections absent from the source are never written and may
/// stay zero.
#[derive(Default, Debug, Clone, Copy)]
pub(crate) struct TopDictOffsets {
    pub char_strings: u32,
    pub fd_array: u32,
    pub fd_select: u32,
    pub var_store: u32,
}

/// Rewrites a top dict operator by operator. The four offset-bearing
/// operators are re-encoded with a maximal-width operand so that `size`
/// is exact without knowing the offsets yet; everything else keeps its
/// source bytes.
pub(crate) struct TopDictTranscoder<'a> {
    data: &'a [u8],
}

impl<'a> TopDictTranscoder<'a> {
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
                CHAR_STRINGS | FD_ARRAY | FD_SELECT | VSTORE => {
                    5 + operator.as_bytes().len()
                }
                _ => dict_parser.record().len(),
            };
        }

        size
    }

    pub fn write(&self, offsets: &TopDictOffsets, w: &mut Writer) {
        let mut operands_buffer = [Number::zero(); MAX_OPERANDS];
        let mut dict_parser = DictionaryParser::new(self.data, &mut operands_buffer);

        while let Some(operator) = dict_parser.parse_next() {
            let offset = match operator {
                CHAR_STRINGS => offsets.char_strings,
                FD_ARRAY => offsets.fd_array,
                FD_SELECT => offsets.fd_select,
                VSTORE => offsets.var_store,
                _ => {
                    w.extend(&self.data[dict_parser.record()]);
                    continue;
                }
            };

            IntegerNumber(offset as i32).write_as_5_bytes(w);
            w.extend(operator.as_bytes());
        }
    }
}
