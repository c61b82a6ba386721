use crate::dict::operators::*;
use crate::dict::{DictionaryParser, MAX_OPERANDS};
use crate::number::{IntegerNumber, Number};
use crate::write::Writer;

pub(crate) fn parse_subr_offset(data: &[u8]) -> Option<usize> {
    let mut operands_buffer = [Number::zero(); MAX_OPERANDS];
    let mut dict_parser = DictionaryParser::new(data, &mut operands_buffer);

    while let Some(operator) = dict_parser.parse_next() {
        if operator == SUBRS {
            return dict_parser.parse_offset();
        }
    }

    None
}

/// Rewrites a private dict operator by operator. The local subroutine
/// offset is re-encoded at a fixed width; everything else keeps its
/// source bytes.
pub(crate) struct PrivateDictTranscoder<'a> {
    data: &'a [u8],
}

impl<'a> PrivateDictTranscoder<'a> {
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
                // A 3-byte offset and the operator itself.
                SUBRS => 3 + SUBRS.as_bytes().len(),
                _ => dict_parser.record().len(),
            };
        }

        size
    }

    /// Write the dict, pointing its `Subrs` operator (if any) at
    /// `subrs_offset`, relative to the start of the dict itself.
    pub fn write(&self, subrs_offset: usize, w: &mut Writer) {
        let mut operands_buffer = [Number::zero(); MAX_OPERANDS];
        let mut dict_parser = DictionaryParser::new(self.data, &mut operands_buffer);

        while let Some(operator) = dict_parser.parse_next() {
            match operator {
                SUBRS => {
                    IntegerNumber(subrs_offset as i32).write_as_3_bytes(w);
                    w.extend(SUBRS.as_bytes());
                }
                _ => w.extend(&self.data[dict_parser.record()]),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_dict() -> Vec<u8> {
        let mut w = Writer::new();
        w.write(IntegerNumber(0));
        w.extend(VSINDEX.as_bytes());
        w.write(IntegerNumber(-15));
        w.write(IntegerNumber(80));
        w.extend(BLUE_VALUES.as_bytes());
        w.write(IntegerNumber(10));
        w.extend(SUBRS.as_bytes());
        w.finish()
    }

    #[test]
    fn finds_subr_offset() {
        assert_eq!(parse_subr_offset(&build_dict()), Some(10));

        let mut w = Writer::new();
        w.write(IntegerNumber(50));
        w.extend(STD_HW.as_bytes());
        assert_eq!(parse_subr_offset(&w.finish()), None);
    }

    #[test]
    fn size_matches_write() {
        let data = build_dict();
        let transcoder = PrivateDictTranscoder::new(&data);

        let mut w = Writer::new();
        transcoder.write(6, &mut w);
        let written = w.finish();

        assert_eq!(written.len(), transcoder.size());
        // Pass-through operators keep their source bytes, the subroutine
        // offset is re-encoded at a fixed width.
        assert_eq!(written[..5], data[..5]);
        assert_eq!(&written[5..], [28, 0, 6, 19]);

        // The size is stable regardless of the offset value.
        let mut w = Writer::new();
        transcoder.write(30000, &mut w);
        assert_eq!(w.finish().len(), transcoder.size());
    }
}
