use crate::dict::font_dict::{parse_font_dict, FontDict};
use crate::dict::top_dict::parse_top_dict;
use crate::fd_select::FdSelect;
use crate::index::Index;
use crate::read::Reader;
use crate::{Error, Result};

/// A parsed CFF2 table, holding read-only views into the source bytes.
pub(crate) struct Table<'a> {
    /// The raw bytes of the top dict.
    pub top_dict: &'a [u8],
    pub global_subrs: Index<'a>,
    /// The raw bytes of the variation store, if the font has one.
    pub var_store: Option<&'a [u8]>,
    pub fd_select: Option<FdSelect<'a>>,
    pub font_dicts: Vec<FontDict<'a>>,
    pub char_strings: Index<'a>,
}

impl<'a> Table<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Table<'a>> {
        let mut r = Reader::new(data);

        let major = r.read::<u8>().ok_or(Error::MalformedFont)?;
        let _minor = r.read::<u8>().ok_or(Error::MalformedFont)?;
        if major != 2 {
            return Err(Error::MalformedFont);
        }

        let header_size = usize::from(r.read::<u8>().ok_or(Error::MalformedFont)?);
        let top_dict_len = usize::from(r.read::<u16>().ok_or(Error::MalformedFont)?);

        // The top dict starts right after the header, the global
        // subroutines right after the top dict.
        let top_dict = data
            .get(header_size..header_size + top_dict_len)
            .ok_or(Error::MalformedFont)?;
        let top = parse_top_dict(top_dict).ok_or(Error::MalformedFont)?;

        let global_subrs = Index::parse_at(data, header_size + top_dict_len)
            .ok_or(Error::MalformedFont)?;

        let char_strings = {
            let offset = top.char_strings.ok_or(Error::MalformedFont)?;
            Index::parse_at(data, offset).ok_or(Error::MalformedFont)?
        };
        let num_glyphs =
            u16::try_from(char_strings.len()).map_err(|_| Error::MalformedFont)?;

        let font_dicts = {
            let offset = top.fd_array.ok_or(Error::MalformedFont)?;
            let fd_array = Index::parse_at(data, offset).ok_or(Error::MalformedFont)?;

            let mut dicts = Vec::with_capacity(fd_array.len() as usize);
            for i in 0..fd_array.len() {
                let dict_data = fd_array.get(i).ok_or(Error::MalformedFont)?;
                dicts.push(parse_font_dict(data, dict_data).ok_or(Error::MalformedFont)?);
            }
            dicts
        };

        if font_dicts.is_empty() {
            return Err(Error::MalformedFont);
        }

        let fd_select = match top.fd_select {
            Some(offset) => {
                let sub = data.get(offset..).ok_or(Error::MalformedFont)?;
                Some(FdSelect::parse(sub, num_glyphs).ok_or(Error::MalformedFont)?)
            }
            None => None,
        };

        let var_store = match top.var_store {
            Some(offset) => {
                let mut r = Reader::new_at(data, offset);
                let len = usize::from(r.read::<u16>().ok_or(Error::MalformedFont)?);
                Some(data.get(offset..offset + 2 + len).ok_or(Error::MalformedFont)?)
            }
            None => None,
        };

        Ok(Table { top_dict, global_subrs, var_store, fd_select, font_dicts, char_strings })
    }
}
