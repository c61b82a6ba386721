use crate::dict::font_dict::FontDictTranscoder;
use crate::dict::private_dict::PrivateDictTranscoder;
use crate::dict::top_dict::TopDictTranscoder;
use crate::fd_select::{self, SelectorPlan};
use crate::index::{self, OffsetSize};
use crate::remapper::FdRemapper;
use crate::table::Table;
use crate::{Error, Result};

/// The fixed CFF2 header: major and minor version, header size and the
/// length of the top dict.
pub(crate) const HEADER_SIZE: usize = 5;

/// Where a private dict lands in the output, with its local subroutine
/// index following right after.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PrivateDictInfo {
    pub offset: usize,
    pub size: usize,
}

/// The computed layout of the subsetted table.
///
/// Offsets are absolute and forward-referencing, so the whole layout has
/// to be known before a single byte is written. The writer follows this
/// plan section by section and bails out if it ever disagrees.
pub(crate) struct SubsetPlan<'a> {
    pub final_size: usize,
    pub top_dict_size: usize,
    pub global_subrs_offset: usize,
    pub var_store_offset: Option<usize>,
    pub fd_select_offset: Option<usize>,
    pub fd_array_offset: usize,
    pub char_strings_offset: usize,
    pub private_dicts_offset: usize,
    pub orig_fd_count: usize,
    pub subst_fd_count: usize,
    /// Old font dict index to new font dict index, excluded dicts absent.
    pub fd_map: FdRemapper,
    /// The selector re-encoding, if the source has a selector.
    pub selector: Option<SelectorPlan>,
    /// The retained charstrings, aligned with the glyph selection.
    pub retained_charstrings: Vec<&'a [u8]>,
    pub char_strings_off_size: OffsetSize,
    pub fd_array_off_size: OffsetSize,
    /// Private dict placements, one per *original* font dict slot. Dicts
    /// excluded from the font dict array keep their private dict in the
    /// output, which keeps the local subroutine offsets trivial.
    pub private_dict_infos: Vec<PrivateDictInfo>,
}

impl<'a> SubsetPlan<'a> {
    /// Walk the source sections in layout order, deciding the font dict
    /// subsetting and the selector re-encoding along the way.
    pub fn build(table: &Table<'a>, glyphs: &[u16]) -> Result<SubsetPlan<'a>> {
        let orig_fd_count = table.font_dicts.len();
        let mut size = HEADER_SIZE;

        // Top dict. The four offset-bearing operators are measured at
        // their fixed re-encoded width, so the size is final even though
        // the offsets are not known yet.
        let top_dict_size = TopDictTranscoder::new(table.top_dict).size();
        u16::try_from(top_dict_size).map_err(|_| Error::MalformedFont)?;
        size += top_dict_size;

        // Global subroutines are copied in full.
        let global_subrs_offset = size;
        size += table.global_subrs.size();

        let var_store_offset = table.var_store.map(|store| {
            let offset = size;
            size += store.len();
            offset
        });

        // Selector. This also decides which font dicts survive.
        let (fd_select_offset, selector, fd_map, subst_fd_count) =
            match &table.fd_select {
                Some(select) => {
                    let offset = size;
                    let (selector, fd_map) =
                        fd_select::plan_subset(glyphs, select, orig_fd_count)?;
                    size += selector.size;
                    let subst_fd_count = selector.fd_count;
                    (Some(offset), Some(selector), fd_map, subst_fd_count)
                }
                None => {
                    // Without a selector, every glyph uses font dict 0.
                    let mut fd_map = FdRemapper::new();
                    fd_map.remap(0);
                    (None, None, fd_map, 1)
                }
            };

        // Font dict array, over the retained font dicts only.
        let fd_array_offset = size;
        let mut fd_data_size = 0;
        for old_fd in fd_map.sorted_iter() {
            let dict = table
                .font_dicts
                .get(usize::from(old_fd))
                .ok_or(Error::MalformedFont)?;
            fd_data_size += FontDictTranscoder::new(dict.raw).size();
        }
        let fd_array_off_size = OffsetSize::for_value(fd_data_size + 1);
        size += index::serialized_size(fd_map.len(), fd_data_size, fd_array_off_size);

        // Charstrings, in selection order.
        let char_strings_offset = size;
        let mut retained_charstrings = Vec::with_capacity(glyphs.len());
        let mut char_strings_data_size = 0;
        for &gid in glyphs {
            let string =
                table.char_strings.get(u32::from(gid)).ok_or(Error::MalformedFont)?;
            char_strings_data_size += string.len();
            retained_charstrings.push(string);
        }
        let char_strings_off_size = OffsetSize::for_value(char_strings_data_size + 1);
        size += index::serialized_size(
            glyphs.len(),
            char_strings_data_size,
            char_strings_off_size,
        );

        // Private dicts, each followed by its local subroutine index.
        let private_dicts_offset = size;
        let mut private_dict_infos = Vec::with_capacity(orig_fd_count);
        for dict in &table.font_dicts {
            let private_size = PrivateDictTranscoder::new(dict.private_dict).size();
            private_dict_infos.push(PrivateDictInfo { offset: size, size: private_size });
            size += private_size;
            if let Some(subrs) = &dict.local_subrs {
                size += subrs.size();
            }
        }

        u32::try_from(size).map_err(|_| Error::MalformedFont)?;

        Ok(SubsetPlan {
            final_size: size,
            top_dict_size,
            global_subrs_offset,
            var_store_offset,
            fd_select_offset,
            fd_array_offset,
            char_strings_offset,
            private_dicts_offset,
            orig_fd_count,
            subst_fd_count,
            fd_map,
            selector,
            retained_charstrings,
            char_strings_off_size,
            fd_array_off_size,
            private_dict_infos,
        })
    }

    /// Whether the selector subsetting dropped any font dicts.
    pub fn fds_subsetted(&self) -> bool {
        self.subst_fd_count < self.orig_fd_count
    }
}
