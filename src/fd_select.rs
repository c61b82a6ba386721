use crate::read::{LazyArray16, Reader};
use crate::remapper::FdRemapper;
use crate::write::Writer;
use crate::{Error, Result};

/// The glyph to font dict assignment table (FDSelect).
#[derive(Clone, Copy, Debug)]
pub(crate) struct FdSelect<'a> {
    /// The full serialized bytes, for verbatim copies.
    raw: &'a [u8],
    kind: FdSelectKind<'a>,
}

#[derive(Clone, Copy, Debug)]
enum FdSelectKind<'a> {
    /// One font dict index per glyph.
    Format0(LazyArray16<'a, u8>),
    /// Ranges of glyphs sharing a font dict index, including the sentinel.
    Format3(&'a [u8]),
}

impl<'a> FdSelect<'a> {
    pub fn parse(data: &'a [u8], num_glyphs: u16) -> Option<FdSelect<'a>> {
        let mut r = Reader::new(data);
        match r.read::<u8>()? {
            0 => {
                let array = r.read_array16::<u8>(num_glyphs)?;
                let raw = data.get(..1 + usize::from(num_glyphs))?;
                Some(FdSelect { raw, kind: FdSelectKind::Format0(array) })
            }
            3 => {
                let num_ranges = usize::from(r.read::<u16>()?);
                // Ranges of (first glyph, font dict), plus the sentinel.
                let len = 1 + 2 + 3 * num_ranges + 2;
                let raw = data.get(..len)?;
                Some(FdSelect { raw, kind: FdSelectKind::Format3(raw.get(1..)?) })
            }
            _ => None,
        }
    }

    /// Get the font dict index for a glyph.
    pub fn font_dict_index(&self, glyph_id: u16) -> Option<u8> {
        match self.kind {
            FdSelectKind::Format0(array) => array.get(glyph_id),
            FdSelectKind::Format3(data) => {
                let mut r = Reader::new(data);
                let num_ranges = r.read::<u16>()?;
                if num_ranges == 0 {
                    return None;
                }

                let num_ranges = num_ranges.checked_add(1)?;

                let mut prev_first_glyph = r.read::<u16>()?;
                let mut prev_index = r.read::<u8>()?;
                for _ in 1..num_ranges {
                    let curr_first_glyph = r.read::<u16>()?;
                    if (prev_first_glyph..curr_first_glyph).contains(&glyph_id) {
                        return Some(prev_index);
                    } else {
                        prev_index = r.read::<u8>()?;
                    }

                    prev_first_glyph = curr_first_glyph;
                }

                None
            }
        }
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

/// The chosen re-encoding of the selector table.
#[derive(Debug, Clone)]
pub(crate) struct SelectorPlan {
    /// The chosen format, 0 or 3.
    pub format: u8,
    /// The serialized size of the selector section.
    pub size: usize,
    /// The remapped font dict index at the start of each run of glyphs,
    /// keyed by new glyph ID.
    pub first_glyphs: Vec<(u16, u8)>,
    /// The number of font dicts still referenced by retained glyphs.
    pub fd_count: usize,
}

/// Decide how the selector is re-encoded for the retained glyphs and build
/// the font dict remap table.
///
/// Retained glyphs assign new font dict indices in the order the old ones
/// are first seen. If every original font dict is still referenced, the
/// remap degenerates to the identity and the original selector is kept
/// verbatim, scoped to the original glyph count.
pub(crate) fn plan_subset(
    glyphs: &[u16],
    fd_select: &FdSelect,
    orig_fd_count: usize,
) -> Result<(SelectorPlan, FdRemapper)> {
    if glyphs.is_empty() {
        let plan =
            SelectorPlan { format: 0, size: 0, first_glyphs: Vec::new(), fd_count: 0 };
        return Ok((plan, FdRemapper::new()));
    }

    let mut fd_map = FdRemapper::new();
    let mut first_glyphs = Vec::new();
    let mut prev_fd = None;

    for (new_gid, &old_gid) in glyphs.iter().enumerate() {
        let fd = fd_select.font_dict_index(old_gid).ok_or(Error::InvalidFdSelect)?;
        if usize::from(fd) >= orig_fd_count {
            return Err(Error::InvalidFdSelect);
        }

        let new_fd = fd_map.remap(fd);
        if prev_fd != Some(new_fd) {
            first_glyphs.push((new_gid as u16, new_fd));
            prev_fd = Some(new_fd);
        }
    }

    let fd_count = fd_map.len();
    if fd_count == orig_fd_count {
        // Nothing was dropped, so the glyphs only get renumbered and the
        // original selector is copied as is.
        let plan = SelectorPlan {
            format: 0,
            size: fd_select.size(),
            first_glyphs,
            fd_count,
        };
        return Ok((plan, FdRemapper::identity(orig_fd_count)));
    }

    // Pick whichever encoding is smaller for this run structure.
    let size0 = 1 + glyphs.len();
    let size3 = 1 + 2 + 3 * first_glyphs.len() + 2;
    let (format, size) = if size0 < size3 { (0, size0) } else { (3, size3) };

    Ok((SelectorPlan { format, size, first_glyphs, fd_count }, fd_map))
}

/// Serialize the re-encoded selector decided by [`plan_subset`].
pub(crate) fn write_subset(
    glyphs: &[u16],
    fd_select: &FdSelect,
    fd_map: &FdRemapper,
    selector: &SelectorPlan,
    w: &mut Writer,
) -> Result<()> {
    if glyphs.is_empty() {
        return Ok(());
    }

    match selector.format {
        0 => {
            w.write::<u8>(0);
            for &old_gid in glyphs {
                let fd =
                    fd_select.font_dict_index(old_gid).ok_or(Error::WriteOverflow)?;
                let new_fd = fd_map.get(fd).ok_or(Error::WriteOverflow)?;
                w.write::<u8>(new_fd);
            }
        }
        _ => {
            w.write::<u8>(3);
            w.write::<u16>(selector.first_glyphs.len() as u16);
            for &(first_glyph, fd) in &selector.first_glyphs {
                w.write::<u16>(first_glyph);
                w.write::<u8>(fd);
            }
            // The sentinel glyph ID, one past the last retained glyph.
            w.write::<u16>(glyphs.len() as u16);
        }
    }

    Ok(())
}
