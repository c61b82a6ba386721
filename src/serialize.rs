use crate::dict::font_dict::FontDictTranscoder;
use crate::dict::private_dict::PrivateDictTranscoder;
use crate::dict::top_dict::{TopDictOffsets, TopDictTranscoder};
use crate::fd_select;
use crate::index::serialize_index;
use crate::plan::{SubsetPlan, HEADER_SIZE};
use crate::table::Table;
use crate::write::Writer;
use crate::{Error, Result};

/// Serialize the subsetted table following the plan.
///
/// Sections are written in the same canonical order the plan walked them
/// in, with a single monotonically advancing cursor. Before each section
/// the cursor is checked against the planned offset; the two passes share
/// the sizing logic, so a mismatch means a sizing bug and aborts the whole
/// operation instead of producing a corrupt table.
pub(crate) fn write_table(
    plan: &SubsetPlan,
    table: &Table,
    glyphs: &[u16],
) -> Result<Vec<u8>> {
    let mut w = Writer::with_capacity(plan.final_size);

    // Header.
    w.write::<u8>(2);
    w.write::<u8>(0);
    w.write::<u8>(HEADER_SIZE as u8);
    w.write::<u16>(plan.top_dict_size as u16);

    // Top dict, now with the final section offsets.
    expect_offset(&w, HEADER_SIZE)?;
    let offsets = TopDictOffsets {
        char_strings: plan.char_strings_offset as u32,
        fd_array: plan.fd_array_offset as u32,
        fd_select: plan.fd_select_offset.unwrap_or(0) as u32,
        var_store: plan.var_store_offset.unwrap_or(0) as u32,
    };
    TopDictTranscoder::new(table.top_dict).write(&offsets, &mut w);

    // Global subroutines.
    expect_offset(&w, plan.global_subrs_offset)?;
    w.extend(table.global_subrs.raw());

    // Variation store.
    if let (Some(offset), Some(store)) = (plan.var_store_offset, table.var_store) {
        expect_offset(&w, offset)?;
        w.extend(store);
    }

    // Selector.
    if let (Some(offset), Some(select), Some(selector)) =
        (plan.fd_select_offset, table.fd_select.as_ref(), plan.selector.as_ref())
    {
        expect_offset(&w, offset)?;
        if plan.fds_subsetted() {
            fd_select::write_subset(glyphs, select, &plan.fd_map, selector, &mut w)?;
        } else {
            w.extend(select.raw());
        }
    }

    // Font dict array, in remapped order.
    expect_offset(&w, plan.fd_array_offset)?;
    let mut font_dicts = Vec::with_capacity(plan.subst_fd_count);
    for old_fd in plan.fd_map.sorted_iter() {
        let dict = table
            .font_dicts
            .get(usize::from(old_fd))
            .ok_or(Error::WriteOverflow)?;
        let info = plan
            .private_dict_infos
            .get(usize::from(old_fd))
            .ok_or(Error::WriteOverflow)?;

        let mut dict_w = Writer::new();
        FontDictTranscoder::new(dict.raw).write(info.size, info.offset, &mut dict_w);
        font_dicts.push(dict_w.finish());
    }
    serialize_index(&font_dicts, plan.fd_array_off_size, &mut w);

    // Charstrings.
    expect_offset(&w, plan.char_strings_offset)?;
    serialize_index(&plan.retained_charstrings, plan.char_strings_off_size, &mut w);

    // Private dicts, each followed by its local subroutine index. All
    // original slots are written, including the ones whose font dict was
    // dropped from the font dict array.
    expect_offset(&w, plan.private_dicts_offset)?;
    for (dict, info) in table.font_dicts.iter().zip(&plan.private_dict_infos) {
        expect_offset(&w, info.offset)?;
        // Local subroutines sit right after their private dict, so the
        // rewritten subroutine offset is the dict's own size.
        PrivateDictTranscoder::new(dict.private_dict).write(info.size, &mut w);
        if let Some(subrs) = &dict.local_subrs {
            w.extend(subrs.raw());
        }
    }

    if w.len() != plan.final_size {
        return Err(Error::WriteOverflow);
    }

    Ok(w.finish())
}

fn expect_offset(w: &Writer, offset: usize) -> Result<()> {
    if w.len() != offset {
        return Err(Error::WriteOverflow);
    }

    Ok(())
}
