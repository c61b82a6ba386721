//! Subsets a hand-built CFF2 table and decodes the result again.
//!
//! The test font has ten glyphs spread over three font dicts:
//! glyphs 0-3 use font dict 0, glyphs 4-6 font dict 1 and glyphs 7-9 font
//! dict 2. Font dict 1 owns a local subroutine index, the other two only
//! have a small private dict.

use cff2_subsetter::{subset, Error};

const FD_SELECT: [u8; 14] = [3, 0, 3, 0, 0, 0, 0, 4, 1, 0, 7, 2, 0, 10];
const VAR_STORE: [u8; 10] = [0, 8, 1, 2, 3, 4, 5, 6, 7, 8];

const PRIVATE_0: [u8; 2] = [139, 6];
// StdHW 10 plus a subroutine offset pointing right past the dict.
const PRIVATE_1: [u8; 4] = [149, 10, 143, 19];
const PRIVATE_2: [u8; 2] = [159, 11];

/// The charstring of a glyph. The contents are arbitrary bytes, only their
/// identity matters.
fn charstring(gid: u8) -> Vec<u8> {
    vec![0x40 + gid; usize::from(gid % 4) + 1]
}

/// A 5-byte integer operand.
fn int5(value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    vec![29, bytes[0], bytes[1], bytes[2], bytes[3]]
}

/// Serialize an INDEX with single-byte offsets.
fn index(items: &[&[u8]]) -> Vec<u8> {
    let mut out = (items.len() as u32).to_be_bytes().to_vec();
    if items.is_empty() {
        return out;
    }

    out.push(1);
    let mut offset = 1u8;
    out.push(offset);
    for item in items {
        offset += item.len() as u8;
        out.push(offset);
    }
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

fn build_font(with_var_store: bool) -> Vec<u8> {
    let charstrings: Vec<Vec<u8>> = (0..10).map(charstring).collect();
    let cs_refs: Vec<&[u8]> = charstrings.iter().map(|v| v.as_slice()).collect();
    let cs_index = index(&cs_refs);

    let gsubrs = index(&[&[0x0B]]);
    let subrs_1 = index(&[&[0x0E]]);
    let var_store: &[u8] = if with_var_store { &VAR_STORE } else { &[] };

    let top_size = 6 + 7 + 7 + if with_var_store { 6 } else { 0 };
    let gsubrs_off = 5 + top_size;
    let vs_off = gsubrs_off + gsubrs.len();
    let fdsel_off = vs_off + var_store.len();
    let fda_off = fdsel_off + FD_SELECT.len();
    let cs_off = fda_off + 42;
    let priv_off = cs_off + cs_index.len();

    // Each font dict references its private dict with fixed-width operands.
    let font_dict = |size: usize, offset: usize| {
        let mut dict = int5(size as u32);
        dict.extend(int5(offset as u32));
        dict.push(18);
        dict
    };
    let fd_0 = font_dict(PRIVATE_0.len(), priv_off);
    let fd_1 = font_dict(PRIVATE_1.len(), priv_off + 2);
    let fd_2 = font_dict(PRIVATE_2.len(), priv_off + 2 + 4 + subrs_1.len());
    let fda_index = index(&[&fd_0, &fd_1, &fd_2]);
    assert_eq!(fda_index.len(), 42);

    let mut data = vec![2, 0, 5];
    data.extend((top_size as u16).to_be_bytes());
    if with_var_store {
        data.extend(int5(vs_off as u32));
        data.push(24);
    }
    data.extend(int5(cs_off as u32));
    data.push(17);
    data.extend(int5(fda_off as u32));
    data.extend([12, 36]);
    data.extend(int5(fdsel_off as u32));
    data.extend([12, 37]);

    data.extend(&gsubrs);
    data.extend(var_store);
    data.extend(FD_SELECT);
    data.extend(&fda_index);
    data.extend(&cs_index);
    data.extend(PRIVATE_0);
    data.extend(PRIVATE_1);
    data.extend(&subrs_1);
    data.extend(PRIVATE_2);
    assert_eq!(data.len(), priv_off + 2 + 4 + subrs_1.len() + 2);

    data
}

/// The section offsets recorded in a table whose top dict only uses
/// 5-byte operands, which holds for the test font and for any output of
/// the subsetter.
struct Top {
    size: usize,
    char_strings: usize,
    fd_array: usize,
    fd_select: usize,
    var_store: Option<usize>,
}

fn parse_top(data: &[u8]) -> Top {
    let size = usize::from(u16::from_be_bytes([data[3], data[4]]));
    let dict = &data[5..5 + size];
    let mut top = Top {
        size,
        char_strings: 0,
        fd_array: 0,
        fd_select: 0,
        var_store: None,
    };

    let mut i = 0;
    while i < dict.len() {
        assert_eq!(dict[i], 29, "expected a 5-byte operand");
        let value =
            u32::from_be_bytes([dict[i + 1], dict[i + 2], dict[i + 3], dict[i + 4]])
                as usize;
        i += 5;
        match dict[i] {
            17 => top.char_strings = value,
            24 => top.var_store = Some(value),
            12 => {
                match dict[i + 1] {
                    36 => top.fd_array = value,
                    37 => top.fd_select = value,
                    op => panic!("unexpected operator 12 {op}"),
                }
                i += 1;
            }
            op => panic!("unexpected operator {op}"),
        }
        i += 1;
    }

    top
}

/// Decode an INDEX, returning its items and the offset past its end.
fn parse_index(data: &[u8], offset: usize) -> (Vec<Vec<u8>>, usize) {
    let count =
        u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap()) as usize;
    if count == 0 {
        return (Vec::new(), offset + 4);
    }

    let off_size = usize::from(data[offset + 4]);
    let offsets = offset + 5;
    let read_offset = |i: usize| {
        data[offsets + i * off_size..offsets + (i + 1) * off_size]
            .iter()
            .fold(0usize, |acc, &b| acc << 8 | usize::from(b))
    };

    let data_start = offsets + (count + 1) * off_size;
    let mut items = Vec::new();
    for i in 0..count {
        let start = data_start + read_offset(i) - 1;
        let end = data_start + read_offset(i + 1) - 1;
        items.push(data[start..end].to_vec());
    }

    (items, data_start + read_offset(count) - 1)
}

/// Decode a transcoded font dict into its private dict size and offset.
fn parse_font_dict(dict: &[u8]) -> (usize, usize) {
    assert_eq!(dict.len(), 9);
    assert_eq!(dict[0], 28);
    let size = usize::from(u16::from_be_bytes([dict[1], dict[2]]));
    assert_eq!(dict[3], 29);
    let offset =
        u32::from_be_bytes([dict[4], dict[5], dict[6], dict[7]]) as usize;
    assert_eq!(dict[8], 18);
    (size, offset)
}

#[test]
fn retains_selected_charstrings() {
    let font = build_font(false);
    let sub = subset(&font, &[0, 1, 5, 6, 9]).unwrap();

    let top = parse_top(&sub);
    let (items, _) = parse_index(&sub, top.char_strings);
    let expected: Vec<Vec<u8>> =
        [0, 1, 5, 6, 9].into_iter().map(charstring).collect();
    assert_eq!(items, expected);
}

#[test]
fn copies_global_subroutines() {
    let font = build_font(false);
    let sub = subset(&font, &[0, 1]).unwrap();

    let top = parse_top(&sub);
    let (items, _) = parse_index(&sub, 5 + top.size);
    assert_eq!(items, vec![vec![0x0B]]);
}

#[test]
fn keeps_selector_when_all_font_dicts_remain() {
    let font = build_font(false);
    // Glyph 9 still references font dict 2, so nothing can be dropped.
    let sub = subset(&font, &[0, 1, 5, 6, 9]).unwrap();

    let top = parse_top(&sub);
    assert_eq!(sub[top.fd_select..top.fd_select + 14], FD_SELECT);

    let (dicts, _) = parse_index(&sub, top.fd_array);
    assert_eq!(dicts.len(), 3);
}

#[test]
fn drops_unreferenced_font_dicts() {
    let font = build_font(false);
    let sub = subset(&font, &[0, 1]).unwrap();

    let top = parse_top(&sub);
    // Two glyphs on one font dict re-encode as a per-glyph array.
    assert_eq!(sub[top.fd_select..top.fd_select + 3], [0, 0, 0]);

    let (dicts, _) = parse_index(&sub, top.fd_array);
    assert_eq!(dicts.len(), 1);
    let (size, offset) = parse_font_dict(&dicts[0]);
    assert_eq!(size, 2);
    assert_eq!(sub[offset..offset + size], PRIVATE_0);
}

#[test]
fn remaps_font_dicts_in_first_seen_order() {
    let font = build_font(false);
    // Font dict 2 is seen first, so it becomes the new font dict 0.
    let sub = subset(&font, &[7, 0]).unwrap();

    let top = parse_top(&sub);
    assert_eq!(sub[top.fd_select..top.fd_select + 3], [0, 0, 1]);

    let (dicts, _) = parse_index(&sub, top.fd_array);
    assert_eq!(dicts.len(), 2);

    let (size, offset) = parse_font_dict(&dicts[0]);
    assert_eq!(sub[offset..offset + size], PRIVATE_2);
    let (size, offset) = parse_font_dict(&dicts[1]);
    assert_eq!(sub[offset..offset + size], PRIVATE_0);
}

#[test]
fn local_subroutines_follow_their_private_dict() {
    let font = build_font(false);
    let sub = subset(&font, &[5]).unwrap();

    let top = parse_top(&sub);
    let (dicts, _) = parse_index(&sub, top.fd_array);
    assert_eq!(dicts.len(), 1);

    // The subroutine offset inside the dict equals the dict's new size.
    let (size, offset) = parse_font_dict(&dicts[0]);
    assert_eq!(size, 6);
    assert_eq!(sub[offset..offset + size], [149, 10, 28, 0, 6, 19]);

    let (subrs, _) = parse_index(&sub, offset + size);
    assert_eq!(subrs, vec![vec![0x0E]]);
}

#[test]
fn empty_selection_yields_empty_indices() {
    let font = build_font(false);
    let sub = subset(&font, &[]).unwrap();

    let top = parse_top(&sub);
    // The selector section collapses to nothing.
    assert_eq!(top.fd_select, top.fd_array);

    let (dicts, _) = parse_index(&sub, top.fd_array);
    assert!(dicts.is_empty());
    let (items, end) = parse_index(&sub, top.char_strings);
    assert!(items.is_empty());

    // All private dicts are still written.
    assert_eq!(sub.len() - end, 2 + 6 + 8 + 2);
}

#[test]
fn copies_variation_store() {
    let font = build_font(true);
    let sub = subset(&font, &[0, 1, 5, 6, 9]).unwrap();

    let top = parse_top(&sub);
    let vs = top.var_store.unwrap();
    assert_eq!(sub[vs..vs + 10], VAR_STORE);
}

#[test]
fn sections_are_contiguous() {
    let font = build_font(true);
    let sub = subset(&font, &[0, 1, 5, 6, 9]).unwrap();

    let top = parse_top(&sub);
    let (_, gsubrs_end) = parse_index(&sub, 5 + top.size);
    assert_eq!(gsubrs_end, top.var_store.unwrap());
    assert_eq!(top.var_store.unwrap() + VAR_STORE.len(), top.fd_select);
    assert_eq!(top.fd_select + FD_SELECT.len(), top.fd_array);

    let (_, fda_end) = parse_index(&sub, top.fd_array);
    assert_eq!(fda_end, top.char_strings);

    // The private dict block runs to the very end of the table.
    let (_, cs_end) = parse_index(&sub, top.char_strings);
    assert_eq!(sub.len() - cs_end, 2 + 6 + 8 + 2);
}

#[test]
fn full_selection_keeps_all_content() {
    let font = build_font(false);
    let all: Vec<u16> = (0..10).collect();
    let sub = subset(&font, &all).unwrap();

    let top = parse_top(&sub);
    let (items, _) = parse_index(&sub, top.char_strings);
    assert_eq!(items, (0..10).map(charstring).collect::<Vec<_>>());
    assert_eq!(sub[top.fd_select..top.fd_select + 14], FD_SELECT);

    let (dicts, _) = parse_index(&sub, top.fd_array);
    assert_eq!(dicts.len(), 3);

    // Private dicts without subroutines survive byte for byte.
    let (size, offset) = parse_font_dict(&dicts[0]);
    assert_eq!(sub[offset..offset + size], PRIVATE_0);
    let (size, offset) = parse_font_dict(&dicts[2]);
    assert_eq!(sub[offset..offset + size], PRIVATE_2);
}

#[test]
fn rejects_selector_pointing_past_the_font_dicts() {
    let mut font = build_font(false);
    let top = parse_top(&font);
    // Point the third range at font dict 3, which does not exist.
    font[top.fd_select + 11] = 3;

    assert_eq!(subset(&font, &[9]), Err(Error::InvalidFdSelect));
    // Only retained glyphs are checked, so a selection that never touches
    // the bad range is unaffected.
    assert!(subset(&font, &[0, 1]).is_ok());
}
