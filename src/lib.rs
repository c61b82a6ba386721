/*!
Reduces CFF2 font tables to a chosen set of glyphs.

Given the raw bytes of a CFF2 table and an ordered list of glyph IDs, this
crate produces a new table that keeps only the charstrings of those glyphs
and the font dicts, private dicts and local subroutines they still
reference. The position of a glyph ID in the list becomes its new glyph ID.

Because every cross-section reference in CFF2 is an absolute byte offset,
the table is built in two passes: a planning pass first computes the size
and position of every section of the output, then a writing pass
serializes the sections and checks that each one lands exactly where the
plan said it would.

Charstrings are copied verbatim, the table is not re-hinted or otherwise
transformed. The global subroutine index is copied in full.

# Example
```no_run
# fn main() -> Result<(), cff2_subsetter::Error> {
// Read a raw CFF2 table and keep three glyphs, remapped to IDs 0..3.
let data = std::fs::read("font.cff2").unwrap();
let sub = cff2_subsetter::subset(&data, &[0, 68, 69])?;
std::fs::write("font-sub.cff2", &sub).unwrap();
# Ok(())
# }
```
*/

#![deny(unsafe_code)]
#![deny(missing_docs)]

mod dict;
mod fd_select;
mod index;
mod number;
mod operator;
mod plan;
mod read;
mod remapper;
mod serialize;
mod table;
mod write;

use crate::plan::SubsetPlan;
use crate::table::Table;
use std::fmt::{self, Display, Formatter};

/// Subset a CFF2 table to the given glyphs.
///
/// - `data` must be the raw bytes of a CFF2 table.
/// - `glyphs` are the glyph IDs to retain, ordered and deduplicated; the
///   position of an ID defines the glyph's new ID. An empty selection is
///   legal and yields a table without any charstrings.
pub fn subset(data: &[u8], glyphs: &[u16]) -> Result<Vec<u8>> {
    let table = Table::parse(data)?;
    let plan = SubsetPlan::build(&table, glyphs)?;
    serialize::write_table(&plan, &table, glyphs)
}

/// The result type for everything.
pub type Result<T> = std::result::Result<T, Error>;

/// Subsetting failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// The data is not a well-formed CFF2 table.
    MalformedFont,
    /// The selector table references a font dict that does not exist.
    InvalidFdSelect,
    /// The written table diverged from its planned layout. This is a bug
    /// in the size computation, not a property of the font.
    WriteOverflow,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::MalformedFont => f.pad("malformed CFF2 table"),
            Self::InvalidFdSelect => f.pad("FDSelect references a nonexistent font dict"),
            Self::WriteOverflow => f.pad("subset table diverged from its planned layout"),
        }
    }
}

impl std::error::Error for Error {}
