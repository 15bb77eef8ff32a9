use smallvec::SmallVec;

use crate::types::WordId;
use crate::word_list::WordList;
use crate::MAX_GLYPH_COUNT;

/// Number of occurrences of each glyph at a single cell index across a set of words, indexed by
/// `GlyphId`.
pub type GlyphCounts = SmallVec<[u32; MAX_GLYPH_COUNT]>;

/// Count how many of the given words carry each glyph at `cell_idx`. Words too short to have that
/// cell don't contribute anything.
#[must_use]
pub fn build_glyph_counts_for_cell(
    word_list: &WordList,
    options: &[WordId],
    cell_idx: usize,
) -> GlyphCounts {
    let mut result: GlyphCounts = (0..word_list.glyphs.len()).map(|_| 0).collect();

    for &word_id in options {
        if let Some(&glyph) = word_list.words[word_id].glyphs.get(cell_idx) {
            result[glyph] += 1;
        }
    }

    result
}
