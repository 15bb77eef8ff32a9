/// An identifier for a given letter or symbol, based on its index in the `WordList`'s `glyphs`
/// field.
pub type GlyphId = usize;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field. Words are
/// de-duplicated on load, so two ids are equal exactly when the words they name are equal.
pub type WordId = usize;

/// An identifier for a given slot, based on its index in the `GridConfig`'s `slot_configs` field.
/// This index is also the fixed order in which slots are enumerated during search.
pub type SlotId = usize;
