use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::types::{GlyphId, WordId};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// A struct representing a word in the word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// The word as it would appear in a grid: uppercase, NFC-normalized, without whitespace.
    pub normalized_string: String,

    /// The glyph ids making up `normalized_string`.
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The number of cells this word occupies in a grid.
    #[must_use]
    pub fn length(&self) -> usize {
        self.glyphs.len()
    }
}

/// Given a raw word from a word list file, turn it into the normalized form we'll use in the
/// actual fill engine.
#[must_use]
pub fn normalize_word(raw: &str) -> String {
    raw.to_uppercase()
        .nfc() // Normalize Unicode combining forms
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WordListError {
    #[error("Can’t read file: “{0}”")]
    InvalidPath(String),

    #[error("Word list is empty")]
    Empty,
}

/// A struct representing the vocabulary available to a fill. Words keep the order in which they
/// were first seen, and each distinct normalized string appears exactly once.
#[derive(Clone)]
pub struct WordList {
    /// A list of all characters that occur in any (normalized) word. `GlyphId`s used everywhere
    /// else are indices into this list.
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,

    /// The inverse of `glyphs`: a map from a character to the `GlyphId` representing it.
    pub glyph_id_by_char: HashMap<char, GlyphId>,

    /// All loaded words. `WordId`s are indices into this list.
    pub words: Vec<Word>,

    /// A map from a normalized string to the id of the Word representing it.
    pub word_id_by_string: HashMap<String, WordId>,

    /// Words longer than this were left out, since no slot could hold them.
    pub max_length: Option<usize>,
}

impl WordList {
    /// Construct a new `WordList` from raw entries, normalizing each one and omitting blanks,
    /// repeats and anything longer than `max_length`.
    pub fn new<I, S>(raw_words: I, max_length: Option<usize>) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut instance = WordList {
            glyphs: SmallVec::new(),
            glyph_id_by_char: HashMap::new(),
            words: vec![],
            word_id_by_string: HashMap::new(),
            max_length,
        };

        let mut skipped = 0;
        for raw_word in raw_words {
            let normalized = normalize_word(raw_word.as_ref());
            if !normalized.is_empty() && instance.add_word(&normalized).is_none() {
                skipped += 1;
            }
        }

        debug!(
            event = "word_list_loaded",
            words = instance.words.len(),
            glyphs = instance.glyphs.len(),
            skipped,
        );

        instance
    }

    /// Load a `WordList` from a file with one word per line.
    pub fn from_dict_file(
        path: &Path,
        max_length: Option<usize>,
    ) -> Result<WordList, WordListError> {
        let contents = fs::read_to_string(path)
            .map_err(|_| WordListError::InvalidPath(path.to_string_lossy().into()))?;

        Ok(WordList::new(contents.lines(), max_length))
    }

    /// Add a normalized word unless it's already present or too long; return its id if it ended up
    /// in the list.
    fn add_word(&mut self, normalized_word: &str) -> Option<WordId> {
        if let Some(&word_id) = self.word_id_by_string.get(normalized_word) {
            return Some(word_id);
        }

        // Overlong words must not intern any glyphs.
        let length = normalized_word.chars().count();
        if self.max_length.is_some_and(|max_length| length > max_length) {
            return None;
        }

        let glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]> = normalized_word
            .chars()
            .map(|c| self.glyph_id_for_char(c))
            .collect();

        let word_id = self.words.len();
        self.words.push(Word {
            normalized_string: normalized_word.to_string(),
            glyphs,
        });
        self.word_id_by_string
            .insert(normalized_word.to_string(), word_id);

        Some(word_id)
    }

    /// What's the unique glyph id for the given char? We do this lazily, instead of just mapping
    /// every letter up front, because word list entries may also contain numbers, non-English
    /// letters, or punctuation.
    pub fn glyph_id_for_char(&mut self, ch: char) -> GlyphId {
        self.glyph_id_by_char.get(&ch).copied().unwrap_or_else(|| {
            self.glyphs.push(ch);
            let id = self.glyphs.len() - 1;
            self.glyph_id_by_char.insert(ch, id);
            id
        })
    }

    /// Look up a word by value, normalizing it first.
    #[must_use]
    pub fn get_word_id(&self, word: &str) -> Option<WordId> {
        self.word_id_by_string.get(&normalize_word(word)).copied()
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.get_word_id(word).is_some()
    }

    /// Borrow an existing word, if the id belongs to this list.
    #[must_use]
    pub fn get_word(&self, word_id: WordId) -> Option<&Word> {
        self.words.get(word_id)
    }

    /// Ids of every word in the list, in list order.
    pub fn word_ids(&self) -> impl Iterator<Item = WordId> {
        0..self.words.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &self.words.len())
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}
