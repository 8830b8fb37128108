//! Spoken number lexicon
//!
//! Maps spelled-out number words to their values. The recognizer tends to
//! hear "to" for 2 and "for" for 4 when a user says a bare number, so those
//! homophones ship in the default table. The table is plain data and can be
//! extended from configuration without touching the parser.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const BASE_WORDS: [(&str, u32); 21] = [
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
];

const HOMOPHONES: [(&str, u32); 3] = [("to", 2), ("too", 2), ("for", 4)];

/// Word → value table for spelled-out numbers
///
/// # Example
/// ```
/// use voicenav_lib::grammar::NumberLexicon;
///
/// let lexicon = NumberLexicon::default().with_alias("ate", 8);
/// assert_eq!(lexicon.lookup("eight"), Some(8));
/// assert_eq!(lexicon.lookup("ate"), Some(8));
/// assert_eq!(lexicon.lookup("for"), Some(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumberLexicon {
    words: HashMap<String, u32>,
}

impl NumberLexicon {
    /// Create an empty lexicon
    pub fn empty() -> Self {
        Self {
            words: HashMap::new(),
        }
    }

    /// Add or replace a word mapping
    pub fn with_alias(mut self, word: impl Into<String>, value: u32) -> Self {
        self.insert(word, value);
        self
    }

    /// Add or replace a word mapping in place
    ///
    /// Words are stored lower-cased so lookups match normalized utterances.
    pub fn insert(&mut self, word: impl Into<String>, value: u32) {
        self.words.insert(word.into().to_lowercase(), value);
    }

    /// Look up a single word
    pub fn lookup(&self, word: &str) -> Option<u32> {
        self.words.get(word).copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the lexicon has no entries
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for NumberLexicon {
    fn default() -> Self {
        let words = BASE_WORDS
            .iter()
            .chain(HOMOPHONES.iter())
            .map(|(word, value)| (word.to_string(), *value))
            .collect();

        Self { words }
    }
}
