//! Voice command grammar
//!
//! Turns one recognized utterance into exactly one typed [`Command`].
//! The parser is a pure string-to-command function; it knows nothing about
//! the list being navigated, so bounds checks live in the recognition manager.

/// Spoken number lexicon
pub mod lexicon;

/// Utterance parser and phrase tables
pub mod parser;

pub use lexicon::NumberLexicon;
pub use parser::{normalize, parse_command, Command, CommandParser, GrammarConfig};
