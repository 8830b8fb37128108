//! Utterance → command parsing
//!
//! Rules are tried in a fixed order and the first match wins:
//! 1. a "next" phrase → [`Command::NextItem`]
//! 2. a "previous" phrase → [`Command::PreviousItem`]
//! 3. a select directive followed by a number → [`Command::SelectItem`]
//! 4. anything else → [`Command::Unrecognized`]
//!
//! Users speak 1-based positions ("open three"); commands carry 0-based
//! indices. No bounds checking happens here.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::lexicon::NumberLexicon;

/// Application-level instruction produced from one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Move to the next item
    NextItem,

    /// Move to the previous item
    PreviousItem,

    /// Jump to an explicit item
    ///
    /// `index` is 0-based. "open zero" yields `-1`, which callers must treat
    /// as out of range.
    SelectItem { index: i64 },

    /// Nothing in the utterance matched a rule
    Unrecognized,
}

impl Command {
    /// Whether the utterance mapped to an actual instruction
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::NextItem => "NextItem",
            Self::PreviousItem => "PreviousItem",
            Self::SelectItem { .. } => "SelectItem",
            Self::Unrecognized => "Unrecognized",
        }
    }
}

/// Phrase tables and number lexicon used by [`CommandParser`]
///
/// Phrases match whole words; a multi-word phrase such as `"go to"` must
/// appear as consecutive words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Phrases that move forward
    pub next_phrases: Vec<String>,

    /// Phrases that move backward
    pub previous_phrases: Vec<String>,

    /// Directives that introduce an explicit item number
    pub select_phrases: Vec<String>,

    /// Spelled-out number words
    pub lexicon: NumberLexicon,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            next_phrases: vec!["next".to_string(), "forward".to_string()],
            previous_phrases: vec![
                "previous".to_string(),
                "prev".to_string(),
                "back".to_string(),
            ],
            select_phrases: vec![
                "open".to_string(),
                "select".to_string(),
                "show".to_string(),
                "choose".to_string(),
                "go to".to_string(),
            ],
            lexicon: NumberLexicon::default(),
        }
    }
}

type Phrase = Vec<String>;

/// Compiled grammar
///
/// # Example
/// ```
/// use voicenav_lib::grammar::{Command, CommandParser};
///
/// let parser = CommandParser::default();
/// assert_eq!(parser.parse("next order"), Command::NextItem);
/// assert_eq!(parser.parse("open 3"), Command::SelectItem { index: 2 });
/// assert_eq!(parser.parse("open for"), Command::SelectItem { index: 3 });
/// assert_eq!(parser.parse("what time is it"), Command::Unrecognized);
/// ```
#[derive(Debug, Clone)]
pub struct CommandParser {
    next: Vec<Phrase>,
    previous: Vec<Phrase>,
    select: Vec<Phrase>,
    lexicon: NumberLexicon,
}

impl CommandParser {
    /// Compile a grammar
    pub fn new(grammar: &GrammarConfig) -> Self {
        Self {
            next: compile(&grammar.next_phrases),
            previous: compile(&grammar.previous_phrases),
            select: compile(&grammar.select_phrases),
            lexicon: grammar.lexicon.clone(),
        }
    }

    /// Parse one normalized utterance
    ///
    /// Never fails; anything that does not match yields
    /// [`Command::Unrecognized`].
    pub fn parse(&self, utterance: &str) -> Command {
        let words = tokenize(utterance);

        if find_phrase(&words, &self.next).is_some() {
            return Command::NextItem;
        }

        if find_phrase(&words, &self.previous).is_some() {
            return Command::PreviousItem;
        }

        if let Some(end) = find_phrase(&words, &self.select) {
            return match self.extract_number(&words[end..]) {
                Some(number) => Command::SelectItem { index: number - 1 },
                None => Command::Unrecognized,
            };
        }

        Command::Unrecognized
    }

    /// Digits win over words; both scan the remainder left to right.
    fn extract_number(&self, rest: &[String]) -> Option<i64> {
        rest.iter()
            .find_map(|word| digit_run(word))
            .or_else(|| {
                rest.iter()
                    .find_map(|word| self.lexicon.lookup(word).map(i64::from))
            })
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(&GrammarConfig::default())
    }
}

/// Lower-case and trim raw recognizer output
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parse with the default grammar
pub fn parse_command(utterance: &str) -> Command {
    static DEFAULT_PARSER: OnceLock<CommandParser> = OnceLock::new();
    DEFAULT_PARSER
        .get_or_init(CommandParser::default)
        .parse(utterance)
}

fn compile(phrases: &[String]) -> Vec<Phrase> {
    phrases
        .iter()
        .map(|phrase| tokenize(phrase))
        .filter(|words| !words.is_empty())
        .collect()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Returns the word index just past the earliest phrase occurrence.
fn find_phrase(words: &[String], phrases: &[Phrase]) -> Option<usize> {
    (0..words.len()).find_map(|start| {
        phrases
            .iter()
            .find(|phrase| {
                start + phrase.len() <= words.len()
                    && words[start..start + phrase.len()] == phrase[..]
            })
            .map(|phrase| start + phrase.len())
    })
}

/// First run of ASCII digits in a word ("#12" → 12, "3rd" → 3).
///
/// Runs too long for `i64` saturate so they still read as out of range.
fn digit_run(word: &str) -> Option<i64> {
    let start = word.find(|c: char| c.is_ascii_digit())?;
    let run: String = word[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    Some(run.parse::<i64>().unwrap_or(i64::MAX))
}
