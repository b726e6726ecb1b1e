//! Character vocabularies for CTC models.

use crate::core::{OCRError, OcrResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where the CTC blank symbol sits in the model's output classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankPosition {
    /// Class 0 is blank, characters follow.
    First,
    /// Characters come first, the last class is blank.
    #[default]
    Last,
}

/// Maps model output classes to characters.
///
/// One class is reserved for the blank symbol; every other class maps to exactly one
/// character. The vocabulary is fixed once the predictor is built and shared between
/// calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    characters: Vec<char>,
    blank: BlankPosition,
    index: HashMap<char, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from its characters, in class order, without the blank.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no characters are given.
    pub fn new(characters: impl IntoIterator<Item = char>, blank: BlankPosition) -> OcrResult<Self> {
        let characters: Vec<char> = characters.into_iter().collect();
        if characters.is_empty() {
            return Err(OCRError::config_error(
                "vocabulary must contain at least one character",
            ));
        }

        let offset = match blank {
            BlankPosition::First => 1,
            BlankPosition::Last => 0,
        };
        let mut index = HashMap::with_capacity(characters.len());
        for (i, &c) in characters.iter().enumerate() {
            // Keep the first class when a dictionary lists a character twice.
            index.entry(c).or_insert(i + offset);
        }

        Ok(Self {
            characters,
            blank,
            index,
        })
    }

    /// Builds a vocabulary from dictionary lines holding one character each.
    ///
    /// Empty lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a line with more than one character.
    pub fn from_lines(lines: &[String], blank: BlankPosition) -> OcrResult<Self> {
        let mut characters = Vec::with_capacity(lines.len());
        for (number, line) in lines.iter().enumerate() {
            let mut chars = line.chars();
            let Some(c) = chars.next() else {
                continue;
            };
            if chars.next().is_some() {
                return Err(OCRError::config_error(format!(
                    "dictionary line {} holds {:?}, expected a single character",
                    number + 1,
                    line
                )));
            }
            characters.push(c);
        }
        Self::new(characters, blank)
    }

    /// Number of model classes, blank included.
    pub fn len(&self) -> usize {
        self.characters.len() + 1
    }

    /// A vocabulary always holds the blank class.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn blank_position(&self) -> BlankPosition {
        self.blank
    }

    /// Class index of the blank symbol.
    pub fn blank_index(&self) -> usize {
        match self.blank {
            BlankPosition::First => 0,
            BlankPosition::Last => self.characters.len(),
        }
    }

    /// Character for a class, or `None` for the blank and out-of-range classes.
    pub fn symbol(&self, class: usize) -> Option<char> {
        match self.blank {
            BlankPosition::First => class.checked_sub(1).and_then(|i| self.characters.get(i)),
            BlankPosition::Last => self.characters.get(class),
        }
        .copied()
    }

    /// Class index of a character.
    pub fn class_of(&self, c: char) -> Option<usize> {
        self.index.get(&c).copied()
    }

    /// Characters in class order, blank excluded.
    pub fn characters(&self) -> &[char] {
        &self.characters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_last_mapping() {
        let vocab = Vocabulary::new("ab".chars(), BlankPosition::Last).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.blank_index(), 2);
        assert_eq!(vocab.symbol(0), Some('a'));
        assert_eq!(vocab.symbol(1), Some('b'));
        assert_eq!(vocab.symbol(2), None);
        assert_eq!(vocab.class_of('b'), Some(1));
    }

    #[test]
    fn test_blank_first_mapping() {
        let vocab = Vocabulary::new("ab".chars(), BlankPosition::First).unwrap();
        assert_eq!(vocab.blank_index(), 0);
        assert_eq!(vocab.symbol(0), None);
        assert_eq!(vocab.symbol(1), Some('a'));
        assert_eq!(vocab.symbol(3), None);
        assert_eq!(vocab.class_of('a'), Some(1));
    }

    #[test]
    fn test_from_lines_skips_empty_lines() {
        let lines = vec!["a".to_string(), String::new(), " ".to_string(), "b".to_string()];
        let vocab = Vocabulary::from_lines(&lines, BlankPosition::First).unwrap();
        assert_eq!(vocab.characters(), &['a', ' ', 'b']);
    }

    #[test]
    fn test_multi_character_line_is_config_error() {
        let lines = vec!["a".to_string(), "bc".to_string()];
        let err = Vocabulary::from_lines(&lines, BlankPosition::Last).unwrap_err();
        assert_eq!(err.category(), crate::core::ErrorCategory::Config);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_empty_vocabulary_is_rejected() {
        assert!(Vocabulary::new(std::iter::empty(), BlankPosition::Last).is_err());
    }

    #[test]
    fn test_duplicate_characters_keep_first_class() {
        let vocab = Vocabulary::new("aba".chars(), BlankPosition::Last).unwrap();
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.class_of('a'), Some(0));
    }
}
