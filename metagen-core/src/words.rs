//! Nomenclature: multi-word names manipulated as word lists.
//!
//! Every named entity in the model carries a [`Name`]: an ordered,
//! non-empty sequence of lowercase word tokens. Downstream calculators
//! rewrite words independently (casing, joining, pluralization), so
//! names are never manipulated as flat strings.

use std::fmt::{self, Display};
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use serde::Deserialize;

/// An ordered, non-empty list of lowercase word tokens.
///
/// Two names are equal iff their word lists are equal token-wise.
/// The [`Display`] rendering joins the words with underscores, which
/// is also the wire (tag) form, so `Name::parse` round-trips it.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "String")]
pub struct Name {
    words: Vec<String>,
}

impl Name {
    /// Parses a source identifier into a name.
    ///
    /// Splits on camel-case and underscore boundaries, lowercases each
    /// token, and rejects inputs that yield no tokens.
    ///
    /// # Examples
    ///
    /// ```
    /// # use metagen_core::words::Name;
    /// let name = Name::parse("IdentityProvider").unwrap();
    /// assert_eq!(name.words(), ["identity", "provider"]);
    /// assert_eq!(Name::parse("identity_provider").unwrap(), name);
    /// assert!(Name::parse("___").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, NameError> {
        let words: Vec<String> = WordSegments::new(input)
            .map(|word| word.to_lowercase())
            .collect();
        if words.is_empty() {
            return Err(NameError::Empty {
                input: input.to_owned(),
            });
        }
        Ok(Self { words })
    }

    /// Builds a name from known-good word tokens.
    ///
    /// Intended for the fixed vocabulary used by emitters (`type`,
    /// `list`, `metadata`, …). Tokens are normalized through the same
    /// segmentation as [`Name::parse`].
    ///
    /// # Panics
    ///
    /// Panics if the tokens yield an empty name. That is a programming
    /// error, not a model error.
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let words: Vec<String> = words
            .into_iter()
            .flat_map(WordSegments::new)
            .map(|word| word.to_lowercase())
            .collect();
        assert!(!words.is_empty(), "a name needs at least one word");
        Self { words }
    }

    /// Builds a single-word name.
    pub fn word(word: &str) -> Self {
        Self::from_words([word])
    }

    /// Returns the word tokens of this name, in order.
    #[inline]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Concatenates this name with another, preserving word order.
    ///
    /// ```
    /// # use metagen_core::words::Name;
    /// let cluster = Name::word("cluster");
    /// let list = cluster.cat(&Name::word("list"));
    /// assert_eq!(list.words(), ["cluster", "list"]);
    /// ```
    pub fn cat(&self, other: &Name) -> Name {
        let mut words = self.words.clone();
        words.extend(other.words.iter().cloned());
        Name { words }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = self.words.iter();
        if let Some(first) = words.next() {
            f.write_str(first)?;
        }
        for word in words {
            write!(f, "_{word}")?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum NameError {
    #[error("`{input}` doesn't contain any words")]
    Empty { input: String },
}

/// Segments a string into words, detecting word boundaries for
/// case transformation.
///
/// Word boundaries occur on:
///
/// * Non-alphanumeric characters: underscores, hyphens, etc.
/// * Lowercase-to-uppercase transitions (`httpResponse`).
/// * Uppercase-to-lowercase after an uppercase run (`XMLHttp`).
/// * Digit-to-letter transitions (`1099KStatus`, `250g`).
///
/// The digit-to-letter rule is stricter than Heck's segmentation, so
/// that names like `1099KStatus` and `1099_K_Status` produce the same
/// word list.
pub struct WordSegments<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current_word_starts_at: Option<usize>,
    mode: WordMode,
}

impl<'a> WordSegments<'a> {
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            current_word_starts_at: None,
            mode: WordMode::Boundary,
        }
    }
}

impl<'a> Iterator for WordSegments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, c)) = self.chars.next() {
            if c.is_uppercase() {
                match self.mode {
                    WordMode::Boundary | WordMode::Lowercase => {
                        // Start a new word with this uppercase character.
                        let start = self.current_word_starts_at.replace(index);
                        self.mode = WordMode::Uppercase;
                        if let Some(start) = start {
                            return Some(&self.input[start..index]);
                        }
                    }
                    WordMode::Uppercase => {
                        let next_is_lowercase = self
                            .chars
                            .peek()
                            .map(|&(_, next)| next.is_lowercase())
                            .unwrap_or(false);
                        if next_is_lowercase
                            && let Some(start) = self.current_word_starts_at
                        {
                            // `XMLHttp` case; the "H" starts a new word.
                            self.current_word_starts_at = Some(index);
                            return Some(&self.input[start..index]);
                        }
                    }
                }
            } else if c.is_lowercase() {
                match self.mode {
                    WordMode::Boundary => {
                        let start = self.current_word_starts_at.replace(index);
                        self.mode = WordMode::Lowercase;
                        if let Some(start) = start {
                            return Some(&self.input[start..index]);
                        }
                    }
                    WordMode::Lowercase | WordMode::Uppercase => {
                        if self.current_word_starts_at.is_none() {
                            self.current_word_starts_at = Some(index);
                        }
                        self.mode = WordMode::Lowercase;
                    }
                }
            } else if !c.is_alphanumeric() {
                // Start a new word at this non-alphanumeric character.
                let start = std::mem::take(&mut self.current_word_starts_at);
                self.mode = WordMode::Boundary;
                if let Some(start) = start {
                    return Some(&self.input[start..index]);
                }
            } else {
                // Digit: continue the current word.
                if self.current_word_starts_at.is_none() {
                    self.current_word_starts_at = Some(index);
                }
            }
        }
        if let Some(start) = std::mem::take(&mut self.current_word_starts_at) {
            // Trailing word.
            return Some(&self.input[start..]);
        }
        None
    }
}

/// The current state of a [`WordSegments`] iterator.
#[derive(Clone, Copy)]
enum WordMode {
    /// At a word boundary: either at the start of the input, or after
    /// a non-alphanumeric character.
    Boundary,
    /// Currently in a lowercase segment.
    Lowercase,
    /// Currently in an uppercase segment.
    Uppercase,
}

#[cfg(test)]
mod tests {
    use super::*;

    use itertools::Itertools;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_segment_camel_and_pascal_case() {
        assert_eq!(
            WordSegments::new("identityProvider").collect_vec(),
            vec!["identity", "Provider"]
        );
        assert_eq!(
            WordSegments::new("IdentityProvider").collect_vec(),
            vec!["Identity", "Provider"]
        );
    }

    #[test]
    fn test_segment_underscores() {
        assert_eq!(
            WordSegments::new("identity_provider").collect_vec(),
            vec!["identity", "provider"]
        );
        assert_eq!(
            WordSegments::new("identity__provider").collect_vec(),
            vec!["identity", "provider"]
        );
    }

    #[test]
    fn test_segment_uppercase_runs() {
        assert_eq!(
            WordSegments::new("XMLHttpRequest").collect_vec(),
            vec!["XML", "Http", "Request"]
        );
        assert_eq!(
            WordSegments::new("HTTPResponse").collect_vec(),
            vec!["HTTP", "Response"]
        );
    }

    #[test]
    fn test_segment_digits() {
        assert_eq!(
            WordSegments::new("Response2").collect_vec(),
            vec!["Response2"]
        );
        assert_eq!(WordSegments::new("250g").collect_vec(), vec!["250", "g"]);
        assert_eq!(
            WordSegments::new("1099KStatus").collect_vec(),
            vec!["1099", "K", "Status"]
        );
    }

    #[test]
    fn test_parse_lowercases() {
        let name = Name::parse("XMLHttpRequest").unwrap();
        assert_eq!(name.words(), ["xml", "http", "request"]);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(Name::parse(""), Err(NameError::Empty { .. })));
        assert!(matches!(Name::parse("_-_"), Err(NameError::Empty { .. })));
    }

    #[test]
    fn test_equality_is_token_wise() {
        let a = Name::parse("identityProvider").unwrap();
        let b = Name::parse("identity_provider").unwrap();
        let c = Name::parse("identityproviders").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for input in ["cluster", "identity_provider", "awsNodePool"] {
            let name = Name::parse(input).unwrap();
            assert_eq!(Name::parse(&name.to_string()).unwrap(), name);
        }
    }

    #[test]
    fn test_cat() {
        let name = Name::word("cluster").cat(&Name::word("list"));
        assert_eq!(name.to_string(), "cluster_list");
    }

    #[test]
    fn test_from_words_normalizes() {
        let name = Name::from_words(["serverVersion"]);
        assert_eq!(name.words(), ["server", "version"]);
    }

    #[test]
    fn test_deserialize_from_string() {
        let name: Name = serde_json::from_str(r#""identity_provider""#).unwrap();
        assert_eq!(name.words(), ["identity", "provider"]);
        assert!(serde_json::from_str::<Name>(r#""""#).is_err());
    }
}
