//! Placeholder syntax

use std::ops::Range;

use formsmith_config::BusinessConfig;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{GenerationError, Result};

/// Default quote glyph
pub const DEFAULT_QUOTE: char = '§';
/// Default format separator glyph
pub const DEFAULT_SEPARATOR: char = '‡';

static DEFAULT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&pattern_for(DEFAULT_QUOTE, DEFAULT_SEPARATOR)).expect("valid regex"));

fn pattern_for(quote: char, separator: char) -> String {
    let q = regex::escape(&quote.to_string());
    let s = regex::escape(&separator.to_string());
    format!("{q}(.+?)(?:{s}(.+?))?{q}")
}

/// One placeholder found in a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMatch {
    /// Byte range of the whole placeholder, glyphs included
    pub range: Range<usize>,
    /// Keyword name
    pub key: String,
    /// Format specifier, if any
    pub format: Option<String>,
}

/// `§key§` / `§key‡format§` placeholders with configurable glyphs
#[derive(Debug, Clone)]
pub struct PlaceholderSyntax {
    quote: char,
    separator: char,
    pattern: Regex,
}

impl Default for PlaceholderSyntax {
    fn default() -> Self {
        Self {
            quote: DEFAULT_QUOTE,
            separator: DEFAULT_SEPARATOR,
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl PlaceholderSyntax {
    /// Build a syntax from two distinct glyphs
    pub fn new(quote: char, separator: char) -> Result<Self> {
        if quote == separator {
            return Err(GenerationError::Validation(format!(
                "Placeholder quote and format separator must differ, both are {:?}",
                quote
            )));
        }
        let pattern = Regex::new(&pattern_for(quote, separator))
            .map_err(|e| GenerationError::Validation(e.to_string()))?;
        Ok(Self {
            quote,
            separator,
            pattern,
        })
    }

    /// Build the syntax configured for the host
    pub fn from_config(business: &BusinessConfig) -> Result<Self> {
        Self::new(business.placeholder_quote, business.format_separator)
    }

    /// Quote glyph
    pub fn quote(&self) -> char {
        self.quote
    }

    /// Format separator glyph
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Literal placeholder text for `key` without a format
    pub fn placeholder(&self, key: &str) -> String {
        format!("{}{}{}", self.quote, key, self.quote)
    }

    /// First placeholder in `text`
    pub fn find(&self, text: &str) -> Option<PlaceholderMatch> {
        let captures = self.pattern.captures(text)?;
        let whole = captures.get(0)?;
        let key = captures.get(1)?;
        Some(PlaceholderMatch {
            range: whole.range(),
            key: key.as_str().to_string(),
            format: captures.get(2).map(|m| m.as_str().to_string()),
        })
    }

    /// Whether `text` contains any placeholder
    pub fn contains(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Keyword names of every placeholder in `text`, in order
    pub fn keys<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pattern
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
    }
}
