//! Placeholder substitution engine

use formsmith_config::BusinessConfig;
use tracing::debug;

use crate::document::Document;
use crate::error::{GenerationError, Result};
use crate::keywords::KeywordSource;
use crate::templates::format::format_value;
use crate::templates::syntax::PlaceholderSyntax;

/// Replacements allowed per text before substitution is considered runaway
pub const MAX_REPLACEMENTS: usize = 20;

/// Rewrites placeholders in text from a keyword source.
///
/// Each pass replaces the first placeholder and rescans the updated text, so
/// keyword values may themselves contain placeholders. At most
/// [`MAX_REPLACEMENTS`] replacements are made per text; a placeholder still
/// present after that is a [`GenerationError::RunawayExpansion`].
#[derive(Debug, Clone)]
pub struct SubstitutionEngine {
    syntax: PlaceholderSyntax,
    max_replacements: usize,
}

impl Default for SubstitutionEngine {
    fn default() -> Self {
        Self::new(PlaceholderSyntax::default())
    }
}

impl SubstitutionEngine {
    /// Create an engine for a placeholder syntax
    pub fn new(syntax: PlaceholderSyntax) -> Self {
        Self {
            syntax,
            max_replacements: MAX_REPLACEMENTS,
        }
    }

    /// Create an engine with the host's placeholder glyphs
    pub fn from_config(business: &BusinessConfig) -> Result<Self> {
        Ok(Self::new(PlaceholderSyntax::from_config(business)?))
    }

    /// Override the replacement bound
    pub fn with_max_replacements(mut self, max_replacements: usize) -> Self {
        self.max_replacements = max_replacements;
        self
    }

    /// Placeholder syntax in use
    pub fn syntax(&self) -> &PlaceholderSyntax {
        &self.syntax
    }

    /// Substitute every placeholder in `text`.
    ///
    /// Missing keywords become empty strings. `origin` names the document in
    /// diagnostics.
    pub fn substitute(
        &self,
        text: &str,
        keywords: &dyn KeywordSource,
        origin: &str,
    ) -> Result<String> {
        let mut text = text.to_string();
        let mut replacements = 0;

        while let Some(found) = self.syntax.find(&text) {
            if replacements >= self.max_replacements {
                return Err(GenerationError::RunawayExpansion {
                    iterations: replacements,
                    origin: origin.to_string(),
                });
            }

            let formatted = match keywords.lookup(&found.key) {
                Some(value) => format_value(&found.key, value, found.format.as_deref())?,
                None => {
                    debug!("Unresolved keyword {:?} in {}", found.key, origin);
                    String::new()
                }
            };
            text.replace_range(found.range, &formatted);
            replacements += 1;
        }

        Ok(text)
    }

    /// Substitute every text-bearing region of a document in place
    pub fn substitute_document(
        &self,
        document: &mut Document,
        keywords: &dyn KeywordSource,
        origin: &str,
    ) -> Result<()> {
        document.visit_text_mut(&mut |text: &mut String| -> Result<()> {
            if self.syntax.contains(text) {
                *text = self.substitute(text, keywords, origin)?;
            }
            Ok(())
        })
    }
}
