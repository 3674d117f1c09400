//! In-memory document model
//!
//! Byte formats are handled by the host behind [`DocumentStore`]; the pipeline
//! only needs the text-bearing regions of each document.

pub mod render;
pub mod sheet;
pub mod store;
pub mod word;

use serde::{Deserialize, Serialize};

pub use render::{NoopRenderer, RenderError, Renderer};
pub use sheet::{CellRef, Workbook, Worksheet};
pub use store::{DocumentStore, JsonDocumentStore, MemoryDocumentStore};
pub use word::{Block, Cell, Paragraph, Row, Run, Section, Table, WordDocument};

/// A template or generated document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Document {
    /// Word-processor document
    Word(WordDocument),
    /// Spreadsheet document
    Sheet(Workbook),
}

impl Document {
    /// Apply `f` to every text-bearing region of the document
    pub fn visit_text_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut String) -> Result<(), E>,
    {
        match self {
            Document::Word(doc) => doc.visit_text_mut(f),
            Document::Sheet(book) => book.visit_text_mut(f),
        }
    }

    /// Word-processor content, if this is one
    pub fn as_word_mut(&mut self) -> Option<&mut WordDocument> {
        match self {
            Document::Word(doc) => Some(doc),
            Document::Sheet(_) => None,
        }
    }

    /// Spreadsheet content, if this is one
    pub fn as_sheet_mut(&mut self) -> Option<&mut Workbook> {
        match self {
            Document::Sheet(book) => Some(book),
            Document::Word(_) => None,
        }
    }
}

impl From<WordDocument> for Document {
    fn from(doc: WordDocument) -> Self {
        Document::Word(doc)
    }
}

impl From<Workbook> for Document {
    fn from(book: Workbook) -> Self {
        Document::Sheet(book)
    }
}
