//! Word-processor document model

use serde::{Deserialize, Serialize};

/// A run of text sharing one character style
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Run text
    pub text: String,
    /// Character style name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl Run {
    /// Create an unstyled run
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }
}

/// A paragraph made of runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Runs in reading order
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Create a paragraph holding a single run
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::new(text)],
        }
    }

    /// Concatenated text of every run
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Replace the paragraph text.
    ///
    /// The text goes into the first run, keeping its style; later runs are
    /// emptied so placeholders split across runs collapse into one.
    pub fn set_text(&mut self, text: String) {
        match self.runs.split_first_mut() {
            Some((first, rest)) => {
                first.text = text;
                for run in rest {
                    run.text.clear();
                }
            }
            None => self.runs.push(Run::new(text)),
        }
    }

    fn visit_text_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut String) -> Result<(), E>,
    {
        let mut text = self.text();
        let before = text.clone();
        f(&mut text)?;
        if text != before {
            self.set_text(text);
        }
        Ok(())
    }
}

/// A table cell holding nested blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell content
    pub blocks: Vec<Block>,
}

impl Cell {
    /// Create a cell holding a single paragraph
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![Block::Paragraph(Paragraph::new(text))],
        }
    }

    /// Concatenated text of every paragraph in the cell, one per line
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Cells in column order
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create a row of single-paragraph cells
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Cell::new).collect(),
        }
    }
}

/// A table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in order
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a table from rows
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Whether any paragraph of the table contains `needle`
    pub fn contains_text(&self, needle: &str) -> bool {
        self.paragraphs().any(|p| p.text().contains(needle))
    }

    /// Every paragraph of the table, nested tables included, in reading order
    pub fn paragraphs(&self) -> Box<dyn Iterator<Item = &Paragraph> + '_> {
        Box::new(
            self.rows
                .iter()
                .flat_map(|row| row.cells.iter())
                .flat_map(|cell| cell.blocks.iter())
                .flat_map(Block::paragraphs),
        )
    }

    /// Mutable access to every paragraph in reading order
    pub fn paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        let mut paragraphs = Vec::new();
        for row in &mut self.rows {
            for cell in &mut row.cells {
                for block in &mut cell.blocks {
                    block.collect_paragraphs_mut(&mut paragraphs);
                }
            }
        }
        paragraphs
    }

    /// Apply `f` to the text of every paragraph in the table
    pub fn visit_text_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut String) -> Result<(), E>,
    {
        for row in &mut self.rows {
            for cell in &mut row.cells {
                for block in &mut cell.blocks {
                    block.visit_text_mut(f)?;
                }
            }
        }
        Ok(())
    }
}

/// Body-level content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    /// A paragraph
    Paragraph(Paragraph),
    /// A table
    Table(Table),
}

impl Block {
    /// Shorthand for a single-run paragraph block
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(Paragraph::new(text))
    }

    /// Text of the block; tables join their paragraphs with newlines
    pub fn text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.text(),
            Block::Table(t) => t.paragraphs().map(Paragraph::text).collect::<Vec<_>>().join("\n"),
        }
    }

    fn paragraphs(&self) -> Box<dyn Iterator<Item = &Paragraph> + '_> {
        match self {
            Block::Paragraph(p) => Box::new(std::iter::once(p)),
            Block::Table(t) => t.paragraphs(),
        }
    }

    fn collect_paragraphs_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Paragraph>) {
        match self {
            Block::Paragraph(p) => out.push(p),
            Block::Table(t) => {
                for row in &mut t.rows {
                    for cell in &mut row.cells {
                        for block in &mut cell.blocks {
                            block.collect_paragraphs_mut(out);
                        }
                    }
                }
            }
        }
    }

    fn visit_text_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut String) -> Result<(), E>,
    {
        match self {
            Block::Paragraph(p) => p.visit_text_mut(f),
            Block::Table(t) => t.visit_text_mut(f),
        }
    }
}

/// Page section with its header and footer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Header content
    #[serde(default)]
    pub header: Vec<Block>,
    /// Footer content
    #[serde(default)]
    pub footer: Vec<Block>,
}

/// A word-processor document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDocument {
    /// Body content
    pub body: Vec<Block>,
    /// Sections
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl WordDocument {
    /// Create a document from body blocks
    pub fn new(body: Vec<Block>) -> Self {
        Self {
            body,
            sections: Vec::new(),
        }
    }

    /// Add a section
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Top-level tables of the body
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    /// Body position of the first top-level table containing `needle`
    pub fn find_table(&self, needle: &str) -> Option<usize> {
        self.body
            .iter()
            .position(|block| matches!(block, Block::Table(t) if t.contains_text(needle)))
    }

    /// Top-level table at a body position
    pub fn table_mut(&mut self, position: usize) -> Option<&mut Table> {
        match self.body.get_mut(position) {
            Some(Block::Table(t)) => Some(t),
            _ => None,
        }
    }

    /// Whole document text, body first then headers and footers
    pub fn text(&self) -> String {
        let body = self.body.iter().map(Block::text);
        let sections = self
            .sections
            .iter()
            .flat_map(|s| s.header.iter().chain(s.footer.iter()))
            .map(Block::text);
        body.chain(sections).collect::<Vec<_>>().join("\n")
    }

    /// Apply `f` to every text-bearing region, headers and footers included
    pub fn visit_text_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut String) -> Result<(), E>,
    {
        for block in &mut self.body {
            block.visit_text_mut(f)?;
        }
        for section in &mut self.sections {
            for block in section.header.iter_mut().chain(section.footer.iter_mut()) {
                block.visit_text_mut(f)?;
            }
        }
        Ok(())
    }

    /// Fill a guarantor address table.
    ///
    /// In the first table containing `placeholder`, each occurrence is replaced
    /// in order by the next entry of `values` (empty once they run out). Rows
    /// past `row_height * (max(1, values.len()) + 1)` are removed. Returns
    /// `false` when no table contains the placeholder.
    pub fn fill_repeating_table(
        &mut self,
        placeholder: &str,
        values: &[String],
        row_height: usize,
    ) -> bool {
        let Some(position) = self.find_table(placeholder) else {
            return false;
        };
        let Some(table) = self.table_mut(position) else {
            return false;
        };

        let mut remaining = values.iter();
        for paragraph in table.paragraphs_mut() {
            let text = paragraph.text();
            if !text.contains(placeholder) {
                continue;
            }
            let mut filled = String::with_capacity(text.len());
            let mut rest = text.as_str();
            while let Some(at) = rest.find(placeholder) {
                filled.push_str(&rest[..at]);
                if let Some(value) = remaining.next() {
                    filled.push_str(value);
                }
                rest = &rest[at + placeholder.len()..];
            }
            filled.push_str(rest);
            paragraph.set_text(filled);
        }

        let keep = row_height * (values.len().max(1) + 1);
        table.rows.truncate(keep);
        true
    }

    /// Insert `copies` duplicates of the table at `position` directly after it
    pub fn duplicate_table(&mut self, position: usize, copies: usize) -> bool {
        let Some(Block::Table(table)) = self.body.get(position) else {
            return false;
        };
        let table = table.clone();
        for offset in 1..=copies {
            self.body
                .insert(position + offset, Block::Table(table.clone()));
        }
        true
    }

    /// Body positions of every top-level table containing `needle`
    pub fn table_positions(&self, needle: &str) -> Vec<usize> {
        self.body
            .iter()
            .enumerate()
            .filter(|(_, block)| matches!(block, Block::Table(t) if t.contains_text(needle)))
            .map(|(i, _)| i)
            .collect()
    }
}
