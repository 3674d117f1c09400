//! Spreadsheet document model

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::models::Value;

/// 1-based cell coordinate, ordered row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    /// Row number, starting at 1
    pub row: u32,
    /// Column number, starting at 1
    pub column: u32,
}

impl CellRef {
    /// Create a coordinate
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.column), self.row)
    }
}

impl FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| format!("Invalid cell reference {:?}", s))?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(format!("Invalid cell reference {:?}", s));
        }
        let column = letters
            .bytes()
            .try_fold(0u32, |acc, b| {
                acc.checked_mul(26)?.checked_add(u32::from(b - b'A' + 1))
            })
            .ok_or_else(|| format!("Cell reference {:?} is out of range", s))?;
        let row = digits
            .parse::<u32>()
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| format!("Invalid cell reference {:?}", s))?;
        Ok(Self { row, column })
    }
}

impl Serialize for CellRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// One worksheet with sparse cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    /// Sheet name
    pub name: String,
    /// Non-empty cells
    #[serde(default)]
    pub cells: BTreeMap<CellRef, Value>,
    /// Header and footer slots by name (for example `odd_header`)
    #[serde(default)]
    pub header_footer: BTreeMap<String, String>,
}

impl Worksheet {
    /// Create an empty sheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Value at a coordinate
    pub fn get(&self, row: u32, column: u32) -> Option<&Value> {
        self.cells.get(&CellRef::new(row, column))
    }

    /// Set or clear a cell
    pub fn set(&mut self, row: u32, column: u32, value: Option<Value>) {
        let at = CellRef::new(row, column);
        match value {
            Some(value) => {
                self.cells.insert(at, value);
            }
            None => {
                self.cells.remove(&at);
            }
        }
    }

    /// Builder form of [`Worksheet::set`]
    pub fn with_cell(mut self, row: u32, column: u32, value: impl Into<Value>) -> Self {
        self.set(row, column, Some(value.into()));
        self
    }

    fn visit_text_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut String) -> Result<(), E>,
    {
        for value in self.cells.values_mut() {
            if let Value::Text(text) = value {
                f(text)?;
            }
        }
        for slot in self.header_footer.values_mut() {
            f(slot)?;
        }
        Ok(())
    }
}

/// A spreadsheet document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    /// Worksheets in tab order
    pub sheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create a workbook from sheets
    pub fn new(sheets: Vec<Worksheet>) -> Self {
        Self { sheets }
    }

    /// Sheet with the given name, falling back to the first sheet
    pub fn sheet_or_first_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        match self.sheets.iter().position(|s| s.name == name) {
            Some(i) => self.sheets.get_mut(i),
            None => self.sheets.first_mut(),
        }
    }

    /// Apply `f` to every text cell and header/footer slot
    pub fn visit_text_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut String) -> Result<(), E>,
    {
        for sheet in &mut self.sheets {
            sheet.visit_text_mut(f)?;
        }
        Ok(())
    }
}
