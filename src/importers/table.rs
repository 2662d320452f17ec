use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// A header row plus string data rows, independent of where they came from
///
/// This is the shape a spreadsheet values API, a CSV file or a workbook sheet
/// all reduce to. Data rows are padded to the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = header.len();
        let rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self { header, rows }
    }

    /// Build from a values grid whose first row is the header
    pub fn from_values(mut values: Vec<Vec<String>>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let header = values.remove(0);
        Self::new(header, values)
    }

    /// Position of a column, matched on a case/accent-insensitive key
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = header_key(name);
        self.header.iter().position(|h| header_key(h) == wanted)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cell text at `idx`, empty when the row is short
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Lower-case, accent-free, single-spaced form used to compare header names
pub(crate) fn header_key(input: &str) -> String {
    let lower = input.trim_start_matches('\u{feff}').to_lowercase();
    let stripped: String = lower.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
