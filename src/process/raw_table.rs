use std::path::PathBuf;

#[derive(Debug)]
pub struct RawTable {
    /// Path the table was read from.
    pub source: PathBuf,
    /// Column names from the header record, already normalised and unique.
    pub headers: Vec<String>,
    /// Each data record, one cell per header. Missing trailing cells are `None`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cells of column `idx`, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(idx).and_then(|c| c.as_deref()))
    }
}
