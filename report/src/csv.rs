use crate::table::ReportTable;
use common::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CSV_FILENAME: &str = "Enabled_Users_Report.csv";
pub const CSV_MIME: &str = "text/csv";

const DELIMITER: &str = ",";
const LINE_SEPARATOR: &str = "\n";

/// Header line plus one line per row, comma-joined.
///
/// Cells are written verbatim: a value containing a comma or newline shifts
/// the columns of its line. Downstream consumers rely on this exact layout.
pub fn to_delimited_text(table: &ReportTable) -> Result<String> {
    if table.is_empty() {
        return Err(Error::NothingToReport);
    }

    let header = table.headers().join(DELIMITER);
    let lines = table.rows().iter().map(|row| row.cells().join(DELIMITER));

    Ok(std::iter::once(header)
        .chain(lines)
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR))
}

/// A downloadable CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub content: String,
}

impl CsvArtifact {
    pub fn from_table(table: &ReportTable) -> Result<Self> {
        Self::with_filename(table, CSV_FILENAME)
    }

    pub fn with_filename(table: &ReportTable, filename: &str) -> Result<Self> {
        Ok(Self {
            filename: filename.to_string(),
            mime: CSV_MIME,
            content: to_delimited_text(table)?,
        })
    }

    /// Writes the artifact into `dir`, returning the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, self.content.as_bytes())?;
        info!(path = %path.display(), bytes = self.content.len(), "CSV report written");
        Ok(path)
    }
}
