pub mod csv;
pub mod html;
pub mod table;

pub use csv::{CSV_FILENAME, CSV_MIME, CsvArtifact, to_delimited_text};
pub use html::to_html_fragment;
pub use table::{PLACEHOLDER, REPORT_HEADERS, ReportRow, ReportTable};

use common::Result;

/// Both encodings of one table, produced in a single pass.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub csv: CsvArtifact,
    pub html: String,
    pub rows: usize,
}

pub fn render(table: &ReportTable, filename: &str) -> Result<RenderedReport> {
    Ok(RenderedReport {
        csv: CsvArtifact::with_filename(table, filename)?,
        html: to_html_fragment(table)?,
        rows: table.len(),
    })
}
