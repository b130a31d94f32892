use crate::table::ReportTable;
use common::{Error, Result};

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// A bordered `<table>` with a header row and one `<tr>` per report row.
pub fn to_html_fragment(table: &ReportTable) -> Result<String> {
    if table.is_empty() {
        return Err(Error::NothingToReport);
    }

    let mut html = String::from("<table border=\"1\"><thead><tr>");
    for header in table.headers() {
        html.push_str(&format!("<th>{}</th>", html_escape(header)));
    }
    html.push_str("</tr></thead><tbody>");

    for row in table.rows() {
        html.push_str("<tr>");
        for cell in row.cells() {
            html.push_str(&format!("<td>{}</td>", html_escape(cell)));
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>");
    Ok(html)
}
