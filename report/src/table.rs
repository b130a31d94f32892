use directory::DirectoryRecord;
use serde::Serialize;

/// Rendered in place of any absent or empty field.
pub const PLACEHOLDER: &str = "N/A";

pub const REPORT_HEADERS: [&str; 6] = [
    "Display Name",
    "UPN",
    "Email",
    "License Status",
    "Department",
    "Job Title",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub display_name: String,
    pub user_principal_name: String,
    pub mail: String,
    pub license_status: String,
    pub department: String,
    pub job_title: String,
}

impl ReportRow {
    pub fn project(record: &DirectoryRecord) -> Self {
        let license_status = if record.is_licensed() {
            "Licensed"
        } else {
            "Unlicensed"
        };

        Self {
            display_name: or_placeholder(&record.display_name),
            user_principal_name: or_placeholder(&record.user_principal_name),
            mail: or_placeholder(&record.mail),
            license_status: license_status.to_string(),
            department: or_placeholder(&record.department),
            job_title: or_placeholder(&record.job_title),
        }
    }

    /// Cells in header order.
    pub fn cells(&self) -> [&str; 6] {
        [
            self.display_name.as_str(),
            self.user_principal_name.as_str(),
            self.mail.as_str(),
            self.license_status.as_str(),
            self.department.as_str(),
            self.job_title.as_str(),
        ]
    }
}

fn or_placeholder(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// The one tabular projection every output is serialized from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    headers: Vec<String>,
    rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn project(records: &[DirectoryRecord]) -> Self {
        Self {
            headers: REPORT_HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: records.iter().map(ReportRow::project).collect(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
