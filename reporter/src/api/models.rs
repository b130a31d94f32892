use chrono::{DateTime, Utc};
use directory::{FacetOption, FilterCriteria, LicenseStatus};
use report::ReportTable;
use serde::{Deserialize, Serialize};

// Request models
#[derive(Debug, Default, Deserialize)]
pub struct SendReportRequest {
    pub recipient: Option<String>,
    pub subject: Option<String>,
}

// Response models
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshSummary {
    pub records: usize,
    pub fetched_at: DateTime<Utc>,
    pub departments: usize,
    pub job_titles: usize,
}

#[derive(Debug, Serialize)]
pub struct FacetControls {
    pub departments: Vec<FacetOption>,
    pub job_titles: Vec<FacetOption>,
    pub license_statuses: Vec<FacetOption>,
}

impl FacetControls {
    pub fn license_options() -> Vec<FacetOption> {
        [LicenseStatus::Any, LicenseStatus::Licensed, LicenseStatus::Unlicensed]
            .into_iter()
            .map(|status| FacetOption {
                value: match status {
                    LicenseStatus::Any => String::new(),
                    other => other.to_string(),
                },
                label: status.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub matches: usize,
    pub message: Option<&'static str>,
    pub criteria: FilterCriteria,
    pub table: ReportTable,
}

#[derive(Debug, Serialize)]
pub struct SendReceipt {
    pub recipient: String,
    pub rows: usize,
}
