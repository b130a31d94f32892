use serde::{Deserialize, Serialize};

use super::GraphUser;

/// One enabled account as tracked by the report.
///
/// Optional fields stay `None` when the directory omits them; an empty string
/// is kept as-is and only collapses to the placeholder at render time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRecord {
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub mail: Option<String>,
    pub license_count: usize,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

impl DirectoryRecord {
    pub fn is_licensed(&self) -> bool {
        self.license_count > 0
    }
}

impl From<GraphUser> for DirectoryRecord {
    fn from(user: GraphUser) -> Self {
        DirectoryRecord {
            display_name: user.display_name,
            user_principal_name: user.user_principal_name,
            mail: user.mail,
            license_count: user.assigned_licenses.map(|l| l.len()).unwrap_or(0),
            department: user.department,
            job_title: user.job_title,
        }
    }
}
