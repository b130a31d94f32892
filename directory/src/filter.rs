use crate::models::DirectoryRecord;
use common::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LicenseStatus {
    #[default]
    Any,
    Licensed,
    Unlicensed,
}

impl LicenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Any => "Any",
            LicenseStatus::Licensed => "Licensed",
            LicenseStatus::Unlicensed => "Unlicensed",
        }
    }

    pub fn matches(&self, record: &DirectoryRecord) -> bool {
        match self {
            LicenseStatus::Any => true,
            LicenseStatus::Licensed => record.license_count > 0,
            LicenseStatus::Unlicensed => record.license_count == 0,
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" => Ok(LicenseStatus::Any),
            "licensed" => Ok(LicenseStatus::Licensed),
            "unlicensed" => Ok(LicenseStatus::Unlicensed),
            other => Err(Error::InvalidInput(format!(
                "unknown license status '{}' (expected Any, Licensed or Unlicensed)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for LicenseStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LicenseStatus> for String {
    fn from(status: LicenseStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Search state for one invocation. Unset or empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub text: Option<String>,
    #[serde(alias = "license")]
    pub license_status: LicenseStatus,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

impl FilterCriteria {
    pub fn is_unrestricted(&self) -> bool {
        active(&self.text).is_none()
            && self.license_status == LicenseStatus::Any
            && active(&self.department).is_none()
            && active(&self.job_title).is_none()
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_lowercase(field: &Option<String>, needle: &str) -> bool {
    field
        .as_deref()
        .is_some_and(|value| value.to_lowercase().contains(needle))
}

pub struct RecordFilter;

impl RecordFilter {
    pub fn matches(record: &DirectoryRecord, criteria: &FilterCriteria) -> bool {
        let text = match active(&criteria.text) {
            Some(text) => {
                let needle = text.to_lowercase();
                contains_lowercase(&record.display_name, &needle)
                    || contains_lowercase(&record.user_principal_name, &needle)
                    || contains_lowercase(&record.mail, &needle)
            }
            None => true,
        };

        let department = active(&criteria.department)
            .is_none_or(|dep| record.department.as_deref() == Some(dep));

        let job_title = active(&criteria.job_title)
            .is_none_or(|title| record.job_title.as_deref() == Some(title));

        text && criteria.license_status.matches(record) && department && job_title
    }

    /// Matching records in their original order.
    pub fn apply(records: &[DirectoryRecord], criteria: &FilterCriteria) -> Vec<DirectoryRecord> {
        if criteria.is_unrestricted() {
            return records.to_vec();
        }
        records
            .iter()
            .filter(|record| Self::matches(record, criteria))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, upn: Option<&str>, dep: Option<&str>, title: Option<&str>, licenses: usize) -> DirectoryRecord {
        DirectoryRecord {
            display_name: Some(name.to_string()),
            user_principal_name: upn.map(str::to_string),
            mail: None,
            license_count: licenses,
            department: dep.map(str::to_string),
            job_title: title.map(str::to_string),
        }
    }

    fn snapshot() -> Vec<DirectoryRecord> {
        vec![
            user("Ada Lovelace", Some("ada@contoso.com"), Some("Eng"), Some("SWE"), 1),
            user("Bo", Some("bo@contoso.com"), Some("Sales"), Some("Rep"), 0),
            user("Cy", None, None, None, 3),
            DirectoryRecord {
                mail: Some("Dee@Fabrikam.com".to_string()),
                ..DirectoryRecord::default()
            },
        ]
    }

    #[test]
    fn unset_criteria_return_everything_in_order() {
        let records = snapshot();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_unrestricted());
        assert_eq!(RecordFilter::apply(&records, &criteria), records);

        let blank = FilterCriteria {
            text: Some(String::new()),
            department: Some(String::new()),
            job_title: Some(String::new()),
            ..FilterCriteria::default()
        };
        assert!(blank.is_unrestricted());
        assert_eq!(RecordFilter::apply(&records, &blank), records);
    }

    #[test]
    fn text_matches_any_identity_field_case_insensitively() {
        let records = snapshot();
        let by = |text: &str| {
            let criteria = FilterCriteria {
                text: Some(text.to_string()),
                ..FilterCriteria::default()
            };
            RecordFilter::apply(&records, &criteria)
                .into_iter()
                .map(|r| r.display_name.unwrap_or_else(|| "-".to_string()))
                .collect::<Vec<_>>()
        };

        assert_eq!(by("LOVE"), ["Ada Lovelace"]);
        assert_eq!(by("contoso"), ["Ada Lovelace", "Bo"]);
        assert_eq!(by("fabrikam"), ["-"]);
        assert!(by("nobody").is_empty());
    }

    #[test]
    fn license_status_splits_on_count() {
        let records = snapshot();
        let licensed = FilterCriteria {
            license_status: LicenseStatus::Licensed,
            ..FilterCriteria::default()
        };
        let unlicensed = FilterCriteria {
            license_status: LicenseStatus::Unlicensed,
            ..FilterCriteria::default()
        };

        let licensed = RecordFilter::apply(&records, &licensed);
        let unlicensed = RecordFilter::apply(&records, &unlicensed);
        assert_eq!(licensed.len(), 2);
        assert_eq!(unlicensed.len(), 2);
        assert!(licensed.iter().all(DirectoryRecord::is_licensed));
        assert!(unlicensed.iter().all(|r| !r.is_licensed()));
    }

    #[test]
    fn department_equality_includes_own_and_excludes_others() {
        let records = snapshot();
        for record in records.iter().filter(|r| r.department.is_some()) {
            let own = FilterCriteria {
                department: record.department.clone(),
                ..FilterCriteria::default()
            };
            assert!(RecordFilter::matches(record, &own));

            for other in ["Eng", "Sales", "Nonexistent"] {
                if record.department.as_deref() != Some(other) {
                    let criteria = FilterCriteria {
                        department: Some(other.to_string()),
                        ..FilterCriteria::default()
                    };
                    assert!(!RecordFilter::matches(record, &criteria));
                }
            }
        }
    }

    #[test]
    fn criteria_are_anded() {
        let records = snapshot();
        let criteria = FilterCriteria {
            text: Some("contoso".to_string()),
            license_status: LicenseStatus::Unlicensed,
            department: Some("Sales".to_string()),
            job_title: Some("Rep".to_string()),
        };
        let matched = RecordFilter::apply(&records, &criteria);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].display_name.as_deref(), Some("Bo"));

        let mismatched_title = FilterCriteria {
            job_title: Some("SWE".to_string()),
            ..criteria
        };
        assert!(RecordFilter::apply(&records, &mismatched_title).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = snapshot();
        let cases = [
            FilterCriteria::default(),
            FilterCriteria {
                text: Some("o".to_string()),
                ..FilterCriteria::default()
            },
            FilterCriteria {
                license_status: LicenseStatus::Licensed,
                department: Some("Eng".to_string()),
                ..FilterCriteria::default()
            },
        ];
        for criteria in cases {
            let once = RecordFilter::apply(&records, &criteria);
            let twice = RecordFilter::apply(&once, &criteria);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn license_status_parses_control_values() {
        assert_eq!("".parse::<LicenseStatus>().unwrap(), LicenseStatus::Any);
        assert_eq!("Licensed".parse::<LicenseStatus>().unwrap(), LicenseStatus::Licensed);
        assert_eq!("unlicensed".parse::<LicenseStatus>().unwrap(), LicenseStatus::Unlicensed);
        assert!("maybe".parse::<LicenseStatus>().is_err());
    }

    #[test]
    fn criteria_deserialize_from_query_shape() {
        let criteria: FilterCriteria = serde_json::from_value(serde_json::json!({
            "text": "ada",
            "license": "Licensed",
            "department": "Eng"
        }))
        .unwrap();
        assert_eq!(criteria.license_status, LicenseStatus::Licensed);
        assert_eq!(criteria.department.as_deref(), Some("Eng"));
        assert!(criteria.job_title.is_none());
    }
}
