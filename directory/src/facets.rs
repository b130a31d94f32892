use crate::models::DirectoryRecord;
use crate::snapshot::DirectorySnapshot;
use serde::Serialize;
use std::collections::HashSet;

/// Label of the option that clears a facet filter.
pub const NO_FILTER_LABEL: &str = "Select";

/// Distinct non-empty values of one field, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FacetSet {
    values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetOption {
    pub value: String,
    pub label: String,
}

impl FacetSet {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Options for a selection control: the empty-valued sentinel first.
    pub fn options(&self) -> Vec<FacetOption> {
        std::iter::once(FacetOption {
            value: String::new(),
            label: NO_FILTER_LABEL.to_string(),
        })
        .chain(self.values.iter().map(|v| FacetOption {
            value: v.clone(),
            label: v.clone(),
        }))
        .collect()
    }
}

pub struct FacetIndexer;

impl FacetIndexer {
    pub fn derive<F>(snapshot: &DirectorySnapshot, field: F) -> FacetSet
    where
        F: Fn(&DirectoryRecord) -> Option<&str>,
    {
        let mut seen = HashSet::new();
        let values = snapshot
            .iter()
            .filter_map(|record| field(record))
            .filter(|value| !value.is_empty())
            .filter(|value| seen.insert(*value))
            .map(str::to_string)
            .collect();

        FacetSet { values }
    }
}

/// The facets offered for a snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Facets {
    pub departments: FacetSet,
    pub job_titles: FacetSet,
}

impl Facets {
    pub fn derive(snapshot: &DirectorySnapshot) -> Self {
        Self {
            departments: FacetIndexer::derive(snapshot, |r| r.department.as_deref()),
            job_titles: FacetIndexer::derive(snapshot, |r| r.job_title.as_deref()),
        }
    }
}
