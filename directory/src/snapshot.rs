use crate::client::GraphApi;
use crate::facets::Facets;
use crate::models::{DirectoryRecord, UsersResponse};
use chrono::{DateTime, Utc};
use common::Result;
use rquest::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Enabled accounts only, restricted to the six tracked fields.
pub const ENABLED_USERS_ENDPOINT: &str = "/users?$filter=accountEnabled eq true&$select=displayName,userPrincipalName,mail,assignedLicenses,department,jobTitle";

/// Directory records as returned by one fetch, in API order.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    records: Vec<DirectoryRecord>,
    fetched_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    pub fn new(records: Vec<DirectoryRecord>) -> Self {
        Self {
            records,
            fetched_at: Utc::now(),
        }
    }

    pub fn records(&self) -> &[DirectoryRecord] {
        &self.records
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectoryRecord> {
        self.records.iter()
    }
}

/// Fetches the enabled-user listing. Only the first page is read.
pub async fn fetch_snapshot(api: &dyn GraphApi) -> Result<DirectorySnapshot> {
    let value = api
        .call(ENABLED_USERS_ENDPOINT, Method::GET, None, &HashMap::new())
        .await?;
    let page: UsersResponse = serde_json::from_value(value)?;

    if page.next_link.is_some() {
        warn!("Directory listing has more pages; only the first page is used");
    }

    let records = page.value.into_iter().map(DirectoryRecord::from).collect();
    Ok(DirectorySnapshot::new(records))
}

/// Holds the current snapshot and the facets derived from it.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: Option<Arc<DirectorySnapshot>>,
    facets: Facets,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-fetches the directory. On failure the held snapshot is left as it was.
    pub async fn refresh(&mut self, api: &dyn GraphApi) -> Result<Arc<DirectorySnapshot>> {
        let snapshot = fetch_snapshot(api).await?;
        info!(records = snapshot.len(), "Directory snapshot refreshed");
        Ok(self.replace(snapshot))
    }

    pub fn replace(&mut self, snapshot: DirectorySnapshot) -> Arc<DirectorySnapshot> {
        let snapshot = Arc::new(snapshot);
        self.facets = Facets::derive(&snapshot);
        self.current = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn current(&self) -> Option<&Arc<DirectorySnapshot>> {
        self.current.as_ref()
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }
}
