use common::config::{ReportConfig, Settings};
use common::{Error, Result};
use directory::auth::provider_from_config;
use directory::{
    DirectorySnapshot, Facets, FilterCriteria, GraphApi, GraphClient, RecordFilter, SnapshotStore,
    TokenProvider,
};
use notification::ReportDispatcher;
use report::{CsvArtifact, RenderedReport, ReportTable};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a search. An empty match is an expected outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Matches(usize),
    EmptyResultSet,
}

impl SearchOutcome {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SearchOutcome::Matches(_) => None,
            SearchOutcome::EmptyResultSet => Some("No matching results found."),
        }
    }
}

/// Everything one operator session works on: the snapshot, the current
/// criteria and the table currently on display.
pub struct ReportSession {
    auth: Arc<dyn TokenProvider>,
    graph: Arc<dyn GraphApi>,
    dispatcher: ReportDispatcher,
    store: SnapshotStore,
    criteria: FilterCriteria,
    table: ReportTable,
    report: ReportConfig,
}

impl ReportSession {
    pub fn new(
        auth: Arc<dyn TokenProvider>,
        graph: Arc<dyn GraphApi>,
        report: ReportConfig,
    ) -> Self {
        let dispatcher = ReportDispatcher::new(Arc::clone(&graph), report.sender.as_deref());
        Self {
            auth,
            graph,
            dispatcher,
            store: SnapshotStore::new(),
            criteria: FilterCriteria::default(),
            table: ReportTable::default(),
            report,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let auth = provider_from_config(&settings.auth)?;
        let graph = Arc::new(GraphClient::new(&settings.graph, Arc::clone(&auth))?);
        Ok(Self::new(auth, graph, settings.report.clone()))
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.active_account().is_some()
    }

    /// Signs back in and re-fetches the directory, so facets are current right after login.
    pub async fn sign_in(&mut self) -> Result<Arc<DirectorySnapshot>> {
        let account = self.auth.sign_in().await?;
        info!(account = %account.username, "Signed in");
        self.refresh().await
    }

    pub fn sign_out(&mut self) {
        self.auth.sign_out();
        info!("Signed out");
    }

    /// Fetches a new snapshot; the previous one stays in place if this fails.
    pub async fn refresh(&mut self) -> Result<Arc<DirectorySnapshot>> {
        self.store.refresh(self.graph.as_ref()).await
    }

    pub fn snapshot(&self) -> Option<&Arc<DirectorySnapshot>> {
        self.store.current()
    }

    pub fn facets(&self) -> &Facets {
        self.store.facets()
    }

    /// Filters the snapshot and makes the result the displayed table.
    pub fn search(&mut self, criteria: FilterCriteria) -> SearchOutcome {
        let records = self
            .store
            .current()
            .map(|snapshot| RecordFilter::apply(snapshot.records(), &criteria))
            .unwrap_or_default();

        self.table = ReportTable::project(&records);
        self.criteria = criteria;

        if self.table.is_empty() {
            warn!(criteria = ?self.criteria, "Search matched no records");
            SearchOutcome::EmptyResultSet
        } else {
            info!(matches = self.table.len(), "Search complete");
            SearchOutcome::Matches(self.table.len())
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn table(&self) -> &ReportTable {
        &self.table
    }

    /// Renders the displayed table in every output encoding.
    pub fn render_report(&self) -> Result<RenderedReport> {
        report::render(&self.table, &self.report.filename)
    }

    pub fn export_csv(&self) -> Result<CsvArtifact> {
        Ok(self.render_report()?.csv)
    }

    /// Mails the displayed table. Falls back to `report.default_recipient` and `report.subject`.
    pub async fn send_report(
        &self,
        recipient: Option<&str>,
        subject: Option<&str>,
    ) -> Result<String> {
        let recipient = recipient
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .or(self.report.default_recipient.as_deref())
            .ok_or(Error::InvalidRecipient)?;
        let subject = subject
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.report.subject);

        let rendered = self.render_report()?;
        self.dispatcher.send(recipient, subject, &rendered.html).await?;
        Ok(recipient.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use directory::{Method, StaticTokenProvider};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGraph {
        users: Mutex<Vec<Result<Value>>>,
        sent: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl GraphApi for FakeGraph {
        async fn call(
            &self,
            endpoint: &str,
            _method: Method,
            body: Option<Value>,
            _headers: &HashMap<String, String>,
        ) -> Result<Value> {
            if endpoint.ends_with("/sendMail") {
                self.sent.lock().unwrap().push(body.unwrap_or(Value::Null));
                return Ok(json!({}));
            }
            self.users.lock().unwrap().remove(0)
        }
    }

    fn ada_and_bo() -> Value {
        json!({"value": [
            {"displayName": "Ada", "department": "Eng", "jobTitle": "SWE", "assignedLicenses": [{"skuId": "x"}]},
            {"displayName": "Bo", "department": "Sales", "jobTitle": "Rep", "assignedLicenses": []}
        ]})
    }

    fn session(graph: Arc<FakeGraph>) -> ReportSession {
        ReportSession::new(
            Arc::new(StaticTokenProvider::new("admin@contoso.com", "tok")),
            graph,
            ReportConfig::default(),
        )
    }

    fn department(dep: &str) -> FilterCriteria {
        FilterCriteria {
            department: Some(dep.to_string()),
            ..FilterCriteria::default()
        }
    }

    #[tokio::test]
    async fn search_then_export_matches_display() {
        let graph = Arc::new(FakeGraph {
            users: Mutex::new(vec![Ok(ada_and_bo())]),
            ..FakeGraph::default()
        });
        let mut session = session(graph);
        session.refresh().await.unwrap();
        assert_eq!(session.facets().departments.values(), ["Eng", "Sales"]);

        assert_eq!(session.search(department("Eng")), SearchOutcome::Matches(1));
        let csv = session.export_csv().unwrap();
        assert_eq!(csv.filename, "Enabled_Users_Report.csv");
        assert_eq!(
            csv.content,
            "Display Name,UPN,Email,License Status,Department,Job Title\nAda,N/A,N/A,Licensed,Eng,SWE"
        );
    }

    #[tokio::test]
    async fn empty_search_blocks_export_and_send() {
        let graph = Arc::new(FakeGraph {
            users: Mutex::new(vec![Ok(ada_and_bo())]),
            ..FakeGraph::default()
        });
        let mut session = session(graph.clone());
        session.refresh().await.unwrap();

        let outcome = session.search(department("Nonexistent"));
        assert_eq!(outcome, SearchOutcome::EmptyResultSet);
        assert_eq!(outcome.message(), Some("No matching results found."));
        assert!(session.table().is_empty());

        assert!(matches!(session.export_csv(), Err(Error::NothingToReport)));
        assert!(matches!(
            session.send_report(Some("admin@contoso.com"), None).await,
            Err(Error::NothingToReport)
        ));
        assert!(graph.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_before_refresh_is_empty() {
        let mut session = session(Arc::new(FakeGraph::default()));
        assert_eq!(session.search(FilterCriteria::default()), SearchOutcome::EmptyResultSet);
    }

    #[tokio::test]
    async fn mail_carries_displayed_rows() {
        let graph = Arc::new(FakeGraph {
            users: Mutex::new(vec![Ok(ada_and_bo())]),
            ..FakeGraph::default()
        });
        let mut session = session(graph.clone());
        session.refresh().await.unwrap();
        session.search(FilterCriteria::default());

        session.send_report(Some("admin@contoso.com"), None).await.unwrap();

        let sent = graph.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let message = &sent[0]["message"];
        assert_eq!(message["subject"], "Enabled Users Report");
        let html = message["body"]["content"].as_str().unwrap();
        assert_eq!(html, report::to_html_fragment(session.table()).unwrap());
        assert_eq!(html.matches("<tr>").count(), 3);
    }

    #[tokio::test]
    async fn missing_recipient_is_invalid() {
        let graph = Arc::new(FakeGraph {
            users: Mutex::new(vec![Ok(ada_and_bo())]),
            ..FakeGraph::default()
        });
        let mut session = session(graph);
        session.refresh().await.unwrap();
        session.search(FilterCriteria::default());

        assert!(matches!(
            session.send_report(Some("  "), None).await,
            Err(Error::InvalidRecipient)
        ));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_snapshot_and_table() {
        let graph = Arc::new(FakeGraph {
            users: Mutex::new(vec![
                Ok(ada_and_bo()),
                Err(Error::RemoteApi {
                    status: 403,
                    status_text: "Forbidden".to_string(),
                }),
            ]),
            ..FakeGraph::default()
        });
        let mut session = session(graph);
        let before = session.refresh().await.unwrap();
        session.search(FilterCriteria::default());

        let err = session.refresh().await.unwrap_err();
        assert!(matches!(err, Error::RemoteApi { status: 403, .. }));
        assert!(Arc::ptr_eq(session.snapshot().unwrap(), &before));
        assert_eq!(session.table().len(), 2);
    }

    #[test]
    fn sign_out_ends_session() {
        let mut session = session(Arc::new(FakeGraph::default()));
        assert!(session.is_signed_in());
        session.sign_out();
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn sign_in_restores_session_and_refetches() {
        let graph = Arc::new(FakeGraph {
            users: Mutex::new(vec![Ok(ada_and_bo())]),
            ..FakeGraph::default()
        });
        let mut session = session(graph);
        session.sign_out();

        let snapshot = session.sign_in().await.unwrap();
        assert!(session.is_signed_in());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(session.facets().job_titles.values(), ["SWE", "Rep"]);
    }

    #[tokio::test]
    async fn sign_in_without_credentials_fails() {
        let mut session = ReportSession::new(
            Arc::new(StaticTokenProvider::signed_out()),
            Arc::new(FakeGraph::default()),
            ReportConfig::default(),
        );
        assert!(matches!(session.sign_in().await, Err(Error::NotAuthenticated)));
        assert!(session.snapshot().is_none());
    }

    #[tokio::test]
    async fn rendered_report_uses_configured_filename() {
        let graph = Arc::new(FakeGraph {
            users: Mutex::new(vec![Ok(ada_and_bo())]),
            ..FakeGraph::default()
        });
        let mut session = ReportSession::new(
            Arc::new(StaticTokenProvider::new("admin@contoso.com", "tok")),
            graph,
            ReportConfig {
                filename: "enabled.csv".to_string(),
                ..ReportConfig::default()
            },
        );
        session.refresh().await.unwrap();
        session.search(FilterCriteria::default());

        let rendered = session.render_report().unwrap();
        assert_eq!(rendered.rows, 2);
        assert_eq!(rendered.csv.filename, "enabled.csv");
        assert_eq!(session.export_csv().unwrap().content, rendered.csv.content);
    }
}
