use axum::{
    routing::{get, post},
    Router,
    extract::{State, Query},
    response::IntoResponse,
    response::Response,
    http::header,
    Json
};
use std::sync::Arc;
use tokio::sync::Mutex;
use directory::DirectorySnapshot;
use tower_http::trace::TraceLayer;
use directory::FilterCriteria;

use crate::session::ReportSession;
use crate::services::AppError;
use super::models::{
    ApiResponse, FacetControls, RefreshSummary, SearchResults, SendReceipt, SendReportRequest,
};

/// Requests are served one at a time against the session, so a refresh never
/// overlaps another refresh or a search.
pub struct AppState {
    pub session: Mutex<ReportSession>,
}

impl AppState {
    pub fn new(session: ReportSession) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

fn summarize(session: &ReportSession, snapshot: &DirectorySnapshot) -> RefreshSummary {
    let facets = session.facets();
    RefreshSummary {
        records: snapshot.len(),
        fetched_at: snapshot.fetched_at(),
        departments: facets.departments.len(),
        job_titles: facets.job_titles.len(),
    }
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RefreshSummary>>, AppError> {
    let mut session = state.session.lock().await;
    let snapshot = session.refresh().await?;
    Ok(Json(ApiResponse::success(summarize(&session, &snapshot))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RefreshSummary>>, AppError> {
    let mut session = state.session.lock().await;
    let snapshot = session.sign_in().await?;
    Ok(Json(ApiResponse::success(summarize(&session, &snapshot))))
}

pub async fn facets(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<FacetControls>> {
    let session = state.session.lock().await;
    let facets = session.facets();

    Json(ApiResponse::success(FacetControls {
        departments: facets.departments.options(),
        job_titles: facets.job_titles.options(),
        license_statuses: FacetControls::license_options(),
    }))
}

pub async fn search_users(
    Query(criteria): Query<FilterCriteria>,
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<SearchResults>> {
    let mut session = state.session.lock().await;
    let outcome = session.search(criteria);

    Json(ApiResponse::success(SearchResults {
        matches: session.table().len(),
        message: outcome.message(),
        criteria: session.criteria().clone(),
        table: session.table().clone(),
    }))
}

pub async fn download_csv(
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let session = state.session.lock().await;
    let artifact = session.export_csv()?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.content,
    )
        .into_response())
}

pub async fn send_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendReportRequest>,
) -> Result<Json<ApiResponse<SendReceipt>>, AppError> {
    let session = state.session.lock().await;
    let recipient = session
        .send_report(request.recipient.as_deref(), request.subject.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(SendReceipt {
        recipient,
        rows: session.table().len(),
    })))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Json<ApiResponse<bool>> {
    let mut session = state.session.lock().await;
    session.sign_out();
    Json(ApiResponse::success(session.is_signed_in()))
}

// Define all API routes
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/refresh", post(refresh))
        .route("/api/facets", get(facets))
        .route("/api/users", get(search_users))
        .route("/api/report.csv", get(download_csv))
        .route("/api/report/send", post(send_report))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
