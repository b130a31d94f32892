use axum::{
    response::IntoResponse,
    http::StatusCode,
    Json
};
use crate::api::models::ApiResponse;

pub struct AppError(pub common::Error);

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            common::Error::InvalidInput(_) | common::Error::InvalidRecipient => StatusCode::BAD_REQUEST,
            common::Error::NotAuthenticated => StatusCode::UNAUTHORIZED,
            common::Error::NothingToReport => StatusCode::CONFLICT,
            common::Error::RemoteApi { .. }
            | common::Error::Transport(_)
            | common::Error::TokenAcquisition(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        let body = Json(ApiResponse::<()>::error(self.0.to_string()));
        (status_code, body).into_response()
    }
}

impl From<common::Error> for AppError {
    fn from(err: common::Error) -> Self {
        AppError(err)
    }
}
