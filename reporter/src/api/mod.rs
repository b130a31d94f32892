pub mod models;
pub mod routes;

pub use routes::{AppState, routes};
