pub mod auth;
pub mod client;
pub mod facets;
pub mod filter;
pub mod models;
pub mod snapshot;

pub use auth::{AccessToken, Account, ClientCredentialsProvider, StaticTokenProvider, TokenProvider};
pub use client::{GraphApi, GraphClient};
pub use facets::{FacetIndexer, FacetOption, FacetSet, Facets};
pub use filter::{FilterCriteria, LicenseStatus, RecordFilter};
pub use models::DirectoryRecord;
pub use snapshot::{DirectorySnapshot, SnapshotStore};

/// Re-exported so callers of [`GraphApi::call`] need no direct rquest dependency.
pub use rquest::Method;
