mod record;
mod response;

pub use record::DirectoryRecord;
pub use response::{AssignedLicense, GraphUser, UsersResponse};
