/// Persistent search and error logs
mod errors;
mod searches;

pub use errors::{ErrorLogManager, RequestInfo};
pub use searches::{SearchLogManager, SearchTermCount};
