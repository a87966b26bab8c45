pub mod email;
pub mod error;
pub mod logging;
pub mod mime;
pub mod pagination;

pub use email::{Email, EmailsList};
pub use error::{EmailError, PaginationError};
pub use pagination::PaginationQuery;
pub use tracing;
