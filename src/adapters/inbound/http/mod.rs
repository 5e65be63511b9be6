pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;

pub use dto::*;
pub use error::{ApiError, api_error};
pub use router::{AppState, create_api_router, create_router};
