pub mod bucket_handlers;
pub mod file_handlers;
pub mod health_handlers;
pub mod presign_handlers;
pub mod usage_handlers;

pub use bucket_handlers::*;
pub use file_handlers::*;
pub use health_handlers::*;
pub use presign_handlers::*;
pub use usage_handlers::*;
