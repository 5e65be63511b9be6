pub mod bucket;
pub mod file;
pub mod presigned;
pub mod principal;
pub mod stream;
pub mod usage;

pub use bucket::*;
pub use file::*;
pub use presigned::*;
pub use principal::*;
pub use stream::*;
pub use usage::*;
