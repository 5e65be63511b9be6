mod bucket_name;
mod checksum;
mod container_name;
mod file_name;
mod object_name;

pub use bucket_name::*;
pub use checksum::*;
pub use container_name::*;
pub use file_name::*;
pub use object_name::*;
