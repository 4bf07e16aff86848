pub mod extensions;
pub mod stored_name;

pub use extensions::AllowedExtensions;
pub use stored_name::{NameError, StoredName};
