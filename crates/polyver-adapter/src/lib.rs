mod error;
pub mod fetch;
mod traits;
mod types;

pub use error::AdapterError;
pub use traits::{AppAdapter, ManagedAdapter, UnmanagedInstaller};
pub use types::{ShimSpec, ShortcutSpec, VersionDescriptor};
