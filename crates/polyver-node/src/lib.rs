mod adapter;
mod release;

pub use adapter::NodeAdapter;
pub use release::{DistEntry, LtsField, descriptors_from_index};
