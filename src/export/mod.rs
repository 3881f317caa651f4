//! Model export: the versioned on-disk artifact of a trained bundle

mod store;

pub use store::{ModelStore, FORMAT_VERSION};
