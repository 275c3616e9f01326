//! Catalog: registered models and their validated table metadata

pub mod registry;

pub use registry::{Initializer, ModelMetadata, ModelRegistry};
