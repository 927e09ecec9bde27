// Data Module
//
// Reference backends for the query pipeline.

pub mod json;
pub mod memory;

pub use json::{JsonError, JsonLinesCursor, JsonResult, read_features, write_features};
pub use memory::{MemoryCursor, MemoryDataset};
