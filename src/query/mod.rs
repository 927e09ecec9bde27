// Query Execution Module
//
// Cursor primitive, decorator stages and the plan that composes them around
// a backend's raw cursor.

pub mod cursor;
pub mod dataset;
pub mod operators;
pub mod plan;
pub mod result;
pub mod vector_query;

// Export key public interfaces
pub use cursor::{Cursor, CursorIter, FeatureCursor};
pub use dataset::VectorDataset;
pub use plan::{execute, QueryPlan};
pub use result::{QueryError, QueryResult};
pub use vector_query::VectorQuery;
