// Geoquery Feature Query Engine

pub mod cql;
pub mod data;
pub mod feature;
pub mod filter;
pub mod geom;
pub mod query;

// Re-export key items for convenient access
pub use cql::{parse, parse_expression, parse_geometry, SyntaxError};
pub use data::MemoryDataset;
pub use feature::{Feature, Schema};
pub use filter::{EvaluationError, Expression, Filter, Value};
pub use geom::{Envelope, Geometry, GeometryEngine, PlanarEngine};
pub use query::{Cursor, FeatureCursor, QueryError, QueryPlan, QueryResult, VectorDataset, VectorQuery};
