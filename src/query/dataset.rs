// Vector Dataset Contract
//
// Implemented by storage backends. Backends build their raw cursor, push
// down whatever clauses they can, and let `QueryPlan` add the rest.

use super::cursor::{Cursor, FeatureCursor};
use super::result::QueryResult;
use super::vector_query::VectorQuery;
use crate::feature::Schema;
use crate::geom::Envelope;

pub trait VectorDataset {
    /// Dataset name, also used as the schema name
    fn name(&self) -> &str;

    /// Ordered field list of the stored features
    fn schema(&self) -> QueryResult<Schema>;

    /// Envelope of every stored geometry
    fn bounds(&self) -> QueryResult<Envelope>;

    /// Features answering `query`
    fn cursor(&self, query: &VectorQuery) -> QueryResult<FeatureCursor>;

    /// Number of features answering `query`. Overrides must return exactly
    /// what draining `cursor(query)` would.
    fn count(&self, query: &VectorQuery) -> QueryResult<usize> {
        self.cursor(query)?.count()
    }
}
