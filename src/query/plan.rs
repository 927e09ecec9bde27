// Query Plan
//
// Composes the decorator stages for a `VectorQuery` around a raw backend
// cursor. Stages wrap innermost first: bounds, filter, project, offset,
// limit. A backend that answered a clause natively marks it done and the
// corresponding stage is left out.

use std::sync::Arc;

use log::debug;

use super::cursor::{Cursor, FeatureCursor};
use super::operators::{BoundsCursor, FilterCursor, LimitCursor, OffsetCursor, ProjectCursor};
use super::vector_query::VectorQuery;
use crate::feature::Feature;
use crate::filter::Filter;
use crate::geom::{GeometryEngine, PlanarEngine};

pub struct QueryPlan<'a> {
    query: &'a VectorQuery,
    bounded: bool,
    filtered: bool,
    projected: bool,
    offsetted: bool,
    limited: bool,
    engine: Arc<dyn GeometryEngine>,
}

impl<'a> QueryPlan<'a> {
    /// A plan with every clause still to be applied
    pub fn new(query: &'a VectorQuery) -> Self {
        QueryPlan {
            query,
            bounded: false,
            filtered: false,
            projected: false,
            offsetted: false,
            limited: false,
            engine: Arc::new(PlanarEngine),
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn GeometryEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// The raw cursor only yields features inside the query bounds
    pub fn bounded(mut self) -> Self {
        self.bounded = true;
        self
    }

    /// The raw cursor only yields features matching the query filter
    pub fn filtered(mut self) -> Self {
        self.filtered = true;
        self
    }

    /// The raw cursor already restricts features to the requested fields
    pub fn projected(mut self) -> Self {
        self.projected = true;
        self
    }

    /// The raw cursor already skipped the query offset
    pub fn offsetted(mut self) -> Self {
        self.offsetted = true;
        self
    }

    /// The raw cursor never yields more than the query limit
    pub fn limited(mut self) -> Self {
        self.limited = true;
        self
    }

    pub fn query(&self) -> &VectorQuery {
        self.query
    }

    /// Names of the stages `apply` will add, innermost first
    pub fn stages(&self) -> Vec<&'static str> {
        let mut stages = Vec::new();
        if !self.bounded && self.query.bounds().is_some() {
            stages.push("bounds");
        }
        if !self.filtered && *self.query.filter() != Filter::All {
            stages.push("filter");
        }
        if !self.projected && self.query.fields().is_some() {
            stages.push("project");
        }
        if !self.offsetted && self.query.offset() > 0 {
            stages.push("offset");
        }
        if !self.limited && self.query.limit().is_some() {
            stages.push("limit");
        }
        stages
    }

    /// Wrap `raw` with every stage not pushed down
    pub fn apply<C>(self, raw: C) -> FeatureCursor
    where
        C: Cursor<Item = Feature> + 'static,
    {
        debug!("query plan for {}: stages {:?}", self.query, self.stages());

        let mut cursor: FeatureCursor = Box::new(raw);
        if !self.bounded {
            if let Some(bounds) = self.query.bounds() {
                cursor = Box::new(BoundsCursor::new(cursor, *bounds, self.engine.clone()));
            }
        }
        if !self.filtered && *self.query.filter() != Filter::All {
            cursor = Box::new(FilterCursor::new(
                cursor,
                self.query.filter().clone(),
                self.engine.clone(),
            ));
        }
        if !self.projected {
            if let Some(fields) = self.query.fields() {
                cursor = Box::new(ProjectCursor::new(cursor, fields.to_vec()));
            }
        }
        if !self.offsetted && self.query.offset() > 0 {
            cursor = Box::new(OffsetCursor::new(cursor, self.query.offset()));
        }
        if !self.limited {
            if let Some(limit) = self.query.limit() {
                cursor = Box::new(LimitCursor::new(cursor, limit));
            }
        }
        cursor
    }
}

/// Run `query` over `raw` with nothing pushed down
pub fn execute<C>(query: &VectorQuery, raw: C) -> FeatureCursor
where
    C: Cursor<Item = Feature> + 'static,
{
    QueryPlan::new(query).apply(raw)
}
