// Filter Stage
//
// Drops features the filter does not match. Unknown results do not match;
// evaluation errors propagate to the caller.

use std::sync::Arc;

use crate::feature::Feature;
use crate::filter::Filter;
use crate::geom::GeometryEngine;
use crate::query::cursor::Cursor;
use crate::query::result::{QueryError, QueryResult};

pub struct FilterCursor<C> {
    source: C,
    filter: Filter,
    engine: Arc<dyn GeometryEngine>,
    buffered: Option<Feature>,
    closed: bool,
}

impl<C: Cursor<Item = Feature>> FilterCursor<C> {
    pub fn new(source: C, filter: Filter, engine: Arc<dyn GeometryEngine>) -> Self {
        FilterCursor {
            source,
            filter,
            engine,
            buffered: None,
            closed: false,
        }
    }
}

impl<C: Cursor<Item = Feature>> Cursor for FilterCursor<C> {
    type Item = Feature;

    fn has_next(&mut self) -> QueryResult<bool> {
        if self.closed {
            return Ok(false);
        }
        while self.buffered.is_none() {
            if !self.source.has_next()? {
                self.close()?;
                return Ok(false);
            }
            let feature = self.source.next()?;
            if self.filter.matches_with(&feature, self.engine.as_ref())? {
                self.buffered = Some(feature);
            }
        }
        Ok(true)
    }

    fn next(&mut self) -> QueryResult<Feature> {
        if self.buffered.is_none() && !self.has_next()? {
            return Err(QueryError::Exhausted);
        }
        self.buffered.take().ok_or(QueryError::Exhausted)
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.buffered = None;
        self.source.close()
    }
}
