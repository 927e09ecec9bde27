// Bounds Stage
//
// Drops features whose geometry envelope does not intersect the query
// bounds. Features without a geometry never pass.

use std::sync::Arc;

use crate::feature::Feature;
use crate::geom::{Envelope, GeometryEngine};
use crate::query::cursor::Cursor;
use crate::query::result::{QueryError, QueryResult};

pub struct BoundsCursor<C> {
    source: C,
    bounds: Envelope,
    engine: Arc<dyn GeometryEngine>,
    buffered: Option<Feature>,
    closed: bool,
}

impl<C: Cursor<Item = Feature>> BoundsCursor<C> {
    pub fn new(source: C, bounds: Envelope, engine: Arc<dyn GeometryEngine>) -> Self {
        BoundsCursor {
            source,
            bounds,
            engine,
            buffered: None,
            closed: false,
        }
    }

    fn accepts(&self, feature: &Feature) -> bool {
        feature
            .geometry()
            .map(|g| self.engine.envelope(g).intersects(&self.bounds))
            .unwrap_or(false)
    }
}

impl<C: Cursor<Item = Feature>> Cursor for BoundsCursor<C> {
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
            if self.accepts(&feature) {
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
