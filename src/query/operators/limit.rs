// Limit Stage
//
// Emits at most `limit` features and closes its upstream as soon as the
// last one has been handed out.

use log::debug;

use crate::feature::Feature;
use crate::query::cursor::Cursor;
use crate::query::result::{QueryError, QueryResult};

pub struct LimitCursor<C> {
    source: C,
    limit: usize,
    emitted: usize,
    closed: bool,
}

impl<C: Cursor<Item = Feature>> LimitCursor<C> {
    pub fn new(source: C, limit: usize) -> Self {
        LimitCursor {
            source,
            limit,
            emitted: 0,
            closed: false,
        }
    }
}

impl<C: Cursor<Item = Feature>> Cursor for LimitCursor<C> {
    type Item = Feature;

    fn has_next(&mut self) -> QueryResult<bool> {
        if self.closed {
            return Ok(false);
        }
        if self.emitted < self.limit && self.source.has_next()? {
            return Ok(true);
        }
        self.close()?;
        Ok(false)
    }

    fn next(&mut self) -> QueryResult<Feature> {
        if !self.has_next()? {
            return Err(QueryError::Exhausted);
        }
        let feature = self.source.next()?;
        self.emitted += 1;
        if self.emitted == self.limit {
            debug!("limit of {} reached, closing upstream", self.limit);
            self.close()?;
        }
        Ok(feature)
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source.close()
    }
}
