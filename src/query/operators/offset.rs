// Offset Stage
//
// Discards the first `offset` features that reach it.

use crate::feature::Feature;
use crate::query::cursor::Cursor;
use crate::query::result::{QueryError, QueryResult};

pub struct OffsetCursor<C> {
    source: C,
    remaining: usize,
    closed: bool,
}

impl<C: Cursor<Item = Feature>> OffsetCursor<C> {
    pub fn new(source: C, offset: usize) -> Self {
        OffsetCursor {
            source,
            remaining: offset,
            closed: false,
        }
    }
}

impl<C: Cursor<Item = Feature>> Cursor for OffsetCursor<C> {
    type Item = Feature;

    fn has_next(&mut self) -> QueryResult<bool> {
        if self.closed {
            return Ok(false);
        }
        while self.remaining > 0 && self.source.has_next()? {
            self.source.next()?;
            self.remaining -= 1;
        }
        if self.source.has_next()? {
            return Ok(true);
        }
        self.close()?;
        Ok(false)
    }

    fn next(&mut self) -> QueryResult<Feature> {
        if !self.has_next()? {
            return Err(QueryError::Exhausted);
        }
        self.source.next()
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source.close()
    }
}
