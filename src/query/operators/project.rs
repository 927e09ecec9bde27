// Projection Stage
//
// Restricts each feature to the requested attribute names. The feature id
// is always kept and attribute order follows the source feature.

use crate::feature::Feature;
use crate::query::cursor::Cursor;
use crate::query::result::{QueryError, QueryResult};

pub struct ProjectCursor<C> {
    source: C,
    fields: Vec<String>,
    closed: bool,
}

impl<C: Cursor<Item = Feature>> ProjectCursor<C> {
    pub fn new(source: C, fields: Vec<String>) -> Self {
        ProjectCursor {
            source,
            fields,
            closed: false,
        }
    }
}

impl<C: Cursor<Item = Feature>> Cursor for ProjectCursor<C> {
    type Item = Feature;

    fn has_next(&mut self) -> QueryResult<bool> {
        if self.closed {
            return Ok(false);
        }
        if self.source.has_next()? {
            return Ok(true);
        }
        self.close()?;
        Ok(false)
    }

    fn next(&mut self) -> QueryResult<Feature> {
        if self.closed {
            return Err(QueryError::Exhausted);
        }
        Ok(self.source.next()?.select(&self.fields))
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source.close()
    }
}
