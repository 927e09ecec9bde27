// Cursor Primitive
//
// A single-pass, closeable lazy sequence. `has_next` returning false closes
// the cursor, so loops that run to exhaustion never leak resources.
// Abandoning a cursor early requires an explicit `close`.

use std::iter::Peekable;
use std::marker::PhantomData;

use super::result::{QueryError, QueryResult};
use crate::feature::Feature;

/// Lazy sequence with an explicit lifecycle
pub trait Cursor {
    type Item;

    /// Whether another item is available. Returning false closes the cursor;
    /// further calls keep returning false.
    fn has_next(&mut self) -> QueryResult<bool>;

    /// The next item. Calling this without a preceding true `has_next` is a
    /// contract violation reported as `QueryError::Exhausted` at best.
    fn next(&mut self) -> QueryResult<Self::Item>;

    /// Release resources held by this cursor and everything it wraps.
    /// Idempotent.
    fn close(&mut self) -> QueryResult<()>;

    /// Adapt into a standard iterator that closes the cursor when it ends
    fn iter(self) -> CursorIter<Self>
    where
        Self: Sized,
    {
        CursorIter::new(self)
    }

    /// Number of remaining items; the cursor is closed afterwards
    fn count(mut self) -> QueryResult<usize>
    where
        Self: Sized,
    {
        let mut n = 0;
        drain(&mut self, |_| n += 1)?;
        Ok(n)
    }

    /// Collect the remaining items; the cursor is closed afterwards
    fn read_all(mut self) -> QueryResult<Vec<Self::Item>>
    where
        Self: Sized,
    {
        let mut items = Vec::new();
        drain(&mut self, |item| items.push(item))?;
        Ok(items)
    }
}

/// Pull every item, closing the cursor on success and on failure
fn drain<C, F>(cursor: &mut C, mut f: F) -> QueryResult<()>
where
    C: Cursor,
    F: FnMut(C::Item),
{
    let pulled = (|| -> QueryResult<()> {
        while cursor.has_next()? {
            f(cursor.next()?);
        }
        Ok(())
    })();
    match pulled {
        Ok(()) => cursor.close(),
        Err(e) => {
            // the original failure wins over a secondary close error
            let _ = cursor.close();
            Err(e)
        }
    }
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    type Item = C::Item;

    fn has_next(&mut self) -> QueryResult<bool> {
        (**self).has_next()
    }

    fn next(&mut self) -> QueryResult<Self::Item> {
        (**self).next()
    }

    fn close(&mut self) -> QueryResult<()> {
        (**self).close()
    }
}

/// Type-erased feature cursor produced by datasets and query plans
pub type FeatureCursor = Box<dyn Cursor<Item = Feature>>;

/// Iterator adapter over a cursor
///
/// Yields `Err` at most once; the cursor is closed when iteration ends or
/// fails. Removal is not part of the protocol.
pub struct CursorIter<C: Cursor> {
    cursor: C,
    done: bool,
}

impl<C: Cursor> CursorIter<C> {
    pub fn new(cursor: C) -> Self {
        CursorIter {
            cursor,
            done: false,
        }
    }

    /// Close the underlying cursor without draining it
    pub fn close(&mut self) -> QueryResult<()> {
        self.done = true;
        self.cursor.close()
    }

    fn fail(&mut self, e: QueryError) -> Option<QueryResult<C::Item>> {
        self.done = true;
        let _ = self.cursor.close();
        Some(Err(e))
    }
}

impl<C: Cursor> Iterator for CursorIter<C> {
    type Item = QueryResult<C::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.has_next() {
            Ok(true) => match self.cursor.next() {
                Ok(item) => Some(Ok(item)),
                Err(e) => self.fail(e),
            },
            Ok(false) => {
                self.done = true;
                match self.cursor.close() {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                }
            }
            Err(e) => self.fail(e),
        }
    }
}

/// Cursor over nothing
#[derive(Debug)]
pub struct EmptyCursor<T> {
    _marker: PhantomData<T>,
}

impl<T> Cursor for EmptyCursor<T> {
    type Item = T;

    fn has_next(&mut self) -> QueryResult<bool> {
        Ok(false)
    }

    fn next(&mut self) -> QueryResult<T> {
        Err(QueryError::Exhausted)
    }

    fn close(&mut self) -> QueryResult<()> {
        Ok(())
    }
}

/// Cursor over exactly one item
#[derive(Debug)]
pub struct SingleCursor<T> {
    item: Option<T>,
}

impl<T> Cursor for SingleCursor<T> {
    type Item = T;

    fn has_next(&mut self) -> QueryResult<bool> {
        Ok(self.item.is_some())
    }

    fn next(&mut self) -> QueryResult<T> {
        self.item.take().ok_or(QueryError::Exhausted)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.item = None;
        Ok(())
    }
}

/// Cursor over an in-memory iterator
pub struct IterCursor<I: Iterator> {
    iter: Peekable<I>,
    closed: bool,
}

impl<I: Iterator> Cursor for IterCursor<I> {
    type Item = I::Item;

    fn has_next(&mut self) -> QueryResult<bool> {
        if self.closed {
            return Ok(false);
        }
        if self.iter.peek().is_some() {
            return Ok(true);
        }
        self.close()?;
        Ok(false)
    }

    fn next(&mut self) -> QueryResult<I::Item> {
        if self.closed {
            return Err(QueryError::Exhausted);
        }
        self.iter.next().ok_or(QueryError::Exhausted)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.closed = true;
        Ok(())
    }
}

pub fn empty<T>() -> EmptyCursor<T> {
    EmptyCursor {
        _marker: PhantomData,
    }
}

pub fn single<T>(item: T) -> SingleCursor<T> {
    SingleCursor { item: Some(item) }
}

pub fn from_vec<T>(items: Vec<T>) -> IterCursor<std::vec::IntoIter<T>> {
    from_iter(items)
}

pub fn from_iter<I: IntoIterator>(items: I) -> IterCursor<I::IntoIter> {
    IterCursor {
        iter: items.into_iter().peekable(),
        closed: false,
    }
}
