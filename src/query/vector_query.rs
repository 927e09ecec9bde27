// Vector Query Descriptor
//
// Immutable description of what a caller wants from a dataset: an optional
// bounding rectangle, an attribute filter, an optional field list and
// offset/limit paging.

use std::fmt;

use crate::cql::{self, ParseResult};
use crate::filter::Filter;
use crate::geom::Envelope;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorQuery {
    bounds: Option<Envelope>,
    filter: Filter,
    fields: Option<Vec<String>>,
    limit: Option<usize>,
    offset: usize,
}

impl VectorQuery {
    /// A query selecting every feature
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(mut self, bounds: Envelope) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Parse `text` as CQL and use it as the filter
    pub fn with_cql(self, text: &str) -> ParseResult<Self> {
        Ok(self.with_filter(cql::parse(text)?))
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn bounds(&self) -> Option<&Envelope> {
        self.bounds.as_ref()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Attributes a backend must read to answer this query when it projects
    /// natively before filtering. `None` means every attribute.
    pub fn required_fields(&self) -> Option<Vec<String>> {
        let mut required = self.fields.clone()?;
        for name in self.filter.properties() {
            if !required.contains(&name) {
                required.push(name);
            }
        }
        Some(required)
    }
}

impl fmt::Display for VectorQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "filter={}", self.filter)?;
        if let Some(bounds) = &self.bounds {
            write!(f, " bounds={}", bounds)?;
        }
        if let Some(fields) = &self.fields {
            write!(f, " fields=[{}]", fields.join(", "))?;
        }
        if self.offset > 0 {
            write!(f, " offset={}", self.offset)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit={}", limit)?;
        }
        Ok(())
    }
}
