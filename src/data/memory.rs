// In-Memory Dataset
//
// Reference backend holding its features in a shared vector. Id filters are
// answered by direct lookup, and paging is applied natively whenever no
// generic stage has to run before it.

use std::sync::Arc;

use log::debug;

use crate::feature::{Feature, Schema};
use crate::filter::Filter;
use crate::geom::Envelope;
use crate::query::{Cursor, FeatureCursor, QueryError, QueryPlan, QueryResult, VectorDataset, VectorQuery};

#[derive(Debug, Clone)]
pub struct MemoryDataset {
    name: String,
    schema: Schema,
    features: Arc<Vec<Feature>>,
}

impl MemoryDataset {
    /// Create a dataset whose schema is inferred from the features
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        let name = name.into();
        let schema = Schema::infer(name.clone(), &features);
        MemoryDataset {
            name,
            schema,
            features: Arc::new(features),
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Positions of the features the raw cursor yields, plus the plan
    /// recording which clauses that already covers
    fn plan<'a>(&self, query: &'a VectorQuery) -> (Vec<usize>, QueryPlan<'a>) {
        let mut plan = QueryPlan::new(query);
        let mut positions: Vec<usize> = match query.filter() {
            Filter::Id(ids) => {
                debug!("{}: id filter pushed down ({} ids)", self.name, ids.len());
                plan = plan.filtered();
                self.features
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| ids.contains(f.id()))
                    .map(|(i, _)| i)
                    .collect()
            }
            Filter::All => (0..self.features.len()).collect(),
            _ => return ((0..self.features.len()).collect(), plan),
        };

        if query.bounds().is_none() {
            let start = query.offset().min(positions.len());
            let end = query
                .limit()
                .map_or(positions.len(), |l| start.saturating_add(l).min(positions.len()));
            debug!("{}: paging pushed down ({}..{})", self.name, start, end);
            positions = positions[start..end].to_vec();
            plan = plan.offsetted().limited();
        }
        (positions, plan)
    }
}

impl VectorDataset for MemoryDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> QueryResult<Schema> {
        Ok(self.schema.clone())
    }

    fn bounds(&self) -> QueryResult<Envelope> {
        let mut bounds = Envelope::empty();
        for geometry in self.features.iter().filter_map(Feature::geometry) {
            bounds.expand_to_include_envelope(&geometry.envelope());
        }
        Ok(bounds)
    }

    fn cursor(&self, query: &VectorQuery) -> QueryResult<FeatureCursor> {
        let (positions, plan) = self.plan(query);
        let raw = MemoryCursor::new(self.features.clone(), positions);
        Ok(plan.apply(raw))
    }

    fn count(&self, query: &VectorQuery) -> QueryResult<usize> {
        let (positions, plan) = self.plan(query);
        if plan.stages().iter().all(|s| *s == "project") {
            return Ok(positions.len());
        }
        plan.apply(MemoryCursor::new(self.features.clone(), positions)).count()
    }
}

/// Raw cursor over selected positions of a shared feature vector
pub struct MemoryCursor {
    features: Arc<Vec<Feature>>,
    positions: Vec<usize>,
    index: usize,
    closed: bool,
}

impl MemoryCursor {
    pub fn new(features: Arc<Vec<Feature>>, positions: Vec<usize>) -> Self {
        MemoryCursor {
            features,
            positions,
            index: 0,
            closed: false,
        }
    }
}

impl Cursor for MemoryCursor {
    type Item = Feature;

    fn has_next(&mut self) -> QueryResult<bool> {
        if self.closed {
            return Ok(false);
        }
        if self.index < self.positions.len() {
            return Ok(true);
        }
        self.close()?;
        Ok(false)
    }

    fn next(&mut self) -> QueryResult<Feature> {
        if self.closed {
            return Err(QueryError::Exhausted);
        }
        let position = *self.positions.get(self.index).ok_or(QueryError::Exhausted)?;
        self.index += 1;
        self.features
            .get(position)
            .cloned()
            .ok_or_else(|| QueryError::Backend(format!("no feature at position {}", position)))
    }

    fn close(&mut self) -> QueryResult<()> {
        self.closed = true;
        self.positions.clear();
        Ok(())
    }
}
