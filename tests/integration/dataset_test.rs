use std::fs::File;
use std::io::BufReader;

use anyhow::Result;
use geoquery::data::{JsonLinesCursor, read_features};
use geoquery::feature::FieldKind;
use geoquery::geom::GeometryEngine;
use geoquery::query::cursor::{self, Cursor};
use geoquery::query::{FeatureCursor, QueryPlan, QueryResult, VectorDataset, VectorQuery};
use geoquery::{Envelope, Feature, MemoryDataset, PlanarEngine, Schema};

#[path = "../common/mod.rs"]
mod common;
use common::{ids, states, states_file};

fn queries() -> Result<Vec<VectorQuery>> {
    Ok(vec![
        VectorQuery::new(),
        VectorQuery::new().with_limit(2),
        VectorQuery::new().with_offset(3),
        VectorQuery::new().with_offset(2).with_limit(2),
        VectorQuery::new().with_cql("IN ('states.5', 'states.1', 'states.8')")?,
        VectorQuery::new()
            .with_cql("IN ('states.5', 'states.1', 'states.3')")?
            .with_offset(1),
        VectorQuery::new().with_cql("PERSONS > 2000000")?.with_limit(2),
        VectorQuery::new().with_cql("SAMP_POP < 1000 OR P_MALE IS NULL")?,
        VectorQuery::new().with_bounds(Envelope::new(-100.0, 30.0, -70.0, 45.0)),
        VectorQuery::new()
            .with_bounds(Envelope::new(-100.0, 30.0, -70.0, 45.0))
            .with_cql("STATE_NAME <> 'Iowa'")?
            .with_fields(["STATE_NAME"])
            .with_limit(1),
    ])
}

#[test]
fn test_memory_dataset_count_matches_cursor() -> Result<()> {
    let dataset = MemoryDataset::new("states", states());
    for query in queries()? {
        let from_cursor = dataset.cursor(&query)?.count()?;
        assert_eq!(dataset.count(&query)?, from_cursor, "{}", query);
    }
    Ok(())
}

#[test]
fn test_memory_dataset_queries() -> Result<()> {
    let dataset = MemoryDataset::new("states", states());
    let queries = queries()?;
    let run = |q: &VectorQuery| -> Result<Vec<String>> { Ok(ids(&dataset.cursor(q)?.read_all()?)) };

    assert_eq!(run(&queries[4])?, vec!["states.1", "states.5"]);
    assert_eq!(run(&queries[5])?, vec!["states.3", "states.5"]);
    assert_eq!(run(&queries[6])?, vec!["states.1", "states.2"]);
    assert_eq!(run(&queries[7])?, vec!["states.2", "states.3", "states.5"]);
    assert_eq!(run(&queries[8])?, vec!["states.1", "states.2", "states.3", "states.4"]);
    assert_eq!(run(&queries[9])?, vec!["states.1"]);
    Ok(())
}

#[test]
fn test_memory_dataset_schema_and_bounds() -> Result<()> {
    let dataset = MemoryDataset::new("states", states());
    let schema = dataset.schema()?;
    assert_eq!(schema.name(), "states");
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["the_geom", "STATE_NAME", "STATE_ABBR", "SAMP_POP", "P_MALE", "PERSONS"]
    );
    assert_eq!(schema.geometry().map(|f| f.name.as_str()), Some("the_geom"));
    assert_eq!(schema.field("P_MALE").map(|f| f.kind), Some(FieldKind::Float));
    assert_eq!(schema.field("SAMP_POP").map(|f| f.kind), Some(FieldKind::Integer));

    let projected = schema.select(&["PERSONS", "STATE_NAME"]);
    let names: Vec<&str> = projected.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["STATE_NAME", "PERSONS"]);

    assert_eq!(dataset.bounds()?, Envelope::new(-109.1, 25.8, -66.9, 47.5));
    Ok(())
}

/// Backend that answers the bounds clause itself, standing in for a
/// spatially indexed store
struct IndexedDataset {
    features: Vec<Feature>,
}

impl VectorDataset for IndexedDataset {
    fn name(&self) -> &str {
        "indexed"
    }

    fn schema(&self) -> QueryResult<Schema> {
        Ok(Schema::infer("indexed", &self.features))
    }

    fn bounds(&self) -> QueryResult<Envelope> {
        let mut bounds = Envelope::empty();
        for f in &self.features {
            if let Some(g) = f.geometry() {
                bounds.expand_to_include_envelope(&g.envelope());
            }
        }
        Ok(bounds)
    }

    fn cursor(&self, query: &VectorQuery) -> QueryResult<FeatureCursor> {
        let mut plan = QueryPlan::new(query);
        let selected: Vec<Feature> = match query.bounds() {
            Some(bounds) => {
                plan = plan.bounded();
                self.features
                    .iter()
                    .filter(|f| {
                        f.geometry()
                            .map(|g| PlanarEngine.envelope(g).intersects(bounds))
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect()
            }
            None => self.features.clone(),
        };
        Ok(plan.apply(cursor::from_vec(selected)))
    }
}

#[test]
fn test_backend_pushdown_matches_generic_pipeline() -> Result<()> {
    let indexed = IndexedDataset { features: states() };
    let memory = MemoryDataset::new("states", states());
    for query in queries()? {
        assert_eq!(
            ids(&indexed.cursor(&query)?.read_all()?),
            ids(&memory.cursor(&query)?.read_all()?),
            "{}",
            query
        );
        // default count drains the cursor
        assert_eq!(indexed.count(&query)?, memory.count(&query)?, "{}", query);
    }
    Ok(())
}

#[test]
fn test_json_lines_round_trip() -> Result<()> {
    let file = states_file()?;
    let features = read_features(BufReader::new(File::open(file.path())?))?;
    assert_eq!(features.len(), 5);
    assert_eq!(features[0].id(), "states.1");
    assert_eq!(features[0].geometry(), states()[0].geometry());
    assert_eq!(features[4].get("P_MALE"), states()[4].get("P_MALE"));

    // streaming through the pipeline gives the same answer as the memory backend
    let query = VectorQuery::new().with_cql("PERSONS > 2000000 AND STATE_ABBR <> 'TX'")?;
    let streamed = geoquery::query::execute(&query, JsonLinesCursor::new(BufReader::new(File::open(file.path())?)));
    assert_eq!(ids(&streamed.read_all()?), vec!["states.2", "states.4"]);
    Ok(())
}
