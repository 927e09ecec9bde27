use anyhow::Result;
use geoquery::cql;
use geoquery::query::cursor::{self, Cursor};
use geoquery::query::operators::{FilterCursor, LimitCursor, OffsetCursor, ProjectCursor};
use geoquery::query::{QueryError, QueryPlan, VectorQuery, execute};
use geoquery::{Envelope, PlanarEngine, Value};
use std::sync::Arc;

#[path = "../common/mod.rs"]
mod common;
use common::{ProbeCursor, ids, states};

#[test]
fn test_limit_offset_composition() -> Result<()> {
    for n in [0usize, 1, 5, 10] {
        for limit in [0usize, 1, 3, 10, 20] {
            for offset in [0usize, 1, 4, 10, 15] {
                let (raw, _) = ProbeCursor::numbered(n);
                let query = VectorQuery::new().with_limit(limit).with_offset(offset);
                let expected = limit.min(n.saturating_sub(offset));
                assert_eq!(
                    execute(&query, raw).count()?,
                    expected,
                    "n={} limit={} offset={}",
                    n,
                    limit,
                    offset
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_paging_applies_after_filtering() -> Result<()> {
    let (raw, _) = ProbeCursor::numbered(20);
    let query = VectorQuery::new()
        .with_cql("N >= 10")?
        .with_offset(2)
        .with_limit(3);
    let out = execute(&query, raw).read_all()?;
    assert_eq!(ids(&out), vec!["f.12", "f.13", "f.14"]);
    Ok(())
}

#[test]
fn test_limit_closes_upstream_immediately() -> Result<()> {
    let (raw, probe) = ProbeCursor::numbered(1000);
    let query = VectorQuery::new().with_limit(5);
    let mut cursor = execute(&query, raw);
    let mut seen = 0;
    while seen < 5 {
        assert!(cursor.has_next()?);
        cursor.next()?;
        seen += 1;
    }
    assert!(probe.borrow().closed, "source must be closed as the limit is reached");
    assert_eq!(probe.borrow().pulled, 5);
    assert!(!cursor.has_next()?);
    Ok(())
}

#[test]
fn test_projection_runs_after_filter() -> Result<()> {
    let (raw, _) = ProbeCursor::new(states());
    // the filter reads attributes the projection drops
    let query = VectorQuery::new()
        .with_cql("SAMP_POP > 1000")?
        .with_fields(["STATE_NAME"]);
    let out = execute(&query, raw).read_all()?;
    assert_eq!(ids(&out), vec!["states.1", "states.4"]);
    for feature in &out {
        assert_eq!(feature.names().collect::<Vec<_>>(), vec!["STATE_NAME"]);
    }
    Ok(())
}

#[test]
fn test_bounds_stage() -> Result<()> {
    let (raw, _) = ProbeCursor::new(states());
    let query = VectorQuery::new().with_bounds(Envelope::new(-110.0, 30.0, -100.0, 35.0));
    assert_eq!(ids(&execute(&query, raw).read_all()?), vec!["states.1", "states.5"]);
    Ok(())
}

#[test]
fn test_io_error_propagates_and_chain_still_closes() -> Result<()> {
    let (raw, probe) = ProbeCursor::numbered(10);
    let raw = raw.failing_at(3);
    let query = VectorQuery::new()
        .with_cql("N >= 0")?
        .with_fields(["N"])
        .with_offset(1)
        .with_limit(8);
    let mut cursor = execute(&query, raw);

    let mut pulled = 0;
    let err = loop {
        match cursor.has_next() {
            Ok(true) => {
                cursor.next()?;
                pulled += 1;
            }
            Ok(false) => panic!("source should have failed"),
            Err(e) => break e,
        }
    };
    assert!(matches!(err, QueryError::Io(_)), "unexpected error {:?}", err);
    assert_eq!(pulled, 2);

    cursor.close()?;
    cursor.close()?;
    assert!(probe.borrow().closed);
    Ok(())
}

#[test]
fn test_read_all_closes_on_error() -> Result<()> {
    let (raw, probe) = ProbeCursor::numbered(10);
    let query = VectorQuery::new().with_cql("N > 1")?;
    let result = execute(&query, raw.failing_at(4)).read_all();
    assert!(matches!(result, Err(QueryError::Io(_))));
    assert!(probe.borrow().closed);
    Ok(())
}

#[test]
fn test_close_is_idempotent_and_exhaustion_is_sticky() -> Result<()> {
    let (raw, probe) = ProbeCursor::numbered(2);
    let query = VectorQuery::new().with_cql("N < 10")?.with_offset(1);
    let mut cursor = execute(&query, raw);
    assert!(cursor.has_next()?);
    cursor.next()?;
    assert!(!cursor.has_next()?);
    assert!(!cursor.has_next()?);
    cursor.close()?;
    cursor.close()?;
    assert!(probe.borrow().closed);
    assert!(matches!(cursor.next(), Err(QueryError::Exhausted)));
    Ok(())
}

#[test]
fn test_early_close_releases_source() -> Result<()> {
    let (raw, probe) = ProbeCursor::numbered(100);
    let query = VectorQuery::new().with_cql("N > 10")?;
    let mut cursor = execute(&query, raw);
    assert!(cursor.has_next()?);
    cursor.close()?;
    assert!(probe.borrow().closed);
    assert!(!cursor.has_next()?);
    Ok(())
}

#[test]
fn test_manual_stage_composition() -> Result<()> {
    // the same chain a backend would build by hand
    let (raw, probe) = ProbeCursor::new(states());
    let filtered = FilterCursor::new(raw, cql::parse("PERSONS > 2000000")?, Arc::new(PlanarEngine));
    let projected = ProjectCursor::new(filtered, vec!["STATE_ABBR".to_string()]);
    let offset = OffsetCursor::new(projected, 1);
    let limited = LimitCursor::new(offset, 1);
    let out = limited.read_all()?;
    assert_eq!(ids(&out), vec!["states.2"]);
    assert_eq!(out[0].get("STATE_ABBR"), Some(&Value::from("IA")));
    assert!(probe.borrow().closed);
    Ok(())
}

#[test]
fn test_pushed_down_filter_is_trusted() -> Result<()> {
    let (raw, _) = ProbeCursor::numbered(4);
    let query = VectorQuery::new().with_cql("N > 100")?;
    let cursor = QueryPlan::new(&query).filtered().apply(raw);
    assert_eq!(cursor.count()?, 4);
    Ok(())
}

#[test]
fn test_cursor_iterator_adapter() -> Result<()> {
    let query = VectorQuery::new().with_cql("STATE_NAME LIKE '%a'")?;
    let names = execute(&query, cursor::from_vec(states()))
        .iter()
        .map(|f| f.map(|f| f.id().to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(names, vec!["states.2", "states.4"]);
    Ok(())
}
