#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use anyhow::Result;
use tempfile::NamedTempFile;
use geoquery::data::write_features;
use geoquery::query::{Cursor, QueryError, QueryResult};
use geoquery::{Envelope, Feature, Value};

pub const GEOMETRY: &str = "the_geom";

// A state outline approximated by its bounding rectangle
fn state(id: usize, name: &str, rect: (f64, f64, f64, f64)) -> Feature {
    Feature::new(format!("states.{}", id))
        .with(GEOMETRY, Envelope::new(rect.0, rect.1, rect.2, rect.3).to_geometry())
        .with_geometry_field(GEOMETRY)
        .with("STATE_NAME", name)
}

// Small "states" dataset; New Mexico has no SAMP_POP and a null P_MALE
pub fn states() -> Vec<Feature> {
    vec![
        state(1, "Texas", (-106.6, 25.8, -93.5, 36.5))
            .with("STATE_ABBR", "TX")
            .with("SAMP_POP", 3721i64)
            .with("P_MALE", 0.493)
            .with("PERSONS", 16_986_510i64),
        state(2, "Iowa", (-96.6, 40.4, -90.1, 43.5))
            .with("STATE_ABBR", "IA")
            .with("SAMP_POP", 495i64)
            .with("P_MALE", 0.484)
            .with("PERSONS", 2_776_755i64),
        state(3, "Maine", (-71.1, 43.0, -66.9, 47.5))
            .with("STATE_ABBR", "ME")
            .with("SAMP_POP", 262i64)
            .with("P_MALE", 0.487)
            .with("PERSONS", 1_227_928i64),
        state(4, "Virginia", (-83.7, 36.5, -75.2, 39.5))
            .with("STATE_ABBR", "VA")
            .with("SAMP_POP", 1337i64)
            .with("P_MALE", 0.489)
            .with("PERSONS", 6_187_358i64),
        state(5, "New Mexico", (-109.1, 31.3, -103.0, 37.0))
            .with("STATE_ABBR", "NM")
            .with("P_MALE", Value::Null)
            .with("PERSONS", 1_515_069i64),
    ]
}

pub fn ids(features: &[Feature]) -> Vec<String> {
    features.iter().map(|f| f.id().to_string()).collect()
}

// Write the states dataset as a JSON lines file
pub fn states_file() -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    write_features(&mut file, &states())?;
    file.flush()?;
    Ok(file)
}

/// Shared record of what happened to a `ProbeCursor`
#[derive(Debug, Default)]
pub struct Probe {
    /// Features handed out
    pub pulled: usize,
    /// Set once the cursor has released its features
    pub closed: bool,
}

/// Raw cursor over generated features that records pulls and closes and can
/// fail with an I/O error at a chosen position
pub struct ProbeCursor {
    remaining: Vec<Feature>,
    fail_at: Option<usize>,
    probe: Rc<RefCell<Probe>>,
}

impl ProbeCursor {
    pub fn new(features: Vec<Feature>) -> (Self, Rc<RefCell<Probe>>) {
        let probe = Rc::new(RefCell::new(Probe::default()));
        let mut remaining = features;
        remaining.reverse();
        (
            ProbeCursor {
                remaining,
                fail_at: None,
                probe: probe.clone(),
            },
            probe,
        )
    }

    pub fn numbered(n: usize) -> (Self, Rc<RefCell<Probe>>) {
        Self::new(
            (0..n)
                .map(|i| Feature::new(format!("f.{}", i)).with("N", i as i64))
                .collect(),
        )
    }

    /// Fail the pull of the feature at `position`
    pub fn failing_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }
}

impl Cursor for ProbeCursor {
    type Item = Feature;

    fn has_next(&mut self) -> QueryResult<bool> {
        if self.probe.borrow().closed {
            return Ok(false);
        }
        if self.fail_at == Some(self.probe.borrow().pulled) {
            return Err(QueryError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection reset",
            )));
        }
        if self.remaining.is_empty() {
            self.close()?;
            return Ok(false);
        }
        Ok(true)
    }

    fn next(&mut self) -> QueryResult<Feature> {
        let feature = self.remaining.pop().ok_or(QueryError::Exhausted)?;
        self.probe.borrow_mut().pulled += 1;
        Ok(feature)
    }

    fn close(&mut self) -> QueryResult<()> {
        let mut probe = self.probe.borrow_mut();
        probe.closed = true;
        self.remaining.clear();
        Ok(())
    }
}
