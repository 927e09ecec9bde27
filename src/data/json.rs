// JSON Lines Features
//
// One feature per line:
//
//   {"id": "states.1", "geometry": "POLYGON ((...))", "properties": {"STATE_NAME": "Texas"}}
//
// The geometry is well-known text and is stored as the `geometry`
// attribute, ahead of the properties. Property order is preserved.

use std::io::{BufRead, Write};

use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};
use thiserror::Error;

use crate::cql::{self, SyntaxError};
use crate::feature::Feature;
use crate::filter::Value;
use crate::query::{Cursor, QueryError, QueryResult};

/// Attribute holding the geometry of a decoded feature
pub const GEOMETRY_FIELD: &str = "geometry";

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Decode {
        line: usize,
        source: serde_json::Error,
    },

    #[error("line {line}: invalid geometry: {source}")]
    Geometry { line: usize, source: SyntaxError },

    #[error("line {line}: unsupported value for attribute {name}")]
    Attribute { line: usize, name: String },

    #[error("line {line}: feature id must be a string or a number")]
    Id { line: usize },

    #[error("Encoding error: {0}")]
    Encode(serde_json::Error),
}

pub type JsonResult<T> = Result<T, JsonError>;

impl From<JsonError> for QueryError {
    fn from(e: JsonError) -> Self {
        match e {
            JsonError::Io(io) => QueryError::Io(io),
            other => QueryError::Backend(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FeatureLine {
    #[serde(default)]
    id: JsonValue,
    #[serde(default)]
    geometry: Option<String>,
    #[serde(default)]
    properties: LinkedHashMap<String, JsonValue>,
}

/// Decode one line of JSON text; `line` is used for error reports and as
/// the id of features that carry none
pub fn decode_feature(text: &str, line: usize) -> JsonResult<Feature> {
    let decoded: FeatureLine =
        serde_json::from_str(text).map_err(|source| JsonError::Decode { line, source })?;

    let id = match decoded.id {
        JsonValue::Null => line.to_string(),
        JsonValue::String(s) => s,
        JsonValue::Number(n) => n.to_string(),
        _ => return Err(JsonError::Id { line }),
    };

    let mut feature = Feature::new(id);
    if let Some(wkt) = decoded.geometry {
        let geometry =
            cql::parse_geometry(&wkt).map_err(|source| JsonError::Geometry { line, source })?;
        feature = feature
            .with(GEOMETRY_FIELD, geometry)
            .with_geometry_field(GEOMETRY_FIELD);
    }
    for (name, value) in decoded.properties {
        let value = attribute_value(value).ok_or_else(|| JsonError::Attribute {
            line,
            name: name.clone(),
        })?;
        feature.set(name, value);
    }
    Ok(feature)
}

fn attribute_value(value: JsonValue) -> Option<Value> {
    Some(match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64()?),
        },
        JsonValue::String(s) => Value::Text(s),
        JsonValue::Array(_) | JsonValue::Object(_) => return None,
    })
}

fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Integer(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Geometry(g) => JsonValue::String(g.to_string()),
    }
}

/// Encode a feature as one line of JSON text, without the newline
pub fn encode_feature(feature: &Feature) -> JsonResult<String> {
    let geometry_field = feature.geometry_field();
    let line = FeatureLine {
        id: JsonValue::String(feature.id().to_string()),
        geometry: feature.geometry().map(|g| g.to_string()),
        properties: feature
            .attributes()
            .filter(|(name, _)| Some(*name) != geometry_field)
            .map(|(name, value)| (name.to_string(), json_value(value)))
            .collect(),
    };
    serde_json::to_string(&line).map_err(JsonError::Encode)
}

/// Read every feature from JSON lines, skipping blank lines
pub fn read_features<R: BufRead>(reader: R) -> JsonResult<Vec<Feature>> {
    let mut features = Vec::new();
    for (i, text) in reader.lines().enumerate() {
        let text = text?;
        if text.trim().is_empty() {
            continue;
        }
        features.push(decode_feature(&text, i + 1)?);
    }
    Ok(features)
}

/// Write features as JSON lines
pub fn write_features<'a, W, I>(mut writer: W, features: I) -> JsonResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Feature>,
{
    for feature in features {
        writeln!(writer, "{}", encode_feature(feature)?)?;
    }
    writer.flush()?;
    Ok(())
}

/// Raw cursor decoding features lazily from a JSON lines reader
pub struct JsonLinesCursor<R> {
    reader: Option<R>,
    line: usize,
    buffered: Option<Feature>,
}

impl<R: BufRead> JsonLinesCursor<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesCursor {
            reader: Some(reader),
            line: 0,
            buffered: None,
        }
    }
}

impl<R: BufRead> Cursor for JsonLinesCursor<R> {
    type Item = Feature;

    fn has_next(&mut self) -> QueryResult<bool> {
        if self.buffered.is_some() {
            return Ok(true);
        }
        let mut text = String::new();
        loop {
            let reader = match self.reader.as_mut() {
                Some(reader) => reader,
                None => return Ok(false),
            };
            text.clear();
            if reader.read_line(&mut text)? == 0 {
                self.close()?;
                return Ok(false);
            }
            self.line += 1;
            if !text.trim().is_empty() {
                break;
            }
        }
        self.buffered = Some(decode_feature(text.trim_end(), self.line)?);
        Ok(true)
    }

    fn next(&mut self) -> QueryResult<Feature> {
        if self.buffered.is_none() && !self.has_next()? {
            return Err(QueryError::Exhausted);
        }
        self.buffered.take().ok_or(QueryError::Exhausted)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.reader = None;
        self.buffered = None;
        Ok(())
    }
}
