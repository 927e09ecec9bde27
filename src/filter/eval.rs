// Expression and Filter Evaluation
//
// Three-valued evaluation against a feature. An absent attribute evaluates to
// `None` (undefined), which propagates through arithmetic and comparisons and
// makes predicates unknown. Logic follows the Kleene tables; matching coerces
// unknown to false.

use std::cmp::Ordering;

use thiserror::Error;

use super::expression::{ArithmeticOp, Expression};
use super::filter::{ComparisonOp, Filter, LogicKind, SpatialOp};
use super::like::like_matches;
use super::value::Value;
use crate::feature::Feature;
use crate::geom::{Coord, Geometry, GeometryEngine, PlanarEngine, Polygon};

/// Errors raised for structurally invalid expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type EvalResult<T> = Result<T, EvaluationError>;

impl Expression {
    /// Evaluate against a feature; `Ok(None)` means undefined
    pub fn evaluate(&self, feature: &Feature) -> EvalResult<Option<Value>> {
        match self {
            Expression::Literal(value) => Ok(Some(value.clone())),
            Expression::PropertyRef(name) => Ok(feature.get(name).cloned()),
            Expression::BinaryArithmetic { op, left, right } => {
                let l = left.evaluate(feature)?;
                let r = right.evaluate(feature)?;
                Ok(match (l, r) {
                    (Some(l), Some(r)) => arithmetic(*op, &l, &r),
                    _ => None,
                })
            }
            Expression::FunctionCall { name, args } => {
                if !self.is_geometry_constructor() {
                    return Err(EvaluationError::UnknownFunction(name.clone()));
                }
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    match arg.evaluate(feature)? {
                        Some(v) => values.push(v),
                        None => return Ok(None),
                    }
                }
                let upper = name.to_ascii_uppercase();
                match construct_geometry(&upper, values) {
                    Ok(g) => Ok(Some(Value::Geometry(g))),
                    // badly shaped feature data is undefined, bad literals are errors
                    Err(EvaluationError::InvalidGeometry(_)) if !self.properties().is_empty() => {
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}

fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Option<Value> {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        let checked = match op {
            ArithmeticOp::Add => a.checked_add(*b),
            ArithmeticOp::Sub => a.checked_sub(*b),
            ArithmeticOp::Mul => a.checked_mul(*b),
            ArithmeticOp::Div => None,
        };
        if let Some(v) = checked {
            return Some(Value::Integer(v));
        }
    }
    let (a, b) = (left.as_f64()?, right.as_f64()?);
    let result = match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Sub => a - b,
        ArithmeticOp::Mul => a * b,
        ArithmeticOp::Div => {
            if b == 0.0 {
                return None;
            }
            a / b
        }
    };
    Some(Value::Float(result))
}

fn coordinate(value: &Value) -> EvalResult<f64> {
    value.as_f64().ok_or_else(|| {
        EvaluationError::InvalidGeometry(format!("expected a coordinate, found {}", value))
    })
}

fn expect_point(value: &Value) -> EvalResult<Coord> {
    match value {
        Value::Geometry(Geometry::Point(c)) => Ok(*c),
        other => Err(EvaluationError::InvalidGeometry(format!(
            "expected a point, found {}",
            other
        ))),
    }
}

fn expect_path(value: &Value) -> EvalResult<Vec<Coord>> {
    match value {
        Value::Geometry(Geometry::LineString(cs)) => Ok(cs.clone()),
        other => Err(EvaluationError::InvalidGeometry(format!(
            "expected a coordinate sequence, found {}",
            other
        ))),
    }
}

fn expect_polygon(value: &Value) -> EvalResult<Polygon> {
    match value {
        Value::Geometry(Geometry::Polygon(p)) => Ok(p.clone()),
        other => Err(EvaluationError::InvalidGeometry(format!(
            "expected a polygon, found {}",
            other
        ))),
    }
}

/// Build a geometry from an evaluated constructor call
fn construct_geometry(name: &str, args: Vec<Value>) -> EvalResult<Geometry> {
    match name {
        "POINT" => match args.as_slice() {
            [x, y] => Ok(Geometry::point(coordinate(x)?, coordinate(y)?)),
            _ => Err(EvaluationError::InvalidGeometry(format!(
                "POINT takes 2 coordinates, found {}",
                args.len()
            ))),
        },
        "LINESTRING" => {
            let coords = args.iter().map(expect_point).collect::<EvalResult<Vec<_>>>()?;
            if coords.len() == 1 {
                return Err(EvaluationError::InvalidGeometry(
                    "LINESTRING needs at least 2 points".to_string(),
                ));
            }
            Ok(Geometry::LineString(coords))
        }
        "POLYGON" => {
            let mut rings = args.iter().map(expect_path).collect::<EvalResult<Vec<_>>>()?;
            if rings.is_empty() {
                return Ok(Geometry::Polygon(Polygon::new(Vec::new(), Vec::new())));
            }
            let exterior = rings.remove(0);
            let polygon = Polygon::new(exterior, rings);
            if polygon.rings().any(|r| r.len() < 4) {
                return Err(EvaluationError::InvalidGeometry(
                    "POLYGON rings need at least 3 distinct points".to_string(),
                ));
            }
            Ok(Geometry::Polygon(polygon))
        }
        "MULTIPOINT" => Ok(Geometry::MultiPoint(
            args.iter().map(expect_point).collect::<EvalResult<_>>()?,
        )),
        "MULTILINESTRING" => Ok(Geometry::MultiLineString(
            args.iter().map(expect_path).collect::<EvalResult<_>>()?,
        )),
        "MULTIPOLYGON" => Ok(Geometry::MultiPolygon(
            args.iter().map(expect_polygon).collect::<EvalResult<_>>()?,
        )),
        _ => Err(EvaluationError::UnknownFunction(name.to_string())),
    }
}

/// Kleene conjunction over part results
fn all_of<I>(results: I) -> Option<bool>
where
    I: IntoIterator<Item = Option<bool>>,
{
    let mut unknown = false;
    for r in results {
        match r {
            Some(false) => return Some(false),
            None => unknown = true,
            Some(true) => {}
        }
    }
    if unknown { None } else { Some(true) }
}

/// Kleene disjunction over part results
fn any_of<I>(results: I) -> Option<bool>
where
    I: IntoIterator<Item = Option<bool>>,
{
    let mut unknown = false;
    for r in results {
        match r {
            Some(true) => return Some(true),
            None => unknown = true,
            Some(false) => {}
        }
    }
    if unknown { None } else { Some(false) }
}

fn compare(op: ComparisonOp, left: &Value, right: &Value) -> Option<bool> {
    if left.is_null() || right.is_null() {
        return None;
    }
    Some(match op {
        ComparisonOp::Eq => left.loose_eq(right),
        ComparisonOp::Neq => !left.loose_eq(right),
        ComparisonOp::Lt => left.compare(right)? == Ordering::Less,
        ComparisonOp::Lte => left.compare(right)? != Ordering::Greater,
        ComparisonOp::Gt => left.compare(right)? == Ordering::Greater,
        ComparisonOp::Gte => left.compare(right)? != Ordering::Less,
    })
}

fn evaluate_geometry(expr: &Expression, feature: &Feature) -> EvalResult<Option<Geometry>> {
    Ok(match expr.evaluate(feature)? {
        Some(Value::Geometry(g)) => Some(g),
        _ => None,
    })
}

impl Filter {
    /// Three-valued evaluation with the default planar engine
    pub fn evaluate(&self, feature: &Feature) -> EvalResult<Option<bool>> {
        self.evaluate_with(feature, &PlanarEngine)
    }

    /// Three-valued evaluation; `Ok(None)` means unknown
    pub fn evaluate_with(
        &self,
        feature: &Feature,
        engine: &dyn GeometryEngine,
    ) -> EvalResult<Option<bool>> {
        match self {
            Filter::All => Ok(Some(true)),
            Filter::None => Ok(Some(false)),
            Filter::Comparison { op, left, right } => {
                let l = left.evaluate(feature)?;
                let r = right.evaluate(feature)?;
                Ok(match (l, r) {
                    (Some(l), Some(r)) => compare(*op, &l, &r),
                    _ => None,
                })
            }
            Filter::Logic { kind, parts } => {
                // every part is evaluated so that errors surface consistently
                let results = parts
                    .iter()
                    .map(|p| p.evaluate_with(feature, engine))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(match kind {
                    LogicKind::And => all_of(results),
                    LogicKind::Or => any_of(results),
                    LogicKind::Not => all_of(results).map(|b| !b),
                })
            }
            Filter::Spatial {
                op,
                property,
                geometry,
                distance,
                ..
            } => {
                let distance = match (op, distance) {
                    (SpatialOp::DWithin, None) => {
                        return Err(EvaluationError::InvalidArgument(
                            "DWITHIN requires a distance".to_string(),
                        ));
                    }
                    (_, d) => d.unwrap_or(0.0),
                };
                let a = evaluate_geometry(property, feature)?;
                let b = evaluate_geometry(geometry, feature)?;
                let (a, b) = match (a, b) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Ok(None),
                };
                Ok(Some(match op {
                    SpatialOp::Equals => engine.equals(&a, &b),
                    SpatialOp::Disjoint => engine.disjoint(&a, &b),
                    SpatialOp::Intersects => engine.intersects(&a, &b),
                    SpatialOp::Touches => engine.touches(&a, &b),
                    SpatialOp::Crosses => engine.crosses(&a, &b),
                    SpatialOp::Within => engine.within(&a, &b),
                    SpatialOp::Contains => engine.contains(&a, &b),
                    SpatialOp::Overlaps => engine.overlaps(&a, &b),
                    SpatialOp::DWithin => engine.dwithin(&a, &b, distance),
                }))
            }
            Filter::Like {
                property,
                pattern,
                case_sensitive,
            } => Ok(match feature.get(property) {
                Some(Value::Text(s)) => Some(like_matches(pattern, s, *case_sensitive)),
                _ => None,
            }),
            Filter::In {
                property,
                values,
                negated,
            } => {
                let actual = match feature.get(property) {
                    Some(v) if !v.is_null() => v,
                    _ => return Ok(None),
                };
                let mut found = false;
                for candidate in values {
                    if let Some(v) = candidate.evaluate(feature)? {
                        if actual.loose_eq(&v) {
                            found = true;
                            break;
                        }
                    }
                }
                Ok(Some(found != *negated))
            }
            Filter::Id(ids) => Ok(Some(ids.contains(feature.id()))),
            // an absent attribute is neither null nor not-null
            Filter::Null { property, negated } => Ok(Some(
                feature.get(property).is_some_and(|v| v.is_null() != *negated),
            )),
        }
    }

    /// Whether the feature matches; unknown results do not match
    pub fn matches(&self, feature: &Feature) -> EvalResult<bool> {
        Ok(self.evaluate(feature)?.unwrap_or(false))
    }

    pub fn matches_with(&self, feature: &Feature, engine: &dyn GeometryEngine) -> EvalResult<bool> {
        Ok(self.evaluate_with(feature, engine)?.unwrap_or(false))
    }
}
