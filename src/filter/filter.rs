// Filter AST
//
// Boolean-producing nodes. Filters are immutable once built and can be
// shared freely between queries and threads.

use std::collections::BTreeSet;
use std::fmt;

use super::expression::Expression;
use crate::geom::Envelope;

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ComparisonOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Neq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicKind {
    And,
    Or,
    Not,
}

/// Spatial predicate operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialOp {
    Equals,
    Disjoint,
    Intersects,
    Touches,
    Crosses,
    Within,
    Contains,
    Overlaps,
    DWithin,
}

impl SpatialOp {
    pub const ALL: [SpatialOp; 9] = [
        SpatialOp::Equals,
        SpatialOp::Disjoint,
        SpatialOp::Intersects,
        SpatialOp::Touches,
        SpatialOp::Crosses,
        SpatialOp::Within,
        SpatialOp::Contains,
        SpatialOp::Overlaps,
        SpatialOp::DWithin,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SpatialOp::Equals => "EQUALS",
            SpatialOp::Disjoint => "DISJOINT",
            SpatialOp::Intersects => "INTERSECTS",
            SpatialOp::Touches => "TOUCHES",
            SpatialOp::Crosses => "CROSSES",
            SpatialOp::Within => "WITHIN",
            SpatialOp::Contains => "CONTAINS",
            SpatialOp::Overlaps => "OVERLAPS",
            SpatialOp::DWithin => "DWITHIN",
        }
    }

    /// Case-insensitive lookup by CQL name
    pub fn from_name(name: &str) -> Option<SpatialOp> {
        SpatialOp::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }
}

/// A boolean predicate over features
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches everything
    All,
    /// Matches nothing
    None,
    Comparison {
        op: ComparisonOp,
        left: Expression,
        right: Expression,
    },
    Logic {
        kind: LogicKind,
        parts: Vec<Filter>,
    },
    Spatial {
        op: SpatialOp,
        property: Expression,
        geometry: Expression,
        distance: Option<f64>,
        unit: Option<String>,
    },
    Like {
        property: String,
        pattern: String,
        case_sensitive: bool,
    },
    In {
        property: String,
        values: Vec<Expression>,
        negated: bool,
    },
    /// Matches features by identity
    Id(BTreeSet<String>),
    Null {
        property: String,
        negated: bool,
    },
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

impl Filter {
    pub fn comparison(op: ComparisonOp, left: Expression, right: Expression) -> Self {
        Filter::Comparison { op, left, right }
    }

    pub fn equal(left: Expression, right: Expression) -> Self {
        Filter::comparison(ComparisonOp::Eq, left, right)
    }

    /// `BETWEEN` is sugar for `value >= low AND value <= high`
    pub fn between(value: Expression, low: Expression, high: Expression) -> Self {
        Filter::and(vec![
            Filter::comparison(ComparisonOp::Gte, value.clone(), low),
            Filter::comparison(ComparisonOp::Lte, value, high),
        ])
    }

    pub fn and(parts: Vec<Filter>) -> Self {
        Filter::Logic {
            kind: LogicKind::And,
            parts,
        }
    }

    pub fn or(parts: Vec<Filter>) -> Self {
        Filter::Logic {
            kind: LogicKind::Or,
            parts,
        }
    }

    pub fn not(filter: Filter) -> Self {
        Filter::Logic {
            kind: LogicKind::Not,
            parts: vec![filter],
        }
    }

    /// Conjunction that treats `All` as the identity
    pub fn and_also(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (
                Filter::Logic {
                    kind: LogicKind::And,
                    mut parts,
                },
                f,
            ) => {
                parts.push(f);
                Filter::and(parts)
            }
            (a, b) => Filter::and(vec![a, b]),
        }
    }

    pub fn like(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Like {
            property: property.into(),
            pattern: pattern.into(),
            case_sensitive: true,
        }
    }

    pub fn ilike(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Like {
            property: property.into(),
            pattern: pattern.into(),
            case_sensitive: false,
        }
    }

    pub fn in_list(property: impl Into<String>, values: Vec<Expression>) -> Self {
        Filter::In {
            property: property.into(),
            values,
            negated: false,
        }
    }

    pub fn not_in(property: impl Into<String>, values: Vec<Expression>) -> Self {
        Filter::In {
            property: property.into(),
            values,
            negated: true,
        }
    }

    pub fn id<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Id(ids.into_iter().map(Into::into).collect())
    }

    pub fn is_null(property: impl Into<String>) -> Self {
        Filter::Null {
            property: property.into(),
            negated: false,
        }
    }

    pub fn is_not_null(property: impl Into<String>) -> Self {
        Filter::Null {
            property: property.into(),
            negated: true,
        }
    }

    pub fn spatial(op: SpatialOp, property: Expression, geometry: Expression) -> Self {
        Filter::Spatial {
            op,
            property,
            geometry,
            distance: None,
            unit: None,
        }
    }

    pub fn dwithin(
        property: Expression,
        geometry: Expression,
        distance: f64,
        unit: Option<String>,
    ) -> Self {
        Filter::Spatial {
            op: SpatialOp::DWithin,
            property,
            geometry,
            distance: Some(distance),
            unit,
        }
    }

    /// Intersection with the rectangle of an envelope
    pub fn bbox(property: Expression, envelope: &Envelope) -> Self {
        Filter::spatial(
            SpatialOp::Intersects,
            property,
            Expression::literal(envelope.to_geometry()),
        )
    }

    /// Attribute names referenced anywhere in the filter, first occurrence order
    pub fn properties(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_properties(&mut out);
        out
    }

    fn collect_properties(&self, out: &mut Vec<String>) {
        fn push(name: &String, out: &mut Vec<String>) {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }

        match self {
            Filter::All | Filter::None | Filter::Id(_) => {}
            Filter::Comparison { left, right, .. } => {
                left.collect_properties(out);
                right.collect_properties(out);
            }
            Filter::Logic { parts, .. } => parts.iter().for_each(|p| p.collect_properties(out)),
            Filter::Spatial {
                property, geometry, ..
            } => {
                property.collect_properties(out);
                geometry.collect_properties(out);
            }
            Filter::Like { property, .. }
            | Filter::In { property, .. }
            | Filter::Null { property, .. } => push(property, out),
        }
    }

    /// Binding strength used to decide where rendering needs parentheses
    fn precedence(&self) -> u8 {
        match self {
            Filter::Logic { kind, parts } => match (kind, parts.len()) {
                (LogicKind::Not, 0) => 4,
                (LogicKind::Not, _) => 3,
                (_, 0) => 4,
                (_, 1) => parts[0].precedence(),
                (LogicKind::And, _) => 2,
                (LogicKind::Or, _) => 1,
            },
            _ => 4,
        }
    }

    fn fmt_part(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[Expression]) -> fmt::Result {
    write!(f, "(")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    write!(f, ")")
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "INCLUDE"),
            Filter::None => write!(f, "EXCLUDE"),
            Filter::Comparison { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Filter::Logic { kind, parts } => match (kind, parts.as_slice()) {
                (LogicKind::And, []) => write!(f, "INCLUDE"),
                (LogicKind::Or, []) => write!(f, "EXCLUDE"),
                (LogicKind::Not, []) => write!(f, "EXCLUDE"),
                (LogicKind::And | LogicKind::Or, [single]) => write!(f, "{}", single),
                (LogicKind::Not, [single]) => {
                    write!(f, "NOT ")?;
                    single.fmt_part(f, 3)
                }
                (LogicKind::Not, _) => {
                    write!(f, "NOT (")?;
                    write!(f, "{}", Filter::and(parts.clone()))?;
                    write!(f, ")")
                }
                (LogicKind::And | LogicKind::Or, _) => {
                    let (sep, min) = if *kind == LogicKind::And {
                        (" AND ", 2)
                    } else {
                        (" OR ", 1)
                    };
                    for (i, part) in parts.iter().enumerate() {
                        if i > 0 {
                            write!(f, "{}", sep)?;
                        }
                        part.fmt_part(f, min)?;
                    }
                    Ok(())
                }
            },
            Filter::Spatial {
                op,
                property,
                geometry,
                distance,
                ..
            } => {
                write!(f, "{} {} {}", property, op.name(), geometry)?;
                if let Some(d) = distance {
                    write!(f, " {}", d)?;
                }
                Ok(())
            }
            Filter::Like {
                property,
                pattern,
                case_sensitive,
            } => {
                let keyword = if *case_sensitive { "LIKE" } else { "ILIKE" };
                write!(f, "[{}] {} '{}'", property, keyword, pattern.replace('\'', "''"))
            }
            Filter::In {
                property,
                values,
                negated,
            } => {
                write!(f, "[{}] {}", property, if *negated { "NOT IN " } else { "IN " })?;
                write_list(f, values)
            }
            Filter::Id(ids) => {
                write!(f, "IN (")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}'", id.replace('\'', "''"))?;
                }
                write!(f, ")")
            }
            Filter::Null { property, negated } => {
                write!(f, "[{}] IS {}NULL", property, if *negated { "NOT " } else { "" })
            }
        }
    }
}
