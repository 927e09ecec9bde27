// Schema Implementation
//
// Ordered field lists describing the attributes of a dataset's features.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::feature::Feature;
use crate::filter::Value;

/// Attribute types a feature field can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Boolean,
    Integer,
    Float,
    Text,
    Geometry,
}

impl FieldKind {
    /// Kind of a concrete value; `None` for null
    pub fn of(value: &Value) -> Option<FieldKind> {
        match value {
            Value::Null => None,
            Value::Boolean(_) => Some(FieldKind::Boolean),
            Value::Integer(_) => Some(FieldKind::Integer),
            Value::Float(_) => Some(FieldKind::Float),
            Value::Text(_) => Some(FieldKind::Text),
            Value::Geometry(_) => Some(FieldKind::Geometry),
        }
    }

    /// Least general kind able to hold values of both kinds
    fn widen(self, other: FieldKind) -> FieldKind {
        match (self, other) {
            (a, b) if a == b => a,
            (FieldKind::Integer, FieldKind::Float) | (FieldKind::Float, FieldKind::Integer) => {
                FieldKind::Float
            }
            _ => FieldKind::Text,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Boolean => "Boolean",
            FieldKind::Integer => "Integer",
            FieldKind::Float => "Float",
            FieldKind::Text => "Text",
            FieldKind::Geometry => "Geometry",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Field {
            name: name.into(),
            kind,
        }
    }
}

/// Named, ordered field list of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Schema {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The first geometry field
    pub fn geometry(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.kind == FieldKind::Geometry)
    }

    /// Schema of a projection onto `names`, keeping this schema's order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Schema {
        Schema {
            name: self.name.clone(),
            fields: self
                .fields
                .iter()
                .filter(|f| names.iter().any(|n| n.as_ref() == f.name))
                .cloned()
                .collect(),
        }
    }

    /// Infer a schema from sample features. Fields appear in first-seen
    /// order; mixed numeric kinds widen to Float, other mixes to Text, and
    /// fields that are only ever null are typed as Text.
    pub fn infer(name: impl Into<String>, features: &[Feature]) -> Schema {
        let mut fields: Vec<(String, Option<FieldKind>)> = Vec::new();
        for feature in features {
            for (attr, value) in feature.attributes() {
                let kind = FieldKind::of(value);
                match fields.iter_mut().find(|(n, _)| n == attr) {
                    Some((_, existing)) => {
                        *existing = match (*existing, kind) {
                            (Some(a), Some(b)) => Some(a.widen(b)),
                            (a, b) => a.or(b),
                        };
                    }
                    None => fields.push((attr.to_string(), kind)),
                }
            }
        }
        Schema::new(
            name,
            fields
                .into_iter()
                .map(|(n, k)| Field::new(n, k.unwrap_or(FieldKind::Text)))
                .collect(),
        )
    }
}
