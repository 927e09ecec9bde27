// Feature Implementation
//
// A feature is the record that filters evaluate against: an identity string,
// an ordered set of named attributes and an optional geometry attribute.

use std::fmt;

use linked_hash_map::LinkedHashMap;

use crate::filter::Value;
use crate::geom::Geometry;

/// A named-attribute record with an identity
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: String,
    attributes: LinkedHashMap<String, Value>,
    geometry_field: Option<String>,
}

impl Feature {
    pub fn new(id: impl Into<String>) -> Self {
        Feature {
            id: id.into(),
            attributes: LinkedHashMap::new(),
            geometry_field: None,
        }
    }

    /// Builder form of `set`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Declare which attribute holds the default geometry
    pub fn with_geometry_field(mut self, name: impl Into<String>) -> Self {
        self.geometry_field = Some(name.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up an attribute; `None` means the attribute is not defined on
    /// this feature, which is distinct from a present `Value::Null`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.get_mut(&name) {
            Some(slot) => *slot = value,
            None => {
                self.attributes.insert(name, value);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// Attribute names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(|k| k.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Name of the default geometry attribute: the declared one, otherwise
    /// the first attribute holding a geometry
    pub fn geometry_field(&self) -> Option<&str> {
        if let Some(name) = &self.geometry_field {
            return Some(name.as_str());
        }
        self.attributes
            .iter()
            .find(|(_, v)| matches!(v, Value::Geometry(_)))
            .map(|(k, _)| k.as_str())
    }

    /// The default geometry, if present and not null
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry_field()
            .and_then(|name| self.get(name))
            .and_then(|v| v.as_geometry())
    }

    /// Copy of this feature restricted to the named attributes, in the
    /// feature's own attribute order. The id is always retained.
    pub fn select<S: AsRef<str>>(&self, fields: &[S]) -> Feature {
        let attributes = self
            .attributes
            .iter()
            .filter(|(k, _)| fields.iter().any(|f| f.as_ref() == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let geometry_field = self
            .geometry_field
            .as_ref()
            .filter(|g| fields.iter().any(|f| f.as_ref() == g.as_str()))
            .cloned();
        Feature {
            id: self.id.clone(),
            attributes,
            geometry_field,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.id)?;
        for (i, (k, v)) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {}", k, v)?;
        }
        write!(f, " }}")
    }
}
