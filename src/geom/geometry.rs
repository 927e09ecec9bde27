// Geometry Types
//
// Simple-feature geometries with well-known-text rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::envelope::Envelope;

/// A planar coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }
}

/// Polygon with one exterior ring and zero or more holes; rings are closed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Coord>,
    pub interiors: Vec<Vec<Coord>>,
}

impl Polygon {
    /// Create a polygon, closing any ring whose last coordinate differs from its first
    pub fn new(exterior: Vec<Coord>, interiors: Vec<Vec<Coord>>) -> Self {
        Polygon {
            exterior: close_ring(exterior),
            interiors: interiors.into_iter().map(close_ring).collect(),
        }
    }

    /// Exterior ring followed by the holes
    pub fn rings(&self) -> impl Iterator<Item = &Vec<Coord>> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }
}

fn close_ring(mut ring: Vec<Coord>) -> Vec<Coord> {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}

/// A simple-feature geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Polygon),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Coord::new(x, y))
    }

    /// The WKT tag of this geometry
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "POINT",
            Geometry::LineString(_) => "LINESTRING",
            Geometry::Polygon(_) => "POLYGON",
            Geometry::MultiPoint(_) => "MULTIPOINT",
            Geometry::MultiLineString(_) => "MULTILINESTRING",
            Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        }
    }

    /// Topological dimension: 0 for points, 1 for lines, 2 for polygons
    pub fn dimension(&self) -> u8 {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => 0,
            Geometry::LineString(_) | Geometry::MultiLineString(_) => 1,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.is_empty(),
            Geometry::Polygon(p) => p.exterior.is_empty(),
            Geometry::MultiLineString(ls) => ls.iter().all(|l| l.is_empty()),
            Geometry::MultiPolygon(ps) => ps.iter().all(|p| p.exterior.is_empty()),
        }
    }

    /// Every vertex of the geometry, rings included
    pub fn coords(&self) -> Vec<Coord> {
        match self {
            Geometry::Point(c) => vec![*c],
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.clone(),
            Geometry::Polygon(p) => p.rings().flatten().copied().collect(),
            Geometry::MultiLineString(ls) => ls.iter().flatten().copied().collect(),
            Geometry::MultiPolygon(ps) => ps
                .iter()
                .flat_map(|p| p.rings().flatten().copied().collect::<Vec<_>>())
                .collect(),
        }
    }

    /// Line segments of linear components and polygon rings
    pub fn segments(&self) -> Vec<(Coord, Coord)> {
        fn push_path(out: &mut Vec<(Coord, Coord)>, path: &[Coord]) {
            out.extend(path.windows(2).map(|w| (w[0], w[1])));
        }

        let mut out = Vec::new();
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => {}
            Geometry::LineString(cs) => push_path(&mut out, cs),
            Geometry::MultiLineString(ls) => ls.iter().for_each(|l| push_path(&mut out, l)),
            Geometry::Polygon(p) => p.rings().for_each(|r| push_path(&mut out, r)),
            Geometry::MultiPolygon(ps) => ps
                .iter()
                .for_each(|p| p.rings().for_each(|r| push_path(&mut out, r))),
        }
        out
    }

    /// Polygonal components, empty for points and lines
    pub fn polygons(&self) -> Vec<&Polygon> {
        match self {
            Geometry::Polygon(p) => vec![p],
            Geometry::MultiPolygon(ps) => ps.iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn envelope(&self) -> Envelope {
        let mut env = Envelope::empty();
        for c in self.coords() {
            env.expand_to_include(c);
        }
        env
    }
}

impl From<Envelope> for Geometry {
    fn from(env: Envelope) -> Self {
        env.to_geometry()
    }
}

fn write_coords(f: &mut fmt::Formatter<'_>, coords: &[Coord]) -> fmt::Result {
    write!(f, "(")?;
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} {}", c.x, c.y)?;
    }
    write!(f, ")")
}

fn write_polygon(f: &mut fmt::Formatter<'_>, polygon: &Polygon) -> fmt::Result {
    write!(f, "(")?;
    for (i, ring) in polygon.rings().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_coords(f, ring)?;
    }
    write!(f, ")")
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{} EMPTY", self.kind());
        }
        write!(f, "{} ", self.kind())?;
        match self {
            Geometry::Point(c) => write!(f, "({} {})", c.x, c.y),
            Geometry::LineString(cs) => write_coords(f, cs),
            Geometry::Polygon(p) => write_polygon(f, p),
            Geometry::MultiPoint(cs) => {
                write!(f, "(")?;
                for (i, c) in cs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "({} {})", c.x, c.y)?;
                }
                write!(f, ")")
            }
            Geometry::MultiLineString(ls) => {
                write!(f, "(")?;
                for (i, l) in ls.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_coords(f, l)?;
                }
                write!(f, ")")
            }
            Geometry::MultiPolygon(ps) => {
                write!(f, "(")?;
                for (i, p) in ps.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_polygon(f, p)?;
                }
                write!(f, ")")
            }
        }
    }
}
