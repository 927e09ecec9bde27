// Geometry Engine
//
// The spatial capability consumed by spatial filters and the bounds stage.
// `PlanarEngine` is the default implementation: exact for points, envelopes
// and simple polygons, sample-based for degenerate overlaps of complex shapes.

use super::envelope::Envelope;
use super::geometry::{Coord, Geometry, Polygon};

/// Topological predicates and measurements over geometries
///
/// Implementations must be usable from several threads at once; filters
/// holding an engine are shared read-only across queries.
pub trait GeometryEngine: Send + Sync {
    fn envelope(&self, geometry: &Geometry) -> Envelope {
        geometry.envelope()
    }

    fn equals(&self, a: &Geometry, b: &Geometry) -> bool;

    fn disjoint(&self, a: &Geometry, b: &Geometry) -> bool {
        !self.intersects(a, b)
    }

    fn intersects(&self, a: &Geometry, b: &Geometry) -> bool;

    fn touches(&self, a: &Geometry, b: &Geometry) -> bool;

    fn crosses(&self, a: &Geometry, b: &Geometry) -> bool;

    fn within(&self, a: &Geometry, b: &Geometry) -> bool;

    fn contains(&self, a: &Geometry, b: &Geometry) -> bool {
        self.within(b, a)
    }

    fn overlaps(&self, a: &Geometry, b: &Geometry) -> bool;

    /// Minimum planar distance, zero when the geometries intersect
    fn distance(&self, a: &Geometry, b: &Geometry) -> f64;

    fn dwithin(&self, a: &Geometry, b: &Geometry, distance: f64) -> bool {
        self.distance(a, b) <= distance
    }
}

const EPSILON: f64 = 1e-12;

/// Cartesian-plane implementation of `GeometryEngine`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarEngine;

/// Position of a coordinate relative to a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Location {
    Outside,
    Boundary,
    Inside,
}

impl GeometryEngine for PlanarEngine {
    fn equals(&self, a: &Geometry, b: &Geometry) -> bool {
        a.dimension() == b.dimension() && self.within(a, b) && self.within(b, a)
    }

    fn intersects(&self, a: &Geometry, b: &Geometry) -> bool {
        if !a.envelope().intersects(&b.envelope()) {
            return false;
        }
        a.coords().iter().any(|c| locate(*c, b) != Location::Outside)
            || b.coords().iter().any(|c| locate(*c, a) != Location::Outside)
            || any_segment_pair(a, b, |s, t| segments_intersect(s.0, s.1, t.0, t.1))
    }

    fn touches(&self, a: &Geometry, b: &Geometry) -> bool {
        if a.dimension() == 0 && b.dimension() == 0 {
            return false;
        }
        self.intersects(a, b) && !interiors_intersect(a, b)
    }

    fn crosses(&self, a: &Geometry, b: &Geometry) -> bool {
        let (da, db) = (a.dimension(), b.dimension());
        if da > db {
            return self.crosses(b, a);
        }
        if da < db {
            return interiors_intersect(a, b) && has_exterior_part(a, b);
        }
        if da == 1 {
            return interiors_intersect(a, b) && !has_collinear_overlap(a, b);
        }
        false
    }

    fn within(&self, a: &Geometry, b: &Geometry) -> bool {
        if a.is_empty() || b.is_empty() || a.dimension() > b.dimension() {
            return false;
        }
        if !b.envelope().contains(&a.envelope()) {
            return false;
        }
        if has_exterior_part(a, b) || !interiors_intersect(a, b) {
            return false;
        }
        // b's boundary may not pass through the interior of a polygonal a
        a.dimension() < 2 || !b.coords().iter().any(|c| locate(*c, a) == Location::Inside)
    }

    fn overlaps(&self, a: &Geometry, b: &Geometry) -> bool {
        if a.dimension() != b.dimension() {
            return false;
        }
        if a.dimension() == 1 && !has_collinear_overlap(a, b) {
            return false;
        }
        interiors_intersect(a, b) && has_exterior_part(a, b) && has_exterior_part(b, a)
    }

    fn distance(&self, a: &Geometry, b: &Geometry) -> f64 {
        if a.is_empty() || b.is_empty() {
            return f64::INFINITY;
        }
        if self.intersects(a, b) {
            return 0.0;
        }
        let forward = a
            .coords()
            .iter()
            .map(|c| distance_to_geometry(*c, b))
            .fold(f64::INFINITY, f64::min);
        let backward = b
            .coords()
            .iter()
            .map(|c| distance_to_geometry(*c, a))
            .fold(f64::INFINITY, f64::min);
        forward.min(backward)
    }
}

fn sign(v: f64) -> i8 {
    if v > EPSILON {
        1
    } else if v < -EPSILON {
        -1
    } else {
        0
    }
}

fn orientation(a: Coord, b: Coord, c: Coord) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn same(a: Coord, b: Coord) -> bool {
    (a.x - b.x).abs() <= EPSILON && (a.y - b.y).abs() <= EPSILON
}

fn on_segment(p: Coord, a: Coord, b: Coord) -> bool {
    sign(orientation(a, b, p)) == 0
        && p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

fn segments_intersect(a: Coord, b: Coord, c: Coord, d: Coord) -> bool {
    segments_cross(a, b, c, d)
        || on_segment(a, c, d)
        || on_segment(b, c, d)
        || on_segment(c, a, b)
        || on_segment(d, a, b)
}

/// True when the segments meet at a single point interior to both
fn segments_cross(a: Coord, b: Coord, c: Coord, d: Coord) -> bool {
    let d1 = sign(orientation(c, d, a));
    let d2 = sign(orientation(c, d, b));
    let d3 = sign(orientation(a, b, c));
    let d4 = sign(orientation(a, b, d));
    d1 * d2 < 0 && d3 * d4 < 0
}

fn collinear_overlap(a: Coord, b: Coord, c: Coord, d: Coord) -> bool {
    if sign(orientation(a, b, c)) != 0 || sign(orientation(a, b, d)) != 0 {
        return false;
    }
    let (a0, a1, c0, c1) = if (b.x - a.x).abs() >= (b.y - a.y).abs() {
        (a.x, b.x, c.x, d.x)
    } else {
        (a.y, b.y, c.y, d.y)
    };
    let lo = a0.min(a1).max(c0.min(c1));
    let hi = a0.max(a1).min(c0.max(c1));
    hi - lo > EPSILON
}

fn any_segment_pair<F>(a: &Geometry, b: &Geometry, mut pred: F) -> bool
where
    F: FnMut((Coord, Coord), (Coord, Coord)) -> bool,
{
    let other = b.segments();
    a.segments()
        .into_iter()
        .any(|s| other.iter().any(|t| pred(s, *t)))
}

fn has_collinear_overlap(a: &Geometry, b: &Geometry) -> bool {
    any_segment_pair(a, b, |s, t| collinear_overlap(s.0, s.1, t.0, t.1))
}

fn locate_in_ring(p: Coord, ring: &[Coord]) -> Location {
    if ring.windows(2).any(|w| on_segment(p, w[0], w[1])) {
        return Location::Boundary;
    }
    let mut inside = false;
    for w in ring.windows(2) {
        let (a, b) = (w[0], w[1]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    if inside { Location::Inside } else { Location::Outside }
}

fn locate_in_polygon(p: Coord, polygon: &Polygon) -> Location {
    match locate_in_ring(p, &polygon.exterior) {
        Location::Inside => {
            for hole in &polygon.interiors {
                match locate_in_ring(p, hole) {
                    Location::Inside => return Location::Outside,
                    Location::Boundary => return Location::Boundary,
                    Location::Outside => {}
                }
            }
            Location::Inside
        }
        other => other,
    }
}

fn locate_in_line(p: Coord, line: &[Coord]) -> Location {
    let (first, last) = match (line.first(), line.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Location::Outside,
    };
    if line.len() == 1 {
        return if same(p, first) { Location::Inside } else { Location::Outside };
    }
    if !same(first, last) && (same(p, first) || same(p, last)) {
        return Location::Boundary;
    }
    if line.windows(2).any(|w| on_segment(p, w[0], w[1])) {
        Location::Inside
    } else {
        Location::Outside
    }
}

fn locate(p: Coord, geometry: &Geometry) -> Location {
    match geometry {
        Geometry::Point(c) => {
            if same(p, *c) { Location::Inside } else { Location::Outside }
        }
        Geometry::MultiPoint(cs) => {
            if cs.iter().any(|c| same(p, *c)) { Location::Inside } else { Location::Outside }
        }
        Geometry::LineString(cs) => locate_in_line(p, cs),
        Geometry::MultiLineString(ls) => ls
            .iter()
            .map(|l| locate_in_line(p, l))
            .max()
            .unwrap_or(Location::Outside),
        Geometry::Polygon(poly) => locate_in_polygon(p, poly),
        Geometry::MultiPolygon(ps) => ps
            .iter()
            .map(|poly| locate_in_polygon(p, poly))
            .max()
            .unwrap_or(Location::Outside),
    }
}

/// A point strictly inside the polygon, found on a horizontal scanline
/// placed between two distinct vertex ordinates
fn interior_point(polygon: &Polygon) -> Option<Coord> {
    let mut ys: Vec<f64> = polygon.rings().flatten().map(|c| c.y).collect();
    ys.sort_by(|a, b| a.total_cmp(b));
    ys.dedup_by(|a, b| (*a - *b).abs() <= EPSILON);
    if ys.len() < 2 {
        return None;
    }
    let mid = ys.len() / 2;
    let y = (ys[mid - 1] + ys[mid]) / 2.0;

    let mut xs = Vec::new();
    for ring in polygon.rings() {
        for w in ring.windows(2) {
            let (a, b) = (w[0], w[1]);
            if (a.y > y) != (b.y > y) {
                xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
    }
    xs.sort_by(|a, b| a.total_cmp(b));

    xs.chunks(2)
        .filter(|pair| pair.len() == 2 && pair[1] - pair[0] > EPSILON)
        .max_by(|p, q| (p[1] - p[0]).total_cmp(&(q[1] - q[0])))
        .map(|pair| Coord::new((pair[0] + pair[1]) / 2.0, y))
}

/// Vertices, segment midpoints and polygon interior points; every sample
/// lies in the closure of the geometry's interior
fn samples(geometry: &Geometry) -> Vec<Coord> {
    let mut out = geometry.coords();
    out.extend(
        geometry
            .segments()
            .iter()
            .map(|(a, b)| Coord::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)),
    );
    out.extend(geometry.polygons().into_iter().filter_map(interior_point));
    out
}

fn interiors_intersect(a: &Geometry, b: &Geometry) -> bool {
    if a.dimension() >= 1
        && b.dimension() >= 1
        && any_segment_pair(a, b, |s, t| segments_cross(s.0, s.1, t.0, t.1))
    {
        return true;
    }
    if a.dimension() == 1 && b.dimension() == 1 && has_collinear_overlap(a, b) {
        return true;
    }
    let interior_hit = |from: &Geometry, into: &Geometry| {
        samples(from).into_iter().any(|s| {
            locate(s, into) == Location::Inside
                && (into.dimension() == 2 || locate(s, from) == Location::Inside)
        })
    };
    interior_hit(a, b) || interior_hit(b, a)
}

/// True when some part of `a` lies outside `b`
fn has_exterior_part(a: &Geometry, b: &Geometry) -> bool {
    if samples(a).into_iter().any(|s| locate(s, b) == Location::Outside) {
        return true;
    }
    a.dimension() >= 1
        && b.dimension() >= 1
        && any_segment_pair(a, b, |s, t| segments_cross(s.0, s.1, t.0, t.1))
}

fn point_segment_distance(p: Coord, a: Coord, b: Coord) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 <= EPSILON {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

fn distance_to_geometry(p: Coord, geometry: &Geometry) -> f64 {
    let segments = geometry.segments();
    if segments.is_empty() {
        return geometry
            .coords()
            .iter()
            .map(|c| ((p.x - c.x).powi(2) + (p.y - c.y).powi(2)).sqrt())
            .fold(f64::INFINITY, f64::min);
    }
    segments
        .iter()
        .map(|(a, b)| point_segment_distance(p, *a, *b))
        .fold(f64::INFINITY, f64::min)
}
