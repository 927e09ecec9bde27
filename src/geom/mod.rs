// Geometry Module
//
// Planar geometry primitives used by spatial filters and by bounds checks
// in the query pipeline. Topological predicates are provided through the
// `GeometryEngine` capability so backends can supply their own.

pub mod envelope;
pub mod geometry;
pub mod engine;

pub use self::envelope::Envelope;
pub use self::geometry::{Coord, Geometry, Polygon};
pub use self::engine::{GeometryEngine, PlanarEngine};
