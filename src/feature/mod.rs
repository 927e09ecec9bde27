// Feature Module
//
// Records and their schemas.

pub mod feature;
pub mod schema;

pub use self::feature::Feature;
pub use self::schema::{Field, FieldKind, Schema};
