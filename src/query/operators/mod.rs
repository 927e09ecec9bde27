// Query Pipeline Stages
//
// Decorator cursors, one per query clause. Each owns exactly one upstream
// cursor and closes it when closed itself or exhausted.

pub mod bounds;
pub mod filter;
pub mod project;
pub mod offset;
pub mod limit;

pub use self::bounds::BoundsCursor;
pub use self::filter::FilterCursor;
pub use self::project::ProjectCursor;
pub use self::offset::OffsetCursor;
pub use self::limit::LimitCursor;
