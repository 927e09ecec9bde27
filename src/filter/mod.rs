// Filter Module
//
// The expression and filter AST, its canonical CQL rendering and the
// three-valued evaluator.

pub mod value;
pub mod expression;
pub mod filter;
pub mod like;
pub mod eval;

pub use self::value::Value;
pub use self::expression::{ArithmeticOp, Expression};
pub use self::filter::{ComparisonOp, Filter, LogicKind, SpatialOp};
pub use self::like::like_matches;
pub use self::eval::{EvalResult, EvaluationError};
