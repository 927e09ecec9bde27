// Expression AST
//
// Value-producing nodes: literals, property references, arithmetic and
// function calls. Geometry literals are function calls named after their
// WKT tag (POINT, LINESTRING, POLYGON and the multi-variants).

use std::fmt;

use super::value::Value;
use crate::feature::Feature;

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            ArithmeticOp::Add | ArithmeticOp::Sub => 1,
            ArithmeticOp::Mul | ArithmeticOp::Div => 2,
        }
    }
}

/// Names of the geometry constructor functions
pub const GEOMETRY_FUNCTIONS: [&str; 6] = [
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
];

/// A value-producing expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    PropertyRef(String),
    BinaryArithmetic {
        op: ArithmeticOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn property(name: impl Into<String>) -> Self {
        Expression::PropertyRef(name.into())
    }

    pub fn arithmetic(op: ArithmeticOp, left: Expression, right: Expression) -> Self {
        Expression::BinaryArithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// `POINT(x, y)` constructor call
    pub fn point(x: f64, y: f64) -> Self {
        Expression::function("POINT", vec![Expression::literal(x), Expression::literal(y)])
    }

    /// Whether this is a call to one of the geometry constructors
    pub fn is_geometry_constructor(&self) -> bool {
        match self {
            Expression::FunctionCall { name, .. } => {
                GEOMETRY_FUNCTIONS.iter().any(|g| g.eq_ignore_ascii_case(name))
            }
            _ => false,
        }
    }

    /// Property names referenced by this expression, first occurrence order
    pub fn properties(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_properties(&mut out);
        out
    }

    pub(crate) fn collect_properties(&self, out: &mut Vec<String>) {
        match self {
            Expression::Literal(_) => {}
            Expression::PropertyRef(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expression::BinaryArithmetic { left, right, .. } => {
                left.collect_properties(out);
                right.collect_properties(out);
            }
            Expression::FunctionCall { args, .. } => {
                args.iter().for_each(|a| a.collect_properties(out));
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::BinaryArithmetic { op, .. } => op.precedence(),
            _ => 3,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parens: bool) -> fmt::Result {
        if parens {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::PropertyRef(name) => write!(f, "[{}]", name),
            Expression::BinaryArithmetic { op, left, right } => {
                let prec = op.precedence();
                left.fmt_operand(f, left.precedence() < prec)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f, right.precedence() <= prec)
            }
            Expression::FunctionCall { name, args } => {
                // constant geometry constructors render as WKT
                if self.is_geometry_constructor() {
                    if let Ok(Some(Value::Geometry(g))) = self.evaluate(&Feature::new("")) {
                        return write!(f, "{}", g);
                    }
                }
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
