// CQL Module
//
// Text surface of the filter language: lexing, parsing and syntax errors.

pub mod error;
pub mod lexer;
pub mod parser;

pub use self::error::{ParseResult, SyntaxError, SyntaxErrorKind};
pub use self::lexer::{Lexer, Token, TokenType};
pub use self::parser::Parser;

use crate::feature::Feature;
use crate::filter::{Expression, Filter, Value};
use crate::geom::Geometry;

/// Parse CQL filter text
pub fn parse(text: &str) -> ParseResult<Filter> {
    Parser::new(text)?.parse_filter()
}

/// Parse a standalone value expression
pub fn parse_expression(text: &str) -> ParseResult<Expression> {
    Parser::new(text)?.parse_standalone_expression()
}

/// Parse well-known text into a geometry
pub fn parse_geometry(text: &str) -> ParseResult<Geometry> {
    let expr = parse_expression(text)?;
    let invalid = |found: String| SyntaxError::grammar(1, 1, "well-known text geometry", found);
    if !expr.is_geometry_constructor() {
        return Err(invalid(format!("\"{}\"", expr)));
    }
    match expr.evaluate(&Feature::new("")) {
        Ok(Some(Value::Geometry(g))) => Ok(g),
        Ok(_) => Err(invalid(format!("\"{}\"", expr))),
        Err(e) => Err(invalid(e.to_string())),
    }
}
