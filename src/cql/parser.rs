// CQL Parser Implementation
//
// Recursive-descent parser from CQL tokens to the filter AST.
//
// Precedence, loosest first:
//   OR < AND < NOT < comparison / spatial / LIKE / IN / IS NULL
//      < additive (+ -) < multiplicative (* /) < unary < primary

use log::{trace, warn};

use super::error::{ParseResult, SyntaxError};
use super::lexer::{Token, TokenType, tokenize};
use crate::filter::{ArithmeticOp, ComparisonOp, Expression, Filter, SpatialOp, Value};
use crate::geom::Envelope;

/// CQL parser over a token buffer; positions can be rewound for backtracking
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Tokenize the input and create a parser over it
    pub fn new(input: &str) -> ParseResult<Self> {
        trace!("parsing CQL: {}", input);
        Ok(Parser {
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    /// Parse the whole input as a filter
    pub fn parse_filter(&mut self) -> ParseResult<Filter> {
        let filter = self.parse_or()?;
        self.expect_token(TokenType::EOF, "<EOF>")?;
        Ok(filter)
    }

    /// Parse the whole input as a value expression
    pub fn parse_standalone_expression(&mut self) -> ParseResult<Expression> {
        let expr = self.parse_expression()?;
        self.expect_token(TokenType::EOF, "<EOF>")?;
        Ok(expr)
    }

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek(&self, offset: usize) -> &TokenType {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)].token_type
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.token_type != TokenType::EOF {
            self.pos += 1;
        }
        token
    }

    fn current_token_is(&self, token_type: &TokenType) -> bool {
        matches_token_type(&self.current().token_type, token_type)
    }

    fn error_here(&self, expected: &str) -> SyntaxError {
        let token = self.current();
        SyntaxError::grammar(token.line, token.column, expected, token.describe())
    }

    fn expect_token(&mut self, token_type: TokenType, expected: &str) -> ParseResult<Token> {
        if self.current_token_is(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_here(expected))
        }
    }

    /// The identifier at the current position, if any, upper-cased
    fn current_word(&self) -> Option<String> {
        match &self.current().token_type {
            TokenType::IDENTIFIER(name) => Some(name.to_ascii_uppercase()),
            _ => None,
        }
    }

    // ---- filters ----

    fn parse_or(&mut self) -> ParseResult<Filter> {
        let mut parts = vec![self.parse_and()?];
        while self.current_token_is(&TokenType::OR) {
            self.advance();
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Filter::or(parts)
        })
    }

    fn parse_and(&mut self) -> ParseResult<Filter> {
        let mut parts = vec![self.parse_not()?];
        while self.current_token_is(&TokenType::AND) {
            self.advance();
            parts.push(self.parse_not()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Filter::and(parts)
        })
    }

    fn parse_not(&mut self) -> ParseResult<Filter> {
        if self.current_token_is(&TokenType::NOT) {
            self.advance();
            return Ok(Filter::not(self.parse_not()?));
        }
        self.parse_predicate()
    }

    fn parse_predicate(&mut self) -> ParseResult<Filter> {
        match self.current().token_type {
            TokenType::INCLUDE => {
                self.advance();
                return Ok(Filter::All);
            }
            TokenType::EXCLUDE => {
                self.advance();
                return Ok(Filter::None);
            }
            TokenType::IN => return self.parse_id_filter(),
            TokenType::LeftParen => return self.parse_group(),
            _ => {}
        }

        if let Some(word) = self.current_word() {
            if self.peek(1) == &TokenType::LeftParen {
                if word == "BBOX" {
                    return self.parse_bbox();
                }
                if let Some(op) = SpatialOp::from_name(&word) {
                    return self.parse_spatial_call(op);
                }
            }
        }

        self.parse_expression_predicate()
    }

    /// `( filter )`, falling back to a predicate whose left operand is a
    /// parenthesised expression
    fn parse_group(&mut self) -> ParseResult<Filter> {
        let start = self.pos;
        let group_error = match self.parse_group_body() {
            Ok(filter) => return Ok(filter),
            Err(e) => e,
        };

        self.pos = start;
        self.parse_expression_predicate()
            .map_err(|e| furthest(group_error, e))
    }

    fn parse_group_body(&mut self) -> ParseResult<Filter> {
        self.expect_token(TokenType::LeftParen, "\"(\"")?;
        let filter = self.parse_or()?;
        self.expect_token(TokenType::RightParen, "\")\"")?;
        Ok(filter)
    }

    /// `IN ('id', ...)` without a property selects by feature identity
    fn parse_id_filter(&mut self) -> ParseResult<Filter> {
        self.expect_token(TokenType::IN, "IN")?;
        self.expect_token(TokenType::LeftParen, "\"(\"")?;
        let mut ids = Vec::new();
        if !self.current_token_is(&TokenType::RightParen) {
            ids.push(self.parse_feature_id()?);
            while self.current_token_is(&TokenType::COMMA) {
                self.advance();
                ids.push(self.parse_feature_id()?);
            }
        }
        self.expect_token(TokenType::RightParen, "\")\"")?;
        Ok(Filter::id(ids))
    }

    fn parse_feature_id(&mut self) -> ParseResult<String> {
        let token = self.current().clone();
        let id = match token.token_type {
            TokenType::STRING(s) => s,
            TokenType::INTEGER(_) | TokenType::FLOAT(_) => token.literal,
            _ => return Err(self.error_here("feature id")),
        };
        self.advance();
        Ok(id)
    }

    /// `BBOX(property, minx, miny, maxx, maxy[, srid])`
    fn parse_bbox(&mut self) -> ParseResult<Filter> {
        self.advance();
        self.expect_token(TokenType::LeftParen, "\"(\"")?;
        let property = self.parse_expression()?;
        let mut bounds = [0.0; 4];
        for bound in bounds.iter_mut() {
            self.expect_token(TokenType::COMMA, "\",\"")?;
            *bound = self.parse_signed_number()?;
        }
        if self.current_token_is(&TokenType::COMMA) {
            self.advance();
            let srid = self.advance();
            match srid.token_type {
                TokenType::STRING(_) | TokenType::INTEGER(_) | TokenType::IDENTIFIER(_) => {
                    warn!("BBOX reference system {} ignored, using native coordinates", srid.literal);
                }
                _ => {
                    return Err(SyntaxError::grammar(
                        srid.line,
                        srid.column,
                        "reference system identifier",
                        srid.describe(),
                    ));
                }
            }
        }
        self.expect_token(TokenType::RightParen, "\")\"")?;
        let envelope = Envelope::new(bounds[0], bounds[1], bounds[2], bounds[3]);
        Ok(Filter::bbox(property, &envelope))
    }

    /// `OP(property, geometry)` or `DWITHIN(property, geometry, distance, unit)`
    fn parse_spatial_call(&mut self, op: SpatialOp) -> ParseResult<Filter> {
        self.advance();
        self.expect_token(TokenType::LeftParen, "\"(\"")?;
        let property = self.parse_expression()?;
        self.expect_token(TokenType::COMMA, "\",\"")?;
        let geometry = self.parse_expression()?;

        let filter = if op == SpatialOp::DWithin {
            self.expect_token(TokenType::COMMA, "\",\"")?;
            let distance = self.parse_signed_number()?;
            self.expect_token(TokenType::COMMA, "\",\"")?;
            let unit = self.parse_unit()?;
            Filter::dwithin(property, geometry, distance, Some(unit))
        } else {
            Filter::spatial(op, property, geometry)
        };
        self.expect_token(TokenType::RightParen, "\")\"")?;
        Ok(filter)
    }

    fn parse_unit(&mut self) -> ParseResult<String> {
        let token = self.current().clone();
        match token.token_type {
            TokenType::IDENTIFIER(unit) | TokenType::STRING(unit) => {
                self.advance();
                Ok(unit)
            }
            _ => Err(self.error_here("distance unit")),
        }
    }

    fn parse_expression_predicate(&mut self) -> ParseResult<Filter> {
        let start = self.current().clone();
        let left = self.parse_expression()?;

        if let Some(op) = comparison_op(&self.current().token_type) {
            self.advance();
            let right = self.parse_expression()?;
            return Ok(Filter::comparison(op, left, right));
        }

        match self.current().token_type.clone() {
            TokenType::BETWEEN => {
                self.advance();
                self.parse_between(left)
            }
            TokenType::NOT => {
                self.advance();
                match self.current().token_type {
                    TokenType::BETWEEN => {
                        self.advance();
                        Ok(Filter::not(self.parse_between(left)?))
                    }
                    TokenType::LIKE | TokenType::ILIKE => {
                        Ok(Filter::not(self.parse_like(property_name(&start, left)?)?))
                    }
                    TokenType::IN => {
                        let property = property_name(&start, left)?;
                        self.advance();
                        Ok(Filter::not_in(property, self.parse_value_list()?))
                    }
                    _ => Err(self.error_here("BETWEEN, LIKE, ILIKE or IN")),
                }
            }
            TokenType::LIKE | TokenType::ILIKE => self.parse_like(property_name(&start, left)?),
            TokenType::IN => {
                let property = property_name(&start, left)?;
                self.advance();
                Ok(Filter::in_list(property, self.parse_value_list()?))
            }
            TokenType::IS => {
                let property = property_name(&start, left)?;
                self.advance();
                let negated = self.current_token_is(&TokenType::NOT);
                if negated {
                    self.advance();
                }
                self.expect_token(TokenType::NULL, "NULL")?;
                Ok(if negated {
                    Filter::is_not_null(property)
                } else {
                    Filter::is_null(property)
                })
            }
            TokenType::IDENTIFIER(word) => match SpatialOp::from_name(&word) {
                Some(op) => {
                    self.advance();
                    self.parse_infix_spatial(op, left)
                }
                None => Err(self.error_here("comparison operator")),
            },
            _ => Err(self.error_here("comparison operator")),
        }
    }

    fn parse_between(&mut self, value: Expression) -> ParseResult<Filter> {
        let low = self.parse_expression()?;
        self.expect_token(TokenType::AND, "AND")?;
        let high = self.parse_expression()?;
        Ok(Filter::between(value, low, high))
    }

    fn parse_like(&mut self, property: String) -> ParseResult<Filter> {
        let case_sensitive = self.current_token_is(&TokenType::LIKE);
        self.advance();
        let token = self.current().clone();
        match token.token_type {
            TokenType::STRING(pattern) => {
                self.advance();
                Ok(if case_sensitive {
                    Filter::like(property, pattern)
                } else {
                    Filter::ilike(property, pattern)
                })
            }
            _ => Err(self.error_here("pattern string")),
        }
    }

    fn parse_value_list(&mut self) -> ParseResult<Vec<Expression>> {
        self.expect_token(TokenType::LeftParen, "\"(\"")?;
        let mut values = Vec::new();
        if !self.current_token_is(&TokenType::RightParen) {
            values.push(self.parse_expression()?);
            while self.current_token_is(&TokenType::COMMA) {
                self.advance();
                values.push(self.parse_expression()?);
            }
        }
        self.expect_token(TokenType::RightParen, "\")\"")?;
        Ok(values)
    }

    /// `expr OP geometry [distance [unit]]`, the form filters render to
    fn parse_infix_spatial(&mut self, op: SpatialOp, property: Expression) -> ParseResult<Filter> {
        let geometry = self.parse_expression()?;
        if op != SpatialOp::DWithin {
            return Ok(Filter::spatial(op, property, geometry));
        }
        let distance = self.parse_signed_number()?;
        let unit = match self.current().token_type {
            TokenType::IDENTIFIER(_) => Some(self.parse_unit()?),
            _ => None,
        };
        Ok(Filter::dwithin(property, geometry, distance, unit))
    }

    // ---- expressions ----

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().token_type {
                TokenType::PLUS => ArithmeticOp::Add,
                TokenType::MINUS => ArithmeticOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::arithmetic(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().token_type {
                TokenType::MULTIPLY => ArithmeticOp::Mul,
                TokenType::DIVIDE => ArithmeticOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::arithmetic(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        match self.current().token_type {
            TokenType::MINUS => {
                self.advance();
                Ok(match self.parse_unary()? {
                    Expression::Literal(Value::Integer(i)) => match i.checked_neg() {
                        Some(n) => Expression::literal(n),
                        None => Expression::literal(-(i as f64)),
                    },
                    Expression::Literal(Value::Float(f)) => Expression::literal(-f),
                    operand => Expression::arithmetic(
                        ArithmeticOp::Mul,
                        Expression::literal(-1i64),
                        operand,
                    ),
                })
            }
            TokenType::PLUS => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let token = self.current().clone();
        let expr = match token.token_type {
            TokenType::STRING(s) => Expression::literal(s),
            TokenType::INTEGER(i) => Expression::literal(i),
            TokenType::FLOAT(f) => Expression::literal(f),
            TokenType::TRUE => Expression::literal(true),
            TokenType::FALSE => Expression::literal(false),
            TokenType::NULL => Expression::Literal(Value::Null),
            TokenType::QUOTED(name) => Expression::property(name),
            TokenType::IDENTIFIER(name) => return self.parse_identifier_expression(name),
            TokenType::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_token(TokenType::RightParen, "\")\"")?;
                return Ok(inner);
            }
            _ => return Err(self.error_here("expression")),
        };
        self.advance();
        Ok(expr)
    }

    /// Property reference, geometry literal or function call
    fn parse_identifier_expression(&mut self, name: String) -> ParseResult<Expression> {
        let upper = name.to_ascii_uppercase();
        let is_geometry = crate::filter::expression::GEOMETRY_FUNCTIONS.contains(&upper.as_str());
        let next = self.peek(1).clone();

        if is_geometry {
            if let TokenType::IDENTIFIER(word) = &next {
                if word.eq_ignore_ascii_case("EMPTY") {
                    // points always carry a coordinate
                    if upper == "POINT" {
                        self.advance();
                        return Err(self.error_here("\"(\""));
                    }
                    self.advance();
                    self.advance();
                    return Ok(Expression::function(upper, Vec::new()));
                }
            }
        }
        if next != TokenType::LeftParen {
            self.advance();
            return Ok(Expression::property(name));
        }

        let start = self.pos;
        let mut wkt_error = None;
        if is_geometry {
            self.advance();
            match self.parse_wkt_body(&upper) {
                Ok(expr) => return Ok(expr),
                Err(e) => wkt_error = Some(e),
            }
            self.pos = start;
        }

        // generic call syntax: NAME(expr, ...)
        self.advance();
        self.expect_token(TokenType::LeftParen, "\"(\"")?;
        let mut args = Vec::new();
        if !self.current_token_is(&TokenType::RightParen) {
            args.push(self.parse_expression()?);
            while self.current_token_is(&TokenType::COMMA) {
                self.advance();
                args.push(self.parse_expression()?);
            }
        }
        match self.expect_token(TokenType::RightParen, "\")\"") {
            Ok(_) => Ok(Expression::function(if is_geometry { upper } else { name }, args)),
            Err(e) => Err(match wkt_error {
                Some(w) => furthest(w, e),
                None => e,
            }),
        }
    }

    fn parse_signed_number(&mut self) -> ParseResult<f64> {
        let negative = match self.current().token_type {
            TokenType::MINUS => {
                self.advance();
                true
            }
            TokenType::PLUS => {
                self.advance();
                false
            }
            _ => false,
        };
        let value = match self.current().token_type {
            TokenType::INTEGER(i) => i as f64,
            TokenType::FLOAT(f) => f,
            _ => return Err(self.error_here("number")),
        };
        self.advance();
        Ok(if negative { -value } else { value })
    }

    /// `x y [z]`; a third ordinate is accepted and dropped
    fn parse_coordinate(&mut self) -> ParseResult<Expression> {
        let x = self.parse_signed_number()?;
        let y = self.parse_signed_number()?;
        if matches!(
            self.current().token_type,
            TokenType::INTEGER(_) | TokenType::FLOAT(_) | TokenType::MINUS
        ) {
            self.parse_signed_number()?;
        }
        Ok(Expression::point(x, y))
    }

    /// Comma separated items inside parentheses
    fn parse_wkt_list<F>(&mut self, mut item: F) -> ParseResult<Vec<Expression>>
    where
        F: FnMut(&mut Parser) -> ParseResult<Expression>,
    {
        self.expect_token(TokenType::LeftParen, "\"(\"")?;
        let mut items = vec![item(self)?];
        while self.current_token_is(&TokenType::COMMA) {
            self.advance();
            items.push(item(self)?);
        }
        self.expect_token(TokenType::RightParen, "\")\"")?;
        Ok(items)
    }

    fn parse_wkt_path(&mut self) -> ParseResult<Expression> {
        let points = self.parse_wkt_list(|p| p.parse_coordinate())?;
        Ok(Expression::function("LINESTRING", points))
    }

    fn parse_wkt_polygon(&mut self) -> ParseResult<Expression> {
        let rings = self.parse_wkt_list(|p| p.parse_wkt_path())?;
        Ok(Expression::function("POLYGON", rings))
    }

    /// WKT coordinate body following a geometry tag
    fn parse_wkt_body(&mut self, tag: &str) -> ParseResult<Expression> {
        match tag {
            "POINT" => {
                self.expect_token(TokenType::LeftParen, "\"(\"")?;
                let point = self.parse_coordinate()?;
                self.expect_token(TokenType::RightParen, "\")\"")?;
                Ok(point)
            }
            "LINESTRING" => self.parse_wkt_path(),
            "POLYGON" => self.parse_wkt_polygon(),
            "MULTIPOINT" => {
                let points = self.parse_wkt_list(|p| {
                    if p.current_token_is(&TokenType::LeftParen) {
                        p.advance();
                        let point = p.parse_coordinate()?;
                        p.expect_token(TokenType::RightParen, "\")\"")?;
                        Ok(point)
                    } else {
                        p.parse_coordinate()
                    }
                })?;
                Ok(Expression::function("MULTIPOINT", points))
            }
            "MULTILINESTRING" => {
                let lines = self.parse_wkt_list(|p| p.parse_wkt_path())?;
                Ok(Expression::function("MULTILINESTRING", lines))
            }
            "MULTIPOLYGON" => {
                let polygons = self.parse_wkt_list(|p| p.parse_wkt_polygon())?;
                Ok(Expression::function("MULTIPOLYGON", polygons))
            }
            _ => Err(self.error_here("geometry")),
        }
    }
}

/// Discriminant comparison, ignoring literal payloads
fn matches_token_type(a: &TokenType, b: &TokenType) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn comparison_op(token_type: &TokenType) -> Option<ComparisonOp> {
    match token_type {
        TokenType::EQUALS => Some(ComparisonOp::Eq),
        TokenType::NotEqual => Some(ComparisonOp::Neq),
        TokenType::LessThan => Some(ComparisonOp::Lt),
        TokenType::LessEqual => Some(ComparisonOp::Lte),
        TokenType::GreaterThan => Some(ComparisonOp::Gt),
        TokenType::GreaterEqual => Some(ComparisonOp::Gte),
        _ => None,
    }
}

/// LIKE, IN and IS NULL apply only to a bare property reference
fn property_name(start: &Token, expr: Expression) -> ParseResult<String> {
    match expr {
        Expression::PropertyRef(name) => Ok(name),
        other => Err(SyntaxError::grammar(
            start.line,
            start.column,
            "property name",
            format!("\"{}\"", other),
        )),
    }
}

/// The error that got further into the input
fn furthest(a: SyntaxError, b: SyntaxError) -> SyntaxError {
    if (b.line, b.column) >= (a.line, a.column) { b } else { a }
}
