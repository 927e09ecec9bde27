use anyhow::Result;
use geoquery::cql::{self, SyntaxErrorKind};
use geoquery::filter::{ArithmeticOp, ComparisonOp, LogicKind, SpatialOp};
use geoquery::{Envelope, Expression, Filter, Geometry};

fn prop(name: &str) -> Expression {
    Expression::property(name)
}

#[test]
fn test_equality_comparison() -> Result<()> {
    let filter = cql::parse("foo = 'bar'")?;
    match filter {
        Filter::Comparison { op, left, right } => {
            assert_eq!(op, ComparisonOp::Eq);
            assert_eq!(left, prop("foo"));
            assert_eq!(right, Expression::literal("bar"));
        }
        other => panic!("Expected comparison, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_between_desugars_to_and() -> Result<()> {
    let filter = cql::parse("foo BETWEEN 1 AND 10")?;
    assert_eq!(
        filter,
        Filter::Logic {
            kind: LogicKind::And,
            parts: vec![
                Filter::comparison(ComparisonOp::Gte, prop("foo"), Expression::literal(1i64)),
                Filter::comparison(ComparisonOp::Lte, prop("foo"), Expression::literal(10i64)),
            ],
        }
    );
    Ok(())
}

#[test]
fn test_keywords_are_case_insensitive() -> Result<()> {
    assert_eq!(
        cql::parse("a = 1 and not b = 2")?,
        cql::parse("a = 1 AND NOT b = 2")?
    );
    assert_eq!(cql::parse("include")?, Filter::All);
    assert_eq!(cql::parse("EXCLUDE")?, Filter::None);
    Ok(())
}

#[test]
fn test_comparison_operators() -> Result<()> {
    let cases = [
        ("a = 1", ComparisonOp::Eq),
        ("a <> 1", ComparisonOp::Neq),
        ("a != 1", ComparisonOp::Neq),
        ("a < 1", ComparisonOp::Lt),
        ("a <= 1", ComparisonOp::Lte),
        ("a > 1", ComparisonOp::Gt),
        ("a >= 1", ComparisonOp::Gte),
    ];
    for (text, expected) in cases {
        match cql::parse(text)? {
            Filter::Comparison { op, .. } => assert_eq!(op, expected, "{}", text),
            other => panic!("Expected comparison for {}, got {:?}", text, other),
        }
    }
    Ok(())
}

#[test]
fn test_arithmetic_precedence() -> Result<()> {
    let filter = cql::parse("a + b * 2 > 10")?;
    let expected = Filter::comparison(
        ComparisonOp::Gt,
        Expression::arithmetic(
            ArithmeticOp::Add,
            prop("a"),
            Expression::arithmetic(ArithmeticOp::Mul, prop("b"), Expression::literal(2i64)),
        ),
        Expression::literal(10i64),
    );
    assert_eq!(filter, expected);

    // left associative
    let filter = cql::parse("a - b - c = 0")?;
    assert_eq!(filter.to_string(), "[a] - [b] - [c] = 0");
    let filter = cql::parse("a - (b - c) = 0")?;
    assert_eq!(filter.to_string(), "[a] - ([b] - [c]) = 0");
    Ok(())
}

#[test]
fn test_not_binds_below_comparison_above_and() -> Result<()> {
    let filter = cql::parse("NOT a = 1 AND b = 2")?;
    assert_eq!(
        filter,
        Filter::and(vec![
            Filter::not(Filter::equal(prop("a"), Expression::literal(1i64))),
            Filter::equal(prop("b"), Expression::literal(2i64)),
        ])
    );
    Ok(())
}

#[test]
fn test_string_escapes_and_quoted_names() -> Result<()> {
    let filter = cql::parse("[STATE NAME] = 'O''Brien'")?;
    assert_eq!(filter, Filter::equal(prop("STATE NAME"), Expression::literal("O'Brien")));
    assert_eq!(filter.to_string(), "[STATE NAME] = 'O''Brien'");
    Ok(())
}

#[test]
fn test_numeric_literals() -> Result<()> {
    assert_eq!(
        cql::parse("a = .07")?,
        Filter::equal(prop("a"), Expression::literal(0.07))
    );
    assert_eq!(
        cql::parse("a = 1.5e3")?,
        Filter::equal(prop("a"), Expression::literal(1500.0))
    );
    assert_eq!(
        cql::parse("a = -3")?,
        Filter::equal(prop("a"), Expression::literal(-3i64))
    );
    Ok(())
}

#[test]
fn test_spatial_predicates() -> Result<()> {
    for op in SpatialOp::ALL {
        let text = if op == SpatialOp::DWithin {
            format!("{}(the_geom, POINT(1 2), 10, kilometers)", op.name())
        } else {
            format!("{}(the_geom, POINT(1 2))", op.name())
        };
        match cql::parse(&text)? {
            Filter::Spatial {
                op: parsed,
                property,
                geometry,
                ..
            } => {
                assert_eq!(parsed, op);
                assert_eq!(property, prop("the_geom"));
                assert_eq!(geometry, Expression::point(1.0, 2.0));
            }
            other => panic!("Expected spatial filter for {}, got {:?}", text, other),
        }
    }
    Ok(())
}

#[test]
fn test_bbox_is_intersects_rectangle() -> Result<()> {
    let filter = cql::parse("BBOX(the_geom, -100, 30, -90, 40)")?;
    assert_eq!(
        filter,
        Filter::bbox(prop("the_geom"), &Envelope::new(-100.0, 30.0, -90.0, 40.0))
    );
    Ok(())
}

#[test]
fn test_wkt_geometries() -> Result<()> {
    let geometry = cql::parse_geometry("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 4 2, 4 4, 2 2))")?;
    assert_eq!(geometry.kind(), "POLYGON");
    assert_eq!(geometry.polygons()[0].interiors.len(), 1);

    let geometry = cql::parse_geometry("MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))")?;
    assert_eq!(geometry.polygons().len(), 2);

    let geometry = cql::parse_geometry("MULTILINESTRING ((0 0, 1 1), (2 2, 3 3))")?;
    assert_eq!(geometry.dimension(), 1);

    assert_eq!(cql::parse_geometry("MULTIPOINT EMPTY")?, Geometry::MultiPoint(Vec::new()));
    let err = cql::parse_geometry("POINT EMPTY").unwrap_err();
    assert_eq!(err.found, "\"EMPTY\"");
    assert_eq!(err.column, 7);
    assert!(cql::parse_geometry("POINT (1 2 3 4)").is_err());
    Ok(())
}

#[test]
fn test_unterminated_string_is_lexical_error() {
    let err = cql::parse("STATE_NAME+EQ+'Virginia").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Lexical);
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 24);
    let message = err.to_string();
    assert!(message.contains("Lexical error"), "{}", message);
    assert!(message.contains("column 24"), "{}", message);
}

#[test]
fn test_illegal_character() {
    let err = cql::parse("a = 1 AND b # 2").unwrap_err();
    assert!(err.is_lexical());
    assert_eq!(err.column, 13);
}

#[test]
fn test_errors_report_line_and_column() {
    let err = cql::parse("a = 1 AND\n  b >").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Grammar);
    assert_eq!(err.line, 2);
    assert_eq!(err.found, "<EOF>");
    assert!(err.to_string().starts_with("Syntax error at line 2"));

    let err = cql::parse("(a = 1").unwrap_err();
    assert!(!err.is_lexical());

    let err = cql::parse("").unwrap_err();
    assert_eq!(err.found, "<EOF>");
}

#[test]
fn test_standalone_expression() -> Result<()> {
    let expr = cql::parse_expression("SAMP_POP / PERSONS * 100")?;
    assert_eq!(expr.to_string(), "[SAMP_POP] / [PERSONS] * 100");
    assert_eq!(expr.properties(), vec!["SAMP_POP".to_string(), "PERSONS".to_string()]);
    Ok(())
}
