use anyhow::Result;
use geoquery::cql;
use geoquery::filter::{ArithmeticOp, ComparisonOp, SpatialOp};
use geoquery::{Envelope, Expression, Feature, Filter, Geometry};

#[path = "../common/mod.rs"]
mod common;
use common::states;

fn prop(name: &str) -> Expression {
    Expression::property(name)
}

fn lit<V: Into<geoquery::Value>>(v: V) -> Expression {
    Expression::literal(v)
}

// Records with odd shapes on top of the states: missing, null and text values
fn records() -> Vec<Feature> {
    let mut records = states();
    records.push(Feature::new("odd.1"));
    records.push(
        Feature::new("odd.2")
            .with("STATE_NAME", "it's quoted")
            .with("SAMP_POP", "1337")
            .with("PERSONS", 2.5),
    );
    records
}

fn constructed_filters() -> Vec<Filter> {
    vec![
        Filter::All,
        Filter::None,
        Filter::equal(prop("STATE_NAME"), lit("it's quoted")),
        Filter::between(prop("SAMP_POP"), lit(300i64), lit(2000i64)),
        Filter::not(Filter::between(prop("PERSONS"), lit(1.0e6), lit(3.0e6))),
        Filter::not_in("STATE_ABBR", vec![lit("TX"), lit("NM")]),
        Filter::in_list("SAMP_POP", vec![lit(262i64), lit(495i64), lit("1337")]),
        Filter::id(["states.2", "odd.1"]),
        Filter::is_null("P_MALE"),
        Filter::is_not_null("SAMP_POP"),
        Filter::like("STATE_NAME", "%i%"),
        Filter::ilike("STATE_NAME", "NEW _EXICO"),
        Filter::comparison(
            ComparisonOp::Gt,
            Expression::arithmetic(
                ArithmeticOp::Mul,
                Expression::arithmetic(ArithmeticOp::Sub, prop("PERSONS"), lit(1000i64)),
                lit(2i64),
            ),
            lit(1.0e7),
        ),
        Filter::comparison(
            ComparisonOp::Lte,
            Expression::arithmetic(
                ArithmeticOp::Div,
                prop("SAMP_POP"),
                Expression::arithmetic(ArithmeticOp::Add, prop("PERSONS"), lit(-1i64)),
            ),
            lit(0.0003),
        ),
        Filter::or(vec![
            Filter::and(vec![
                Filter::equal(prop("STATE_ABBR"), lit("IA")),
                Filter::is_not_null("P_MALE"),
            ]),
            Filter::not(Filter::or(vec![
                Filter::like("STATE_NAME", "T%"),
                Filter::comparison(ComparisonOp::Lt, prop("SAMP_POP"), lit(1000i64)),
            ])),
        ]),
        Filter::bbox(prop("the_geom"), &Envelope::new(-100.0, 30.0, -70.0, 45.0)),
        Filter::spatial(SpatialOp::Contains, prop("the_geom"), Expression::point(-96.8, 32.8)),
        Filter::spatial(
            SpatialOp::Intersects,
            prop("the_geom"),
            Expression::literal(Geometry::LineString(vec![
                geoquery::geom::Coord::new(-110.0, 34.0),
                geoquery::geom::Coord::new(-100.0, 34.0),
            ])),
        ),
        Filter::dwithin(prop("the_geom"), Expression::point(-65.0, 45.0), 2.0, Some("degrees".into())),
    ]
}

// Values at the edges of what the literal syntax spells directly
fn edge_filters() -> Vec<Filter> {
    vec![
        Filter::id(Vec::<String>::new()),
        Filter::in_list("SAMP_POP", Vec::new()),
        Filter::not_in("SAMP_POP", Vec::new()),
        Filter::equal(prop("PERSONS"), lit(i64::MIN)),
        Filter::comparison(ComparisonOp::Lt, prop("PERSONS"), lit(i64::MAX)),
        Filter::spatial(
            SpatialOp::Intersects,
            prop("the_geom"),
            Expression::literal(Geometry::point(1.0e19, 0.0)),
        ),
        Filter::dwithin(prop("the_geom"), Expression::point(0.0, 0.0), 1.0e19, None),
    ]
}

fn assert_equivalent(original: &Filter) -> Result<()> {
    let text = original.to_string();
    let reparsed = cql::parse(&text)?;
    for record in records() {
        assert_eq!(
            original.matches(&record)?,
            reparsed.matches(&record)?,
            "{} on {}",
            text,
            record.id()
        );
    }
    // rendering is stable after one round
    assert_eq!(reparsed.to_string(), cql::parse(&reparsed.to_string())?.to_string());
    Ok(())
}

#[test]
fn test_constructed_filters_round_trip() -> Result<()> {
    for filter in constructed_filters() {
        assert_equivalent(&filter)?;
    }
    Ok(())
}

#[test]
fn test_edge_filters_round_trip() -> Result<()> {
    for filter in edge_filters() {
        assert_equivalent(&filter)?;
    }
    assert_eq!(cql::parse("IN ()")?, Filter::id(Vec::<String>::new()));
    assert!(cql::parse("STATE_ABBR IN ('TX',)").is_err());
    Ok(())
}

#[test]
fn test_parsed_filters_round_trip() -> Result<()> {
    let texts = [
        "STATE_NAME = 'Texas' OR (SAMP_POP > 400 AND NOT P_MALE IS NULL)",
        "NOT (a = 1 OR b = 2) AND c = 3",
        "PERSONS - SAMP_POP * 3 >= -4.5e2",
        "STATE_NAME NOT LIKE 'New%'",
        "STATE_NAME NOT ILIKE 'new%'",
        "SAMP_POP NOT BETWEEN 300 AND 1000",
        "INCLUDE AND STATE_ABBR <> 'ME'",
        "EXCLUDE OR STATE_ABBR = 'ME'",
        "DISJOINT(the_geom, POLYGON ((-100 30, -90 30, -90 40, -100 40, -100 30)))",
        "the_geom WITHIN MULTIPOLYGON (((-120 20, -60 20, -60 50, -120 50, -120 20)))",
        "BBOX(the_geom, -72, 42, -60, 50, 'EPSG:4326')",
        "IN ('states.1', 'states.3')",
    ];
    for text in texts {
        assert_equivalent(&cql::parse(text)?)?;
    }
    Ok(())
}
