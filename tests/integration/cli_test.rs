use anyhow::Result;
use std::process::Command;

#[path = "../common/mod.rs"]
mod common;
use common::states_file;

fn cql() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cql"))
}

/// Test that the parse command prints the canonical form
#[test]
fn test_cli_parse_command() -> Result<()> {
    let output = cql().args(["parse", "foo BETWEEN 1 AND 10"]).output()?;
    assert!(output.status.success(), "CLI parse command failed");

    let output_str = String::from_utf8(output.stdout)?;
    assert_eq!(output_str.trim(), "[foo] >= 1 AND [foo] <= 10");
    Ok(())
}

/// Test that syntax errors are reported with their position
#[test]
fn test_cli_parse_error() -> Result<()> {
    let output = cql().args(["parse", "STATE_NAME+EQ+'Virginia"]).output()?;
    assert!(!output.status.success(), "Expected parse failure");

    let error_str = String::from_utf8(output.stderr)?;
    assert!(error_str.contains("Lexical error at line 1, column 24"), "{}", error_str);
    Ok(())
}

/// Test that the query command filters, projects and pages
#[test]
fn test_cli_query_execution() -> Result<()> {
    let file = states_file()?;
    let path = file.path().to_string_lossy().into_owned();
    let output = cql()
        .args([
            "query",
            "--input",
            path.as_str(),
            "--filter",
            "PERSONS > 2000000",
            "--fields",
            "STATE_NAME,STATE_ABBR",
            "--offset",
            "1",
            "--limit",
            "1",
        ])
        .output()?;
    assert!(output.status.success(), "CLI query execution failed");

    let output_str = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = output_str.lines().collect();
    assert_eq!(lines.len(), 1, "{}", output_str);

    let feature: serde_json::Value = serde_json::from_str(lines[0])?;
    assert_eq!(feature["id"], "states.2");
    assert_eq!(feature["properties"]["STATE_NAME"], "Iowa");
    assert_eq!(feature["properties"]["STATE_ABBR"], "IA");
    assert!(feature["properties"].get("PERSONS").is_none());
    Ok(())
}

/// Test counting with a bounding box
#[test]
fn test_cli_query_count() -> Result<()> {
    let file = states_file()?;
    let path = file.path().to_string_lossy().into_owned();
    let output = cql()
        .args([
            "query",
            "--input",
            path.as_str(),
            "--bbox",
            "-100,30,-70,45",
            "--count",
        ])
        .output()?;
    assert!(output.status.success(), "CLI count failed");
    assert_eq!(String::from_utf8(output.stdout)?.trim(), "4");
    Ok(())
}

/// Test that the schema command prints the inferred fields
#[test]
fn test_cli_schema_command() -> Result<()> {
    let file = states_file()?;
    let path = file.path().to_string_lossy().into_owned();
    let output = cql()
        .args(["schema", "--input", path.as_str()])
        .output()?;
    assert!(output.status.success(), "CLI schema command failed");

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = schema["fields"]
        .as_array()
        .map(|fields| fields.iter().filter_map(|f| f["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(
        names,
        vec!["geometry", "STATE_NAME", "STATE_ABBR", "SAMP_POP", "P_MALE", "PERSONS"]
    );
    Ok(())
}

/// Test that an invalid filter fails the query command
#[test]
fn test_cli_invalid_filter() -> Result<()> {
    let file = states_file()?;
    let path = file.path().to_string_lossy().into_owned();
    let output = cql()
        .args([
            "query",
            "--input",
            path.as_str(),
            "--filter",
            "PERSONS >",
        ])
        .output()?;
    assert!(!output.status.success());
    let error_str = String::from_utf8(output.stderr)?;
    assert!(error_str.contains("Syntax error"), "{}", error_str);
    Ok(())
}
