use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use geoquery::data::json::{JsonLinesCursor, encode_feature, read_features};
use geoquery::query::{Cursor, VectorDataset, VectorQuery, execute};
use geoquery::{Envelope, MemoryDataset};

const HISTORY_FILE: &str = ".cql_history";

#[derive(Parser)]
#[command(author, version, about = "cql - parse CQL filters and query JSON lines features")]
struct Cli {
    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a filter and print its canonical form
    Parse {
        /// CQL filter text
        text: String,
    },

    /// Run a query over a JSON lines feature file
    Query {
        /// Feature file, one JSON feature per line
        #[arg(short, long)]
        input: PathBuf,

        /// CQL filter
        #[arg(short, long)]
        filter: Option<String>,

        /// Bounding box as minx,miny,maxx,maxy
        #[arg(short, long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: Option<Envelope>,

        /// Comma separated attribute names to keep
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,

        /// Maximum number of features
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of matching features to skip
        #[arg(short, long, default_value_t = 0)]
        offset: usize,

        /// Print the number of matching features instead of the features
        #[arg(short, long)]
        count: bool,
    },

    /// Print the schema inferred from a feature file
    Schema {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Evaluate filters interactively against a feature file
    Shell {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn parse_bbox(text: &str) -> std::result::Result<Envelope, String> {
    let parts = text
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("invalid coordinate '{}': {}", p, e)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [minx, miny, maxx, maxy] => Ok(Envelope::new(*minx, *miny, *maxx, *maxy)),
        _ => Err(format!("expected minx,miny,maxx,maxy, got {} values", parts.len())),
    }
}

fn load_dataset(path: &Path) -> Result<MemoryDataset> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let features = read_features(BufReader::new(file))
        .with_context(|| format!("Failed to read features from {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "features".to_string());
    Ok(MemoryDataset::new(name, features))
}

fn run_query(input: &Path, query: &VectorQuery, count: bool) -> Result<()> {
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let cursor = execute(query, JsonLinesCursor::new(BufReader::new(file)));

    if count {
        println!("{}", cursor.count().context("Query failed")?);
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for feature in cursor.iter() {
        let feature = feature.context("Query failed")?;
        writeln!(out, "{}", encode_feature(&feature)?)?;
    }
    Ok(())
}

fn run_shell(dataset: &MemoryDataset) -> Result<()> {
    println!(
        "Loaded {} features from '{}'. Type a CQL filter, 'help' for assistance or 'exit' to quit.",
        dataset.len(),
        dataset.name()
    );

    let mut rl = Editor::<(), DefaultHistory>::new()?;
    if let Err(err) = rl.load_history(HISTORY_FILE) {
        if !err.to_string().contains("No such file or directory") {
            println!("Error loading history: {}", err);
        }
    }

    loop {
        let readline = rl.readline("cql> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match line.to_lowercase().as_str() {
                    "exit" | "quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    "help" => print_help(),
                    "schema" => match dataset.schema() {
                        Ok(schema) => println!("{}", serde_json::to_string_pretty(&schema)?),
                        Err(err) => println!("Error: {}", err),
                    },
                    _ => {
                        if let Err(err) = shell_query(dataset, line) {
                            println!("Error: {}", err);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }

    if let Err(err) = rl.save_history(HISTORY_FILE) {
        println!("Error saving history: {}", err);
    }
    Ok(())
}

fn shell_query(dataset: &MemoryDataset, text: &str) -> Result<()> {
    let query = VectorQuery::new().with_cql(text)?;
    println!("Filter: {}", query.filter());
    let features = dataset.cursor(&query)?.read_all()?;
    for feature in &features {
        println!("{}", encode_feature(feature)?);
    }
    println!("({} features)", features.len());
    Ok(())
}

fn print_help() {
    println!("Enter a CQL filter to list the matching features, for example:");
    println!("  STATE_NAME = 'Texas'");
    println!("  PERSONS BETWEEN 1000000 AND 5000000");
    println!("  STATE_NAME LIKE 'New%' AND SAMP_POP > 1000");
    println!("  INTERSECTS(geometry, POINT (-97 32))");
    println!("  BBOX(geometry, -100, 30, -90, 40)");
    println!("  IN ('states.1', 'states.2')");
    println!();
    println!("Other commands:");
    println!("  schema                        - Display the inferred schema");
    println!("  help                          - Display this help message");
    println!("  exit                          - Exit the shell");
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { text } => match geoquery::parse(&text) {
            Ok(filter) => println!("{}", filter),
            Err(err) => {
                eprintln!("{}", err);
                process::exit(1);
            }
        },
        Commands::Query {
            input,
            filter,
            bbox,
            fields,
            limit,
            offset,
            count,
        } => {
            let mut query = VectorQuery::new().with_offset(offset);
            if let Some(text) = filter {
                query = query.with_cql(&text).context("Invalid filter")?;
            }
            if let Some(bbox) = bbox {
                query = query.with_bounds(bbox);
            }
            if let Some(fields) = fields {
                query = query.with_fields(fields);
            }
            if let Some(limit) = limit {
                query = query.with_limit(limit);
            }
            run_query(&input, &query, count)?;
        }
        Commands::Schema { input } => {
            let dataset = load_dataset(&input)?;
            println!("{}", serde_json::to_string_pretty(&dataset.schema()?)?);
        }
        Commands::Shell { input } => {
            let dataset = load_dataset(&input)?;
            run_shell(&dataset)?;
        }
    }

    Ok(())
}
