//! dbschema CLI - validate, generate DDL, diff and repair database schemas.

use clap::{Parser, Subcommand};
use dbschema::core::traits::EngineAdapter;
use dbschema::{diff, drivers, persist, repair, Config, DbSchemaError, Schema, SchemaError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dbschema")]
#[command(about = "Engine-independent database schema tool: DDL, diff and repair")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (engine, connection, DDL settings)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Engine used when no configuration file is given: mysql or sqlite
    #[arg(short, long, default_value = "mysql")]
    engine: String,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "warn")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a schema file for data errors
    Validate {
        /// Schema file (YAML, or JSON by .json extension)
        schema: PathBuf,
    },

    /// Print the statements creating (or dropping) every table of a schema
    Ddl {
        /// Schema file
        schema: PathBuf,

        /// Print DROP TABLE statements instead
        #[arg(long)]
        drop: bool,
    },

    /// Compare a gauge schema file with an actual schema file
    Diff {
        /// Schema the database should have
        gauge: PathBuf,

        /// Schema the database has
        actual: PathBuf,
    },

    /// Merge a base schema with extension schemas
    Merge {
        /// Schema files; exactly one must be a base schema
        #[arg(required = true)]
        schemas: Vec<PathBuf>,

        /// Only merge the extensions with these GUIDs
        #[arg(long = "extension")]
        extensions: Vec<String>,

        /// Write the merged schema to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read the schema of the configured database
    Introspect {
        /// Write the schema to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare the configured database with a gauge schema file
    Check {
        /// Schema the database should have
        gauge: PathBuf,
    },

    /// Bring the configured database in line with a gauge schema file
    Repair {
        /// Schema the database should have
        gauge: PathBuf,

        /// Print the repair statements without executing them
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DbSchemaError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(DbSchemaError::Config)?;

    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::for_engine(&cli.engine)?,
    };
    let adapter = config.adapter()?;

    match cli.command {
        Commands::Validate { schema } => {
            let schema = persist::load_schema(&schema)?;
            let errors = schema.data_errors();

            if cli.output_json {
                let report: Vec<_> = errors
                    .iter()
                    .flat_map(|(property, messages)| {
                        messages.iter().map(move |m| {
                            serde_json::json!({ "property": property, "message": m })
                        })
                    })
                    .collect();
                println!("{}", to_json(&report)?);
            } else if errors.is_empty() {
                println!("Schema '{}' is valid.", schema.description);
            }

            if !errors.is_empty() {
                return Err(DbSchemaError::Validation(errors.to_report()));
            }
        }

        Commands::Ddl { schema, drop } => {
            let schema = persist::load_schema(&schema)?;
            let statements = if drop {
                repair::drop_database_statements(&schema, &adapter)?
            } else {
                repair::create_database_statements(&schema, &adapter)?
            };
            print_statements(&statements, cli.output_json)?;
        }

        Commands::Diff { gauge, actual } => {
            let gauge = persist::load_schema(&gauge)?;
            let actual = persist::load_schema(&actual)?;
            let errors = diff::compare(&gauge, &actual, &adapter)?;
            print_report(&errors, cli.output_json)?;
        }

        Commands::Merge {
            schemas,
            extensions,
            output,
        } => {
            let schemas = schemas
                .iter()
                .map(persist::load_schema)
                .collect::<Result<Vec<Schema>, _>>()?;
            let filter = extensions
                .iter()
                .map(|g| {
                    Uuid::parse_str(g.trim()).map_err(|_| {
                        DbSchemaError::Config(format!("Invalid extension GUID: '{}'", g))
                    })
                })
                .collect::<Result<Vec<Uuid>, _>>()?;

            let merged = Schema::aggregate(
                &schemas,
                (!filter.is_empty()).then_some(filter.as_slice()),
            )?;
            write_schema(&merged, output.as_deref(), cli.output_json)?;
        }

        Commands::Introspect { output } => {
            config.validate_connection()?;
            let executor = drivers::connect(&adapter, &config.connection.url).await?;
            let schema = adapter.introspect_schema(executor.as_ref()).await?;
            info!("Introspected {} tables", schema.tables.len());
            write_schema(&schema, output.as_deref(), cli.output_json)?;
        }

        Commands::Check { gauge } => {
            let gauge = persist::load_schema(&gauge)?;
            config.validate_connection()?;
            let executor = drivers::connect(&adapter, &config.connection.url).await?;
            let errors = repair::check_schema(&gauge, &adapter, executor.as_ref()).await?;
            print_report(&errors, cli.output_json)?;
        }

        Commands::Repair { gauge, dry_run } => {
            let gauge = persist::load_schema(&gauge)?;
            config.validate_connection()?;
            let executor = drivers::connect(&adapter, &config.connection.url).await?;
            let errors = repair::check_schema(&gauge, &adapter, executor.as_ref()).await?;

            if dry_run {
                let statements: Vec<String> = errors
                    .iter()
                    .flat_map(|e| e.sql_statements.iter().cloned())
                    .collect();
                print_statements(&statements, cli.output_json)?;
                return Ok(());
            }

            let outcome =
                repair::apply_repairs(&errors, &adapter, executor.as_ref(), &config.repair).await?;

            if cli.output_json {
                println!("{}", to_json(&outcome)?);
            } else {
                println!(
                    "Applied {} repairs ({} statements).",
                    outcome.applied.len(),
                    outcome.statements_executed
                );
                if !outcome.is_complete() {
                    println!("Unrepairable differences left:");
                    for error in &outcome.skipped {
                        println!("  {}", error);
                    }
                }
            }
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DbSchemaError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn print_report(errors: &[SchemaError], json: bool) -> Result<(), DbSchemaError> {
    if json {
        println!("{}", to_json(&errors)?);
    } else {
        println!("{}", diff::format_report(errors));
    }
    Ok(())
}

fn print_statements(statements: &[String], json: bool) -> Result<(), DbSchemaError> {
    if json {
        println!("{}", to_json(&statements)?);
    } else {
        for statement in statements {
            println!("{};\n", statement);
        }
    }
    Ok(())
}

fn write_schema(schema: &Schema, output: Option<&Path>, json: bool) -> Result<(), DbSchemaError> {
    match output {
        Some(path) => {
            persist::save_schema(schema, path)?;
            info!("Wrote schema to {:?}", path);
        }
        None => {
            let format = if json {
                persist::SchemaFormat::Json
            } else {
                persist::SchemaFormat::Yaml
            };
            print!("{}", persist::to_string(schema, format)?);
        }
    }
    Ok(())
}

/// Logs go to stderr so statements and reports on stdout stay pipeable.
fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("Unknown verbosity: '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
