use std::fs;
use std::io::{self, Read};
use std::path::Path;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use fieldmap::{
    ConfigFactory, ConstraintRegistry, DocumentFormat, FieldResolver, SchemaIndex,
    config_json_schema, mapping_document_schema, parse_document_str, parse_widget_config,
    render_document,
};

#[derive(Debug, Parser)]
#[command(
    name = "fieldmap",
    version,
    about = "Inspect which schema fields a search widget may bind to"
)]
struct Cli {
    /// Constraint table replacing the built-in widget kinds (file, inline, or "-")
    #[arg(long = "constraints", value_name = "SOURCE", global = true)]
    constraints: Option<String>,

    /// Emit compact JSON rather than pretty formatting
    #[arg(long = "no-pretty", global = true)]
    no_pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List registered widget kinds
    Kinds,
    /// List fields eligible as roots for a widget kind
    Fields {
        /// Mapping document: file path, inline payload, or "-" for stdin
        #[arg(short = 's', long = "schema", value_name = "SOURCE")]
        schema: String,
        #[arg(short = 'k', long = "kind", value_name = "KIND")]
        kind: String,
    },
    /// Print the default configuration for a new widget
    Default {
        #[arg(short = 's', long = "schema", value_name = "SOURCE")]
        schema: String,
        #[arg(short = 'k', long = "kind", value_name = "KIND")]
        kind: String,
        /// Widget id; defaults to the kind
        #[arg(long = "id", value_name = "ID")]
        id: Option<String>,
    },
    /// Expand a stored widget configuration into its concrete binding
    Resolve {
        #[arg(short = 's', long = "schema", value_name = "SOURCE")]
        schema: String,
        /// Stored widget configuration: file path, inline payload, or "-"
        #[arg(short = 'c', long = "config", value_name = "SOURCE")]
        config: String,
    },
    /// Print the JSON Schema of stored widget configurations
    ConfigSchema,
    /// Print the JSON Schema of mapping documents
    MappingSchema,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = match cli.constraints.as_deref() {
        Some(source) => {
            let table = load_value(source, "constraints")?;
            ConstraintRegistry::from_value(&table).wrap_err("invalid constraint table")?
        }
        None => ConstraintRegistry::builtin().clone(),
    };
    let pretty = !cli.no_pretty;

    match cli.command {
        Command::Kinds => {
            for constraint in registry.iter() {
                let types = constraint
                    .accepted_types
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                println!(
                    "{}\tmultiple={}\tweighted={}\ttypes={}",
                    constraint.kind, constraint.multiple, constraint.weighted, types
                );
            }
        }
        Command::Fields { schema, kind } => {
            let index = load_schema(&schema)?;
            let constraint = registry.constraint_for(&kind)?;
            for field in index.fields(&constraint.accepted_types, constraint.eligibility) {
                println!("{field}");
            }
        }
        Command::Default { schema, kind, id } => {
            let index = load_schema(&schema)?;
            let widget_id = id.unwrap_or_else(|| kind.clone());
            let config = ConfigFactory::new(&registry).default_config(&widget_id, &kind, &index)?;
            print_document(&config, pretty)?;
        }
        Command::Resolve { schema, config } => {
            let index = load_schema(&schema)?;
            let mut config = parse_widget_config(&load_value(&config, "config")?)?;
            let constraint = registry.constraint_for(&config.kind)?;
            config.normalize_aux_values(&constraint)?;
            config.validate(&index, &constraint)?;
            let binding = FieldResolver::new(&index, &constraint).resolve(&config)?;
            print_document(&binding, pretty)?;
        }
        Command::ConfigSchema => print_document(&config_json_schema(), pretty)?,
        Command::MappingSchema => print_document(&mapping_document_schema(), pretty)?,
    }
    Ok(())
}

fn load_schema(source: &str) -> Result<SchemaIndex> {
    let document = load_value(source, "schema")?;
    Ok(SchemaIndex::from_value(&document)?)
}

fn print_document<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let rendered = render_document(value, DocumentFormat::Json, pretty)
        .map_err(|err| eyre!("failed to render output: {err:#}"))?;
    println!("{rendered}");
    Ok(())
}

/// Load a document from stdin (`-`), a file, or the argument text itself.
fn load_value(source: &str, label: &str) -> Result<Value> {
    if source == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .wrap_err("failed to read from stdin")?;
        return parse_contents(&buffer, DocumentFormat::Json, label);
    }

    let trimmed = source.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return parse_contents(source, DocumentFormat::Json, &format!("inline {label}"));
    }

    let path = Path::new(source);
    match fs::read_to_string(path) {
        Ok(contents) => {
            let format = DocumentFormat::from_path(path).unwrap_or_default();
            debug!(%format, path = %path.display(), "loading {label}");
            parse_contents(&contents, format, label)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            parse_contents(source, DocumentFormat::Json, &format!("inline {label}"))
        }
        Err(err) => {
            Err(err).wrap_err_with(|| format!("failed to load {label} from {}", path.display()))
        }
    }
}

fn parse_contents(contents: &str, format: DocumentFormat, label: &str) -> Result<Value> {
    parse_document_str(contents, format)
        .map_err(|err| eyre!("failed to parse {label}: {err:#}"))
}
