use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paramforge_core::store::parse_state;
use paramforge_core::{
    apply_json_edit, compile_payload, compile_unit, parse_directives, reconcile, CompileOptions,
    InstanceNode, RuleSet, SchemaNode, SchemaTreeBuilder,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "paramforge")]
#[command(about = "Compile validation rules into parameter schemas, instance trees and request payloads")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output file (defaults to stdout if not specified)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    format: OutputFormat,

    /// Compile options file (JSON, kebab-case keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a rules file (field path → rules) into a schema tree
    Compile {
        /// Rules JSON file
        rules: PathBuf,

        /// Source file with manual parameter directives; its body params replace the rules
        #[arg(long)]
        manual: Option<PathBuf>,
    },

    /// Extract body, query, header and response declarations from doc comments
    Directives {
        /// Source file to scan
        input: PathBuf,
    },

    /// Infer a schema tree from an example JSON payload
    Example {
        /// Example JSON file
        input: PathBuf,
    },

    /// Build an instance tree from a schema, reconciled against saved state
    Hydrate {
        /// Schema tree JSON file
        schema: PathBuf,

        /// Saved instance state (node array or object of nodes)
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Compile a request payload from a schema and saved state
    Payload {
        /// Schema tree JSON file
        schema: PathBuf,

        /// Saved instance state (node array or object of nodes)
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Apply a raw JSON edit to saved instance state
    ApplyJson {
        /// Saved instance state
        state: PathBuf,

        /// JSON object with the edited values
        edit: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let options = load_options(cli.config.as_deref())?;
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Compile { rules, manual } => {
            let rule_set: RuleSet = read_json(&rules, "rules")?;
            let manual_params = match manual {
                Some(path) => parse_directives(&read_text(&path)?, &options).body,
                None => Vec::new(),
            };
            let tree = compile_unit(&rule_set, &manual_params, &options);
            write_json(&tree, output, cli.format)?;
        }
        Commands::Directives { input } => {
            let directives = parse_directives(&read_text(&input)?, &options);
            let responses: BTreeMap<&String, Vec<SchemaNode>> = directives
                .responses
                .iter()
                .map(|(status, params)| (status, SchemaTreeBuilder::from_manual(params, &options)))
                .collect();
            let result = serde_json::json!({
                "body": SchemaTreeBuilder::from_manual(&directives.body, &options),
                "query": SchemaTreeBuilder::from_manual(&directives.query, &options),
                "headers": directives.headers,
                "responses": responses,
            });
            write_json(&result, output, cli.format)?;
        }
        Commands::Example { input } => {
            let example: serde_json::Value = read_json(&input, "example")?;
            let tree = SchemaTreeBuilder::from_example(&example, &options);
            write_json(&tree, output, cli.format)?;
        }
        Commands::Hydrate { schema, state } => {
            let tree = hydrate(&schema, state.as_deref(), &options)?;
            write_json(&tree, output, cli.format)?;
        }
        Commands::Payload { schema, state } => {
            let tree = hydrate(&schema, state.as_deref(), &options)?;
            write_json(&compile_payload(&tree), output, cli.format)?;
        }
        Commands::ApplyJson { state, edit } => {
            let prior = read_state(&state)?;
            let tree = apply_json_edit(&read_text(&edit)?, &prior, &options)
                .map_err(|e| anyhow::Error::from(e).context("JSON edit rejected"))?;
            write_json(&tree, output, cli.format)?;
        }
    }

    Ok(())
}

fn load_options(path: Option<&Path>) -> Result<CompileOptions> {
    match path {
        Some(p) => read_json(p, "config"),
        None => Ok(CompileOptions::default()),
    }
}

fn hydrate(
    schema_path: &Path,
    state_path: Option<&Path>,
    options: &CompileOptions,
) -> Result<Vec<InstanceNode>> {
    let schema: Vec<SchemaNode> = read_json(schema_path, "schema")?;
    let prior = match state_path {
        Some(p) => read_state(p)?,
        None => Vec::new(),
    };
    Ok(reconcile(&schema, &prior, options))
}

fn read_state(path: &Path) -> Result<Vec<InstanceNode>> {
    let raw: serde_json::Value = read_json(path, "state")?;
    parse_state(raw).with_context(|| format!("Failed to read state from: {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {what} file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {what} from: {}", path.display()))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;

    Ok(())
}
