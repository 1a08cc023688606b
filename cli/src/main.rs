use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use jsonmap_core::{map_and_validate, JsonSchema, MappingDeclaration, Outcome, TransformRegistry, ValidateOptions};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "jsonmap")]
#[command(about = "Extract a flat record from nested JSON, transform it and validate it against a JSON Schema")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a source document through a mapping file and validate the result
    Map {
        /// Source JSON file
        input: PathBuf,

        /// Mapping declaration file
        #[arg(short, long)]
        mapping: PathBuf,

        /// JSON Schema file the mapped record must satisfy
        #[arg(short, long)]
        schema: PathBuf,

        /// Output file for the validated record (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        #[command(flatten)]
        validation: ValidationArgs,
    },

    /// Validate a JSON document against a schema without mapping
    Validate {
        /// JSON file to validate
        input: PathBuf,

        /// JSON Schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Output file for the (possibly coerced) document (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        #[command(flatten)]
        validation: ValidationArgs,
    },

    /// List the built-in transform names usable in mapping files
    Transforms,
}

#[derive(Args)]
struct ValidationArgs {
    /// Validator config file (kebab-case JSON, e.g. {"coerce-types": true})
    #[arg(long)]
    config: Option<PathBuf>,

    /// Coerce primitive values to the declared schema type before checking
    #[arg(long)]
    coerce: bool,

    /// Treat `format` as an annotation instead of checking it
    #[arg(long)]
    no_formats: bool,

    /// Max schema nesting depth, including `$ref` hops
    #[arg(long)]
    max_depth: Option<usize>,
}

impl ValidationArgs {
    /// Config file first, then flags on top.
    fn options(&self) -> Result<ValidateOptions> {
        let mut options: ValidateOptions = match &self.config {
            Some(path) => serde_json::from_value(read_json(path, "config")?)
                .with_context(|| format!("Invalid config in: {}", path.display()))?,
            None => ValidateOptions::default(),
        };
        if self.coerce {
            options.coerce_types = true;
        }
        if self.no_formats {
            options.check_formats = false;
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        Ok(options)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<ExitCode> {
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

    match cli.command {
        Commands::Map {
            input,
            mapping,
            schema,
            output,
            format,
            validation,
        } => {
            let source = read_json(&input, "input")?;
            let registry = TransformRegistry::builtin();
            let declaration = MappingDeclaration::from_json(&read_json(&mapping, "mapping")?, &registry)
                .map_err(|e| {
                    anyhow::Error::from(e).context(format!("Invalid mapping: {}", mapping.display()))
                })?;
            let schema = load_schema(&schema, validation.options()?)?;

            let outcome = map_and_validate(&source, &declaration, &schema);
            report(outcome, output.as_ref(), format)
        }
        Commands::Validate {
            input,
            schema,
            output,
            format,
            validation,
        } => {
            let data = read_json(&input, "input")?;
            let schema = load_schema(&schema, validation.options()?)?;

            let outcome = Outcome::from(schema.check(data));
            report(outcome, output.as_ref(), format)
        }
        Commands::Transforms => {
            let registry = TransformRegistry::builtin();
            let mut stdout = BufWriter::new(io::stdout());
            for name in registry.names() {
                writeln!(stdout, "{}", name).context("Failed to write transform list")?;
            }
            stdout.flush().context("Failed to flush stdout")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_json(path: &Path, what: &str) -> Result<Value> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", what, path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {} JSON from: {}", what, path.display()))
}

fn load_schema(path: &Path, options: ValidateOptions) -> Result<JsonSchema> {
    let document = read_json(path, "schema")?;
    JsonSchema::compile(document, options)
        .map_err(|e| anyhow::Error::from(e).context(format!("Invalid schema: {}", path.display())))
}

/// Success writes the record; failure lists issues on stderr and prints the
/// failure outcome on stdout.
fn report(outcome: Outcome, output: Option<&PathBuf>, format: OutputFormat) -> Result<ExitCode> {
    match &outcome {
        Outcome::Success { value } => {
            write_json(value, output, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Failure { issues } => {
            for issue in issues {
                eprintln!("Error: {}", issue);
            }
            write_json(&outcome, None, format)?;
            Ok(ExitCode::FAILURE)
        }
    }
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
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
