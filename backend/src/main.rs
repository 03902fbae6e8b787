//! Schemamap CLI - map records to a target schema with a local model
//!
//! # Main Commands
//!
//! ```bash
//! schemamap map --data row.json --source-schema src.json --target-schema dst.json
//! schemamap batch products.csv --target-schema dst.json --rules rules.txt
//! schemamap rules --source-schema src.json --target-schema dst.json
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! schemamap repair response.txt    # Run the repair pipeline on a saved model response
//! schemamap parse products.csv     # Print loaded rows
//! ```

use clap::{Parser, Subcommand};
use schemamap::logs::set_verbose;
use schemamap::models::Record;
use schemamap::parser::{default_source_schema, load_rows};
use schemamap::transform::export::export;
use schemamap::{
    BatchMapper, BatchRequest, ExportFormat, Mapper, MapperConfig, MappingRequest, RepairOptions,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "schemamap")]
#[command(about = "Map records to a target schema with a local language model", long_about = None)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Generation service base URL (default: $OLLAMA_HOST or http://localhost:11434)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Model name (default: $OLLAMA_MODEL or mistral)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Keep JSON-looking string values as strings
    #[arg(long, global = true)]
    no_unstringify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a single record
    Map {
        /// Source record (JSON object)
        #[arg(long)]
        data: PathBuf,

        /// Source schema file
        #[arg(long)]
        source_schema: PathBuf,

        /// Target schema file
        #[arg(long)]
        target_schema: PathBuf,

        /// Mapping rules file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Target sample data file
        #[arg(long)]
        sample: Option<PathBuf>,
    },

    /// Map every row of a CSV or JSON file
    Batch {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Target schema file
        #[arg(long)]
        target_schema: PathBuf,

        /// Mapping rules file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Source schema file (default for CSV: every column is a String)
        #[arg(long)]
        source_schema: Option<PathBuf>,

        /// Target sample data file
        #[arg(long)]
        sample: Option<PathBuf>,

        /// Rows mapped at the same time
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Output file for the batch result (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export mapped rows to this file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Export format (json or csv)
        #[arg(long, default_value = "json")]
        format: ExportFormat,
    },

    /// Generate "Map X to Y" rules for two schemas
    Rules {
        /// Source schema file
        #[arg(long)]
        source_schema: PathBuf,

        /// Target schema file
        #[arg(long)]
        target_schema: PathBuf,
    },

    /// Run the repair pipeline on a saved model response
    Repair {
        /// File holding the raw response text
        input: PathBuf,
    },

    /// Load a CSV or JSON file and print its rows
    Parse {
        /// Input file
        input: PathBuf,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    set_verbose(cli.verbose);

    let result = match config_from(&cli) {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn config_from(cli: &Cli) -> Result<MapperConfig, Box<dyn std::error::Error>> {
    let mut config = MapperConfig::from_env()?;
    if let Some(host) = &cli.host {
        config = config.with_host(host);
    }
    if let Some(model) = &cli.model {
        config = config.with_model(model);
    }
    if let Some(temperature) = cli.temperature {
        config = config.with_temperature(temperature);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if cli.no_unstringify {
        config = config.with_unstringify_nested(false);
    }
    Ok(config)
}

async fn run(command: Commands, config: MapperConfig) -> CliResult {
    match command {
        Commands::Map {
            data,
            source_schema,
            target_schema,
            rules,
            sample,
        } => {
            cmd_map(
                &config,
                &data,
                &source_schema,
                &target_schema,
                rules.as_deref(),
                sample.as_deref(),
            )
            .await
        }

        Commands::Batch {
            input,
            target_schema,
            rules,
            source_schema,
            sample,
            concurrency,
            output,
            export,
            format,
        } => {
            let config = match concurrency {
                Some(n) => config.with_concurrency(n),
                None => config,
            };
            let files = BatchFiles {
                input,
                target_schema,
                rules,
                source_schema,
                sample,
            };
            cmd_batch(&config, files, output.as_deref(), export.as_deref(), format).await
        }

        Commands::Rules {
            source_schema,
            target_schema,
        } => cmd_rules(&config, &source_schema, &target_schema).await,

        Commands::Repair { input } => cmd_repair(&config, &input),

        Commands::Parse { input } => cmd_parse(&input),
    }
}

async fn cmd_map(
    config: &MapperConfig,
    data: &Path,
    source_schema: &Path,
    target_schema: &Path,
    rules: Option<&Path>,
    sample: Option<&Path>,
) -> CliResult {
    let source_data: Record = serde_json::from_str(&fs::read_to_string(data)?)?;
    let request = MappingRequest::new(source_data, read_text(source_schema)?, read_text(target_schema)?)
        .with_rules(read_optional(rules)?.unwrap_or_default())
        .with_target_sample(read_optional(sample)?);

    eprintln!("🤖 Mapping record with {} at {}", config.model, config.host);
    let mapper = Mapper::from_config(config)?;
    let result = mapper.map(&request).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    match result.error_message() {
        Some(message) => Err(message.into()),
        None => {
            eprintln!("✅ Mapped in {}ms", result.execution_time_ms);
            Ok(())
        }
    }
}

struct BatchFiles {
    input: PathBuf,
    target_schema: PathBuf,
    rules: Option<PathBuf>,
    source_schema: Option<PathBuf>,
    sample: Option<PathBuf>,
}

async fn cmd_batch(
    config: &MapperConfig,
    files: BatchFiles,
    output: Option<&Path>,
    export_path: Option<&Path>,
    format: ExportFormat,
) -> CliResult {
    eprintln!("📄 Loading: {}", files.input.display());
    let loaded = load_rows(&files.input)?;
    eprintln!("   Rows: {}", loaded.rows.len());

    let source_schema = match (&files.source_schema, loaded.headers.is_empty()) {
        (Some(path), _) => read_text(path)?,
        (None, false) => default_source_schema(&loaded.headers),
        (None, true) => return Err("JSON input needs --source-schema".into()),
    };

    let file_name = files
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| files.input.display().to_string());

    let request = BatchRequest {
        file_name,
        rows: loaded.rows,
        source_schema,
        target_schema: read_text(&files.target_schema)?,
        mapping_rules: read_optional(files.rules.as_deref())?.unwrap_or_default(),
        target_sample_data: read_optional(files.sample.as_deref())?,
    };

    let mapper = Mapper::from_config(config)?;
    let result = BatchMapper::new(mapper, config.concurrency).map_batch(request).await;

    eprintln!(
        "\n⚙️  {} of {} rows mapped ({} failed) in {}ms",
        result.successful_mappings, result.total_rows_processed, result.failed_mappings, result.processing_time_ms
    );

    if let Some(path) = export_path {
        fs::write(path, export(&result.mapped_data, format)?)?;
        eprintln!("   💾 Mapped rows exported to: {}", path.display());
    }

    write_output(&serde_json::to_string_pretty(&result)?, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

async fn cmd_rules(config: &MapperConfig, source_schema: &Path, target_schema: &Path) -> CliResult {
    let mapper = Mapper::from_config(config)?;
    let rules = mapper
        .generate_mapping_rules(&read_text(source_schema)?, &read_text(target_schema)?)
        .await?;
    println!("{}", rules);
    Ok(())
}

fn cmd_repair(config: &MapperConfig, input: &Path) -> CliResult {
    let raw = fs::read_to_string(input)?;
    let options = RepairOptions {
        unstringify_nested: config.unstringify_nested,
    };
    let record = schemamap::repair_with(&raw, options)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn cmd_parse(input: &Path) -> CliResult {
    eprintln!("📄 Parsing: {}", input.display());
    let loaded = load_rows(input)?;

    if let Some(encoding) = &loaded.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(delimiter) = loaded.delimiter {
        eprintln!("   Delimiter: '{}'", format_delimiter(delimiter));
    }
    if !loaded.headers.is_empty() {
        eprintln!("   Columns: {}", loaded.headers.join(", "));
    }
    eprintln!("✅ Parsed {} records", loaded.rows.len());

    println!("{}", serde_json::to_string_pretty(&loaded.rows)?);
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn read_text(path: &Path) -> Result<String, std::io::Error> {
    fs::read_to_string(path).map(|s| s.trim().to_string())
}

fn read_optional(path: Option<&Path>) -> Result<Option<String>, std::io::Error> {
    path.map(read_text).transpose()
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
