use std::io::{Read, Write};

use clap::{Args, Parser, Subcommand};
use codec_avro::{AvroCodec, AvroCodecConfig};
use materialize_engine::{MaterializeConfig, MaterializeError};

#[derive(Parser)]
#[command(name = "avro-materialize", about = "Materialize Avro data into target types")]
struct Cli {
    /// Path to engine TOML configuration file.
    #[arg(long, global = true, env = "MATERIALIZE_CONFIG")]
    config: Option<String>,

    /// Pretty-print each JSON value.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode one binary-encoded datum.
    Datum(Input),
    /// Decode an Avro object-container file.
    Container(Input),
}

#[derive(Args)]
struct Input {
    /// Avro schema (.avsc).
    #[arg(long)]
    schema: String,

    /// Target descriptor (.json or .toml). Inferred from the schema when omitted.
    #[arg(long)]
    target: Option<String>,

    /// Input file. Reads stdin when omitted.
    #[arg(long)]
    input: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error("output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    if let Err(e) = run(&cli, &mut stdout.lock()) {
        tracing::error!(error = %e, "materialization failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<(), CliError> {
    let engine = match &cli.config {
        Some(path) => {
            tracing::info!(config = %path, "loading configuration");
            MaterializeConfig::load(path)?
        }
        None => MaterializeConfig::default(),
    };

    let (input, container) = match &cli.command {
        Command::Datum(input) => (input, false),
        Command::Container(input) => (input, true),
    };
    let codec = AvroCodec::from_config(AvroCodecConfig {
        schema_path: input.schema.clone(),
        target_path: input.target.clone(),
        engine,
    })?;
    let data = read_input(input.input.as_deref())?;

    let values = if container {
        codec.decode_container(data.as_slice())?
    } else {
        vec![codec.decode(&data)?]
    };
    for value in &values {
        if cli.pretty {
            serde_json::to_writer_pretty(&mut *out, value)?;
        } else {
            serde_json::to_writer(&mut *out, value)?;
        }
        writeln!(out)?;
    }
    tracing::info!(values = values.len(), "done");
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<Vec<u8>, CliError> {
    match path {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut data = Vec::new();
            std::io::stdin().lock().read_to_end(&mut data)?;
            Ok(data)
        }
    }
}
