mod render;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use binfmt::{
    CanonicalEncoder, DateTime, DateTimeKind, DecodeOptions, PrimitiveValue, StreamDecoder,
    TimeSpan, Value, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NULL_SLOTS,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "binfmt-dump")]
#[command(about = "Inspect, decode and encode legacy binary object serialization payloads")]
#[command(version)]
struct Cli {
    /// Log record dispatch to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the top-level records of a payload
    Inspect {
        /// Input payload (stdin if omitted)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        #[command(flatten)]
        limits: Limits,
    },

    /// Print the root value of a payload
    Decode {
        /// Input payload (stdin if omitted)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "pretty")]
        format: Format,

        #[command(flatten)]
        limits: Limits,
    },

    /// Write a single scalar or string as a payload
    Encode {
        /// Kind of the value
        #[arg(long, value_enum, default_value = "string")]
        kind: Kind,

        /// Value text
        value: String,

        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct Limits {
    /// Maximum record nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum null slots all null runs may expand to
    #[arg(long, default_value_t = DEFAULT_MAX_NULL_SLOTS)]
    max_null_slots: usize,

    /// Let a later record replace an earlier one with the same id
    #[arg(long)]
    allow_duplicate_ids: bool,
}

impl Limits {
    fn options(&self) -> DecodeOptions {
        DecodeOptions::new()
            .max_depth(self.max_depth)
            .max_null_slots(self.max_null_slots)
            .allow_duplicate_ids(self.allow_duplicate_ids)
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Kind {
    String,
    Bool,
    Int32,
    Int64,
    Double,
    Decimal,
    Char,
    /// Ticks, UTC
    DateTime,
    /// Ticks
    TimeSpan,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "binfmt=trace" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Inspect { input, limits } => cmd_inspect(input.as_deref(), &limits),
        Commands::Decode {
            input,
            format,
            limits,
        } => cmd_decode(input.as_deref(), format, &limits),
        Commands::Encode {
            kind,
            value,
            output,
        } => cmd_encode(kind, &value, output.as_deref()),
    }
}

fn read_input(input: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match input {
        Some(path) if path != Path::new("-") => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))
        }
        _ => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("reading stdin")?;
            Ok(bytes)
        }
    }
}

fn decode_input(input: Option<&Path>, limits: &Limits) -> anyhow::Result<StreamDecoder> {
    let bytes = read_input(input)?;
    let decoder = StreamDecoder::with_options(&bytes, limits.options())
        .context("payload is not a valid stream")?;
    if decoder.consumed() < bytes.len() {
        log::warn!(
            "{} trailing bytes after the end of the stream",
            bytes.len() - decoder.consumed()
        );
    }
    Ok(decoder)
}

fn cmd_inspect(input: Option<&Path>, limits: &Limits) -> anyhow::Result<()> {
    let decoder = decode_input(input, limits)?;
    let header = decoder.header();
    println!(
        "header: root={} version={}.{} ({} bytes)",
        header.root_id,
        header.major_version,
        header.minor_version,
        decoder.consumed()
    );
    for (position, record) in decoder.records().enumerate() {
        println!("  {position:>4}  {}", render::describe(record));
    }
    match decoder.try_get_value()? {
        Some(value) => println!("root: {}", value.kind()),
        None => println!("root: unrecognized"),
    }
    Ok(())
}

fn cmd_decode(input: Option<&Path>, format: Format, limits: &Limits) -> anyhow::Result<()> {
    let decoder = decode_input(input, limits)?;
    let Some(value) = decoder.try_get_value()? else {
        let kind = decoder
            .root_record()
            .map(render::describe)
            .unwrap_or_else(|e| e.to_string());
        bail!("root has no recognized shape: {kind}");
    };
    let json = render::to_json(&value);
    match format {
        Format::Pretty => println!("{}", serde_json::to_string_pretty(&json)?),
        Format::Json => println!("{json}"),
    }
    Ok(())
}

fn cmd_encode(kind: Kind, text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let value = parse_value(kind, text)?;
    let mut encoder = CanonicalEncoder::new();
    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            encoder.encode_to(&value, &mut file)?;
            println!("[OK] wrote {} to {}", value.kind(), path.display());
        }
        None => {
            let bytes = encoder.encode(&value)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn parse_value(kind: Kind, text: &str) -> anyhow::Result<Value> {
    let primitive = match kind {
        Kind::String => return Ok(Value::from(text)),
        Kind::Bool => PrimitiveValue::Boolean(text.parse()?),
        Kind::Int32 => PrimitiveValue::Int32(text.parse()?),
        Kind::Int64 => PrimitiveValue::Int64(text.parse()?),
        Kind::Double => PrimitiveValue::Double(text.parse()?),
        Kind::Decimal => PrimitiveValue::Decimal(text.parse()?),
        Kind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => PrimitiveValue::Char(c),
                _ => bail!("expected exactly one character, got {text:?}"),
            }
        }
        Kind::DateTime => {
            let ticks: i64 = text.parse()?;
            match DateTime::new(ticks, DateTimeKind::Utc) {
                Some(value) => PrimitiveValue::DateTime(value),
                None => bail!("date-time ticks out of range: {ticks}"),
            }
        }
        Kind::TimeSpan => PrimitiveValue::TimeSpan(TimeSpan::from_ticks(text.parse()?)),
    };
    Ok(Value::Primitive(primitive))
}
