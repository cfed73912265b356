//! chunkdoc CLI: inspect and round-trip chunked container files.

use clap::{Args, Parser, Subcommand};
use chunkdoc::frame::{frames, seek_signature};
use chunkdoc::formats::adt::Mcnk;
use chunkdoc::kinds::{terrain_tile, DocumentKind};
use chunkdoc::{Chunk, ContainerOptions, Dialect, Document, Flagged, FormatVersion, Signature, UnknownChunkPolicy};
use serde_json::json;
use std::process;

#[derive(Parser)]
#[command(name = "chunkdoc", about = "Inspect and rewrite chunked terrain, map and model files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all top-level chunk frames
    List(ListArgs),
    /// Find all occurrences of a chunk signature
    Find(FindArgs),
    /// Load a file as a document kind and show its fields
    Show(DocArgs),
    /// Load and save a file, reporting whether the bytes are identical
    Roundtrip(RoundtripArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Input file
    #[arg(short, long)]
    input: String,

    /// Signatures are stored in reading order (default: reversed)
    #[arg(long)]
    forward: bool,
}

impl InputArgs {
    fn dialect(&self) -> Dialect {
        if self.forward {
            Dialect::Forward
        } else {
            Dialect::Reversed
        }
    }
}

#[derive(Args)]
struct ListArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FindArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Four-character signature as read (e.g. MVER)
    #[arg(short, long)]
    signature: String,
}

#[derive(Args)]
struct DocArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Document kind (blob, adt, wmo, fog)
    #[arg(short, long)]
    kind: String,

    /// Format version (e.g. legion, wod, tww; default: newest)
    #[arg(short, long)]
    version: Option<String>,

    /// Fail on chunks the document kind does not know
    #[arg(long)]
    strict: bool,

    /// Maximum payload length per chunk
    #[arg(long)]
    max_chunk_size: Option<u32>,
}

impl DocArgs {
    fn to_options(&self) -> Result<ContainerOptions, String> {
        let version = match &self.version {
            Some(v) => v.parse::<FormatVersion>().map_err(|e| e.to_string())?,
            None => FormatVersion::LATEST,
        };
        let mut options = ContainerOptions::default()
            .with_version(version)
            .with_dialect(self.input.dialect());
        if self.strict {
            options.set_unknown_chunks(UnknownChunkPolicy::Reject);
        }
        options.set_max_chunk_size(self.max_chunk_size);
        options.validate().map_err(|e| format!("invalid options: {e}"))?;
        Ok(options)
    }

    fn kind(&self) -> Result<DocumentKind, String> {
        self.kind.parse::<DocumentKind>().map_err(|e| e.to_string())
    }

    fn load(&self) -> Result<(Vec<u8>, Document), String> {
        let kind = self.kind()?;
        let options = self.to_options()?;
        let bytes = read_input(&self.input.input)?;
        let doc = Document::load(kind.schema(), &bytes, options)
            .map_err(|e| format!("cannot load '{}' as {kind}: {e}", self.input.input))?;
        Ok((bytes, doc))
    }
}

#[derive(Args)]
struct RoundtripArgs {
    #[command(flatten)]
    doc: DocArgs,

    /// Write the saved bytes to this file
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::List(args) => run_list(args),
        Command::Find(args) => run_find(args),
        Command::Show(args) => run_show(args),
        Command::Roundtrip(args) => run_roundtrip(args),
    }
}

fn read_input(path: &str) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("cannot read '{path}': {e}"))
}

fn run_list(args: ListArgs) -> Result<(), String> {
    let bytes = read_input(&args.input.input)?;
    let mut rows = Vec::new();
    for frame in frames(&bytes, args.input.dialect()) {
        let frame = frame.map_err(|e| e.to_string())?;
        rows.push((frame.offset, frame.signature, frame.payload.len()));
    }

    if args.json {
        let list: Vec<_> = rows
            .iter()
            .map(|(offset, sig, len)| json!({ "offset": offset, "signature": sig.to_string(), "length": len }))
            .collect();
        let text = serde_json::to_string_pretty(&list).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        for (offset, sig, len) in rows {
            println!("{offset:>10}  {sig}  {len}");
        }
    }
    Ok(())
}

fn run_find(args: FindArgs) -> Result<(), String> {
    let signature = args.signature.parse::<Signature>().map_err(|e| e.to_string())?;
    let bytes = read_input(&args.input.input)?;
    let mut from = 0;
    let mut hits = 0;
    while let Some(pos) = seek_signature(&bytes, signature, args.input.dialect(), from) {
        println!("{pos}");
        hits += 1;
        from = pos + 1;
    }
    if hits == 0 {
        return Err(format!("signature '{signature}' not found"));
    }
    Ok(())
}

fn run_show(args: DocArgs) -> Result<(), String> {
    let (_, doc) = args.load()?;
    println!("{} ({})", doc.schema().name(), doc.version());
    for field in doc.schema().fields() {
        if !field.is_active(doc.version()) {
            continue;
        }
        let count = doc.len(field.name()).map_err(|e| e.to_string())?;
        println!("  {:<24} {}  {count}", field.name(), field.signature());
    }
    if args.kind()? == DocumentKind::TerrainTile {
        print_flags::<Mcnk>(&doc, terrain_tile::MAP_CHUNKS)?;
    }
    for chunk in doc.opaque_chunks() {
        println!(
            "  opaque '{}' at {} ({} bytes, after {})",
            chunk.signature,
            chunk.offset,
            chunk.payload.len(),
            chunk.after.unwrap_or("-")
        );
    }
    Ok(())
}

/// One line per element of a list whose payloads carry flags.
fn print_flags<T: Chunk + Flagged>(doc: &Document, field: &str) -> Result<(), String> {
    for (i, chunk) in doc.list::<T>(field).map_err(|e| e.to_string())?.into_iter().enumerate() {
        println!("  {field}[{i}] flags {:#x}", chunk.flags().bits());
    }
    Ok(())
}

fn run_roundtrip(args: RoundtripArgs) -> Result<(), String> {
    let (original, doc) = args.doc.load()?;
    let saved = doc.save().map_err(|e| format!("save failed: {e}"))?;

    if let Some(path) = &args.output {
        std::fs::write(path, &saved).map_err(|e| format!("cannot write '{path}': {e}"))?;
    }
    if saved == original {
        println!("identical ({} bytes)", saved.len());
        Ok(())
    } else {
        Err(format!("output differs: {} bytes in, {} bytes out", original.len(), saved.len()))
    }
}
