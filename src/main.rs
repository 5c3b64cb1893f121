use std::fs::{self, File, Metadata};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::SystemTime;

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn, LevelFilter};

use tabout::codec::{attributes, Timestamp};
use tabout::output::OutputFormat as OutputFmt;
use tabout::{
    json, termination, ColumnDescriptor, DocValue, EnumValue, OutputOptions, Schema,
    SemanticType, StructuredOutput, TableOutput, TableWriter,
};

const KINDS: [&str; 3] = ["File", "Directory", "Symlink"];

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    /// Parquet file, one row per entry
    Parquet,
    /// JSON document, one element per entry
    Json,
}

impl From<OutputFmt> for OutputFormat {
    fn from(format: OutputFmt) -> Self {
        match format {
            OutputFmt::Parquet => OutputFormat::Parquet,
            OutputFmt::Json => OutputFormat::Json,
        }
    }
}

/// Write directory listings as Parquet tables or JSON documents
#[derive(Parser, Debug)]
#[command(name = "tabout", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List a directory tree into a table or document
    #[command(after_help = "Output format is inferred from the -o extension unless --format is given.")]
    Scan(ScanArgs),
}

#[derive(Parser, Debug)]
struct ScanArgs {
    /// Directory to walk
    dir: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Output format (inferred from -o if not specified)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Rows per Parquet batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,

    /// Encode JSON output as UTF-16LE
    #[arg(long)]
    utf16: bool,

    /// JSON file with writer options; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

/// One directory entry, as listed.
struct Entry {
    path: String,
    size: u64,
    modified: Option<SystemTime>,
    kind: u32,
    attributes: u32,
    readonly: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // Writers still open when we panic get a chance to finish their files.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        termination::global().run_handlers();
        default_hook(info);
    }));

    match cli.command {
        Commands::Scan(args) => run_scan(args),
    }
}

fn run_scan(args: ScanArgs) -> ExitCode {
    let mut options = match &args.config {
        Some(path) => match OutputOptions::from_json_file(path) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => OutputOptions::default(),
    };
    if args.batch_size.is_some() {
        options.batch_size = args.batch_size;
    }
    if args.pretty {
        options.pretty_print = true;
    }
    if args.utf16 {
        options.encoding = tabout::config::TextEncoding::Utf16;
    }

    let format = match args
        .format
        .or_else(|| OutputFmt::infer_from_path(&args.output).map(OutputFormat::from))
    {
        Some(format) => format,
        None => {
            eprintln!("Error: cannot infer output format from path, use --format");
            return ExitCode::FAILURE;
        }
    };

    let entries = match walk(&args.dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error: cannot read {}: {e}", args.dir.display());
            return ExitCode::FAILURE;
        }
    };
    info!("found {} entries under {}", entries.len(), args.dir.display());

    let result = match format {
        OutputFormat::Parquet => write_table(&entries, &args.output, options),
        OutputFormat::Json => write_document(&entries, &args.output, &options),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    eprintln!("Wrote {} entries to {}", entries.len(), args.output.display());
    ExitCode::SUCCESS
}

fn listing_schema() -> tabout::Result<Schema> {
    Schema::new(vec![
        ColumnDescriptor::new("path", SemanticType::Utf8Text),
        ColumnDescriptor::new("size", SemanticType::UInt64),
        ColumnDescriptor::new("modified", SemanticType::Timestamp),
        ColumnDescriptor::new("kind", SemanticType::Enum(Some(EnumValue::table(KINDS)))),
        ColumnDescriptor::new("attributes", SemanticType::Utf8Text),
        ColumnDescriptor::new("readonly", SemanticType::Bool),
    ])
}

fn write_table(entries: &[Entry], output: &Path, options: OutputOptions) -> tabout::Result<()> {
    let mut writer = TableWriter::new(options)?;
    writer.set_schema(listing_schema()?)?;
    writer.write_to_file(output)?;

    for entry in entries {
        writer.write_str(&entry.path)?;
        writer.write_u64(entry.size)?;
        match entry.modified {
            Some(time) => writer.write_timestamp(Timestamp::from_system_time(time))?,
            None => writer.write_nothing()?,
        }
        writer.write_enum(entry.kind)?;
        writer.write_attributes(entry.attributes)?;
        writer.write_bool(entry.readonly)?;
        writer.end_of_row()?;
    }

    writer.close()?;
    if writer.encoding_failures() > 0 {
        warn!("{} values could not be encoded", writer.encoding_failures());
    }
    Ok(())
}

fn write_document(entries: &[Entry], output: &Path, options: &OutputOptions) -> tabout::Result<()> {
    let file = BufWriter::new(File::create(output)?);
    let mut doc = json::open(file, options)?;

    doc.write_named("root", DocValue::Str(&output.display().to_string()))?;
    doc.begin_collection(Some("entries"))?;
    for entry in entries {
        doc.begin_element(None)?;
        doc.write_named("path", DocValue::Str(&entry.path))?;
        doc.write_named("size", entry.size.into())?;
        if let Some(time) = entry.modified {
            doc.write_named("modified", Timestamp::from_system_time(time).into())?;
        }
        doc.write_named(
            "kind",
            DocValue::Enum {
                code: entry.kind,
                names: &KINDS,
            },
        )?;
        doc.write_named("attributes", DocValue::Attributes(entry.attributes))?;
        doc.write_named("readonly", entry.readonly.into())?;
        doc.end_element()?;
    }
    doc.end_collection()?;
    doc.write_named("count", (entries.len() as u64).into())?;
    doc.close()
}

/// Walk `dir` depth first. Unreadable subdirectories are skipped with a warning.
fn walk(dir: &Path) -> std::io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    let mut first = true;

    while let Some(current) = pending.pop() {
        let listing = match fs::read_dir(&current) {
            Ok(listing) => listing,
            Err(e) if !first => {
                warn!("skipping {}: {}", current.display(), e);
                continue;
            }
            Err(e) => return Err(e),
        };
        first = false;

        for item in listing {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!("skipping entry in {}: {}", current.display(), e);
                    continue;
                }
            };
            let path = item.path();
            let metadata = match fs::symlink_metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if metadata.is_dir() {
                pending.push(path.clone());
            }
            let relative = path.strip_prefix(dir).unwrap_or(&path);
            entries.push(entry_for(relative, &metadata));
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn entry_for(path: &Path, metadata: &Metadata) -> Entry {
    let file_type = metadata.file_type();
    let kind = if file_type.is_symlink() {
        2
    } else if file_type.is_dir() {
        1
    } else {
        0
    };

    let readonly = metadata.permissions().readonly();
    let mut attrs = 0;
    if file_type.is_dir() {
        attrs |= attributes::DIRECTORY;
    }
    if file_type.is_symlink() {
        attrs |= attributes::REPARSE_POINT;
    }
    if readonly {
        attrs |= attributes::READONLY;
    }
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'));
    if hidden {
        attrs |= attributes::HIDDEN;
    }
    if attrs == 0 {
        attrs = attributes::NORMAL;
    }

    Entry {
        path: path.to_string_lossy().into_owned(),
        size: metadata.len(),
        modified: metadata.modified().ok(),
        kind,
        attributes: attrs,
        readonly,
    }
}
