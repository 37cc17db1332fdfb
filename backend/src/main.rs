//! docimport CLI - Import CSV/JSON records into a document collection
//!
//! # Main Commands
//!
//! ```bash
//! docimport import posts.csv --collections collections.json --collection posts
//! docimport import posts.json -C collections.json -c posts --overwrite --store-url http://localhost:3000
//! docimport validate posts.csv -C collections.json -c posts
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! docimport unflatten posts.csv    # Decode and nest CSV rows
//! docimport preview posts.csv      # First rows plus total count
//! docimport fields -C collections.json -c posts
//! ```

use clap::{Args, Parser, Subcommand};
use docimport::logs::{drain, LOG_BROADCASTER};
use docimport::store::dir::DEFAULT_STORE_DIR;
use docimport::{
    decode_file, decode_records, field_paths, preview, validate, CollectionRegistry,
    CollectionSchema, DirStore, DocumentStore, HttpStore, ImportConfig, ImportError,
    ImportOptions, ImportStatus, Importer, InputFormat, MarkupConverter, MemoryStore,
    StoreAssetResolver,
};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "docimport")]
#[command(about = "Import CSV and JSON records into document collections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Collections document and target collection
#[derive(Args)]
struct Target {
    /// Collections document (JSON)
    #[arg(short = 'C', long)]
    collections: PathBuf,

    /// Target collection slug
    #[arg(short, long)]
    collection: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, enrich and write records into a collection
    Import {
        /// Input file (.csv or .json)
        input: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Input format (default: from the file extension)
        #[arg(short, long)]
        format: Option<InputFormat>,

        /// Locale used for every write
        #[arg(short, long)]
        locale: Option<String>,

        /// Update documents whose id already exists
        #[arg(long)]
        overwrite: bool,

        /// Directory of the on-disk store
        #[arg(long, conflicts_with = "store_url")]
        store_dir: Option<PathBuf>,

        /// Base URL of a remote document API
        #[arg(long)]
        store_url: Option<String>,

        /// Authorization header value for the remote API
        #[arg(long, requires = "store_url")]
        authorization: Option<String>,

        /// Write into memory only
        #[arg(long, conflicts_with_all = ["store_dir", "store_url"])]
        dry_run: bool,

        /// Log progress and every failed row
        #[arg(long)]
        debug: bool,

        /// Output file for the import result (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stream log entries to stdout as JSON lines (requires --output)
        #[arg(long, requires = "output")]
        log_json: bool,
    },

    /// Validate records against a collection without writing
    Validate {
        /// Input file (.csv or .json)
        input: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Input format (default: from the file extension)
        #[arg(short, long)]
        format: Option<InputFormat>,
    },

    /// Decode a CSV file and print its rows as nested JSON
    Unflatten {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the first decoded rows of a file
    Preview {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Input format (default: from the file extension)
        #[arg(short, long)]
        format: Option<InputFormat>,
    },

    /// List the valid and required field paths of a collection
    Fields {
        #[command(flatten)]
        target: Target,
    },
}

/// Options of the import command
struct ImportArgs {
    input: PathBuf,
    target: Target,
    format: Option<InputFormat>,
    locale: Option<String>,
    overwrite: bool,
    store_dir: Option<PathBuf>,
    store_url: Option<String>,
    authorization: Option<String>,
    dry_run: bool,
    debug: bool,
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import {
            input,
            target,
            format,
            locale,
            overwrite,
            store_dir,
            store_url,
            authorization,
            dry_run,
            debug,
            output,
            log_json,
        } => {
            let stream = log_json.then(stream_logs);
            let args = ImportArgs {
                input,
                target,
                format,
                locale,
                overwrite,
                store_dir,
                store_url,
                authorization,
                dry_run,
                debug,
                output,
            };
            let result = cmd_import(args).await;
            if let Some((stop, handle)) = stream {
                let _ = stop.send(());
                let _ = handle.await;
            }
            result
        }

        Commands::Validate { input, target, format } => cmd_validate(&input, &target, format),

        Commands::Unflatten { input, output } => cmd_unflatten(&input, output.as_deref()),

        Commands::Preview { input, format } => cmd_preview(&input, format),

        Commands::Fields { target } => cmd_fields(&target),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Print every log entry as a JSON line until told to stop.
fn stream_logs() -> (oneshot::Sender<()>, JoinHandle<()>) {
    let mut receiver = LOG_BROADCASTER.subscribe();
    let (stop, mut stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                entry = receiver.recv() => match entry {
                    Ok(entry) => print_entry(&entry),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(_) => break,
                },
                _ = &mut stopped => {
                    for entry in drain(&mut receiver) {
                        print_entry(&entry);
                    }
                    break;
                }
            }
        }
    });

    (stop, handle)
}

fn print_entry(entry: &docimport::logs::LogEntry) {
    if let Ok(line) = serde_json::to_string(entry) {
        println!("{}", line);
    }
}

fn load_collection(target: &Target) -> Result<(CollectionRegistry, CollectionSchema), Box<dyn std::error::Error>> {
    let registry = CollectionRegistry::from_file(&target.collections)?;
    let collection = registry
        .get(&target.collection)
        .cloned()
        .ok_or_else(|| ImportError::UnknownCollection(target.collection.clone()))?;
    Ok((registry, collection))
}

fn input_format(input: &Path, format: Option<InputFormat>) -> Result<InputFormat, Box<dyn std::error::Error>> {
    match format {
        Some(format) => Ok(format),
        None => Ok(InputFormat::from_path(input)?),
    }
}

/// Pick the store: memory for dry runs, then remote, then on-disk.
fn open_store(args: &ImportArgs, config: &ImportConfig) -> Box<dyn DocumentStore> {
    if args.dry_run {
        let store = MemoryStore::new();
        return match &config.default_locale {
            Some(locale) => Box::new(store.with_default_locale(locale.clone())),
            None => Box::new(store),
        };
    }

    if let Some(url) = args.store_url.as_ref().or(config.store_url.as_ref()) {
        let mut store = HttpStore::new(url.clone());
        if let Some(authorization) = args.authorization.as_ref().or(config.authorization.as_ref()) {
            store = store.with_authorization(authorization.clone());
        }
        if let Some(locale) = &config.default_locale {
            store = store.with_default_locale(locale.clone());
        }
        return Box::new(store);
    }

    let root = args
        .store_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
    let store = DirStore::new(root);
    match &config.default_locale {
        Some(locale) => Box::new(store.with_default_locale(locale.clone())),
        None => Box::new(store),
    }
}

async fn cmd_import(args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Importing: {}", args.input.display());

    let config = ImportConfig::from_env()?;
    let (registry, _) = load_collection(&args.target)?;
    let format = input_format(&args.input, args.format)?;
    let bytes = fs::read(&args.input)?;

    let store = open_store(&args, &config);
    let converter = MarkupConverter::new();
    let assets = StoreAssetResolver::new(store.as_ref(), registry.asset_collections(), config.media.clone());
    let options = ImportOptions {
        overwrite_existing: args.overwrite,
        locale: args.locale.clone(),
        request_locale: None,
        debug: args.debug || config.debug,
    };

    eprintln!("   Collection: {}", args.target.collection);
    eprintln!("   Format: {:?}", format);
    if args.dry_run {
        eprintln!("   Dry run: nothing is persisted");
    }

    let result = Importer::new(store.as_ref(), &converter, &assets)
        .import_bytes(&registry, &args.target.collection, &bytes, format, &options)
        .await?;

    eprintln!("\n📊 Results:");
    eprintln!("   ✅ Created: {}", result.created);
    eprintln!("   🔁 Updated: {}", result.updated);
    if result.status() == ImportStatus::CompletedWithErrors {
        eprintln!("   ❌ Failed: {}", result.errors.len());
        for error in result.errors.iter().take(5) {
            eprintln!("     - {}", error.summary());
        }
    }

    let json = serde_json::to_string_pretty(&result)?;
    write_output(&json, args.output.as_deref())?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_validate(input: &Path, target: &Target, format: Option<InputFormat>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let (_, collection) = load_collection(target)?;
    let format = input_format(input, format)?;
    let records = decode_records(&fs::read(input)?, format)?;

    let result = validate(&collection.fields, &records);
    println!("{}", serde_json::to_string_pretty(&result)?);

    eprintln!(
        "\n📊 Results: {} records, {} errors, {} warnings",
        records.len(),
        result.errors.len(),
        result.warnings.len()
    );

    if !result.is_valid {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_unflatten(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Unflattening CSV: {}", input.display());

    let parsed = decode_file(input, Some(InputFormat::Csv))?;
    eprintln!("   Encoding: {}", parsed.encoding);
    if let Some(delimiter) = parsed.delimiter {
        eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(delimiter));
    }
    eprintln!("   Columns: {}", parsed.headers.join(", "));

    let records = decode_records(&fs::read(input)?, InputFormat::Csv)?;
    eprintln!("✅ Unflattened {} records", records.len());

    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)?;

    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn cmd_preview(input: &Path, format: Option<InputFormat>) -> Result<(), Box<dyn std::error::Error>> {
    let format = input_format(input, format)?;
    let preview = preview(&fs::read(input)?, format)?;
    eprintln!("👀 Showing {} of {} records", preview.rows.len(), preview.total);
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

fn cmd_fields(target: &Target) -> Result<(), Box<dyn std::error::Error>> {
    let (_, collection) = load_collection(target)?;
    let paths = field_paths(&collection.fields);
    eprintln!(
        "📋 {}: {} fields, {} required",
        collection.slug,
        paths.valid.len(),
        paths.required.len()
    );
    println!("{}", serde_json::to_string_pretty(&paths)?);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_json_needs_output_file() {
        let base = ["docimport", "import", "posts.csv", "-C", "collections.json", "-c", "posts", "--log-json"];
        assert!(Cli::try_parse_from(base).is_err());

        let cli = Cli::try_parse_from(base.iter().chain(&["--output", "result.json"])).unwrap();
        assert!(matches!(cli.command, Commands::Import { log_json: true, output: Some(_), .. }));
    }
}
