//! Stash CLI: command-line client for the deduplicating file store.
//!
//! Set STASH_API_URL (or API_URL); see `ClientConfig::from_env` for the other knobs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use stash_api_client::{ApiClient, FileCatalog};
use stash_cli::{
    describe_outcome, init_tracing, print_file_table, print_references, print_stats_table,
    BrowseCommand,
};
use stash_core::models::FileCandidate;
use stash_core::{ClientConfig, FilterField, FilterSnapshot, QueryKey, SizePreset};
use stash_sync::{CatalogView, FilterPipeline, QueryCache, QueryInvalidator, UploadCoordinator};

#[derive(Parser)]
#[command(name = "stash", about = "Stash deduplicating file store CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file; duplicates are linked to the existing copy
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List files matching the given filters
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Interactive filtering: type `<field> <value>`, `preset <name>`, `clear` or `quit`
    Browse,
    /// Delete a file by ID
    Delete {
        /// File UUID
        id: Uuid,
    },
    /// List the distinct file types in the catalog
    Types,
    /// Show the uploads that share a file's content
    Refs {
        /// File UUID
        id: Uuid,
    },
    /// Download a stored file
    Download {
        /// File UUID
        id: Uuid,
        /// Target directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Storage and deduplication statistics
    Stats {
        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Filename substring
    #[arg(long)]
    search: Option<String>,
    /// File type, e.g. pdf or image/png
    #[arg(long = "type")]
    file_type: Option<String>,
    /// Minimum size in bytes
    #[arg(long)]
    min_size: Option<String>,
    /// Maximum size in bytes
    #[arg(long)]
    max_size: Option<String>,
    /// Uploaded on or after (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// Uploaded on or before (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,
    /// Size preset: small, medium or large (overrides --min-size/--max-size)
    #[arg(long)]
    preset: Option<SizePreset>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let client = Arc::new(
        ApiClient::from_config(&config)
            .context("Failed to create API client. Check STASH_API_URL (or API_URL)")?,
    );
    let catalog: Arc<dyn FileCatalog> = client.clone();
    let cache = QueryCache::new();
    let view = CatalogView::new(Arc::clone(&catalog), cache.clone());

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload { file, format } => {
            let coordinator = UploadCoordinator::from_config(catalog, Arc::new(cache), &config);
            let candidate = FileCandidate::from_path(&file).await?;
            coordinator.select_file(Some(candidate))?;

            let outcome = coordinator.submit().await?;
            match format {
                OutputFormat::Json => print_json(&outcome)?,
                OutputFormat::Table => println!("{}", describe_outcome(&outcome)),
            }
            if !outcome.is_success() {
                bail!("Upload of {} failed", file.display());
            }
        }
        Commands::List { filters, format } => {
            let snapshot = settle_filters(&config, filters).await?;
            let files = view.files(&snapshot).await?;
            match format {
                OutputFormat::Json => print_json(&files)?,
                OutputFormat::Table => print_file_table(&files),
            }
        }
        Commands::Browse => browse(&config, &view).await?,
        Commands::Delete { id } => {
            view.delete_file(id).await?;
            print_json(&serde_json::json!({ "success": true, "message": format!("File {} deleted", id) }))?;
        }
        Commands::Types => {
            for file_type in view.file_types().await? {
                println!("{}", file_type);
            }
        }
        Commands::Refs { id } => {
            let refs = view.file_references(id).await?;
            print_references(&refs);
        }
        Commands::Download { id, dir } => {
            let files = view.files(&FilterSnapshot::default()).await?;
            let Some(record) = files.into_iter().find(|f| f.id == id) else {
                bail!("File {} not found", id);
            };
            let path = client.download_file(&record, &dir).await?;
            println!("Saved {}", path.display());
        }
        Commands::Stats { watch, format } => {
            if !watch {
                let stats = view.storage_stats().await?;
                match format {
                    OutputFormat::Json => print_json(&stats)?,
                    OutputFormat::Table => print_stats_table(&stats),
                }
                return Ok(());
            }

            let mut refresh = tokio::time::interval(config.stats_refresh);
            loop {
                tokio::select! {
                    _ = refresh.tick() => {
                        cache.invalidate(&[QueryKey::StorageStats]).await;
                        match view.storage_stats().await {
                            Ok(stats) => match format {
                                OutputFormat::Json => print_json(&stats)?,
                                OutputFormat::Table => print_stats_table(&stats),
                            },
                            Err(e) => tracing::warn!(error = %e, "Failed to refresh storage stats"),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }

    Ok(())
}

/// Feed command-line filters through the pipeline and wait for the search to settle.
async fn settle_filters(config: &ClientConfig, args: FilterArgs) -> anyhow::Result<FilterSnapshot> {
    let mut pipeline = FilterPipeline::from_config(config);

    let fields = [
        (FilterField::FileType, args.file_type),
        (FilterField::MinSize, args.min_size),
        (FilterField::MaxSize, args.max_size),
        (FilterField::DateFrom, args.from),
        (FilterField::DateTo, args.to),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            pipeline.set_field(field, value)?;
        }
    }
    if let Some(preset) = args.preset {
        pipeline.apply_size_preset(preset)?;
    }
    if let Some(search) = args.search.filter(|s| !s.is_empty()) {
        pipeline.set_field(FilterField::Search, search)?;
        pipeline.tick().await;
    }

    Ok(pipeline.snapshot().clone())
}

async fn browse(config: &ClientConfig, view: &CatalogView) -> anyhow::Result<()> {
    let mut pipeline = FilterPipeline::from_config(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    show_files(view, pipeline.snapshot()).await;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let emitted = match line.parse::<BrowseCommand>() {
                    Ok(BrowseCommand::Quit) => break,
                    Ok(BrowseCommand::Clear) => Ok(Some(pipeline.clear())),
                    Ok(BrowseCommand::Preset(preset)) => pipeline.apply_size_preset(preset),
                    Ok(BrowseCommand::Set(field, value)) => pipeline.set_field(field, value),
                    Err(e) => Err(e),
                };
                match emitted {
                    Ok(Some(snapshot)) => show_files(view, &snapshot).await,
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e.user_message()),
                }
            }
            snapshot = pipeline.tick() => show_files(view, &snapshot).await,
        }
    }

    Ok(())
}

async fn show_files(view: &CatalogView, snapshot: &FilterSnapshot) {
    let params = snapshot.cache_key();
    println!(
        "Filters: {}",
        if params.is_empty() { "(none)" } else { params.as_str() }
    );
    match view.files(snapshot).await {
        Ok(files) => print_file_table(&files),
        Err(e) => eprintln!("Failed to load files: {}", e),
    }
}
