use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use stash_api_client::{ApiClient, FileCatalog};
use stash_cli::{format_bytes, init_tracing, print_stats_table, truncate_string};
use stash_core::models::{FileRecord, StorageStats};
use stash_core::{ClientConfig, FilterSnapshot};

#[derive(Parser, Debug)]
#[command(name = "storage_stats")]
#[command(about = "Get deduplication statistics for the file store")]
struct Args {
    /// Also break the stored files down by file type
    #[arg(long)]
    by_type: bool,

    /// Output format: json or table (default: table)
    #[arg(long, default_value = "table")]
    format: String,
}

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    stats: StorageStats,
    duplicate_uploads: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    by_type: Option<Vec<TypeBreakdown>>,
}

#[derive(Serialize)]
struct TypeBreakdown {
    file_type: String,
    count: u64,
    size_bytes: u64,
    references: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let client = ApiClient::from_config(&config)?;

    let (stats, by_type) = if args.by_type {
        let all = FilterSnapshot::default();
        let (stats, files) = tokio::try_join!(client.storage_stats(), client.list_files(&all))?;
        (stats, Some(breakdown_by_type(&files)))
    } else {
        (client.storage_stats().await?, None)
    };

    let report = StatsReport {
        duplicate_uploads: stats.duplicate_uploads(),
        stats,
        by_type,
    };

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_stats_table(&report.stats);
            if let Some(by_type) = &report.by_type {
                print_type_table(by_type);
            }
        }
    }

    Ok(())
}

/// Group listed files by type, largest first. Duplicates are not in the listing, so
/// references are summed from each original's reference count.
fn breakdown_by_type(files: &[FileRecord]) -> Vec<TypeBreakdown> {
    let mut rows: Vec<TypeBreakdown> = Vec::new();
    for file in files {
        match rows.iter_mut().find(|row| row.file_type == file.file_type) {
            Some(row) => {
                row.count += 1;
                row.size_bytes += file.size;
                row.references += u64::from(file.extra_references());
            }
            None => rows.push(TypeBreakdown {
                file_type: file.file_type.clone(),
                count: 1,
                size_bytes: file.size,
                references: u64::from(file.extra_references()),
            }),
        }
    }
    rows.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
    rows
}

fn print_type_table(rows: &[TypeBreakdown]) {
    if rows.is_empty() {
        return;
    }

    println!("--- By File Type (Top 10) ---");
    for row in rows.iter().take(10) {
        println!(
            "{:<40} {:>6} files, {:>12}, {:>4} extra refs",
            truncate_string(&row.file_type, 38),
            row.count,
            format_bytes(row.size_bytes),
            row.references
        );
    }

    if rows.len() > 10 {
        println!("... and {} more file types", rows.len() - 10);
    }
    println!();
}
