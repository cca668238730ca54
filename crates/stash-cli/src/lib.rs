//! Shared helpers for the Stash command-line binaries.

use std::str::FromStr;

use stash_core::models::{FileRecord, FileReferences, StorageStats, UploadOutcome};
use stash_core::{ClientError, FilterField, SizePreset};

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Human-readable byte count (`512 B`, `2.00 KB`, `1.50 MB`).
pub fn format_bytes(bytes: u64) -> String {
    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// One line of input in interactive browse mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Set(FilterField, String),
    Preset(SizePreset),
    Clear,
    Quit,
}

impl FromStr for BrowseCommand {
    type Err = ClientError;

    /// `<field> [value]`, `preset <name>`, `clear` or `quit`. A field with no value
    /// resets it to empty.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        match head.to_lowercase().as_str() {
            "" => Err(ClientError::validation("Empty command")),
            "clear" => Ok(BrowseCommand::Clear),
            "quit" | "exit" => Ok(BrowseCommand::Quit),
            "preset" => rest.parse().map(BrowseCommand::Preset),
            _ => {
                let field = head.parse::<FilterField>()?;
                Ok(BrowseCommand::Set(field, rest.to_string()))
            }
        }
    }
}

pub fn print_file_table(files: &[FileRecord]) {
    println!("\n=== Files ===\n");

    if files.is_empty() {
        println!("No files found.");
        println!();
        return;
    }

    println!(
        "{:<36} {:<32} {:<24} {:>12} {:<10} {:>5} {:<20}",
        "ID", "Filename", "Type", "Size", "Duplicate", "Refs", "Uploaded"
    );
    println!("{}", "-".repeat(147));

    for file in files {
        println!(
            "{:<36} {:<32} {:<24} {:>12} {:<10} {:>5} {:<20}",
            file.id,
            truncate_string(&file.original_filename, 30),
            truncate_string(&file.file_type, 22),
            format_bytes(file.size),
            if file.is_duplicate { "yes" } else { "no" },
            file.reference_count,
            file.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    println!("\nTotal: {} files", files.len());
    println!();
}

pub fn print_stats_table(stats: &StorageStats) {
    println!("\n=== Storage Statistics ===\n");

    println!("Files uploaded:     {:>10}", stats.total_files_uploaded);
    println!("Unique files:       {:>10}", stats.unique_files_stored);
    println!("Duplicate uploads:  {:>10}", stats.duplicate_uploads());

    println!("\n--- Size ---");
    println!(
        "Uploaded:  {:>12.2} MB ({} bytes)",
        stats.total_size_mb, stats.total_size_uploaded
    );
    println!(
        "Stored:    {:>12.2} MB ({} bytes)",
        stats.actual_size_mb, stats.actual_size_stored
    );
    println!(
        "Saved:     {:>12.2} MB ({} bytes, {:.1}%)",
        stats.space_saved_mb, stats.space_saved, stats.savings_percentage
    );

    if !stats.is_consistent() {
        println!("\nWarning: server reported inconsistent totals");
    }
    println!("\nLast updated: {}", stats.last_updated.to_rfc3339());
    println!();
}

pub fn print_references(refs: &FileReferences) {
    let original = &refs.original_file;
    println!("\n=== References ===\n");
    println!(
        "Original: {} ({}, {})",
        original.original_filename,
        original.id,
        format_bytes(original.size)
    );
    println!("Total references: {}", refs.total_references);

    if refs.references.is_empty() {
        println!("\nNo duplicate uploads reference this file.");
    } else {
        println!("\n{:<36} {:<40} {:<20}", "ID", "Uploaded as", "Uploaded");
        println!("{}", "-".repeat(98));
        for reference in &refs.references {
            println!(
                "{:<36} {:<40} {:<20}",
                reference.id,
                truncate_string(&reference.reference_filename, 38),
                reference.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
            );
        }
    }
    println!();
}

/// One-line summary of an upload result.
pub fn describe_outcome(outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::Success {
            is_duplicate: true,
            space_saved,
            message,
            file,
        } => {
            let saved = space_saved
                .map(|bytes| format!(", saved {}", format_bytes(bytes)))
                .unwrap_or_default();
            format!("{} ({} is a duplicate{})", message, file.original_filename, saved)
        }
        UploadOutcome::Success { message, file, .. } => {
            format!("{} ({}, {})", message, file.original_filename, format_bytes(file.size))
        }
        UploadOutcome::Failure { reason } => reason.clone(),
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
        assert_eq!(truncate_string("hello", 0), "...");
    }

    #[test]
    fn truncate_string_counts_characters() {
        assert_eq!(truncate_string("résumé-final.pdf", 9), "résumé...");
    }

    #[test]
    fn format_bytes_picks_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(1_572_864), "1.50 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn browse_commands_parse() {
        assert_eq!(
            "search  quarterly report".parse::<BrowseCommand>().unwrap(),
            BrowseCommand::Set(FilterField::Search, "quarterly report".to_string())
        );
        assert_eq!(
            "type pdf".parse::<BrowseCommand>().unwrap(),
            BrowseCommand::Set(FilterField::FileType, "pdf".to_string())
        );
        assert_eq!(
            "min_size".parse::<BrowseCommand>().unwrap(),
            BrowseCommand::Set(FilterField::MinSize, String::new())
        );
        assert_eq!(
            "preset Small".parse::<BrowseCommand>().unwrap(),
            BrowseCommand::Preset(SizePreset::Small)
        );
        assert_eq!("clear".parse::<BrowseCommand>().unwrap(), BrowseCommand::Clear);
        assert_eq!("quit".parse::<BrowseCommand>().unwrap(), BrowseCommand::Quit);
    }

    #[test]
    fn browse_rejects_unknown_input() {
        assert!("colour red".parse::<BrowseCommand>().is_err());
        assert!("preset huge".parse::<BrowseCommand>().is_err());
        assert!("   ".parse::<BrowseCommand>().is_err());
    }

    #[test]
    fn duplicate_outcome_mentions_savings() {
        let file: FileRecord = serde_json::from_value(json!({
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "file": "/media/uploads/a.pdf",
            "original_filename": "a.pdf",
            "file_type": "application/pdf",
            "size": 2048,
            "uploaded_at": "2024-03-01T10:00:00Z",
            "file_hash": "ab12",
            "is_duplicate": true,
            "reference_count": 2
        }))
        .unwrap();
        let outcome = UploadOutcome::Success {
            is_duplicate: true,
            space_saved: Some(2048),
            message: "Duplicate file detected".to_string(),
            file,
        };

        assert_eq!(
            describe_outcome(&outcome),
            "Duplicate file detected (a.pdf is a duplicate, saved 2.00 KB)"
        );
        assert_eq!(
            describe_outcome(&UploadOutcome::failure("Failed to upload file. Please try again.")),
            "Failed to upload file. Please try again."
        );
    }
}
