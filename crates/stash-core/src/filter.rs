//! Catalog filter values.
//!
//! [`FilterInput`] is what the user typed, field by field. [`FilterSnapshot`] is the
//! settled, fully typed form that list queries are built from. Converting a raw field
//! into its typed value is the only place filter text is validated.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

const MB: u64 = 1024 * 1024;

/// One of the six filterable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Search,
    FileType,
    MinSize,
    MaxSize,
    DateFrom,
    DateTo,
}

impl FilterField {
    pub const ALL: [FilterField; 6] = [
        FilterField::Search,
        FilterField::FileType,
        FilterField::MinSize,
        FilterField::MaxSize,
        FilterField::DateFrom,
        FilterField::DateTo,
    ];

    /// Query-string parameter name for this field.
    pub fn param(&self) -> &'static str {
        match self {
            FilterField::Search => "search",
            FilterField::FileType => "file_type",
            FilterField::MinSize => "min_size",
            FilterField::MaxSize => "max_size",
            FilterField::DateFrom => "date_from",
            FilterField::DateTo => "date_to",
        }
    }

    /// Only the free-text search is debounced; every other field settles immediately.
    pub fn is_debounced(&self) -> bool {
        matches!(self, FilterField::Search)
    }
}

impl FromStr for FilterField {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "search" | "q" => Ok(FilterField::Search),
            "file_type" | "type" => Ok(FilterField::FileType),
            "min_size" | "min" => Ok(FilterField::MinSize),
            "max_size" | "max" => Ok(FilterField::MaxSize),
            "date_from" | "from" => Ok(FilterField::DateFrom),
            "date_to" | "to" => Ok(FilterField::DateTo),
            _ => Err(ClientError::validation(format!("Unknown filter field: {}", s))),
        }
    }
}

impl Display for FilterField {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.param())
    }
}

/// Raw text of every filter field, exactly as last entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterInput {
    pub search: String,
    pub file_type: String,
    pub min_size: String,
    pub max_size: String,
    pub date_from: String,
    pub date_to: String,
}

impl FilterInput {
    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::Search => &self.search,
            FilterField::FileType => &self.file_type,
            FilterField::MinSize => &self.min_size,
            FilterField::MaxSize => &self.max_size,
            FilterField::DateFrom => &self.date_from,
            FilterField::DateTo => &self.date_to,
        }
    }

    pub fn set(&mut self, field: FilterField, value: String) {
        let slot = match field {
            FilterField::Search => &mut self.search,
            FilterField::FileType => &mut self.file_type,
            FilterField::MinSize => &mut self.min_size,
            FilterField::MaxSize => &mut self.max_size,
            FilterField::DateFrom => &mut self.date_from,
            FilterField::DateTo => &mut self.date_to,
        };
        *slot = value;
    }

    pub fn has_active_filters(&self) -> bool {
        FilterField::ALL.iter().any(|field| !self.get(*field).is_empty())
    }
}

/// Settled, query-ready filter state. Every field is individually valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSnapshot {
    pub search: String,
    pub file_type: String,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl FilterSnapshot {
    pub fn is_empty(&self) -> bool {
        *self == FilterSnapshot::default()
    }

    /// Parse `raw` for `field` and store it. On error the snapshot is left unchanged.
    /// Returns whether the settled value changed.
    pub fn apply(&mut self, field: FilterField, raw: &str) -> Result<bool, ClientError> {
        let changed = match field {
            FilterField::Search => replace(&mut self.search, raw.to_string()),
            FilterField::FileType => replace(&mut self.file_type, raw.to_string()),
            FilterField::MinSize => replace(&mut self.min_size, parse_size(field, raw)?),
            FilterField::MaxSize => replace(&mut self.max_size, parse_size(field, raw)?),
            FilterField::DateFrom => replace(&mut self.date_from, parse_date(field, raw)?),
            FilterField::DateTo => replace(&mut self.date_to, parse_date(field, raw)?),
        };
        Ok(changed)
    }

    /// Query parameters for `GET /files/`. Empty fields are omitted entirely.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut query: Vec<(&'static str, String)> = Vec::new();
        if !self.search.is_empty() {
            query.push((FilterField::Search.param(), self.search.clone()));
        }
        if !self.file_type.is_empty() {
            query.push((FilterField::FileType.param(), self.file_type.clone()));
        }
        if let Some(min) = self.min_size {
            query.push((FilterField::MinSize.param(), min.to_string()));
        }
        if let Some(max) = self.max_size {
            query.push((FilterField::MaxSize.param(), max.to_string()));
        }
        if let Some(from) = self.date_from {
            query.push((FilterField::DateFrom.param(), from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            query.push((FilterField::DateTo.param(), to.format("%Y-%m-%d").to_string()));
        }
        query
    }

    /// Stable cache parameter string; equal snapshots produce equal keys.
    pub fn cache_key(&self) -> String {
        self.to_query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

fn parse_size(field: FilterField, raw: &str) -> Result<Option<u64>, ClientError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u64>().map(Some).map_err(|_| {
        ClientError::validation(format!(
            "{} must be a non-negative number of bytes, got '{}'",
            field, raw
        ))
    })
}

fn parse_date(field: FilterField, raw: &str) -> Result<Option<NaiveDate>, ClientError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| {
            ClientError::validation(format!("{} must be a date (YYYY-MM-DD), got '{}'", field, raw))
        })
}

/// Canned size ranges offered next to the size inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizePreset {
    Small,
    Medium,
    Large,
}

impl SizePreset {
    pub fn label(&self) -> &'static str {
        match self {
            SizePreset::Small => "Small (< 1MB)",
            SizePreset::Medium => "Medium (1-10MB)",
            SizePreset::Large => "Large (> 10MB)",
        }
    }

    /// `(min_size, max_size)` raw values for this preset; empty means unbounded.
    pub fn bounds(&self) -> (String, String) {
        match self {
            SizePreset::Small => (String::new(), MB.to_string()),
            SizePreset::Medium => (MB.to_string(), (10 * MB).to_string()),
            SizePreset::Large => ((10 * MB).to_string(), String::new()),
        }
    }
}

impl FromStr for SizePreset {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(SizePreset::Small),
            "medium" => Ok(SizePreset::Medium),
            "large" => Ok(SizePreset::Large),
            _ => Err(ClientError::validation(format!(
                "Invalid size preset: {} (expected small, medium or large)",
                s
            ))),
        }
    }
}
