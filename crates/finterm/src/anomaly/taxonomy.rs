use crate::terms::{normalize_name, DocumentCategory};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Historical reference for one (category, fee name) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub category: DocumentCategory,
    pub name: String,
    /// 90th-percentile historical value, in the fee's canonical unit.
    pub p90: f64,
    #[serde(default)]
    pub disclosure_required: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("failed to read reference taxonomy: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid reference taxonomy CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("reference taxonomy row {row} has invalid p90 {p90} for '{name}'")]
    InvalidValue { row: usize, name: String, p90: f64 },
}

/// Reference fee taxonomy keyed by category and normalized name.
/// An empty taxonomy disables percentile checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTaxonomy {
    entries: HashMap<(DocumentCategory, String), TaxonomyEntry>,
}

impl ReferenceTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut entry: TaxonomyEntry) {
        entry.name = normalize_name(&entry.name);
        self.entries
            .insert((entry.category, entry.name.clone()), entry);
    }

    pub fn with_entry(
        mut self,
        category: DocumentCategory,
        name: &str,
        p90: f64,
        disclosure_required: bool,
    ) -> Self {
        self.insert(TaxonomyEntry {
            category,
            name: name.to_string(),
            p90,
            disclosure_required,
        });
        self
    }

    pub fn lookup(&self, category: DocumentCategory, name: &str) -> Option<&TaxonomyEntry> {
        self.entries.get(&(category, name.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TaxonomyError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse `category,name,p90[,disclosure_required]` rows.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TaxonomyError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut taxonomy = Self::new();

        for (index, record) in csv_reader.deserialize::<TaxonomyRow>().enumerate() {
            let row = record?;
            if !row.p90.is_finite() || row.p90 < 0.0 {
                return Err(TaxonomyError::InvalidValue {
                    row: index + 1,
                    name: row.name,
                    p90: row.p90,
                });
            }

            taxonomy.insert(TaxonomyEntry {
                category: row.category,
                name: row.name,
                p90: row.p90,
                disclosure_required: row.disclosure_required.unwrap_or(false),
            });
        }

        Ok(taxonomy)
    }
}

#[derive(Debug, Deserialize)]
struct TaxonomyRow {
    category: DocumentCategory,
    name: String,
    p90: f64,
    #[serde(default, deserialize_with = "optional_flag")]
    disclosure_required: Option<bool>,
}

fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, found '{other}'"
            ))),
        },
    }
}
