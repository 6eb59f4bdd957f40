//! Structured predicate queries over a normalized document.

use crate::terms::{
    normalize_name, DocumentId, FinancialTerm, NormalizedDocument, TermKind, TermUnit,
};
use serde::{Deserialize, Serialize};

/// Conjunction of optional predicates. An empty query matches every term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermQuery {
    pub kind: Option<TermKind>,
    pub name_contains: Option<String>,
    pub unit: Option<TermUnit>,
    /// Inclusive lower bound on the canonical value.
    pub min_value: Option<f64>,
    /// Inclusive upper bound on the canonical value.
    pub max_value: Option<f64>,
}

impl TermQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TermKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn name_contains(mut self, fragment: impl Into<String>) -> Self {
        self.name_contains = Some(fragment.into());
        self
    }

    pub fn unit(mut self, unit: TermUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub fn max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    pub fn matches(&self, term: &FinancialTerm) -> bool {
        if self.kind.is_some_and(|kind| kind != term.kind()) {
            return false;
        }
        if self.unit.is_some_and(|unit| unit != term.unit()) {
            return false;
        }
        if self.min_value.is_some_and(|min| term.value() < min) {
            return false;
        }
        if self.max_value.is_some_and(|max| term.value() > max) {
            return false;
        }
        match self.name_contains.as_deref() {
            Some(fragment) => term.name().contains(normalize_name(fragment).as_str()),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("expected exactly one matching term in document {document_id}, found {matches}")]
    NoMatch {
        document_id: DocumentId,
        matches: usize,
    },
}

impl QueryError {
    pub fn document_id(&self) -> &DocumentId {
        match self {
            QueryError::NoMatch { document_id, .. } => document_id,
        }
    }
}

/// Every matching term, in document order.
pub fn query(doc: &NormalizedDocument, predicate: &TermQuery) -> Vec<FinancialTerm> {
    doc.terms()
        .iter()
        .filter(|term| predicate.matches(term))
        .cloned()
        .collect()
}

/// The single matching term; zero or several matches are an error.
pub fn query_one(
    doc: &NormalizedDocument,
    predicate: &TermQuery,
) -> Result<FinancialTerm, QueryError> {
    let mut matches = query(doc, predicate);
    if matches.len() == 1 {
        if let Some(term) = matches.pop() {
            return Ok(term);
        }
    }

    Err(QueryError::NoMatch {
        document_id: doc.document_id().clone(),
        matches: matches.len(),
    })
}
