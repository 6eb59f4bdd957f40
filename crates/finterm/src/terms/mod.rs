//! Canonical schema shared by every stage of the engine.

mod domain;
mod names;

pub use domain::{
    AnomalyFlag, DocumentCategory, DocumentId, FinancialTerm, Frequency, NormalizedDocument,
    RawDocument, RawTerm, Severity, TermKind, TermRef, TermUnit,
};
pub use names::normalize_name;

pub(crate) use names::mentions_any;
