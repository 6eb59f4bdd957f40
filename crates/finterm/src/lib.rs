//! Normalizes financial terms extracted from loan, mortgage, insurance, and
//! investment documents, then costs, inspects, ranks, and queries them.

pub mod anomaly;
pub mod compare;
pub mod config;
pub mod cost;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod router;
pub mod telemetry;
pub mod terms;

pub use anomaly::{detect_anomalies, DisclosureSummary, ReferenceTaxonomy, RiskProfile};
pub use compare::{compare, ComparisonReport, ComparisonWeights, CompareError};
pub use cost::{build_cost_model, CostModel, CostModelError, CostOptions};
pub use normalize::{normalize, NormalizeError};
pub use pipeline::{BatchComparison, DocumentAnalysis, EngineError, TermEngine};
pub use query::{query, query_one, QueryError, TermQuery};
pub use terms::{
    AnomalyFlag, DocumentCategory, DocumentId, FinancialTerm, NormalizedDocument, RawDocument,
    RawTerm, Severity, TermKind, TermUnit,
};
