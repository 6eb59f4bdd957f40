//! Runs the full normalize, cost, detect, compare flow for caller-supplied documents.

use crate::anomaly::{detect_anomalies, DisclosureSummary, RiskProfile};
use crate::compare::{compare, CompareError, ComparisonReport, ComparisonWeights, Exclusion};
use crate::config::EngineConfig;
use crate::cost::{
    build_cost_model, resolve_horizon, CostModel, CostModelError, FALLBACK_HORIZON_MONTHS,
};
use crate::normalize::{normalize, NormalizeError};
use crate::query::{query, query_one, QueryError, TermQuery};
use crate::terms::{AnomalyFlag, DocumentId, FinancialTerm, NormalizedDocument, RawDocument};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    CostModel(#[from] CostModelError),
    #[error(transparent)]
    Compare(#[from] CompareError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl EngineError {
    /// The document the failure is attributed to, when there is one.
    pub fn document_id(&self) -> Option<&DocumentId> {
        match self {
            EngineError::Normalize(err) => Some(err.document_id()),
            EngineError::CostModel(err) => Some(err.document_id()),
            EngineError::Compare(err) => err.document_id(),
            EngineError::Query(err) => Some(err.document_id()),
        }
    }
}

/// Everything the engine derives from one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentAnalysis {
    pub document: NormalizedDocument,
    pub cost_model: CostModel,
    pub anomalies: Vec<AnomalyFlag>,
    pub risk: RiskProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchComparison {
    pub report: ComparisonReport,
    pub analyses: Vec<DocumentAnalysis>,
}

/// Stateless engine facade over a shared configuration.
#[derive(Debug, Clone, Default)]
pub struct TermEngine {
    config: Arc<EngineConfig>,
}

impl TermEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalize, cost, and inspect a single document.
    pub fn analyze(
        &self,
        document_id: &DocumentId,
        raw: &RawDocument,
        horizon_months: Option<u32>,
    ) -> Result<DocumentAnalysis, EngineError> {
        let document = normalize(document_id, raw)?;
        let horizon = resolve_horizon(&document, horizon_months, self.config.horizon_months);
        self.analyze_normalized(document, raw, horizon)
    }

    fn analyze_normalized(
        &self,
        document: NormalizedDocument,
        raw: &RawDocument,
        horizon_months: u32,
    ) -> Result<DocumentAnalysis, EngineError> {
        let cost_model = build_cost_model(&document, horizon_months, &self.config.cost)?;
        let disclosure = raw
            .disclosures
            .as_ref()
            .map(|names| names.iter().collect::<DisclosureSummary>());
        let anomalies = detect_anomalies(
            &document,
            &self.config.reference_taxonomy,
            disclosure.as_ref(),
        );
        let risk = RiskProfile::from_flags(&anomalies);

        Ok(DocumentAnalysis {
            document,
            cost_model,
            anomalies,
            risk,
        })
    }

    /// Analyze every document and rank the ones that survive.
    ///
    /// Documents that fail normalization or costing are reported in
    /// `report.excluded` and the rest are still compared. Without a requested
    /// or configured horizon, the set is compared over the shortest document term.
    pub fn compare_documents(
        &self,
        documents: &BTreeMap<DocumentId, RawDocument>,
        horizon_months: Option<u32>,
        weights: Option<ComparisonWeights>,
    ) -> Result<BatchComparison, EngineError> {
        let weights = weights.unwrap_or(self.config.comparison_weights);
        weights.validate()?;

        let mut excluded = Vec::new();
        let mut normalized = Vec::with_capacity(documents.len());
        for (document_id, raw) in documents {
            match normalize(document_id, raw) {
                Ok(document) => normalized.push((document, raw)),
                Err(err) => excluded.push(exclusion(document_id, &err.into())),
            }
        }

        let horizon = horizon_months
            .or(self.config.horizon_months)
            .or_else(|| {
                normalized
                    .iter()
                    .filter_map(|(document, _)| document.term_months())
                    .min()
            })
            .unwrap_or(FALLBACK_HORIZON_MONTHS);

        let mut analyses = Vec::with_capacity(normalized.len());
        for (document, raw) in normalized {
            let document_id = document.document_id().clone();
            match self.analyze_normalized(document, raw, horizon) {
                Ok(analysis) => analyses.push(analysis),
                Err(err) => excluded.push(exclusion(&document_id, &err)),
            }
        }

        let cost_models: Vec<CostModel> = analyses
            .iter()
            .map(|analysis| analysis.cost_model.clone())
            .collect();
        let flags: BTreeMap<DocumentId, Vec<AnomalyFlag>> = analyses
            .iter()
            .map(|analysis| {
                (
                    analysis.document.document_id().clone(),
                    analysis.anomalies.clone(),
                )
            })
            .collect();

        let mut report = compare(&cost_models, &flags, &weights)?;
        report.excluded = excluded;

        info!(
            documents = documents.len(),
            compared = report.ranking.len(),
            excluded = report.excluded.len(),
            horizon_months = horizon,
            "compared documents"
        );

        Ok(BatchComparison { report, analyses })
    }

    /// Terms of `raw` matching `predicate`, in document order.
    pub fn query(
        &self,
        document_id: &DocumentId,
        raw: &RawDocument,
        predicate: &TermQuery,
    ) -> Result<Vec<FinancialTerm>, EngineError> {
        let document = normalize(document_id, raw)?;
        Ok(query(&document, predicate))
    }

    /// The single term of `raw` matching `predicate`.
    pub fn query_one(
        &self,
        document_id: &DocumentId,
        raw: &RawDocument,
        predicate: &TermQuery,
    ) -> Result<FinancialTerm, EngineError> {
        let document = normalize(document_id, raw)?;
        Ok(query_one(&document, predicate)?)
    }
}

fn exclusion(document_id: &DocumentId, err: &EngineError) -> Exclusion {
    warn!(document_id = %document_id, error = %err, "excluding document from comparison");
    Exclusion {
        document_id: document_id.clone(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::{DocumentCategory, RawTerm, TermKind, TermUnit};

    fn loan(rate: f64) -> RawDocument {
        RawDocument::new(DocumentCategory::Loan)
            .with_principal(10_000.0)
            .with_term_months(24)
            .with_term(RawTerm::new(
                TermKind::Rate,
                "Interest Rate",
                rate,
                TermUnit::PercentAnnual,
            ))
    }

    #[test]
    fn analyze_uses_configured_horizon() {
        let engine = TermEngine::new(EngineConfig {
            horizon_months: Some(12),
            ..EngineConfig::default()
        });
        let analysis = engine
            .analyze(&"loan".into(), &loan(0.06), None)
            .expect("analysis");
        assert_eq!(analysis.cost_model.horizon_months, 12);

        let analysis = engine
            .analyze(&"loan".into(), &loan(0.06), Some(6))
            .expect("analysis");
        assert_eq!(analysis.cost_model.horizon_months, 6);
    }

    #[test]
    fn invalid_documents_are_excluded_not_fatal() {
        let mut broken = loan(0.05);
        broken.principal = None;
        let documents = BTreeMap::from([
            (DocumentId::from("good"), loan(0.05)),
            (DocumentId::from("broken"), broken),
        ]);

        let batch = TermEngine::default()
            .compare_documents(&documents, None, None)
            .expect("comparison");

        assert_eq!(batch.report.ranking, vec![DocumentId::from("good")]);
        assert_eq!(batch.report.excluded.len(), 1);
        assert_eq!(batch.report.excluded[0].document_id.as_str(), "broken");
        assert_eq!(batch.analyses.len(), 1);
    }

    #[test]
    fn invalid_weights_fail_the_batch() {
        let documents = BTreeMap::from([(DocumentId::from("good"), loan(0.05))]);
        let result = TermEngine::default().compare_documents(
            &documents,
            None,
            Some(ComparisonWeights::new(f64::NAN, 0.0, 0.0)),
        );
        assert!(matches!(
            result,
            Err(EngineError::Compare(CompareError::InvalidWeights { .. }))
        ));
    }

    #[test]
    fn engine_errors_carry_the_document() {
        let mut raw = loan(0.05);
        raw.principal = None;
        let err = TermEngine::default()
            .analyze(&"missing-principal".into(), &raw, None)
            .expect_err("schema error");
        assert_eq!(
            err.document_id().map(DocumentId::as_str),
            Some("missing-principal")
        );
    }
}
