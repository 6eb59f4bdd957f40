//! Ranks cost models of a single category.

mod scoring;

use crate::cost::CostModel;
use crate::terms::{AnomalyFlag, DocumentCategory, DocumentId, Severity};
use scoring::MinMax;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub const TOTAL_COST_CRITERION: &str = "total_cost";
pub const ANOMALY_COUNT_CRITERION: &str = "anomaly_count";
pub const EFFECTIVE_RATE_CRITERION: &str = "effective_rate";

/// Relative weight of each ranking criterion. Lower weighted scores rank first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonWeights {
    pub total_cost: f64,
    pub anomaly_count: f64,
    pub effective_rate: f64,
}

impl Default for ComparisonWeights {
    fn default() -> Self {
        Self {
            total_cost: 0.6,
            anomaly_count: 0.3,
            effective_rate: 0.1,
        }
    }
}

impl ComparisonWeights {
    pub fn new(total_cost: f64, anomaly_count: f64, effective_rate: f64) -> Self {
        Self {
            total_cost,
            anomaly_count,
            effective_rate,
        }
    }

    pub fn validate(&self) -> Result<(), CompareError> {
        for (criterion, weight) in self.criteria() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CompareError::InvalidWeights {
                    detail: format!(
                        "{criterion} weight must be finite and non-negative, got {weight}"
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn criteria(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            (TOTAL_COST_CRITERION.to_string(), self.total_cost),
            (ANOMALY_COUNT_CRITERION.to_string(), self.anomaly_count),
            (EFFECTIVE_RATE_CRITERION.to_string(), self.effective_rate),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentScore {
    pub document_id: DocumentId,
    /// One-based position in the ranking.
    pub rank: usize,
    pub score: f64,
    pub total_cost: f64,
    pub anomaly_count: usize,
    pub effective_rate: f64,
}

/// A document left out of a comparison, with the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub document_id: DocumentId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Compared documents in input order.
    pub document_ids: Vec<DocumentId>,
    /// Best first.
    pub ranking: Vec<DocumentId>,
    pub criteria: BTreeMap<String, f64>,
    pub scores: Vec<DocumentScore>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<Exclusion>,
}

impl ComparisonReport {
    fn empty(weights: &ComparisonWeights) -> Self {
        Self {
            document_ids: Vec::new(),
            ranking: Vec::new(),
            criteria: weights.criteria(),
            scores: Vec::new(),
            excluded: Vec::new(),
        }
    }

    pub fn best(&self) -> Option<&DocumentId> {
        self.ranking.first()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompareError {
    #[error("document {document_id} is a {found} but the comparison set holds {expected} documents")]
    IncomparableCategory {
        document_id: DocumentId,
        expected: DocumentCategory,
        found: DocumentCategory,
    },
    #[error("document {document_id} appears more than once in the comparison set")]
    DuplicateDocument { document_id: DocumentId },
    #[error("invalid comparison weights: {detail}")]
    InvalidWeights { detail: String },
}

impl CompareError {
    pub fn document_id(&self) -> Option<&DocumentId> {
        match self {
            CompareError::IncomparableCategory { document_id, .. }
            | CompareError::DuplicateDocument { document_id } => Some(document_id),
            CompareError::InvalidWeights { .. } => None,
        }
    }
}

/// Critical and warning flags; info flags do not affect ranking.
pub fn anomaly_count(flags: &[AnomalyFlag]) -> usize {
    flags
        .iter()
        .filter(|flag| flag.severity >= Severity::Warning)
        .count()
}

/// Rank `cost_models` by weighted cost, anomaly count, and effective rate.
///
/// Documents without an entry in `anomalies` count as having no flags.
pub fn compare(
    cost_models: &[CostModel],
    anomalies: &BTreeMap<DocumentId, Vec<AnomalyFlag>>,
    weights: &ComparisonWeights,
) -> Result<ComparisonReport, CompareError> {
    weights.validate()?;

    let Some(first) = cost_models.first() else {
        return Ok(ComparisonReport::empty(weights));
    };

    let mut seen = HashSet::with_capacity(cost_models.len());
    for model in cost_models {
        if model.category != first.category {
            return Err(CompareError::IncomparableCategory {
                document_id: model.document_id.clone(),
                expected: first.category,
                found: model.category,
            });
        }
        if !seen.insert(&model.document_id) {
            return Err(CompareError::DuplicateDocument {
                document_id: model.document_id.clone(),
            });
        }
    }

    let cost_range = MinMax::over(cost_models.iter().map(|model| model.total_cost));
    let rate_range = MinMax::over(cost_models.iter().map(|model| model.effective_rate));
    let scaled = |range: Option<MinMax>, value: f64| range.map(|r| r.scale(value)).unwrap_or(0.0);

    let mut scores: Vec<DocumentScore> = cost_models
        .iter()
        .map(|model| {
            let count = anomalies
                .get(&model.document_id)
                .map(|flags| anomaly_count(flags))
                .unwrap_or(0);
            let score = weights.total_cost * scaled(cost_range, model.total_cost)
                + weights.anomaly_count * count as f64
                + weights.effective_rate * scaled(rate_range, model.effective_rate);

            DocumentScore {
                document_id: model.document_id.clone(),
                rank: 0,
                score,
                total_cost: model.total_cost,
                anomaly_count: count,
                effective_rate: model.effective_rate,
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
    for (index, entry) in scores.iter_mut().enumerate() {
        entry.rank = index + 1;
    }

    debug!(
        category = %first.category,
        documents = scores.len(),
        best = %scores[0].document_id,
        "ranked comparison set"
    );

    Ok(ComparisonReport {
        document_ids: cost_models
            .iter()
            .map(|model| model.document_id.clone())
            .collect(),
        ranking: scores.iter().map(|entry| entry.document_id.clone()).collect(),
        criteria: weights.criteria(),
        scores,
        excluded: Vec::new(),
    })
}
