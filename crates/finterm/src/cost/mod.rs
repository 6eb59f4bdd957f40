//! Total cost of ownership over a horizon for a normalized document.

mod amortization;

pub use amortization::Amortization;

use crate::terms::{
    mentions_any, DocumentCategory, DocumentId, FinancialTerm, Frequency, NormalizedDocument,
    TermKind, TermUnit,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Horizon used when neither the caller, the configuration, nor the document supplies one.
pub const FALLBACK_HORIZON_MONTHS: u32 = 12;

pub const PRINCIPAL_KEY: &str = "principal";
pub const INTEREST_KEY: &str = "interest";
pub const EXPECTED_DEDUCTIBLES_KEY: &str = "expected deductibles";

const PRIMARY_RATE_NAMES: &[&str] = &["interest", "apr", "rate"];
const DEDUCTIBLE_NAMES: &[&str] = &["deductible"];
const PERFORMANCE_FEE_NAMES: &[&str] = &["performance", "carry", "incentive"];

/// Modeling dials that are not part of any single document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostOptions {
    /// Annual return assumed when charging performance fees on investments.
    #[serde(default)]
    pub expected_return_baseline: f64,
    /// Expected number of deductible payments over the horizon for insurance.
    #[serde(default)]
    pub deductible_expectation: f64,
}

/// Cost of a document over one horizon. A new model is built per horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub document_id: DocumentId,
    pub category: DocumentCategory,
    pub horizon_months: u32,
    pub total_cost: f64,
    pub breakdown: BTreeMap<String, f64>,
    pub effective_rate: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CostModelError {
    #[error("invalid horizon for document {document_id}: {horizon_months} months ({detail})")]
    InvalidHorizon {
        document_id: DocumentId,
        horizon_months: u32,
        detail: String,
    },
}

impl CostModelError {
    pub fn document_id(&self) -> &DocumentId {
        match self {
            CostModelError::InvalidHorizon { document_id, .. } => document_id,
        }
    }
}

/// Caller value, then configured value, then the document's own term.
pub fn resolve_horizon(
    doc: &NormalizedDocument,
    requested: Option<u32>,
    configured: Option<u32>,
) -> u32 {
    requested
        .or(configured)
        .or(doc.term_months())
        .unwrap_or(FALLBACK_HORIZON_MONTHS)
}

fn check_horizon(doc: &NormalizedDocument, horizon_months: u32) -> Result<(), CostModelError> {
    let invalid = |detail: String| CostModelError::InvalidHorizon {
        document_id: doc.document_id().clone(),
        horizon_months,
        detail,
    };

    if horizon_months == 0 {
        return Err(invalid("horizon must be at least one month".to_string()));
    }

    if let Some(term) = doc.term_months() {
        if !doc.category().amortizes() && horizon_months > term {
            return Err(invalid(format!(
                "{} contracts end after {term} months and are not modeled beyond their term",
                doc.category()
            )));
        }
    }

    Ok(())
}

fn add(breakdown: &mut BTreeMap<String, f64>, name: &str, amount: f64) {
    *breakdown.entry(name.to_string()).or_insert(0.0) += amount;
}

fn primary_rate(doc: &NormalizedDocument) -> Option<f64> {
    let rates: Vec<&FinancialTerm> = doc.terms_of(TermKind::Rate).map(|(_, term)| term).collect();
    rates
        .iter()
        .find(|term| mentions_any(term.name(), PRIMARY_RATE_NAMES))
        .or_else(|| rates.first())
        .map(|term| term.value())
}

/// Interest and principal for the months the loan is actually held.
/// The annual rate is a nominal APR, so each period accrues `rate / 12`.
fn amortize(doc: &NormalizedDocument, horizon_months: u32, breakdown: &mut BTreeMap<String, f64>) {
    let principal = doc.principal().unwrap_or(0.0);
    let periods = doc.term_months().unwrap_or(horizon_months);
    let annual_rate = primary_rate(doc).unwrap_or(0.0);
    let schedule = Amortization::new(principal, annual_rate / 12.0, periods);

    add(breakdown, PRINCIPAL_KEY, principal);
    add(
        breakdown,
        INTEREST_KEY,
        schedule.interest_through(horizon_months.min(periods)),
    );
}

fn charge_fees(
    doc: &NormalizedDocument,
    charged_months: u32,
    options: &CostOptions,
    breakdown: &mut BTreeMap<String, f64>,
) {
    let category = doc.category();
    let base = doc.base().unwrap_or(0.0);
    let years = charged_months as f64 / 12.0;
    let mut deductibles = 0.0;

    for (_, term) in doc.terms_of(TermKind::Fee) {
        if category == DocumentCategory::Insurance && mentions_any(term.name(), DEDUCTIBLE_NAMES) {
            deductibles += term.value();
            continue;
        }

        let amount = match (term.unit(), term.frequency()) {
            (TermUnit::FlatCurrency, Frequency::OneTime) => term.value(),
            (TermUnit::FlatCurrency, _) => term.value() * charged_months as f64,
            (TermUnit::PercentAnnual, _)
                if category == DocumentCategory::Investment
                    && mentions_any(term.name(), PERFORMANCE_FEE_NAMES) =>
            {
                base * options.expected_return_baseline * years * term.value()
            }
            (TermUnit::PercentAnnual, _) => base * term.value() * years,
            (unit, _) => {
                debug!(name = term.name(), %unit, "skipping fee with non-monetary unit");
                continue;
            }
        };
        add(breakdown, term.name(), amount);
    }

    if category == DocumentCategory::Insurance && deductibles > 0.0 {
        add(
            breakdown,
            EXPECTED_DEDUCTIBLES_KEY,
            deductibles * options.deductible_expectation,
        );
    }
}

/// Build the cost model for `doc` over `horizon_months`.
pub fn build_cost_model(
    doc: &NormalizedDocument,
    horizon_months: u32,
    options: &CostOptions,
) -> Result<CostModel, CostModelError> {
    check_horizon(doc, horizon_months)?;

    let mut breakdown = BTreeMap::new();
    let charged_months = match (doc.category().amortizes(), doc.term_months()) {
        (true, Some(term)) => horizon_months.min(term),
        _ => horizon_months,
    };

    if doc.category().amortizes() {
        amortize(doc, horizon_months, &mut breakdown);
    }

    charge_fees(doc, charged_months, options, &mut breakdown);

    let exits_early = doc
        .term_months()
        .map(|term| horizon_months < term)
        .unwrap_or(false);
    if exits_early {
        for (_, penalty) in doc.terms_of(TermKind::Penalty) {
            add(&mut breakdown, penalty.name(), penalty.value());
        }
    }

    let total_cost: f64 = breakdown.values().sum();
    let ownership_cost = total_cost - doc.principal().unwrap_or(0.0);
    let effective_rate = match doc.base() {
        Some(base) if base > 0.0 => ownership_cost * 12.0 / horizon_months as f64 / base,
        _ => 0.0,
    };

    debug!(
        document_id = %doc.document_id(),
        horizon_months,
        total_cost,
        effective_rate,
        exits_early,
        "built cost model"
    );

    Ok(CostModel {
        document_id: doc.document_id().clone(),
        category: doc.category(),
        horizon_months,
        total_cost,
        breakdown,
        effective_rate,
    })
}
