//! Converts raw extracted terms into a [`NormalizedDocument`].
//!
//! Units are resolved through a closed conversion table: rates become annual
//! percentages (monthly rates compound), recurring flat charges become monthly
//! amounts, durations become months, and one-time percentage charges resolve
//! against the document's principal or notional.

mod conversion;
mod requirements;

pub use conversion::{annual_from_monthly, monthly_from_annual};

use crate::terms::{
    normalize_name, AnomalyFlag, DocumentCategory, DocumentId, FinancialTerm, NormalizedDocument,
    RawDocument, Severity, TermKind, TermRef, TermUnit,
};
use std::collections::HashMap;
use tracing::debug;

/// Validation errors raised while normalizing a document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("schema error in document {document_id}: `{field}` {detail}")]
    Schema {
        document_id: DocumentId,
        field: String,
        detail: String,
    },
    #[error(
        "unit conversion error in document {document_id}: {kind} '{term}' in {unit}: {detail}"
    )]
    UnitConversion {
        document_id: DocumentId,
        term: String,
        kind: TermKind,
        unit: TermUnit,
        detail: String,
    },
}

impl NormalizeError {
    pub fn document_id(&self) -> &DocumentId {
        match self {
            NormalizeError::Schema { document_id, .. }
            | NormalizeError::UnitConversion { document_id, .. } => document_id,
        }
    }
}

/// Normalize one document. `raw.category` selects the validation rules.
pub fn normalize(
    document_id: &DocumentId,
    raw: &RawDocument,
) -> Result<NormalizedDocument, NormalizeError> {
    let (principal, notional) = requirements::check_document(document_id, raw)?;
    let currency = requirements::currency_code(document_id, raw)?;
    let base = principal.or(notional);

    let mut terms: Vec<FinancialTerm> = Vec::with_capacity(raw.raw_terms.len());
    let mut superseded = Vec::new();
    let mut notices = Vec::new();
    let mut positions: HashMap<(TermKind, String), usize> = HashMap::new();

    for (index, raw_term) in raw.raw_terms.iter().enumerate() {
        let name = normalize_name(&raw_term.name);
        requirements::check_term(document_id, index, raw_term, &name)?;

        let canonical = conversion::to_canonical(
            raw_term.kind,
            &name,
            raw_term.unit,
            raw_term.frequency,
            raw_term.value,
            base,
        )
        .map_err(|failure| NormalizeError::UnitConversion {
            document_id: document_id.clone(),
            term: name.clone(),
            kind: raw_term.kind,
            unit: raw_term.unit,
            detail: failure.detail().to_string(),
        })?;

        let term = FinancialTerm::new(
            raw_term.kind,
            name.clone(),
            canonical.value,
            canonical.unit,
            canonical.frequency,
            raw_term
                .applies_to
                .as_deref()
                .map(str::trim)
                .filter(|section| !section.is_empty())
                .map(str::to_string),
            raw_term.confidence,
        );

        match positions.get(&(raw_term.kind, name.clone())) {
            None => {
                positions.insert((raw_term.kind, name), terms.len());
                terms.push(term);
            }
            Some(&position) => {
                let kept = &terms[position];
                if term.confidence() > kept.confidence() {
                    let replaced = std::mem::replace(&mut terms[position], term);
                    superseded.push(replaced);
                } else {
                    if term.confidence() == kept.confidence() {
                        notices.push(AnomalyFlag {
                            document_id: document_id.clone(),
                            term: Some(TermRef::to(position, kept)),
                            severity: Severity::Info,
                            reason: format!(
                                "duplicate {} '{}' with equal confidence; kept the first occurrence",
                                kept.kind(),
                                kept.name()
                            ),
                        });
                    }
                    superseded.push(term);
                }
            }
        }
    }

    let term_months = requirements::resolve_term_months(raw, &terms);
    requirements::check_amortization_inputs(document_id, raw.category, term_months, &terms)?;

    debug!(
        document_id = %document_id,
        category = %raw.category,
        terms = terms.len(),
        superseded = superseded.len(),
        "normalized document"
    );

    Ok(NormalizedDocument::new(
        document_id.clone(),
        raw.category,
        principal,
        term_months,
        notional,
        currency,
        terms,
        superseded,
        notices,
    ))
}

/// Convenience for callers that hold the category separately from the payload.
pub fn normalize_as(
    document_id: &DocumentId,
    raw: &RawDocument,
    category: DocumentCategory,
) -> Result<NormalizedDocument, NormalizeError> {
    if raw.category == category {
        return normalize(document_id, raw);
    }

    let mut retagged = raw.clone();
    retagged.category = category;
    normalize(document_id, &retagged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::{Frequency, RawTerm};

    fn loan() -> RawDocument {
        RawDocument::new(DocumentCategory::Loan)
            .with_principal(100_000.0)
            .with_term_months(60)
            .with_term(RawTerm::new(
                TermKind::Rate,
                "Interest Rate",
                0.05,
                TermUnit::PercentAnnual,
            ))
    }

    #[test]
    fn loan_requires_principal() {
        let mut raw = loan();
        raw.principal = None;

        match normalize(&"loan-a".into(), &raw) {
            Err(NormalizeError::Schema {
                document_id, field, ..
            }) => {
                assert_eq!(document_id.as_str(), "loan-a");
                assert_eq!(field, "principal");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn insurance_rejects_principal() {
        let raw = RawDocument::new(DocumentCategory::Insurance).with_principal(5_000.0);

        assert!(matches!(
            normalize(&"policy".into(), &raw),
            Err(NormalizeError::Schema { field, .. }) if field == "principal"
        ));
    }

    #[test]
    fn term_length_can_come_from_duration_term() {
        let mut raw = loan();
        raw.term_months = None;
        raw.raw_terms.push(RawTerm::new(
            TermKind::Duration,
            "Loan Term",
            5.0,
            TermUnit::Years,
        ));

        let doc = normalize(&"loan-a".into(), &raw).expect("normalizes");
        assert_eq!(doc.term_months(), Some(60));
    }

    #[test]
    fn loan_without_rate_is_rejected() {
        let mut raw = loan();
        raw.raw_terms.clear();

        assert!(matches!(
            normalize(&"loan-a".into(), &raw),
            Err(NormalizeError::Schema { field, .. }) if field == "raw_terms"
        ));
    }

    #[test]
    fn unmappable_unit_reports_term() {
        let raw = loan().with_term(RawTerm::new(
            TermKind::Duration,
            "grace period",
            1.0,
            TermUnit::FlatCurrency,
        ));

        match normalize(&"loan-a".into(), &raw) {
            Err(NormalizeError::UnitConversion { term, unit, .. }) => {
                assert_eq!(term, "grace period");
                assert_eq!(unit, TermUnit::FlatCurrency);
            }
            other => panic!("expected unit conversion error, got {other:?}"),
        }
    }

    #[test]
    fn higher_confidence_duplicate_wins_in_place() {
        let raw = loan()
            .with_term(
                RawTerm::new(TermKind::Fee, "Origination Fee", 900.0, TermUnit::FlatCurrency)
                    .with_confidence(0.6),
            )
            .with_term(
                RawTerm::new(TermKind::Fee, "origination  fee", 1_000.0, TermUnit::FlatCurrency)
                    .with_confidence(0.9),
            );

        let doc = normalize(&"loan-a".into(), &raw).expect("normalizes");
        let fees: Vec<_> = doc.terms_of(TermKind::Fee).collect();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].0, 1);
        assert_eq!(fees[0].1.value(), 1_000.0);
        assert_eq!(doc.superseded().len(), 1);
        assert!(doc.notices().is_empty());
    }

    #[test]
    fn equal_confidence_duplicate_keeps_first_and_notes_it() {
        let fee = RawTerm::new(TermKind::Fee, "Late Fee", 35.0, TermUnit::FlatCurrency)
            .with_frequency(Frequency::OneTime);
        let raw = loan()
            .with_term(fee.clone())
            .with_term(RawTerm { value: 40.0, ..fee });

        let doc = normalize(&"loan-a".into(), &raw).expect("normalizes");
        let (_, kept) = doc.terms_of(TermKind::Fee).next().expect("fee kept");
        assert_eq!(kept.value(), 35.0);
        assert_eq!(doc.notices().len(), 1);
        assert_eq!(doc.notices()[0].severity, Severity::Info);
        assert_eq!(doc.superseded()[0].value(), 40.0);
    }

    #[test]
    fn normalize_as_overrides_category() {
        let raw = loan();
        let result = normalize_as(&"loan-a".into(), &raw, DocumentCategory::Investment);
        assert!(matches!(result, Err(NormalizeError::Schema { .. })));
    }

    #[test]
    fn currency_is_upper_cased_and_validated() {
        let mut raw = loan();
        raw.currency = Some("eur".to_string());
        let doc = normalize(&"loan-a".into(), &raw).expect("normalizes");
        assert_eq!(doc.currency(), "EUR");

        raw.currency = Some("euro".to_string());
        assert!(matches!(
            normalize(&"loan-a".into(), &raw),
            Err(NormalizeError::Schema { field, .. }) if field == "currency"
        ));
    }
}
