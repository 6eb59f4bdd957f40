//! Fee and anomaly detection against a reference taxonomy and disclosure summary.

mod disclosure;
mod risk;
mod taxonomy;

pub use disclosure::DisclosureSummary;
pub use risk::{RiskLevel, RiskProfile};
pub use taxonomy::{ReferenceTaxonomy, TaxonomyEntry, TaxonomyError};

use crate::terms::{
    AnomalyFlag, DocumentCategory, NormalizedDocument, Severity, TermKind, TermRef, TermUnit,
};
use tracing::debug;

/// Fees above `p90 * WARNING_MULTIPLIER` are flagged.
pub const WARNING_MULTIPLIER: f64 = 1.5;

struct FlagSink<'a> {
    doc: &'a NormalizedDocument,
    flags: Vec<AnomalyFlag>,
}

impl<'a> FlagSink<'a> {
    fn new(doc: &'a NormalizedDocument) -> Self {
        Self {
            doc,
            flags: doc.notices().to_vec(),
        }
    }

    fn push(&mut self, term: Option<TermRef>, severity: Severity, reason: String) {
        self.flags.push(AnomalyFlag {
            document_id: self.doc.document_id().clone(),
            term,
            severity,
            reason,
        });
    }
}

/// Flag anomalies in `doc`. Never fails; the normalizer has already rejected malformed input.
///
/// `disclosure` is optional: without it, undisclosed-term checks are skipped and every
/// other rule still applies.
pub fn detect_anomalies(
    doc: &NormalizedDocument,
    taxonomy: &ReferenceTaxonomy,
    disclosure: Option<&DisclosureSummary>,
) -> Vec<AnomalyFlag> {
    let category = doc.category();
    let mut sink = FlagSink::new(doc);

    for (position, term) in doc.terms().iter().enumerate() {
        let reference = || Some(TermRef::to(position, term));
        let entry = taxonomy.lookup(category, term.name());

        if term.kind().is_charge() {
            match entry {
                None => sink.push(
                    reference(),
                    Severity::Info,
                    format!("unclassified fee '{}'", term.name()),
                ),
                Some(entry) if term.value() > entry.p90 * WARNING_MULTIPLIER => sink.push(
                    reference(),
                    Severity::Warning,
                    format!(
                        "'{}' of {:.2} exceeds the {} 90th percentile {:.2} by more than 50%",
                        term.name(),
                        term.value(),
                        category,
                        entry.p90
                    ),
                ),
                Some(_) => {}
            }
        }

        let needs_disclosure = disclosure::requires_disclosure(term.name())
            || entry.map(|entry| entry.disclosure_required).unwrap_or(false);
        if let Some(summary) = disclosure {
            if needs_disclosure && !summary.discloses(term.name()) {
                sink.push(
                    reference(),
                    Severity::Critical,
                    format!(
                        "'{}' requires disclosure but is missing from the disclosure summary",
                        term.name()
                    ),
                );
            }
        }

        let asserted = !(term.unit() == TermUnit::Boolean && term.value() == 0.0);
        if asserted {
            if let Some((label, severity)) = risk::indicator_for(term.name()) {
                sink.push(reference(), severity, format!("{label}: '{}'", term.name()));
            }
        }
    }

    for duplicate in doc.superseded() {
        if !duplicate.kind().is_charge() {
            continue;
        }
        let reference = doc
            .position_of(duplicate.kind(), duplicate.name())
            .map(|position| TermRef::to(position, &doc.terms()[position]));
        sink.push(
            reference,
            Severity::Warning,
            format!(
                "duplicate {} '{}' appears more than once",
                duplicate.kind(),
                duplicate.name()
            ),
        );
    }

    for reason in missing_expected_terms(doc) {
        sink.push(None, Severity::Info, reason);
    }

    debug!(
        document_id = %doc.document_id(),
        flags = sink.flags.len(),
        taxonomy_entries = taxonomy.len(),
        disclosure_supplied = disclosure.is_some(),
        "detected anomalies"
    );

    sink.flags
}

fn missing_expected_terms(doc: &NormalizedDocument) -> Vec<String> {
    let mut fees = doc.terms_of(TermKind::Fee).map(|(_, term)| term);
    match doc.category() {
        DocumentCategory::Insurance => {
            if fees.any(|term| term.is_recurring()) {
                Vec::new()
            } else {
                vec!["missing expected term: no recurring premium".to_string()]
            }
        }
        DocumentCategory::Investment => {
            if fees.next().is_some() {
                Vec::new()
            } else {
                vec!["missing expected term: no fee schedule".to_string()]
            }
        }
        DocumentCategory::Loan | DocumentCategory::Mortgage => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::terms::{DocumentId, Frequency, RawDocument, RawTerm};

    fn mortgage() -> RawDocument {
        RawDocument::new(DocumentCategory::Mortgage)
            .with_principal(300_000.0)
            .with_term_months(360)
            .with_term(RawTerm::new(
                TermKind::Rate,
                "Interest Rate",
                0.065,
                TermUnit::PercentAnnual,
            ))
            .with_term(RawTerm::new(
                TermKind::Fee,
                "Origination Fee",
                4_000.0,
                TermUnit::FlatCurrency,
            ))
            .with_term(RawTerm::new(
                TermKind::Penalty,
                "Prepayment Penalty",
                0.02,
                TermUnit::PercentAnnual,
            ))
    }

    fn detect(raw: &RawDocument, taxonomy: &ReferenceTaxonomy) -> Vec<AnomalyFlag> {
        let doc = normalize(&DocumentId::from("mortgage-1"), raw).expect("normalizes");
        let disclosure = raw
            .disclosures
            .as_ref()
            .map(|names| names.iter().collect::<DisclosureSummary>());
        detect_anomalies(&doc, taxonomy, disclosure.as_ref())
    }

    #[test]
    fn fee_far_above_reference_is_a_warning() {
        let taxonomy = ReferenceTaxonomy::new()
            .with_entry(DocumentCategory::Mortgage, "origination fee", 2_000.0, false)
            .with_entry(DocumentCategory::Mortgage, "prepayment penalty", 8_000.0, false);

        let flags = detect(&mortgage(), &taxonomy);

        assert!(flags.iter().any(|flag| flag.severity == Severity::Warning
            && flag.term.as_ref().map(|term| term.name.as_str()) == Some("origination fee")));
        assert!(!flags
            .iter()
            .any(|flag| flag.reason.starts_with("unclassified")));
    }

    #[test]
    fn fee_within_reference_is_not_flagged() {
        let taxonomy = ReferenceTaxonomy::new()
            .with_entry(DocumentCategory::Mortgage, "origination fee", 3_000.0, false);

        let flags = detect(&mortgage(), &taxonomy);

        assert!(!flags.iter().any(|flag| flag.severity == Severity::Warning
            && flag.term.as_ref().map(|term| term.name.as_str()) == Some("origination fee")));
    }

    #[test]
    fn unknown_fees_are_unclassified() {
        let flags = detect(&mortgage(), &ReferenceTaxonomy::new());
        let unclassified = flags
            .iter()
            .filter(|flag| flag.reason.starts_with("unclassified fee"))
            .count();
        assert_eq!(unclassified, 2);
    }

    #[test]
    fn undisclosed_prepayment_penalty_is_critical_only_with_summary() {
        let without_summary = detect(&mortgage(), &ReferenceTaxonomy::new());
        assert!(without_summary
            .iter()
            .all(|flag| flag.severity != Severity::Critical));

        let with_summary = detect(
            &mortgage().with_disclosures(["origination fee"]),
            &ReferenceTaxonomy::new(),
        );
        let critical: Vec<_> = with_summary
            .iter()
            .filter(|flag| flag.severity == Severity::Critical)
            .collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(
            critical[0].term.as_ref().map(|term| term.name.as_str()),
            Some("prepayment penalty")
        );

        let disclosed = detect(
            &mortgage().with_disclosures(["Prepayment Penalty"]),
            &ReferenceTaxonomy::new(),
        );
        assert!(disclosed.iter().all(|flag| flag.severity != Severity::Critical));
    }

    #[test]
    fn taxonomy_can_mark_additional_disclosures() {
        let raw = mortgage()
            .with_term(RawTerm::new(
                TermKind::Fee,
                "Rate Lock Extension",
                750.0,
                TermUnit::FlatCurrency,
            ))
            .with_disclosures(["prepayment penalty"]);
        let taxonomy = ReferenceTaxonomy::new().with_entry(
            DocumentCategory::Mortgage,
            "rate lock extension",
            1_000.0,
            true,
        );

        let flags = detect(&raw, &taxonomy);
        assert!(flags.iter().any(|flag| flag.severity == Severity::Critical
            && flag.reason.contains("rate lock extension")));
    }

    #[test]
    fn duplicate_fees_are_warnings() {
        let fee = RawTerm::new(TermKind::Fee, "Servicing Fee", 15.0, TermUnit::FlatCurrency)
            .with_frequency(Frequency::Monthly);
        let raw = mortgage().with_term(fee.clone()).with_term(fee);

        let flags = detect(&raw, &ReferenceTaxonomy::new());

        assert!(flags.iter().any(|flag| flag.severity == Severity::Info
            && flag.reason.contains("equal confidence")));
        assert!(flags.iter().any(|flag| flag.severity == Severity::Warning
            && flag.reason.starts_with("duplicate fee 'servicing fee'")));
    }

    #[test]
    fn balloon_payment_is_a_risk_warning() {
        let raw = mortgage().with_term(RawTerm::new(
            TermKind::Condition,
            "Balloon Payment",
            1.0,
            TermUnit::Boolean,
        ));

        let flags = detect(&raw, &ReferenceTaxonomy::new());
        assert!(flags.iter().any(|flag| flag.severity == Severity::Warning
            && flag.reason.starts_with("payment shock risk")));
    }

    #[test]
    fn negated_conditions_carry_no_risk() {
        let raw = mortgage().with_term(RawTerm::new(
            TermKind::Condition,
            "Collateral Required",
            0.0,
            TermUnit::Boolean,
        ));

        let flags = detect(&raw, &ReferenceTaxonomy::new());
        assert!(!flags.iter().any(|flag| flag.reason.starts_with("collateral risk")));
    }

    #[test]
    fn insurance_without_premium_is_noted() {
        let raw = RawDocument::new(DocumentCategory::Insurance).with_term(RawTerm::new(
            TermKind::Fee,
            "Deductible",
            1_000.0,
            TermUnit::FlatCurrency,
        ));
        let doc = normalize(&DocumentId::from("policy"), &raw).expect("normalizes");

        let flags = detect_anomalies(&doc, &ReferenceTaxonomy::new(), None);
        assert!(flags
            .iter()
            .any(|flag| flag.term.is_none() && flag.reason.contains("no recurring premium")));
    }
}
