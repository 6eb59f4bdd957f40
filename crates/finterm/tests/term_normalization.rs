//! Normalization behavior observed through the public engine API.

use finterm::normalize::{annual_from_monthly, monthly_from_annual};
use finterm::terms::Frequency;
use finterm::{
    normalize, DocumentCategory, DocumentId, NormalizeError, RawDocument, RawTerm, TermKind,
    TermUnit,
};
use proptest::prelude::*;

fn mortgage() -> RawDocument {
    RawDocument::new(DocumentCategory::Mortgage)
        .with_principal(250_000.0)
        .with_term(RawTerm::new(
            TermKind::Rate,
            "Note Rate",
            0.005,
            TermUnit::PercentMonthly,
        ))
        .with_term(RawTerm::new(
            TermKind::Duration,
            "Mortgage Term",
            30.0,
            TermUnit::Years,
        ))
        .with_term(
            RawTerm::new(TermKind::Fee, "Escrow Fee", 300.0, TermUnit::FlatCurrency)
                .with_frequency(Frequency::Quarterly),
        )
        .with_term(
            RawTerm::new(TermKind::Fee, "Discount Points", 0.01, TermUnit::PercentAnnual)
                .with_frequency(Frequency::OneTime),
        )
}

proptest! {
    #[test]
    fn monthly_annual_round_trip(monthly in 0.0f64..1.0) {
        let back = monthly_from_annual(annual_from_monthly(monthly));
        prop_assert!((back - monthly).abs() < 1e-9, "{monthly} came back as {back}");
    }
}

#[test]
fn every_kind_lands_in_its_canonical_unit() {
    let doc = normalize(&DocumentId::from("mortgage"), &mortgage()).expect("normalizes");

    assert_eq!(doc.term_months(), Some(360));
    for term in doc.terms() {
        let expected = match term.kind() {
            TermKind::Rate => vec![TermUnit::PercentAnnual],
            TermKind::Duration => vec![TermUnit::Months],
            TermKind::Condition => vec![TermUnit::Boolean],
            TermKind::Fee | TermKind::Penalty => {
                vec![TermUnit::FlatCurrency, TermUnit::PercentAnnual]
            }
        };
        assert!(
            expected.contains(&term.unit()),
            "{} normalized to {}",
            term.name(),
            term.unit()
        );
    }

    let rate = doc.terms_of(TermKind::Rate).next().expect("rate").1;
    assert!((rate.value() - annual_from_monthly(0.005)).abs() < 1e-12);

    let escrow = doc
        .terms()
        .iter()
        .find(|term| term.name() == "escrow fee")
        .expect("escrow fee");
    assert_eq!(escrow.value(), 100.0);
    assert_eq!(escrow.frequency(), Frequency::Monthly);

    let points = doc
        .terms()
        .iter()
        .find(|term| term.name() == "discount points")
        .expect("discount points");
    assert_eq!(points.unit(), TermUnit::FlatCurrency);
    assert!((points.value() - 2_500.0).abs() < 1e-9);
}

#[test]
fn percentage_fee_without_base_is_a_conversion_error() {
    let raw = RawDocument::new(DocumentCategory::Insurance).with_term(RawTerm::new(
        TermKind::Fee,
        "Policy Fee",
        0.02,
        TermUnit::PercentAnnual,
    ));

    match normalize(&DocumentId::from("policy"), &raw) {
        Err(NormalizeError::UnitConversion {
            document_id, term, ..
        }) => {
            assert_eq!(document_id.as_str(), "policy");
            assert_eq!(term, "policy fee");
        }
        other => panic!("expected unit conversion error, got {other:?}"),
    }
}

#[test]
fn out_of_range_confidence_names_the_field() {
    let raw = mortgage().with_term(
        RawTerm::new(TermKind::Fee, "Late Fee", 50.0, TermUnit::FlatCurrency)
            .with_confidence(1.4),
    );

    match normalize(&DocumentId::from("mortgage"), &raw) {
        Err(NormalizeError::Schema { field, .. }) => {
            assert_eq!(field, "raw_terms[4].confidence")
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn rates_at_or_below_minus_one_hundred_percent_are_rejected() {
    let raw = RawDocument::new(DocumentCategory::Loan)
        .with_principal(10_000.0)
        .with_term_months(12)
        .with_term(RawTerm::new(
            TermKind::Rate,
            "Interest Rate",
            -1.0,
            TermUnit::PercentAnnual,
        ));

    match normalize(&DocumentId::from("loan"), &raw) {
        Err(NormalizeError::Schema { field, detail, .. }) => {
            assert_eq!(field, "raw_terms[0].value");
            assert!(detail.contains("interest rate"), "{detail}");
        }
        other => panic!("expected schema error, got {other:?}"),
    }

    let negative = RawDocument::new(DocumentCategory::Loan)
        .with_principal(10_000.0)
        .with_term_months(12)
        .with_term(RawTerm::new(
            TermKind::Rate,
            "Promotional Rate",
            -0.01,
            TermUnit::PercentAnnual,
        ));
    assert!(normalize(&DocumentId::from("promo"), &negative).is_ok());
}

#[test]
fn raw_documents_deserialize_with_defaults() {
    let raw: RawDocument = serde_json::from_str(
        r#"{
            "category": "loan",
            "principal": 5000,
            "term_months": 12,
            "raw_terms": [
                {"kind": "rate", "name": "APR", "value": 0.09, "unit": "percent_annual"}
            ]
        }"#,
    )
    .expect("payload parses");

    assert_eq!(raw.raw_terms[0].confidence, 1.0);
    assert!(raw.disclosures.is_none());
    let doc = normalize(&DocumentId::from("loan"), &raw).expect("normalizes");
    assert_eq!(doc.currency(), "USD");
}
