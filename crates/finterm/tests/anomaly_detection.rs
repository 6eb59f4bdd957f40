//! Fee and disclosure anomalies as seen by callers of the engine.

use finterm::anomaly::RiskLevel;
use finterm::config::EngineConfig;
use finterm::terms::Frequency;
use finterm::{
    detect_anomalies, normalize, DisclosureSummary, DocumentCategory, DocumentId, RawDocument,
    RawTerm, ReferenceTaxonomy, Severity, TermEngine, TermKind, TermUnit,
};
use std::io::Cursor;

fn mortgage() -> RawDocument {
    RawDocument::new(DocumentCategory::Mortgage)
        .with_principal(320_000.0)
        .with_term_months(360)
        .with_term(RawTerm::new(
            TermKind::Rate,
            "Interest Rate",
            0.0625,
            TermUnit::PercentAnnual,
        ))
        .with_term(RawTerm::new(
            TermKind::Penalty,
            "Prepayment Penalty",
            3_000.0,
            TermUnit::FlatCurrency,
        ))
}

#[test]
fn identical_duplicate_fees_raise_a_warning() {
    let fee = RawTerm::new(TermKind::Fee, "Processing Fee", 450.0, TermUnit::FlatCurrency);
    let raw = mortgage().with_term(fee.clone()).with_term(fee);
    let doc = normalize(&DocumentId::from("dup"), &raw).expect("normalizes");

    let flags = detect_anomalies(&doc, &ReferenceTaxonomy::new(), None);

    let warnings: Vec<_> = flags
        .iter()
        .filter(|flag| flag.severity == Severity::Warning)
        .collect();
    assert!(!warnings.is_empty());
    assert!(warnings.iter().any(|flag| flag
        .term
        .as_ref()
        .is_some_and(|term| term.name == "processing fee")));
}

#[test]
fn prepayment_penalty_without_summary_is_not_critical() {
    let doc = normalize(&DocumentId::from("mortgage"), &mortgage()).expect("normalizes");
    let flags = detect_anomalies(&doc, &ReferenceTaxonomy::new(), None);
    assert!(flags.iter().all(|flag| flag.severity != Severity::Critical));

    let summary: DisclosureSummary = ["interest rate"].into_iter().collect();
    let flags = detect_anomalies(&doc, &ReferenceTaxonomy::new(), Some(&summary));
    assert_eq!(
        flags
            .iter()
            .filter(|flag| flag.severity == Severity::Critical)
            .count(),
        1
    );
}

#[test]
fn taxonomy_percentiles_drive_warnings_through_the_engine() {
    let taxonomy = ReferenceTaxonomy::from_reader(Cursor::new(
        "category,name,p90,disclosure_required\n\
mortgage,Prepayment Penalty,1500,yes\n\
mortgage,Servicing Fee,20,\n",
    ))
    .expect("taxonomy parses");
    let engine = TermEngine::new(EngineConfig {
        reference_taxonomy: taxonomy,
        ..EngineConfig::default()
    });

    let raw = mortgage()
        .with_term(
            RawTerm::new(TermKind::Fee, "Servicing Fee", 25.0, TermUnit::FlatCurrency)
                .with_frequency(Frequency::Monthly),
        )
        .with_disclosures(["Prepayment Penalty"]);

    let analysis = engine
        .analyze(&DocumentId::from("mortgage"), &raw, Some(120))
        .expect("analysis");

    let penalty_warning = analysis.anomalies.iter().any(|flag| {
        flag.severity == Severity::Warning
            && flag
                .term
                .as_ref()
                .is_some_and(|term| term.name == "prepayment penalty")
    });
    assert!(penalty_warning, "3000 exceeds 1.5 x 1500");
    assert!(analysis
        .anomalies
        .iter()
        .all(|flag| flag.severity != Severity::Critical));
    assert!(!analysis
        .anomalies
        .iter()
        .any(|flag| flag.reason.contains("servicing fee") && flag.severity == Severity::Warning));
    assert_eq!(analysis.risk.warning, 1);
    assert_eq!(analysis.risk.info, 1);
    assert_eq!(analysis.risk.score, 17);
    assert_eq!(analysis.risk.level, RiskLevel::Minimal);
}
