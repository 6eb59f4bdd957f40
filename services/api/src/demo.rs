use crate::infra::{build_engine, parse_date, read_json};
use chrono::{Local, NaiveDate};
use clap::Args;
use finterm::config::AppConfig;
use finterm::error::AppError;
use finterm::router::{AnalyzeRequest, CompareRequest, QueryRequest};
use finterm::telemetry;
use finterm::{
    BatchComparison, DocumentAnalysis, DocumentCategory, DocumentId, FinancialTerm, RawDocument,
    RawTerm, TermEngine, TermKind, TermQuery, TermUnit,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// JSON file holding `{document_id, document, horizon_months?}`
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Horizon in months (overrides the file and configuration)
    #[arg(long)]
    pub(crate) horizon: Option<u32>,
    /// Print the raw JSON result instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    /// JSON file holding `{documents: {id: document}, horizon_months?, weights?}`
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Horizon in months (overrides the file and configuration)
    #[arg(long)]
    pub(crate) horizon: Option<u32>,
    /// Print the raw JSON result instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct QueryArgs {
    /// JSON file holding `{document_id, document}`
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Term kind: rate, fee, duration, penalty, or condition
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: Option<TermKind>,
    /// Case-insensitive fragment of the term name
    #[arg(long)]
    pub(crate) name: Option<String>,
    /// Inclusive lower bound on the normalized value
    #[arg(long)]
    pub(crate) min: Option<f64>,
    /// Inclusive upper bound on the normalized value
    #[arg(long)]
    pub(crate) max: Option<f64>,
    /// Fail unless exactly one term matches
    #[arg(long)]
    pub(crate) exactly_one: bool,
    /// Print the raw JSON result instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date printed on the report (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Horizon in months. Defaults to the full loan term.
    #[arg(long)]
    pub(crate) horizon: Option<u32>,
}

fn parse_kind(raw: &str) -> Result<TermKind, String> {
    let wanted = raw.trim().to_ascii_lowercase();
    [
        TermKind::Rate,
        TermKind::Fee,
        TermKind::Duration,
        TermKind::Penalty,
        TermKind::Condition,
    ]
    .into_iter()
    .find(|kind| kind.label() == wanted)
    .ok_or_else(|| format!("unknown term kind '{raw}'"))
}

fn command_engine() -> Result<TermEngine, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(build_engine(&config))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let request: AnalyzeRequest = read_json(&args.input)?;
    let engine = command_engine()?;
    let analysis = engine.analyze(
        &request.document_id,
        &request.document,
        args.horizon.or(request.horizon_months),
    )?;

    if args.json {
        return print_json(&analysis);
    }
    render_analysis(&analysis);
    Ok(())
}

pub(crate) fn run_compare(args: CompareArgs) -> Result<(), AppError> {
    let request: CompareRequest = read_json(&args.input)?;
    if request.documents.is_empty() {
        return Err(AppError::Input(format!(
            "{} contains no documents",
            args.input.display()
        )));
    }

    let engine = command_engine()?;
    let batch = engine.compare_documents(
        &request.documents,
        args.horizon.or(request.horizon_months),
        request.weights,
    )?;

    if args.json {
        return print_json(&batch);
    }
    render_comparison(&batch, Local::now().date_naive());
    Ok(())
}

pub(crate) fn run_query(args: QueryArgs) -> Result<(), AppError> {
    let request: QueryRequest = read_json(&args.input)?;
    let mut predicate = request.query;
    if let Some(kind) = args.kind {
        predicate = predicate.kind(kind);
    }
    if let Some(name) = args.name {
        predicate = predicate.name_contains(name);
    }
    if let Some(min) = args.min {
        predicate = predicate.min_value(min);
    }
    if let Some(max) = args.max {
        predicate = predicate.max_value(max);
    }

    let engine = command_engine()?;
    let terms = if args.exactly_one || request.exactly_one {
        vec![engine.query_one(&request.document_id, &request.document, &predicate)?]
    } else {
        engine.query(&request.document_id, &request.document, &predicate)?
    };

    if args.json {
        return print_json(&terms);
    }
    println!("{} matching term(s) in {}", terms.len(), request.document_id);
    render_terms(&terms);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { as_of, horizon } = args;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let engine = TermEngine::default();

    let documents = demo_loans();
    println!("Financial term comparison demo");
    println!(
        "- Loan A: 5.00% APR with a $1,000 origination fee\n- Loan B: 5.50% APR with no fees"
    );

    let batch = engine.compare_documents(&documents, horizon, None)?;
    render_comparison(&batch, as_of);

    let loan_a = DocumentId::from("loan-a");
    if let Some(raw) = documents.get(&loan_a) {
        let fees = engine.query(&loan_a, raw, &TermQuery::new().kind(TermKind::Fee))?;
        println!("\nFee terms in {loan_a}:");
        render_terms(&fees);
    }

    Ok(())
}

fn demo_loans() -> BTreeMap<DocumentId, RawDocument> {
    let loan = |rate: f64| {
        RawDocument::new(DocumentCategory::Loan)
            .with_principal(100_000.0)
            .with_term_months(60)
            .with_term(RawTerm::new(
                TermKind::Rate,
                "Interest Rate",
                rate,
                TermUnit::PercentAnnual,
            ))
    };

    BTreeMap::from([
        (
            DocumentId::from("loan-a"),
            loan(0.05).with_term(RawTerm::new(
                TermKind::Fee,
                "Origination Fee",
                1_000.0,
                TermUnit::FlatCurrency,
            )),
        ),
        (DocumentId::from("loan-b"), loan(0.055)),
    ])
}

pub(crate) fn render_analysis(analysis: &DocumentAnalysis) {
    let model = &analysis.cost_model;
    println!(
        "Document {} ({}, {})",
        model.document_id,
        model.category,
        analysis.document.currency()
    );
    println!(
        "- Total cost over {} months: {:.2} | effective rate {:.3}%",
        model.horizon_months,
        model.total_cost,
        model.effective_rate * 100.0
    );
    println!("Breakdown:");
    for (name, amount) in &model.breakdown {
        println!("  - {name}: {amount:.2}");
    }

    println!(
        "Risk: {} (score {} | {} critical, {} warning, {} info)",
        analysis.risk.level.label(),
        analysis.risk.score,
        analysis.risk.critical,
        analysis.risk.warning,
        analysis.risk.info
    );
    if analysis.anomalies.is_empty() {
        println!("Anomalies: none");
    } else {
        println!("Anomalies:");
        for flag in &analysis.anomalies {
            println!("  - [{}] {}", flag.severity.label(), flag.reason);
        }
    }
}

pub(crate) fn render_comparison(batch: &BatchComparison, as_of: NaiveDate) {
    let report = &batch.report;
    println!("\nComparison as of {as_of}");
    let weights = report
        .criteria
        .iter()
        .map(|(name, weight)| format!("{name}={weight}"))
        .collect::<Vec<_>>()
        .join(", ");
    println!("Criteria: {weights}");

    for entry in &report.scores {
        println!(
            "  {}. {} | score {:.3} | total cost {:.2} | effective rate {:.3}% | {} anomalies",
            entry.rank,
            entry.document_id,
            entry.score,
            entry.total_cost,
            entry.effective_rate * 100.0,
            entry.anomaly_count
        );
    }

    if let Some(best) = report.best() {
        println!("Best option: {best}");
    }
    for exclusion in &report.excluded {
        println!(
            "  Excluded {}: {}",
            exclusion.document_id, exclusion.reason
        );
    }
}

pub(crate) fn render_terms(terms: &[FinancialTerm]) {
    if terms.is_empty() {
        println!("  (none)");
    }
    for term in terms {
        println!(
            "  - {} {}: {} {} ({})",
            term.kind(),
            term.name(),
            term.value(),
            term.unit(),
            if term.is_recurring() { "monthly" } else { "one-time" }
        );
    }
}
