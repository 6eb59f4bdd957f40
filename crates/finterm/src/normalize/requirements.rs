use super::NormalizeError;
use crate::terms::{
    DocumentCategory, DocumentId, FinancialTerm, RawDocument, RawTerm, TermKind, TermUnit,
};

pub(crate) const DEFAULT_CURRENCY: &str = "USD";

/// Duration names that describe the length of the whole contract.
const TERM_LENGTH_NAMES: &[&str] = &["term", "duration", "tenure", "length"];

fn schema(
    document_id: &DocumentId,
    field: impl Into<String>,
    detail: impl Into<String>,
) -> NormalizeError {
    NormalizeError::Schema {
        document_id: document_id.clone(),
        field: field.into(),
        detail: detail.into(),
    }
}

fn positive_amount(
    document_id: &DocumentId,
    field: &str,
    value: Option<f64>,
) -> Result<Option<f64>, NormalizeError> {
    match value {
        Some(amount) if !amount.is_finite() || amount <= 0.0 => Err(schema(
            document_id,
            field,
            format!("must be a positive amount, found {amount}"),
        )),
        other => Ok(other),
    }
}

/// Category rules applied before any term is converted.
pub(crate) fn check_document(
    document_id: &DocumentId,
    raw: &RawDocument,
) -> Result<(Option<f64>, Option<f64>), NormalizeError> {
    let principal = positive_amount(document_id, "principal", raw.principal)?;
    let notional = positive_amount(document_id, "notional", raw.notional)?;

    if raw.category.amortizes() {
        if principal.is_none() {
            return Err(schema(
                document_id,
                "principal",
                format!("is required for {} documents", raw.category),
            ));
        }
        if notional.is_some() {
            return Err(schema(
                document_id,
                "notional",
                format!("does not apply to {} documents", raw.category),
            ));
        }
    } else if principal.is_some() {
        return Err(schema(
            document_id,
            "principal",
            format!("must be absent for {} documents", raw.category),
        ));
    }

    if raw.term_months == Some(0) {
        return Err(schema(document_id, "term_months", "must be at least one month"));
    }

    Ok((principal, notional))
}

pub(crate) fn currency_code(
    document_id: &DocumentId,
    raw: &RawDocument,
) -> Result<String, NormalizeError> {
    let Some(code) = raw.currency.as_deref() else {
        return Ok(DEFAULT_CURRENCY.to_string());
    };

    let trimmed = code.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|ch| ch.is_ascii_alphabetic()) {
        Ok(trimmed.to_ascii_uppercase())
    } else {
        Err(schema(
            document_id,
            "currency",
            format!("must be a three-letter code, found '{code}'"),
        ))
    }
}

pub(crate) fn check_term(
    document_id: &DocumentId,
    index: usize,
    term: &RawTerm,
    name: &str,
) -> Result<(), NormalizeError> {
    let field = |attribute: &str| format!("raw_terms[{index}].{attribute}");

    if name.is_empty() {
        return Err(schema(document_id, field("name"), "must not be empty"));
    }

    if !term.value.is_finite() {
        return Err(schema(
            document_id,
            field("value"),
            format!("term '{name}' has a non-finite value"),
        ));
    }

    if !(0.0..=1.0).contains(&term.confidence) {
        return Err(schema(
            document_id,
            field("confidence"),
            format!(
                "term '{name}' confidence {} outside 0..=1",
                term.confidence
            ),
        ));
    }

    let non_negative = matches!(
        term.kind,
        TermKind::Fee | TermKind::Penalty | TermKind::Duration
    );
    if non_negative && term.value < 0.0 {
        return Err(schema(
            document_id,
            field("value"),
            format!("{} '{name}' must not be negative", term.kind),
        ));
    }

    if term.kind == TermKind::Rate && term.value <= -1.0 {
        return Err(schema(
            document_id,
            field("value"),
            format!("rate '{name}' must be above -100%, found {}", term.value),
        ));
    }

    if term.unit == TermUnit::Boolean && term.value != 0.0 && term.value != 1.0 {
        return Err(schema(
            document_id,
            field("value"),
            format!("boolean term '{name}' must be 0 or 1"),
        ));
    }

    Ok(())
}

fn describes_contract_length(name: &str) -> bool {
    TERM_LENGTH_NAMES.contains(&name) || name.ends_with(" term")
}

/// Explicit `term_months` wins; otherwise the first contract-length duration term.
pub(crate) fn resolve_term_months(raw: &RawDocument, terms: &[FinancialTerm]) -> Option<u32> {
    raw.term_months.or_else(|| {
        terms
            .iter()
            .find(|term| {
                term.kind() == TermKind::Duration && describes_contract_length(term.name())
            })
            .map(|term| term.value().round() as u32)
            .filter(|months| *months > 0)
    })
}

/// Amortizing categories cannot be modeled without a length and a rate.
pub(crate) fn check_amortization_inputs(
    document_id: &DocumentId,
    category: DocumentCategory,
    term_months: Option<u32>,
    terms: &[FinancialTerm],
) -> Result<(), NormalizeError> {
    if !category.amortizes() {
        return Ok(());
    }

    if term_months.is_none() {
        return Err(schema(
            document_id,
            "term_months",
            format!(
                "is required for {category} documents (explicit or as a term duration)"
            ),
        ));
    }

    if !terms.iter().any(|term| term.kind() == TermKind::Rate) {
        return Err(schema(
            document_id,
            "raw_terms",
            format!("{category} documents need at least one rate term"),
        ));
    }

    Ok(())
}
