use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for documents supplied by the extraction adapter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Loan,
    Mortgage,
    Insurance,
    Investment,
}

impl DocumentCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Loan => "loan",
            Self::Mortgage => "mortgage",
            Self::Insurance => "insurance",
            Self::Investment => "investment",
        }
    }

    /// Loans and mortgages carry a principal and an amortization schedule.
    pub const fn amortizes(self) -> bool {
        matches!(self, Self::Loan | Self::Mortgage)
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Rate,
    Fee,
    Duration,
    Penalty,
    Condition,
}

impl TermKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rate => "rate",
            Self::Fee => "fee",
            Self::Duration => "duration",
            Self::Penalty => "penalty",
            Self::Condition => "condition",
        }
    }

    /// Fees and penalties are the terms that move money.
    pub const fn is_charge(self) -> bool {
        matches!(self, Self::Fee | Self::Penalty)
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermUnit {
    PercentAnnual,
    PercentMonthly,
    FlatCurrency,
    Months,
    Years,
    Boolean,
}

impl TermUnit {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PercentAnnual => "percent_annual",
            Self::PercentMonthly => "percent_monthly",
            Self::FlatCurrency => "flat_currency",
            Self::Months => "months",
            Self::Years => "years",
            Self::Boolean => "boolean",
        }
    }

    pub const fn is_percent(self) -> bool {
        matches!(self, Self::PercentAnnual | Self::PercentMonthly)
    }
}

impl fmt::Display for TermUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How often a charge is levied. Normalized terms only carry `OneTime` or `Monthly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    OneTime,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    pub const fn months_per_period(self) -> Option<u32> {
        match self {
            Self::OneTime => None,
            Self::Monthly => Some(1),
            Self::Quarterly => Some(3),
            Self::Annual => Some(12),
        }
    }

    pub const fn is_recurring(self) -> bool {
        !matches!(self, Self::OneTime)
    }
}

/// A financial fact in its canonical unit. Only the normalizer constructs these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialTerm {
    kind: TermKind,
    name: String,
    value: f64,
    unit: TermUnit,
    frequency: Frequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    applies_to: Option<String>,
    confidence: f64,
}

impl FinancialTerm {
    pub(crate) fn new(
        kind: TermKind,
        name: String,
        value: f64,
        unit: TermUnit,
        frequency: Frequency,
        applies_to: Option<String>,
        confidence: f64,
    ) -> Self {
        Self {
            kind,
            name,
            value,
            unit,
            frequency,
            applies_to,
            confidence,
        }
    }

    pub fn kind(&self) -> TermKind {
        self.kind
    }

    /// Normalized (whitespace-collapsed, lower-case) term name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> TermUnit {
        self.unit
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn applies_to(&self) -> Option<&str> {
        self.applies_to.as_deref()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn is_recurring(&self) -> bool {
        self.frequency.is_recurring()
    }
}

/// Pointer to a term inside a normalized document, stable across serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub position: usize,
    pub kind: TermKind,
    pub name: String,
}

impl TermRef {
    pub fn to(position: usize, term: &FinancialTerm) -> Self {
        Self {
            position,
            kind: term.kind(),
            name: term.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Deviation from expected fee ranges or disclosure norms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub document_id: DocumentId,
    /// Absent when the flag describes a term the document is missing.
    pub term: Option<TermRef>,
    pub severity: Severity,
    pub reason: String,
}

/// Canonical document produced by the normalizer; read-only for every later stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDocument {
    document_id: DocumentId,
    category: DocumentCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    principal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    term_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notional: Option<f64>,
    currency: String,
    terms: Vec<FinancialTerm>,
    superseded: Vec<FinancialTerm>,
    notices: Vec<AnomalyFlag>,
}

impl NormalizedDocument {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        document_id: DocumentId,
        category: DocumentCategory,
        principal: Option<f64>,
        term_months: Option<u32>,
        notional: Option<f64>,
        currency: String,
        terms: Vec<FinancialTerm>,
        superseded: Vec<FinancialTerm>,
        notices: Vec<AnomalyFlag>,
    ) -> Self {
        Self {
            document_id,
            category,
            principal,
            term_months,
            notional,
            currency,
            terms,
            superseded,
            notices,
        }
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn category(&self) -> DocumentCategory {
        self.category
    }

    pub fn principal(&self) -> Option<f64> {
        self.principal
    }

    pub fn term_months(&self) -> Option<u32> {
        self.term_months
    }

    pub fn notional(&self) -> Option<f64> {
        self.notional
    }

    /// Amount percentages resolve against: principal, else notional.
    pub fn base(&self) -> Option<f64> {
        self.principal.or(self.notional)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn terms(&self) -> &[FinancialTerm] {
        &self.terms
    }

    /// Duplicates discarded during normalization, in input order.
    pub fn superseded(&self) -> &[FinancialTerm] {
        &self.superseded
    }

    /// Info-level flags raised while normalizing.
    pub fn notices(&self) -> &[AnomalyFlag] {
        &self.notices
    }

    pub fn terms_of(&self, kind: TermKind) -> impl Iterator<Item = (usize, &FinancialTerm)> {
        self.terms
            .iter()
            .enumerate()
            .filter(move |(_, term)| term.kind() == kind)
    }

    pub fn position_of(&self, kind: TermKind, name: &str) -> Option<usize> {
        self.terms
            .iter()
            .position(|term| term.kind() == kind && term.name() == name)
    }
}

fn default_confidence() -> f64 {
    1.0
}

/// Untrusted term as delivered by the extraction adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTerm {
    pub kind: TermKind,
    pub name: String,
    pub value: f64,
    pub unit: TermUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl RawTerm {
    pub fn new(kind: TermKind, name: impl Into<String>, value: f64, unit: TermUnit) -> Self {
        Self {
            kind,
            name: name.into(),
            value,
            unit,
            frequency: None,
            applies_to: None,
            confidence: 1.0,
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn applying_to(mut self, section: impl Into<String>) -> Self {
        self.applies_to = Some(section.into());
        self
    }
}

/// Per-document payload from the extraction adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub category: DocumentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notional: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub raw_terms: Vec<RawTerm>,
    /// Companion disclosure summary: names of the terms the issuer disclosed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclosures: Option<Vec<String>>,
}

impl RawDocument {
    pub fn new(category: DocumentCategory) -> Self {
        Self {
            category,
            principal: None,
            term_months: None,
            notional: None,
            currency: None,
            raw_terms: Vec::new(),
            disclosures: None,
        }
    }

    pub fn with_principal(mut self, principal: f64) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn with_term_months(mut self, term_months: u32) -> Self {
        self.term_months = Some(term_months);
        self
    }

    pub fn with_notional(mut self, notional: f64) -> Self {
        self.notional = Some(notional);
        self
    }

    pub fn with_term(mut self, term: RawTerm) -> Self {
        self.raw_terms.push(term);
        self
    }

    pub fn with_disclosures<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disclosures = Some(names.into_iter().map(Into::into).collect());
        self
    }
}
