use crate::terms::{mentions_any, Frequency, TermKind, TermUnit};

/// Compound a monthly rate into its annual equivalent.
pub fn annual_from_monthly(monthly: f64) -> f64 {
    (1.0 + monthly).powi(12) - 1.0
}

/// Inverse of [`annual_from_monthly`].
pub fn monthly_from_annual(annual: f64) -> f64 {
    (1.0 + annual).powf(1.0 / 12.0) - 1.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Canonical {
    pub(crate) value: f64,
    pub(crate) unit: TermUnit,
    pub(crate) frequency: Frequency,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConversionFailure {
    Unsupported,
    MissingBase,
    RecurringPenalty,
}

impl ConversionFailure {
    pub(crate) fn detail(&self) -> &'static str {
        match self {
            ConversionFailure::Unsupported => "no conversion exists for this kind and unit",
            ConversionFailure::MissingBase => {
                "percentage charges need a principal or notional to resolve against"
            }
            ConversionFailure::RecurringPenalty => "penalties are realized once, at exit",
        }
    }
}

const MONTHLY_NAMES: &[&str] = &["monthly", "per month", "a month"];
const QUARTERLY_NAMES: &[&str] = &["quarterly", "per quarter"];
const ANNUAL_NAMES: &[&str] = &["annual", "yearly", "per year", "per annum"];
const PREMIUM_NAMES: &[&str] = &["premium"];

/// Cadence spelled out in a fee name. Premiums with no cadence are billed monthly.
fn cadence_in_name(name: &str) -> Option<Frequency> {
    if mentions_any(name, MONTHLY_NAMES) {
        Some(Frequency::Monthly)
    } else if mentions_any(name, QUARTERLY_NAMES) {
        Some(Frequency::Quarterly)
    } else if mentions_any(name, ANNUAL_NAMES) {
        Some(Frequency::Annual)
    } else if mentions_any(name, PREMIUM_NAMES) {
        Some(Frequency::Monthly)
    } else {
        None
    }
}

/// Explicit frequency, then a fee's name, then the unit: percent-unit charges
/// recur and flat amounts are one-time. Penalties never take a cadence from their name.
fn effective_frequency(
    kind: TermKind,
    name: &str,
    unit: TermUnit,
    frequency: Option<Frequency>,
) -> Frequency {
    frequency
        .or_else(|| (kind == TermKind::Fee).then(|| cadence_in_name(name)).flatten())
        .unwrap_or(if unit.is_percent() {
            Frequency::Annual
        } else {
            Frequency::OneTime
        })
}

fn percent_as_annual(unit: TermUnit, value: f64) -> f64 {
    match unit {
        TermUnit::PercentMonthly => annual_from_monthly(value),
        _ => value,
    }
}

/// Conversion table from raw `(kind, unit)` pairs to the canonical unit per kind.
/// `name` must already be normalized.
pub(crate) fn to_canonical(
    kind: TermKind,
    name: &str,
    unit: TermUnit,
    frequency: Option<Frequency>,
    value: f64,
    base: Option<f64>,
) -> Result<Canonical, ConversionFailure> {
    let one_time = |value: f64, unit: TermUnit| Canonical {
        value,
        unit,
        frequency: Frequency::OneTime,
    };

    match (kind, unit) {
        (TermKind::Rate, TermUnit::PercentAnnual | TermUnit::PercentMonthly) => {
            Ok(one_time(percent_as_annual(unit, value), TermUnit::PercentAnnual))
        }
        (TermKind::Duration, TermUnit::Months) => Ok(one_time(value, TermUnit::Months)),
        (TermKind::Duration, TermUnit::Years) => Ok(one_time(value * 12.0, TermUnit::Months)),
        (TermKind::Condition, TermUnit::Boolean) => Ok(one_time(value, TermUnit::Boolean)),
        (TermKind::Fee | TermKind::Penalty, TermUnit::FlatCurrency) => {
            match effective_frequency(kind, name, unit, frequency).months_per_period() {
                None => Ok(one_time(value, TermUnit::FlatCurrency)),
                Some(_) if kind == TermKind::Penalty => Err(ConversionFailure::RecurringPenalty),
                Some(months) => Ok(Canonical {
                    value: value / months as f64,
                    unit: TermUnit::FlatCurrency,
                    frequency: Frequency::Monthly,
                }),
            }
        }
        (TermKind::Fee | TermKind::Penalty, TermUnit::PercentAnnual | TermUnit::PercentMonthly) => {
            let base = base.ok_or(ConversionFailure::MissingBase)?;
            let recurring = effective_frequency(kind, name, unit, frequency).is_recurring();
            if kind == TermKind::Penalty || !recurring {
                Ok(one_time(value * base, TermUnit::FlatCurrency))
            } else {
                Ok(Canonical {
                    value: percent_as_annual(unit, value),
                    unit: TermUnit::PercentAnnual,
                    frequency: Frequency::Monthly,
                })
            }
        }
        _ => Err(ConversionFailure::Unsupported),
    }
}
