use crate::terms::{AnomalyFlag, Severity};
use serde::{Deserialize, Serialize};

/// Term-name indicators of structural risk, first match wins.
pub(crate) const RISK_INDICATORS: &[(&str, &str, Severity)] = &[
    ("balloon", "payment shock risk", Severity::Warning),
    ("default", "default risk", Severity::Warning),
    ("variable", "interest rate risk", Severity::Info),
    ("adjustable", "interest rate risk", Severity::Info),
    ("collateral", "collateral risk", Severity::Info),
    ("prepayment", "prepayment risk", Severity::Info),
    ("penalty", "penalty risk", Severity::Info),
];

pub(crate) fn indicator_for(name: &str) -> Option<(&'static str, Severity)> {
    RISK_INDICATORS
        .iter()
        .find(|(needle, _, _)| name.contains(*needle))
        .map(|(_, label, severity)| (*label, *severity))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => RiskLevel::High,
            40..=69 => RiskLevel::Medium,
            20..=39 => RiskLevel::Low,
            _ => RiskLevel::Minimal,
        }
    }
}

/// Severity tally for one document's flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub score: u8,
    pub level: RiskLevel,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

impl RiskProfile {
    pub fn from_flags(flags: &[AnomalyFlag]) -> Self {
        let count = |severity: Severity| flags.iter().filter(|flag| flag.severity == severity).count();
        let critical = count(Severity::Critical);
        let warning = count(Severity::Warning);
        let info = count(Severity::Info);

        let raw = critical * 40 + warning * 15 + info * 2;
        let score = raw.min(100) as u8;

        Self {
            score,
            level: RiskLevel::from_score(score),
            critical,
            warning,
            info,
        }
    }
}
