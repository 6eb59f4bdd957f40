use crate::terms::{mentions_any, normalize_name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Terms that must appear in the issuer's disclosure summary whenever present.
pub(crate) const DISCLOSURE_REQUIRED: &[&str] = &[
    "prepayment penalty",
    "balloon payment",
    "early termination",
    "surrender charge",
];

pub(crate) fn requires_disclosure(name: &str) -> bool {
    mentions_any(name, DISCLOSURE_REQUIRED)
}

/// Companion summary listing the terms an issuer disclosed alongside a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisclosureSummary {
    disclosed: BTreeSet<String>,
}

impl DisclosureSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A term counts as disclosed when either name contains the other.
    pub fn discloses(&self, name: &str) -> bool {
        self.disclosed
            .iter()
            .any(|disclosed| disclosed.contains(name) || name.contains(disclosed.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.disclosed.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for DisclosureSummary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            disclosed: iter
                .into_iter()
                .map(|name| normalize_name(name.as_ref()))
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }
}
