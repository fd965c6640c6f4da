//! Operating modes — the persona presets that shape the system instruction.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ClaimError;

/// One of the fixed assistant modes. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Persuasive, evidence-based drafts addressed to the carrier.
    #[serde(alias = "a")]
    Carrier,
    /// Plain-language explanations for the homeowner.
    #[serde(alias = "b")]
    Homeowner,
    /// Fact extraction from uploaded claim documents.
    #[default]
    #[serde(alias = "c")]
    Document,
}

impl OperatingMode {
    pub const ALL: [OperatingMode; 3] = [Self::Carrier, Self::Homeowner, Self::Document];

    /// Short machine identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Carrier => "carrier",
            Self::Homeowner => "homeowner",
            Self::Document => "document",
        }
    }

    /// The full label, as injected into the system instruction.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Carrier => "MODE A — Carrier Communication Drafting",
            Self::Homeowner => "MODE B — Homeowner Explanation",
            Self::Document => "MODE C — Document Intelligence & Claim Build",
        }
    }

    /// Badge shown in headers, e.g. `MODE C`.
    pub fn tag(&self) -> &'static str {
        self.label()
            .split_once(" — ")
            .map(|(tag, _)| tag)
            .unwrap_or(self.label())
    }

    /// Human-readable description, e.g. `Document Intelligence & Claim Build`.
    pub fn description(&self) -> &'static str {
        self.label()
            .split_once(" — ")
            .map(|(_, desc)| desc)
            .unwrap_or(self.label())
    }

    fn letter(&self) -> &'static str {
        match self {
            Self::Carrier => "a",
            Self::Homeowner => "b",
            Self::Document => "c",
        }
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OperatingMode {
    type Err = ClaimError;

    /// Accepts the id (`document`), the letter (`c`), or the badge (`mode c`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        let needle = needle.strip_prefix("mode").map(str::trim).unwrap_or(&needle);
        Self::ALL
            .into_iter()
            .find(|m| m.id() == needle || m.letter() == needle)
            .ok_or_else(|| ClaimError::UnknownMode(s.to_string()))
    }
}
