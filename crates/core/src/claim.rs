//! Claim metadata — the structured context injected into the system instruction.
//!
//! Pure data: every field is optional free-form text, edited by the user at
//! any time and owned by the front end for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ClaimError;

/// The desired next step for the claim, drawn from a fixed set of goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClaimGoal {
    InitialClaimSubmission,
    ReinspectionRequest,
    SupplementSubmission,
    DenialResponse,
    MatchingIssue,
    RecoverableDepreciation,
}

impl ClaimGoal {
    pub const ALL: [ClaimGoal; 6] = [
        Self::InitialClaimSubmission,
        Self::ReinspectionRequest,
        Self::SupplementSubmission,
        Self::DenialResponse,
        Self::MatchingIssue,
        Self::RecoverableDepreciation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::InitialClaimSubmission => "Initial Claim Submission",
            Self::ReinspectionRequest => "Reinspection Request",
            Self::SupplementSubmission => "Supplement Submission",
            Self::DenialResponse => "Denial Response",
            Self::MatchingIssue => "Matching Issue/ITEL",
            Self::RecoverableDepreciation => "Recoverable Depreciation",
        }
    }

    /// Kebab-case identifier, e.g. `denial-response`.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::InitialClaimSubmission => "initial-claim-submission",
            Self::ReinspectionRequest => "reinspection-request",
            Self::SupplementSubmission => "supplement-submission",
            Self::DenialResponse => "denial-response",
            Self::MatchingIssue => "matching-issue",
            Self::RecoverableDepreciation => "recoverable-depreciation",
        }
    }
}

impl std::fmt::Display for ClaimGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClaimGoal {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.label().eq_ignore_ascii_case(needle) || g.slug().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ClaimError::UnknownGoal(s.to_string()))
    }
}

/// The editable fields of [`ClaimMetadata`], addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimField {
    Carrier,
    ClaimNumber,
    Address,
    DateOfLoss,
    Adjuster,
    NextStep,
}

impl ClaimField {
    pub const ALL: [ClaimField; 6] = [
        Self::Carrier,
        Self::ClaimNumber,
        Self::Address,
        Self::DateOfLoss,
        Self::Adjuster,
        Self::NextStep,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Carrier => "carrier",
            Self::ClaimNumber => "claim",
            Self::Address => "address",
            Self::DateOfLoss => "date",
            Self::Adjuster => "adjuster",
            Self::NextStep => "goal",
        }
    }
}

impl FromStr for ClaimField {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "carrier" => Ok(Self::Carrier),
            "claim" | "claimnumber" | "claim#" => Ok(Self::ClaimNumber),
            "address" | "propertyaddress" => Ok(Self::Address),
            "date" | "dateofloss" | "dol" => Ok(Self::DateOfLoss),
            "adjuster" => Ok(Self::Adjuster),
            "goal" | "nextstep" => Ok(Self::NextStep),
            _ => Err(ClaimError::UnknownField(s.to_string())),
        }
    }
}

/// Insurance claim context. No field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMetadata {
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub claim_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub date_of_loss: String,
    #[serde(default)]
    pub adjuster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<ClaimGoal>,
}

impl ClaimMetadata {
    /// Set a field from text. The goal field must parse as a [`ClaimGoal`].
    pub fn set_field(&mut self, field: ClaimField, value: &str) -> Result<(), ClaimError> {
        let value = value.trim().to_string();
        match field {
            ClaimField::Carrier => self.carrier = value,
            ClaimField::ClaimNumber => self.claim_number = value,
            ClaimField::Address => self.address = value,
            ClaimField::DateOfLoss => self.date_of_loss = value,
            ClaimField::Adjuster => self.adjuster = value,
            ClaimField::NextStep => {
                self.next_step = if value.is_empty() {
                    None
                } else {
                    Some(value.parse()?)
                }
            }
        }
        Ok(())
    }

    pub fn clear_field(&mut self, field: ClaimField) {
        match field {
            ClaimField::Carrier => self.carrier.clear(),
            ClaimField::ClaimNumber => self.claim_number.clear(),
            ClaimField::Address => self.address.clear(),
            ClaimField::DateOfLoss => self.date_of_loss.clear(),
            ClaimField::Adjuster => self.adjuster.clear(),
            ClaimField::NextStep => self.next_step = None,
        }
    }

    /// Current text of a field; empty when unset.
    pub fn field(&self, field: ClaimField) -> &str {
        match field {
            ClaimField::Carrier => &self.carrier,
            ClaimField::ClaimNumber => &self.claim_number,
            ClaimField::Address => &self.address,
            ClaimField::DateOfLoss => &self.date_of_loss,
            ClaimField::Adjuster => &self.adjuster,
            ClaimField::NextStep => self.next_step.map(|g| g.label()).unwrap_or(""),
        }
    }

    pub fn is_empty(&self) -> bool {
        ClaimField::ALL.iter().all(|f| self.field(*f).trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metadata_is_empty() {
        let meta = ClaimMetadata::default();
        assert!(meta.is_empty());
        assert!(meta.next_step.is_none());
    }

    #[test]
    fn set_and_clear_fields_by_name() {
        let mut meta = ClaimMetadata::default();
        let field: ClaimField = "claim-number".parse().unwrap();
        meta.set_field(field, "  HX-2291-07 ").unwrap();
        assert_eq!(meta.claim_number, "HX-2291-07");

        meta.set_field(ClaimField::NextStep, "denial response").unwrap();
        assert_eq!(meta.next_step, Some(ClaimGoal::DenialResponse));

        meta.clear_field(ClaimField::NextStep);
        assert!(meta.next_step.is_none());
    }

    #[test]
    fn unknown_goal_is_rejected_without_mutation() {
        let mut meta = ClaimMetadata {
            next_step: Some(ClaimGoal::SupplementSubmission),
            ..ClaimMetadata::default()
        };
        assert!(meta.set_field(ClaimField::NextStep, "sue the carrier").is_err());
        assert_eq!(meta.next_step, Some(ClaimGoal::SupplementSubmission));
    }

    #[test]
    fn goal_parses_label_and_slug() {
        assert_eq!("Matching Issue/ITEL".parse::<ClaimGoal>().unwrap(), ClaimGoal::MatchingIssue);
        assert_eq!(
            "recoverable-depreciation".parse::<ClaimGoal>().unwrap(),
            ClaimGoal::RecoverableDepreciation
        );
    }

    #[test]
    fn unknown_field_name_errors() {
        assert!("policy".parse::<ClaimField>().is_err());
        assert_eq!("DOL".parse::<ClaimField>().unwrap(), ClaimField::DateOfLoss);
    }
}
