//! System instruction assembly.
//!
//! The instruction is built, in fixed order, from:
//! 1. the persona / mission / output-structure template,
//! 2. the active operating mode's full label,
//! 3. the claim metadata block (`Label: value`, with placeholders for blanks),
//! 4. the construction-code expertise addendum.
//!
//! Assembly is pure: identical inputs always produce byte-identical output.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::claim::ClaimMetadata;
use crate::mode::OperatingMode;

/// Placeholder for blank text fields.
pub const UNKNOWN: &str = "Unknown";

/// Placeholder for an unset goal.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Returned verbatim when asked for legal advice or coverage interpretation.
pub const LEGAL_DEFLECTION: &str = "I can’t interpret coverage or provide legal advice. I can summarize the documents, highlight inconsistencies, and help draft a professional request for clarification or reconsideration.";

/// Construction-code guidance appended after the claim data.
pub const IRC_EXPERT_ADDENDUM: &str = "You are an expert on IRC Chapters 8 and 9. Use specific code references (e.g., R905.2.8.5 for drip edge) only when relevant to the construction scope being discussed. Ensure repair methodologies mentioned align with these standards.";

/// Who the assistant presents itself as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
    #[serde(default = "default_organization")]
    pub organization: String,
}

fn default_assistant_name() -> String {
    "Megan".into()
}
fn default_organization() -> String {
    "XPRO ELITE EXTERIOR BUILDERS".into()
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            organization: default_organization(),
        }
    }
}

/// Composes system instructions for a given persona.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptTemplate {
    persona: Persona,
}

impl PromptTemplate {
    pub fn new(persona: Persona) -> Self {
        Self { persona }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Build the full system instruction for `mode` and `metadata`.
    pub fn compose(&self, mode: OperatingMode, metadata: &ClaimMetadata) -> String {
        let mut out = self.persona_block();

        out.push('\n');
        let _ = writeln!(out, "CURRENT OPERATING MODE: {}", mode.label());

        out.push('\n');
        out.push_str("CURRENT CLAIM DATA:\n");
        let _ = writeln!(out, "Carrier: {}", or_placeholder(&metadata.carrier, UNKNOWN));
        let _ = writeln!(out, "Claim #: {}", or_placeholder(&metadata.claim_number, UNKNOWN));
        let _ = writeln!(out, "Address: {}", or_placeholder(&metadata.address, UNKNOWN));
        let _ = writeln!(out, "Date of Loss: {}", or_placeholder(&metadata.date_of_loss, UNKNOWN));
        let _ = writeln!(out, "Adjuster: {}", or_placeholder(&metadata.adjuster, UNKNOWN));
        let _ = writeln!(
            out,
            "Desired Next Action: {}",
            metadata.next_step.map(|g| g.label()).unwrap_or(NOT_SPECIFIED)
        );

        out.push('\n');
        out.push_str(IRC_EXPERT_ADDENDUM);
        out.push('\n');
        out
    }

    fn persona_block(&self) -> String {
        let Persona {
            assistant_name,
            organization,
        } = &self.persona;

        let mut modes = String::new();
        for mode in OperatingMode::ALL {
            let _ = writeln!(modes, "- {}: {}", mode.tag(), mode.description());
        }

        format!(
            "You are {assistant_name}, the Insurance Restoration Claims Conduit for {organization}.\n\
             Expertise: Insurance restoration claim process, fact extraction from restoration PDFs (Estimates, Denial Letters, ITEL, Xactimate), and an expert on Chapter R8 (Roof-Ceiling Construction) and R9 (Roof Assemblies) of the International Residential Code (IRC).\n\
             \n\
             MISSION:\n\
             1. Extract facts from uploaded PDFs.\n\
             2. Draft persuasive, evidence-based messages to insurance carriers.\n\
             3. Translate claim complexity into homeowner-friendly language.\n\
             4. DO NOT provide legal advice or interpret policy coverage/exclusions. Response if asked: \"{LEGAL_DEFLECTION}\"\n\
             \n\
             OUTPUT STRUCTURE (MANDATORY):\n\
             1. What I Understand (Facts Only) - Bullet list of confirmed data.\n\
             2. What’s Missing / Questions - Bullet list of data needed.\n\
             3. Recommended Next Step - 1-3 clear actions.\n\
             4. Draft Message(s) - Actual ready-to-send messages labeled \"Carrier Draft\" or \"Homeowner Draft\".\n\
             5. Attachment Checklist - Documents needed for the communication.\n\
             \n\
             Operating Modes:\n\
             {modes}\
             \n\
             Stay firm, professional, respectful, and evidence-based. Label your current mode at the start of every message.\n"
        )
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { placeholder } else { trimmed }
}

/// Compose the system instruction with the default persona.
pub fn compose_system_instruction(mode: OperatingMode, metadata: &ClaimMetadata) -> String {
    PromptTemplate::default().compose(mode, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ClaimGoal;

    fn filled() -> ClaimMetadata {
        ClaimMetadata {
            carrier: "Lakeshore Mutual".into(),
            claim_number: "LM-4471-22".into(),
            address: "18 Cedar Ridge Rd".into(),
            date_of_loss: "2025-05-14".into(),
            adjuster: "Dana Ruiz".into(),
            next_step: Some(ClaimGoal::ReinspectionRequest),
        }
    }

    #[test]
    fn composition_is_deterministic() {
        for mode in OperatingMode::ALL {
            let a = compose_system_instruction(mode, &filled());
            let b = compose_system_instruction(mode, &filled());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn empty_metadata_renders_placeholders() {
        let text = compose_system_instruction(OperatingMode::Document, &ClaimMetadata::default());
        assert_eq!(text.matches(UNKNOWN).count(), 5);
        assert_eq!(text.matches(NOT_SPECIFIED).count(), 1);
        assert!(text.contains("Carrier: Unknown\n"));
        assert!(text.contains("Desired Next Action: Not specified\n"));
    }

    #[test]
    fn partial_metadata_mixes_values_and_placeholders() {
        let meta = ClaimMetadata {
            carrier: "Lakeshore Mutual".into(),
            adjuster: "   ".into(),
            ..ClaimMetadata::default()
        };
        let text = compose_system_instruction(OperatingMode::Carrier, &meta);
        assert!(text.contains("Carrier: Lakeshore Mutual\n"));
        assert!(text.contains("Adjuster: Unknown\n"));
        assert_eq!(text.matches(UNKNOWN).count(), 4);
    }

    #[test]
    fn filled_metadata_has_no_placeholders() {
        let text = compose_system_instruction(OperatingMode::Homeowner, &filled());
        assert!(!text.contains(UNKNOWN));
        assert!(!text.contains(NOT_SPECIFIED));
        assert!(text.contains("Desired Next Action: Reinspection Request"));
    }

    #[test]
    fn mode_label_appears_exactly_once() {
        for mode in OperatingMode::ALL {
            let text = compose_system_instruction(mode, &ClaimMetadata::default());
            assert_eq!(text.matches(mode.label()).count(), 1, "{mode}");
        }
    }

    #[test]
    fn blocks_appear_in_fixed_order() {
        let text = compose_system_instruction(OperatingMode::Document, &filled());
        let persona = text.find("OUTPUT STRUCTURE").unwrap();
        let mode = text.find("CURRENT OPERATING MODE").unwrap();
        let claim = text.find("CURRENT CLAIM DATA").unwrap();
        let irc = text.find("R905.2.8.5").unwrap();
        assert!(persona < mode && mode < claim && claim < irc);
    }

    #[test]
    fn legal_deflection_is_verbatim() {
        let text = compose_system_instruction(OperatingMode::Carrier, &ClaimMetadata::default());
        assert!(text.contains(LEGAL_DEFLECTION));
    }

    #[test]
    fn custom_persona_is_applied() {
        let template = PromptTemplate::new(Persona {
            assistant_name: "Riley".into(),
            organization: "Summit Roofing".into(),
        });
        let text = template.compose(OperatingMode::Document, &ClaimMetadata::default());
        assert!(text.starts_with("You are Riley, the Insurance Restoration Claims Conduit for Summit Roofing."));
    }
}
