pub mod chat;
pub mod doctor;
pub mod modes;
pub mod onboard;
pub mod prompt;
pub mod status;

use clap::Args;
use claimconduit_config::AppConfig;
use claimconduit_core::{
    ClaimChat, ClaimError, ClaimField, ClaimGoal, ClaimMetadata, MetadataPolicy, OperatingMode,
    PromptTemplate, SessionManager, SessionSettings,
};

/// Claim context flags shared by `chat` and `prompt`.
#[derive(Args, Debug, Default)]
pub struct ClaimArgs {
    /// Operating mode: carrier|homeowner|document (or a|b|c)
    #[arg(long)]
    pub mode: Option<OperatingMode>,

    /// Insurance carrier
    #[arg(long)]
    pub carrier: Option<String>,

    /// Claim number
    #[arg(long = "claim")]
    pub claim_number: Option<String>,

    /// Property address
    #[arg(long)]
    pub address: Option<String>,

    /// Date of loss
    #[arg(long = "date-of-loss")]
    pub date_of_loss: Option<String>,

    /// Desk or field adjuster
    #[arg(long)]
    pub adjuster: Option<String>,

    /// Desired next action, e.g. "supplement-submission"
    #[arg(long)]
    pub goal: Option<ClaimGoal>,
}

impl ClaimArgs {
    pub fn mode_or(&self, fallback: OperatingMode) -> OperatingMode {
        self.mode.unwrap_or(fallback)
    }

    pub fn to_metadata(&self) -> Result<ClaimMetadata, ClaimError> {
        let mut metadata = ClaimMetadata::default();
        let fields = [
            (ClaimField::Carrier, &self.carrier),
            (ClaimField::ClaimNumber, &self.claim_number),
            (ClaimField::Address, &self.address),
            (ClaimField::DateOfLoss, &self.date_of_loss),
            (ClaimField::Adjuster, &self.adjuster),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                metadata.set_field(field, value)?;
            }
        }
        metadata.next_step = self.goal;
        Ok(metadata)
    }
}

/// The prompt template configured for this install.
pub fn template(config: &AppConfig) -> PromptTemplate {
    PromptTemplate::new(config.persona.clone())
}

/// Wire config, provider and claim context into a chat controller.
pub fn build_chat(
    config: &AppConfig,
    claim: &ClaimArgs,
    policy: MetadataPolicy,
) -> Result<ClaimChat, Box<dyn std::error::Error>> {
    let router = claimconduit_providers::build_from_config(config)?;
    let provider = router.default().ok_or("No default provider configured")?;

    let settings = SessionSettings {
        model: config.provider_model(&config.provider).to_string(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    let mut manager = SessionManager::new(provider, settings).with_template(template(config));
    if let Some(timeout) = config.request_timeout() {
        manager = manager.with_timeout(timeout);
    }

    let mode = claim.mode_or(config.default_mode);
    tracing::debug!(provider = %config.provider, ?mode, ?policy, "Chat controller wired");

    Ok(ClaimChat::new(manager, mode)
        .with_metadata(claim.to_metadata()?)
        .with_policy(policy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_args_fill_metadata() {
        let args = ClaimArgs {
            carrier: Some("  Lakeshore Mutual ".into()),
            adjuster: Some("Dana Ruiz".into()),
            goal: Some(ClaimGoal::DenialResponse),
            ..ClaimArgs::default()
        };
        let metadata = args.to_metadata().unwrap();
        assert_eq!(metadata.carrier, "Lakeshore Mutual");
        assert_eq!(metadata.adjuster, "Dana Ruiz");
        assert_eq!(metadata.next_step, Some(ClaimGoal::DenialResponse));
        assert!(metadata.claim_number.is_empty());
    }

    #[test]
    fn mode_falls_back_to_config() {
        let args = ClaimArgs::default();
        assert_eq!(args.mode_or(OperatingMode::Carrier), OperatingMode::Carrier);
    }

    #[test]
    fn build_chat_uses_config_defaults() {
        let config = AppConfig {
            api_key: Some("test-key".into()),
            default_mode: OperatingMode::Homeowner,
            ..AppConfig::default()
        };
        let chat = build_chat(&config, &ClaimArgs::default(), MetadataPolicy::Refresh).unwrap();
        assert_eq!(chat.mode(), OperatingMode::Homeowner);
        assert_eq!(chat.policy(), MetadataPolicy::Refresh);
        assert_eq!(chat.session().provider_name(), "gemini");
        assert!(!chat.session().is_ready());
    }
}
