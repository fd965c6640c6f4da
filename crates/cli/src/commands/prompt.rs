//! `claimconduit prompt` — Print the system instruction a session would open with.

use claimconduit_config::AppConfig;

use super::ClaimArgs;

pub async fn run(args: ClaimArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mode = args.mode_or(config.default_mode);
    let metadata = args.to_metadata()?;

    println!("{}", super::template(&config).compose(mode, &metadata));
    Ok(())
}
