//! `claimconduit status` — Show configuration status.

use claimconduit_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("ClaimConduit Status");
    println!("===================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.provider);
    println!("  Model:        {}", config.provider_model(&config.provider));
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!(
        "  Temperature:  {}",
        config.temperature.map_or("provider default".to_string(), |t| t.to_string())
    );
    println!(
        "  Max tokens:   {}",
        config.max_tokens.map_or("provider default".to_string(), |t| t.to_string())
    );
    println!(
        "  Timeout:      {}",
        config
            .request_timeout_secs
            .map_or("none".to_string(), |s| format!("{s}s"))
    );
    println!("  Mode:         {}", config.default_mode);
    println!("  Claim edits:  {:?}", config.metadata_policy);
    println!(
        "  Persona:      {} ({})",
        config.persona.assistant_name, config.persona.organization
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `claimconduit onboard` first");
    }

    Ok(())
}
