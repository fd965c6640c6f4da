//! `claimconduit doctor` — Diagnose configuration and provider health.

use claimconduit_config::AppConfig;
use claimconduit_core::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("ClaimConduit Doctor — Diagnostics");
    println!("=================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — defaults in use (run `claimconduit onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured for {}", config.provider);
    } else {
        let var = claimconduit_config::provider_key_var(&config.provider).unwrap_or("CLAIMCONDUIT_API_KEY");
        println!("  ❌ No API key for {} — set {var} or api_key in config.toml", config.provider);
        issues += 1;
    }

    match claimconduit_providers::build_from_config(&config) {
        Ok(router) => match router.default() {
            Some(provider) if config.has_api_key() => match provider.health_check().await {
                Ok(true) => println!("  ✅ {} reachable", provider.name()),
                Ok(false) => {
                    println!("  ❌ {} rejected the credentials", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ {} unreachable: {e}", provider.name());
                    issues += 1;
                }
            },
            Some(_) => println!("  ⚠️  Skipping connectivity check (no API key)"),
            None => {
                println!("  ❌ No default provider");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
