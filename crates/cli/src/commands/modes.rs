//! `claimconduit modes` — List operating modes, claim goals and quick starts.

use claimconduit_core::{ClaimField, ClaimGoal, OperatingMode, QuickStart};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Operating modes (--mode, /mode):");
    for mode in OperatingMode::ALL {
        let default = if mode == OperatingMode::default() { " (default)" } else { "" };
        println!("  {:<10} {}{default}", mode.id(), mode.label());
        println!("  {:<10} {}", "", mode.description());
    }

    println!("\nClaim goals (--goal, /set goal):");
    for goal in ClaimGoal::ALL {
        println!("  {:<26} {}", goal.slug(), goal.label());
    }

    println!("\nClaim fields (/set, /clear):");
    let fields: Vec<&str> = ClaimField::ALL.iter().map(|f| f.name()).collect();
    println!("  {}", fields.join(", "));

    println!("\nQuick starts (/quick):");
    for (i, starter) in QuickStart::ALL.iter().enumerate() {
        println!("  {}. {} — {}", i + 1, starter.title(), starter.description());
    }

    Ok(())
}
