//! Remote model providers for ClaimConduit.
//!
//! All providers implement the `claimconduit_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod anthropic;
pub mod gemini;
mod http;
pub mod router;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use router::{ProviderRouter, build_from_config};
