//! Example binary demonstrating the dtz_cloud library.
//!
//! This example resolves the account context, then prints registry
//! statistics and the domains registered in the context.
//!
//! ## Usage
//!
//! 1. Create a `.env` file with `DTZ_API_KEY`
//! 2. Run: `cargo run`

#![allow(clippy::print_stdout)] // Allow println! in the binary example

use dtz_cloud::{ContainersClient, ContextClient, DtzConfig, RegistryClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Load configuration from environment
    let cfg = DtzConfig::from_env()?;
    println!("Configuration loaded:");
    println!("  Containers API: {}", cfg.containers_url);
    println!("  Registry API:   {}", cfg.registry_url);

    // Resolve the context the API key belongs to
    let context = ContextClient::new(cfg.clone())?.get_context().await?;
    println!("\nContext:");
    println!("  ID:    {}", context.contextId);
    println!("  Alias: {}", context.alias);

    // Registry statistics
    let stats = RegistryClient::new(cfg.clone())?.stats().await?;
    println!("\nRegistry:");
    println!("  Server: {}", stats.serverUrl);
    println!("  Images: {}", stats.imageCount);

    // Domains registered in the context
    let containers = ContainersClient::new(cfg)?;
    let domains = containers.list_domains().await?;
    println!("\nDomains:");
    for domain in &domains {
        let verified = if domain.verified { "verified" } else { "pending" };
        println!("  {} ({verified})", domain.name);
    }
    if let Some(default) = containers.find_default_domain().await? {
        println!("  default: {}", default.name);
    }

    Ok(())
}
