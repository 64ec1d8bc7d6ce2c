//! CLI Doctor Command
//!
//! Validates the config, reports relevant environment variables and checks
//! that the backend answers.

use std::env;
use std::time::Instant;

use anyhow::Result;
use tracing::warn;

use reelforge_client::PointsBackend;
use reelforge_config::env::{API_BASE_VAR, LOG_DIR_VAR};
use reelforge_config::validation::validate;

use crate::config::CliContext;
use crate::terminal_output::{note_error, note_success, note_warn};

const ENV_VARS: [&str; 4] = [API_BASE_VAR, LOG_DIR_VAR, "REELFORGE_ENV", "REELFORGE_CONFIG_DIR"];

/// Executes the full doctor diagnosis.
pub async fn run(ctx: &CliContext) -> Result<()> {
    println!("\n🔍 Running ReelForge Doctor...\n");

    let config_ok = check_config(ctx);
    check_env_vars();
    let backend_ok = check_backend(ctx).await;

    println!();
    if config_ok && backend_ok {
        note_success("All checks passed! ReelForge is ready.");
    } else {
        note_error("Some checks failed. Please fix the errors above.");
    }
    Ok(())
}

fn check_config(ctx: &CliContext) -> bool {
    println!("Checking config ({}):", ctx.config_path.display());
    let report = validate(&ctx.config);
    for warning in &report.warnings {
        println!("  🟡 {warning}");
    }
    for error in &report.errors {
        println!("  🔴 {error}");
    }
    if report.is_valid() && report.warnings.is_empty() {
        println!("  🟢 Config is valid");
    }
    report.is_valid()
}

fn check_env_vars() {
    println!("Checking environment variables:");
    for var in ENV_VARS {
        match env::var(var) {
            Ok(val) if !val.is_empty() => println!("  🟢 {var} = {val}"),
            _ => println!("  ⚪ {var} is not set (optional)"),
        }
    }
}

async fn check_backend(ctx: &CliContext) -> bool {
    println!("Checking backend at {}:", ctx.api.base_url());
    let started = Instant::now();
    match ctx.api.packs().await {
        Ok(packs) => {
            println!(
                "  🟢 Reachable in {} ms ({} point packs listed)",
                started.elapsed().as_millis(),
                packs.len()
            );
            if ctx.state.account_id().is_none() {
                note_warn("Not signed in; one-click generation needs `reelforge login <account_id>`");
            }
            true
        }
        Err(e) => {
            warn!(error = %e, "Backend health check failed");
            println!("  🔴 {}", e.display_text());
            false
        }
    }
}
