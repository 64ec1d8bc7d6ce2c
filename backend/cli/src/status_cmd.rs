//! CLI Status Command
//!
//! Reports the resolved configuration, the local identities and the wallet.

use anyhow::Result;

use logging::redact_user_id;
use reelforge_client::PointsBackend;
use reelforge_points::Badge;

use crate::config::CliContext;
use crate::terminal_output::{format_badge, paint, render_table, Column, BOLD, DIM};

pub async fn run(ctx: &CliContext) -> Result<()> {
    println!("\n{}\n", paint(BOLD, "📊 ReelForge Status"));

    let settings = ctx.points_settings();
    let (low, warning) = ctx.config.balance_thresholds();
    let account = ctx.state.account_id();
    let rows = vec![
        row("API", ctx.api.base_url()),
        row("Config", &ctx.config_path.display().to_string()),
        row("State", &ctx.state_path().display().to_string()),
        row("Agent user", &redact_user_id(&ctx.user_id)),
        row("Account", &account.as_deref().map(redact_user_id).unwrap_or_else(|| "未登入".to_string())),
        row("Points", if ctx.config.points_enabled() { "enabled" } else { "disabled" }),
        row("Badge", if settings.badge_visible { "visible" } else { "hidden" }),
        row("Thresholds", &format!("low < {low}, warning < {warning}")),
    ];
    print!("{}", render_table(&[Column::left("Item"), Column::left("Value")], &rows));

    if ctx.config.points_enabled() && account.is_some() {
        println!();
        match ctx.api.wallet().await {
            Ok(wallet) => {
                let mut badge = Badge::new(true).with_thresholds(ctx.thresholds());
                badge.update(wallet);
                if let Some(view) = badge.view() {
                    println!("Wallet: {}", format_badge(&view));
                }
            }
            Err(e) => println!("Wallet: {}", paint(DIM, &e.display_text())),
        }
    }
    println!();
    Ok(())
}

fn row(key: &str, value: &str) -> Vec<String> {
    vec![key.to_string(), value.to_string()]
}
