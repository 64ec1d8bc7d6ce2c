//! `reelforge login` and `reelforge logout`.

use anyhow::Result;
use tracing::info;

use logging::redact_user_id;

use crate::config::CliContext;
use crate::terminal_output::{note_error, note_info, note_success};

pub async fn login(ctx: &mut CliContext, account_id: &str) -> Result<()> {
    let account_id = account_id.trim();
    if account_id.is_empty() {
        note_error("請輸入帳號");
        return Ok(());
    }
    ctx.state.sign_in(account_id);
    ctx.save_state().await?;
    info!(account = %redact_user_id(account_id), "Signed in");
    note_success(&format!("已登入：{account_id}"));
    Ok(())
}

pub async fn logout(ctx: &mut CliContext) -> Result<()> {
    if ctx.state.account_id().is_none() {
        note_info("目前未登入");
        return Ok(());
    }
    ctx.state.sign_out();
    ctx.save_state().await?;
    info!("Signed out");
    note_success("已登出");
    Ok(())
}
