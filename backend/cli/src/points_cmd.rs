//! `reelforge wallet | packs | plans | buy`.

use anyhow::Result;

use logging::{ClientEvent, EventLogger};
use reelforge_client::PointsBackend;
use reelforge_core::{Plan, PointPack};
use reelforge_points::modal::{
    pack_description, plan_description, plan_price, purchase_error_text, PACKS_LOAD_FAILED,
    PLANS_LOAD_FAILED, PURCHASE_SUCCESS, SUBSCRIBE_UNAVAILABLE,
};
use reelforge_points::Badge;

use crate::config::CliContext;
use crate::terminal_output::{
    format_badge, note_error, note_info, note_success, render_table, Column,
};

pub async fn wallet(ctx: &CliContext) -> Result<()> {
    match ctx.api.wallet().await {
        Ok(wallet) => {
            let mut badge = Badge::new(true).with_thresholds(ctx.thresholds());
            badge.update(wallet);
            if let Some(view) = badge.view() {
                println!("點數餘額：{}", format_badge(&view));
            }
        }
        Err(e) => note_error(&format!("無法取得點數：{}", e.display_text())),
    }
    Ok(())
}

pub async fn packs(ctx: &CliContext) -> Result<()> {
    match ctx.api.packs().await {
        Ok(packs) if packs.is_empty() => note_info("目前沒有可購買的點數包"),
        Ok(packs) => print!("{}", packs_table(&packs)),
        Err(e) => note_error(&format!("{PACKS_LOAD_FAILED}：{}", e.display_text())),
    }
    Ok(())
}

pub async fn plans(ctx: &CliContext) -> Result<()> {
    match ctx.api.plans().await {
        Ok(plans) if plans.is_empty() => note_info("目前沒有訂閱方案"),
        Ok(plans) => {
            print!("{}", plans_table(&plans));
            note_info(SUBSCRIBE_UNAVAILABLE);
        }
        Err(e) => note_error(&format!("{PLANS_LOAD_FAILED}：{}", e.display_text())),
    }
    Ok(())
}

pub async fn buy(ctx: &CliContext, pack_id: u32) -> Result<()> {
    let result = ctx.api.checkout(pack_id).await.map(|_| ());
    EventLogger::log_event(
        &ctx.user_id,
        ClientEvent::Purchase {
            pack_id,
            ok: result.is_ok(),
            message: result.as_ref().err().map(|e| e.display_text()).unwrap_or_default(),
        },
    );
    match result {
        Ok(()) => {
            note_success(PURCHASE_SUCCESS);
            wallet(ctx).await?;
        }
        Err(e) => note_error(&purchase_error_text(&e)),
    }
    Ok(())
}

fn packs_table(packs: &[PointPack]) -> String {
    let columns = [
        Column::right("ID"),
        Column::left("名稱"),
        Column::right("點數"),
        Column::right("價格"),
        Column::right("效期"),
        Column::left("說明"),
    ];
    let rows: Vec<Vec<String>> = packs
        .iter()
        .map(|p| {
            vec![
                p.pack_id.to_string(),
                p.name.clone(),
                p.points.to_string(),
                format!("NT${}", p.price_ntd),
                if p.valid_days > 0 { format!("{} 天", p.valid_days) } else { "-".to_string() },
                pack_description(&p.name).to_string(),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

fn plans_table(plans: &[Plan]) -> String {
    let columns = [
        Column::right("ID"),
        Column::left("方案"),
        Column::right("月費"),
        Column::right("每月點數"),
        Column::right("批次上限"),
        Column::right("角色上限"),
        Column::left("說明"),
    ];
    let rows: Vec<Vec<String>> = plans
        .iter()
        .map(|p| {
            vec![
                p.plan_id.to_string(),
                p.name.clone(),
                format!("NT${}", plan_price(&p.name)),
                p.monthly_points.to_string(),
                p.batch_limit.to_string(),
                p.roles_limit.to_string(),
                plan_description(&p.name).to_string(),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal_output::strip_ansi;

    #[test]
    fn packs_table_lists_every_pack() {
        let packs = vec![
            PointPack { pack_id: 1, name: "小額包".into(), points: 100, price_ntd: 99, valid_days: 30 },
            PointPack { pack_id: 3, name: "標準包".into(), points: 500, price_ntd: 399, valid_days: 0 },
        ];
        let table = strip_ansi(&packs_table(&packs));
        assert!(table.contains("NT$99"));
        assert!(table.contains("30 天"));
        assert!(table.contains("標準包"));
        assert_eq!(table.lines().count(), 4);
    }

    #[test]
    fn plans_table_uses_known_price() {
        let plans = vec![Plan {
            plan_id: 2,
            name: "專業方案".into(),
            monthly_points: 3000,
            batch_limit: 10,
            roles_limit: 3,
        }];
        let table = strip_ansi(&plans_table(&plans));
        assert!(table.contains("NT$999"));
        assert!(table.contains("3000"));
    }
}
