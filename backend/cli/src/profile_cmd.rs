//! `reelforge profile` and `reelforge notes`.

use anyhow::{bail, Result};
use serde_json::Value;

use reelforge_client::agents::error_line;
use reelforge_core::{AgentKind, UserProfile};

use crate::config::CliContext;
use crate::terminal_output::{format_notes, format_profile, note_error, note_info, note_success};

/// Show the profile; with edits, apply them and save.
pub async fn profile(ctx: &CliContext, edits: &[String]) -> Result<()> {
    let edits = parse_edits(edits)?;
    let client = ctx.agents();
    note_info("正在載入定位檔案...");
    let snapshot = match client.load_profile().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            note_error(&error_line(&e));
            return Ok(());
        }
    };

    if edits.is_empty() {
        match &snapshot.profile {
            Some(profile) => print!("{}", format_profile(profile)),
            None => note_info("尚未建立定位檔案"),
        }
        return Ok(());
    }

    let mut profile = snapshot.profile.unwrap_or_default();
    apply_edits(&mut profile, edits);
    match client.save_profile(&profile).await {
        Ok(()) => {
            note_success("定位檔案已儲存");
            print!("{}", format_profile(&profile));
        }
        Err(e) => note_error(&format!("儲存失敗：{}", e.display_text())),
    }
    Ok(())
}

pub async fn notes(ctx: &CliContext, agent: AgentKind) -> Result<()> {
    match ctx.agents().notes(agent).await {
        Ok(notes) => println!("{}", format_notes(agent, &notes)),
        Err(e) => note_error(&error_line(&e)),
    }
    Ok(())
}

fn parse_edits(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| {
            let Some((field, value)) = pair.split_once('=') else {
                bail!("Expected FIELD=VALUE, got '{pair}'");
            };
            let field = field.trim();
            if !UserProfile::NAMED_FIELDS.iter().any(|(name, _)| *name == field) {
                let known: Vec<&str> = UserProfile::NAMED_FIELDS.iter().map(|(name, _)| *name).collect();
                bail!("Unknown profile field '{field}' (expected one of: {})", known.join(", "));
            }
            Ok((field.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn apply_edits(profile: &mut UserProfile, edits: Vec<(String, String)>) {
    for (field, value) in edits {
        if value.is_empty() {
            profile.fields.remove(&field);
        } else {
            profile.fields.insert(field, Value::String(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_fields() {
        let edits = parse_edits(&["brand_voice = 活潑親切".to_string()]).unwrap();
        assert_eq!(edits, vec![("brand_voice".to_string(), "活潑親切".to_string())]);
    }

    #[test]
    fn rejects_unknown_field_and_missing_equals() {
        assert!(parse_edits(&["nickname=x".to_string()]).is_err());
        assert!(parse_edits(&["brand_voice".to_string()]).is_err());
    }

    #[test]
    fn empty_value_clears_field() {
        let mut profile = UserProfile::default();
        apply_edits(&mut profile, vec![("brand_voice".to_string(), "活潑".to_string())]);
        assert_eq!(profile.get("brand_voice").as_deref(), Some("活潑"));
        apply_edits(&mut profile, vec![("brand_voice".to_string(), String::new())]);
        assert_eq!(profile.get("brand_voice"), None);
    }
}
