//! Slash-command detection in the input line.

use reelforge_core::Page;

use crate::registry::CommandRegistry;
use crate::types::{CommandArg, CommandInvocation};

/// Parse `text` as a slash command available on `page`. Plain chat input
/// and unknown aliases yield `None`.
pub fn detect_command(
    text: &str,
    registry: &CommandRegistry,
    page: Page,
) -> Option<CommandInvocation> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (alias_part, rest) = trimmed
        .split_once(char::is_whitespace)
        .map(|(a, r)| (a, r.trim()))
        .unwrap_or((trimmed, ""));

    let def = registry.find_by_alias(alias_part, page)?;
    let args = parse_args(rest, &def.args);

    Some(CommandInvocation {
        key: def.key.clone(),
        raw_alias: alias_part.to_string(),
        args,
        raw_args: rest.to_string(),
    })
}

fn parse_args(text: &str, arg_defs: &[CommandArg]) -> Vec<String> {
    if text.is_empty() || arg_defs.is_empty() {
        return vec![];
    }

    let mut result = Vec::new();
    let mut remaining = text.trim();

    for (i, def) in arg_defs.iter().enumerate() {
        if remaining.is_empty() {
            break;
        }
        if def.capture_remaining || i == arg_defs.len() - 1 {
            result.push(remaining.to_string());
            break;
        }
        let (token, rest) = remaining
            .split_once(char::is_whitespace)
            .map(|(t, r)| (t, r.trim()))
            .unwrap_or((remaining, ""));
        result.push(token.to_string());
        remaining = rest;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        let registry = CommandRegistry::new();
        assert!(detect_command("幫我寫一支開箱影片", &registry, Page::Script).is_none());
        assert!(detect_command("/nope", &registry, Page::Script).is_none());
    }

    #[test]
    fn last_arg_captures_rest() {
        let registry = CommandRegistry::new();
        let inv = detect_command("/tweak 2 dialog 今天 來聊聊 咖啡", &registry, Page::Script).unwrap();
        assert_eq!(inv.key, "segment-tweak");
        assert_eq!(inv.args, vec!["2", "dialog", "今天 來聊聊 咖啡"]);

        let inv = detect_command("  /gen 手沖咖啡教學  ", &registry, Page::Topics).unwrap();
        assert_eq!(inv.key, "oneclick-topics");
        assert_eq!(inv.raw_args, "手沖咖啡教學");
    }
}
