//! Built-in control registry, constructed once at startup.

use tracing::warn;

use reelforge_core::action::DEFAULT_MODE;
use reelforge_core::{ActionDescriptor, BillableModule, Page};
use reelforge_points::Control;

use crate::types::{ArgType, CommandArg, CommandCategory, CommandDef};

fn arg(
    name: &str,
    description: &str,
    ty: ArgType,
    required: bool,
    choices: &[&str],
    capture: bool,
) -> CommandArg {
    CommandArg {
        name: name.to_string(),
        description: description.to_string(),
        arg_type: ty,
        required,
        capture_remaining: capture,
        choices: choices.iter().map(|s| s.to_string()).collect(),
    }
}

fn number_arg(name: &str, description: &str, required: bool) -> CommandArg {
    arg(name, description, ArgType::Number, required, &[], false)
}

fn choice_arg(name: &str, description: &str, choices: &[&str]) -> CommandArg {
    arg(name, description, ArgType::String, true, choices, false)
}

fn remaining_arg(name: &str, description: &str) -> CommandArg {
    arg(name, description, ArgType::String, false, &[], true)
}

struct Def {
    key: &'static str,
    label: &'static str,
    description: &'static str,
    category: CommandCategory,
    aliases: &'static [&'static str],
    args: Vec<CommandArg>,
    pages: &'static [Page],
    descriptor: Option<ActionDescriptor>,
}

impl From<Def> for CommandDef {
    fn from(d: Def) -> Self {
        CommandDef {
            key: d.key.to_string(),
            label: d.label.to_string(),
            description: d.description.to_string(),
            category: d.category,
            text_aliases: d.aliases.iter().map(|a| a.to_string()).collect(),
            accepts_args: !d.args.is_empty(),
            args: d.args,
            pages: d.pages.to_vec(),
            descriptor: d.descriptor,
        }
    }
}

const AGENT_PAGES: &[Page] = &[Page::Positioning, Page::Topics, Page::Script];

fn oneclick(module: BillableModule) -> Option<ActionDescriptor> {
    Some(ActionDescriptor::new(module, DEFAULT_MODE, 1))
}

/// Every control the client offers.
pub fn builtin_commands() -> Vec<CommandDef> {
    let defs = vec![
        Def {
            key: "help",
            label: "說明",
            description: "列出可用指令",
            category: CommandCategory::App,
            aliases: &["/help", "/?"],
            args: vec![],
            pages: &[],
            descriptor: None,
        },
        Def {
            key: "page",
            label: "切換頁面",
            description: "切換到指定頁面",
            category: CommandCategory::Navigation,
            aliases: &["/page", "/go"],
            args: vec![choice_arg(
                "page",
                "home, positioning, topics, script, copy, guide",
                &["home", "positioning", "topics", "script", "copy", "guide"],
            )],
            pages: &[],
            descriptor: None,
        },
        // Billable one-click generation, one per agent page.
        Def {
            key: "oneclick-positioning",
            label: "一鍵生成定位",
            description: "依主題一鍵生成定位檔案",
            category: CommandCategory::Generation,
            aliases: &["/gen", "/oneclick"],
            args: vec![remaining_arg("theme", "主題或業務類型")],
            pages: &[Page::Positioning],
            descriptor: oneclick(BillableModule::Positioning),
        },
        Def {
            key: "oneclick-topics",
            label: "快速生成選題",
            description: "依主題一鍵生成選題建議",
            category: CommandCategory::Generation,
            aliases: &["/gen", "/oneclick"],
            args: vec![remaining_arg("theme", "主題")],
            pages: &[Page::Topics],
            descriptor: oneclick(BillableModule::Ideation),
        },
        Def {
            key: "oneclick-script",
            label: "一鍵生成腳本",
            description: "依主題與目前模板、時長一鍵生成腳本",
            category: CommandCategory::Generation,
            aliases: &["/gen", "/oneclick"],
            args: vec![remaining_arg("theme", "主題")],
            pages: &[Page::Script],
            descriptor: oneclick(BillableModule::Script),
        },
        Def {
            key: "save-profile",
            label: "儲存定位檔案",
            description: "將目前的定位檔案存回後端",
            category: CommandCategory::Generation,
            aliases: &["/save"],
            args: vec![],
            pages: &[Page::Positioning],
            descriptor: None,
        },
        Def {
            key: "topic-preset",
            label: "選題類型",
            description: "以選題類型預填輸入框",
            category: CommandCategory::Generation,
            aliases: &["/preset", "/type"],
            args: vec![choice_arg(
                "type",
                "trending, educational, personal, product",
                &["trending", "educational", "personal", "product"],
            )],
            pages: &[Page::Topics],
            descriptor: None,
        },
        Def {
            key: "script-mode",
            label: "腳本模式",
            description: "切換引導模式 / 自由模式",
            category: CommandCategory::Script,
            aliases: &["/mode"],
            args: vec![choice_arg("mode", "guide 或 free", &["guide", "free"])],
            pages: &[Page::Script],
            descriptor: None,
        },
        Def {
            key: "script-template",
            label: "腳本模板",
            description: "設定腳本結構 A–F",
            category: CommandCategory::Script,
            aliases: &["/template", "/tpl"],
            args: vec![choice_arg("template", "A, B, C, D, E, F", &["A", "B", "C", "D", "E", "F"])],
            pages: &[Page::Script],
            descriptor: None,
        },
        Def {
            key: "script-duration",
            label: "腳本時長",
            description: "設定腳本秒數",
            category: CommandCategory::Script,
            aliases: &["/duration", "/len"],
            args: vec![number_arg("seconds", "秒數", true)],
            pages: &[Page::Script],
            descriptor: None,
        },
        Def {
            key: "script-apply",
            label: "套用設定",
            description: "套用目前的模板與時長",
            category: CommandCategory::Script,
            aliases: &["/apply"],
            args: vec![],
            pages: &[Page::Script],
            descriptor: None,
        },
        Def {
            key: "quick-question",
            label: "快速提問",
            description: "自由模式下以快速提問預填輸入框",
            category: CommandCategory::Script,
            aliases: &["/q", "/ask"],
            args: vec![number_arg("n", "1–4", true)],
            pages: &[Page::Script],
            descriptor: None,
        },
        Def {
            key: "segment-delete",
            label: "刪除片段",
            description: "刪除第 n 個片段",
            category: CommandCategory::Segments,
            aliases: &["/del", "/rm"],
            args: vec![number_arg("n", "片段編號（從 1 開始）", true)],
            pages: &[Page::Script],
            descriptor: None,
        },
        Def {
            key: "segment-tweak",
            label: "微調片段",
            description: "替換片段的台詞、畫面或 CTA",
            category: CommandCategory::Segments,
            aliases: &["/tweak"],
            args: vec![
                number_arg("n", "片段編號（從 1 開始）", true),
                choice_arg("field", "dialog, visual, cta", &["dialog", "visual", "cta"]),
                remaining_arg("text", "新內容"),
            ],
            pages: &[Page::Script],
            descriptor: None,
        },
        Def {
            key: "segment-copy",
            label: "複製片段",
            description: "複製第 n 個片段",
            category: CommandCategory::Segments,
            aliases: &["/copy"],
            args: vec![number_arg("n", "片段編號（從 1 開始）", true)],
            pages: &[Page::Script],
            descriptor: None,
        },
        Def {
            key: "segment-copy-all",
            label: "全部複製",
            description: "複製所有片段",
            category: CommandCategory::Segments,
            aliases: &["/copyall"],
            args: vec![],
            pages: &[Page::Script],
            descriptor: None,
        },
        Def {
            key: "copy-reply",
            label: "複製回覆",
            description: "複製最後一則 AI 回覆",
            category: CommandCategory::App,
            aliases: &["/yank"],
            args: vec![],
            pages: AGENT_PAGES,
            descriptor: None,
        },
        Def {
            key: "clear",
            label: "清除對話",
            description: "清除目前頁面的對話紀錄",
            category: CommandCategory::App,
            aliases: &["/clear"],
            args: vec![],
            pages: AGENT_PAGES,
            descriptor: None,
        },
        Def {
            key: "notes",
            label: "重新整理筆記",
            description: "重新載入筆記或定位檔案",
            category: CommandCategory::App,
            aliases: &["/notes", "/refresh"],
            args: vec![],
            pages: AGENT_PAGES,
            descriptor: None,
        },
        Def {
            key: "wallet",
            label: "點數餘額",
            description: "重新載入點數餘額",
            category: CommandCategory::Points,
            aliases: &["/wallet", "/points"],
            args: vec![],
            pages: &[],
            descriptor: None,
        },
        Def {
            key: "badge",
            label: "顯示/隱藏點數",
            description: "切換點數徽章顯示",
            category: CommandCategory::Points,
            aliases: &["/badge"],
            args: vec![],
            pages: &[],
            descriptor: None,
        },
        Def {
            key: "buy",
            label: "購買點數",
            description: "開啟點數包購買視窗",
            category: CommandCategory::Points,
            aliases: &["/buy", "/topup"],
            args: vec![number_arg("pack_id", "預選的點數包", false)],
            pages: &[],
            descriptor: None,
        },
        Def {
            key: "upgrade",
            label: "升級方案",
            description: "開啟訂閱方案視窗",
            category: CommandCategory::Points,
            aliases: &["/upgrade", "/plans"],
            args: vec![],
            pages: &[],
            descriptor: None,
        },
        Def {
            key: "quit",
            label: "離開",
            description: "離開程式",
            category: CommandCategory::App,
            aliases: &["/quit", "/exit", "/q!"],
            args: vec![],
            pages: &[],
            descriptor: None,
        },
    ];
    defs.into_iter().map(CommandDef::from).collect()
}

/// Trigger id → command definition.
pub struct CommandRegistry {
    commands: Vec<CommandDef>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: builtin_commands() }
    }

    /// Register an additional command. A duplicate key replaces the old entry.
    pub fn register(&mut self, def: CommandDef) {
        if let Some(existing) = self.commands.iter_mut().find(|c| c.key == def.key) {
            warn!(key = %def.key, "Replacing registered command");
            *existing = def;
        } else {
            self.commands.push(def);
        }
    }

    pub fn all(&self) -> &[CommandDef] {
        &self.commands
    }

    /// Commands offered on `page`.
    pub fn for_page(&self, page: Page) -> impl Iterator<Item = &CommandDef> {
        self.commands.iter().filter(move |c| c.available_on(page))
    }

    /// Find the command bound to `alias` on `page`.
    pub fn find_by_alias(&self, alias: &str, page: Page) -> Option<&CommandDef> {
        let lower = alias.to_lowercase();
        self.commands.iter().find(|c| {
            c.available_on(page) && c.text_aliases.iter().any(|a| a.to_lowercase() == lower)
        })
    }

    pub fn find_by_key(&self, key: &str) -> Option<&CommandDef> {
        self.commands.iter().find(|c| c.key == key)
    }

    /// The control the points bus inspects for `key`.
    pub fn control(&self, key: &str) -> Option<Control> {
        let def = self.find_by_key(key)?;
        let mut control = Control::button(def.key.clone(), def.label.clone());
        if let Some(descriptor) = &def.descriptor {
            control = control.with_descriptor(descriptor.to_string());
        }
        Some(control)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        let registry = CommandRegistry::new();
        let mut keys: Vec<_> = registry.all().iter().map(|c| c.key.as_str()).collect();
        keys.sort_unstable();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn aliases_resolve_per_page() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.find_by_alias("/gen", Page::Script).unwrap().key, "oneclick-script");
        assert_eq!(
            registry.find_by_alias("/GEN", Page::Positioning).unwrap().key,
            "oneclick-positioning"
        );
        assert!(registry.find_by_alias("/gen", Page::Home).is_none());
        assert!(registry.find_by_alias("/wallet", Page::Guide).is_some());
    }

    #[test]
    fn billable_controls_carry_descriptors() {
        let registry = CommandRegistry::new();
        let control = registry.control("oneclick-script").unwrap();
        assert_eq!(control.descriptor.as_deref(), Some("script:oneclick:1"));
        let info = reelforge_points::detect(&control, Some("script")).unwrap();
        assert_eq!(info.module, "腳本");
        assert_eq!(info.trigger_id, "oneclick-script");

        let clear = registry.control("clear").unwrap();
        assert!(reelforge_points::detect(&clear, Some("script")).is_none());
    }
}
