//! Command registry, slash-command detection and dispatch.

pub mod detection;
pub mod dispatch;
pub mod handlers;
pub mod registry;
pub mod types;

use std::sync::Arc;

pub use detection::detect_command;
pub use dispatch::{CommandContext, CommandDispatcher, CommandHandler};
pub use handlers::{
    BuyHandler, DurationHandler, GenerateHandler, HelpHandler, IntentHandler, PageHandler,
    QuickQuestionHandler, ScriptModeHandler, SegmentHandler, SegmentOp, TemplateHandler,
    TopicPresetHandler,
};
pub use registry::{builtin_commands, CommandRegistry};
pub use types::{
    ArgType, CommandArg, CommandCategory, CommandDef, CommandIntent, CommandInvocation,
    CommandResponse, SegmentField,
};

/// Build a dispatcher pre-wired with all built-in handlers.
pub fn build_default_dispatcher() -> CommandDispatcher {
    let mut dispatcher = CommandDispatcher::new();
    let intent = |intent: CommandIntent| Arc::new(IntentHandler { intent });

    dispatcher.register("help", Arc::new(HelpHandler { registry: CommandRegistry::new() }));
    dispatcher.register("page", Arc::new(PageHandler));
    for key in ["oneclick-positioning", "oneclick-topics", "oneclick-script"] {
        dispatcher.register(key, Arc::new(GenerateHandler));
    }
    dispatcher.register("save-profile", intent(CommandIntent::SaveProfile));
    dispatcher.register("topic-preset", Arc::new(TopicPresetHandler));
    dispatcher.register("script-mode", Arc::new(ScriptModeHandler));
    dispatcher.register("script-template", Arc::new(TemplateHandler));
    dispatcher.register("script-duration", Arc::new(DurationHandler));
    dispatcher.register("script-apply", intent(CommandIntent::ApplyScriptSettings));
    dispatcher.register("quick-question", Arc::new(QuickQuestionHandler));
    dispatcher.register("segment-delete", Arc::new(SegmentHandler { op: SegmentOp::Delete }));
    dispatcher.register("segment-tweak", Arc::new(SegmentHandler { op: SegmentOp::Tweak }));
    dispatcher.register("segment-copy", Arc::new(SegmentHandler { op: SegmentOp::Copy }));
    dispatcher.register("segment-copy-all", intent(CommandIntent::CopyAll));
    dispatcher.register("copy-reply", intent(CommandIntent::CopyLastReply));
    dispatcher.register("clear", intent(CommandIntent::ClearChat));
    dispatcher.register("notes", intent(CommandIntent::RefreshNotes));
    dispatcher.register("wallet", intent(CommandIntent::RefreshWallet));
    dispatcher.register("badge", intent(CommandIntent::ToggleBadge));
    dispatcher.register("buy", Arc::new(BuyHandler));
    dispatcher.register("upgrade", intent(CommandIntent::OpenPlans));
    dispatcher.register("quit", intent(CommandIntent::Quit));

    dispatcher
}
