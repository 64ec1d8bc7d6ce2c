//! Route detected commands to their handlers.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use reelforge_core::{Page, ScriptMode};

use crate::types::{CommandInvocation, CommandResponse};

/// What a handler can see of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandContext {
    pub page: Page,
    pub script_mode: ScriptMode,
    pub segment_count: usize,
}

pub trait CommandHandler: Send + Sync {
    fn handle(&self, ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse>;
}

pub struct CommandDispatcher {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    pub fn register(&mut self, key: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(key.into(), handler);
    }

    pub fn has_handler(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn dispatch(&self, ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        match self.handlers.get(&inv.key) {
            Some(handler) => {
                info!(command = %inv.key, page = %ctx.page, "Dispatching command");
                handler.handle(ctx, inv)
            }
            None => {
                debug!(command = %inv.key, "No handler registered");
                Ok(CommandResponse::notice(format!("❓ 指令 {} 尚未支援", inv.raw_alias)))
            }
        }
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
