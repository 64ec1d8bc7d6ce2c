//! Purchase modal state: point packs and subscription plans.
//!
//! The modal is pure state plus two async helpers (`load_catalog`, `purchase`) so
//! the TUI reducer can drive it through effects while the CLI calls the
//! helpers directly.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use reelforge_client::PointsBackend;
use reelforge_core::{Plan, PointPack, ReelError};

use crate::bus::BUSY_LABEL;
use crate::detection::ActionInfo;

pub const PURCHASE_SUCCESS: &str = "購買成功！點數已到帳";
pub const SUBSCRIBE_UNAVAILABLE: &str = "訂閱功能暫未開放，請聯繫客服";
pub const PACKS_LOAD_FAILED: &str = "載入點數包失敗";
pub const PLANS_LOAD_FAILED: &str = "載入訂閱方案失敗";

const BUY_NOW: &str = "立即購買";
const RECOMMENDED_PACK: &str = "標準包";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalTab {
    #[default]
    Packs,
    Plans,
}

impl ModalTab {
    fn placeholder(self) -> &'static str {
        match self {
            ModalTab::Packs => "請選擇點數包",
            ModalTab::Plans => "請選擇方案",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ModalTab::Packs => "點數包",
            ModalTab::Plans => "訂閱方案",
        }
    }
}

/// The purchase button as drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseButton {
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackCard {
    pub pack_id: u32,
    pub name: String,
    pub points_text: String,
    pub price_text: String,
    pub validity_text: String,
    pub description: &'static str,
    pub recommended: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCard {
    pub plan_id: u32,
    pub name: String,
    pub description: &'static str,
    pub price_text: String,
    pub features: Vec<String>,
    pub selected: bool,
}

pub fn pack_description(name: &str) -> &'static str {
    match name {
        "小額包" => "適合輕度使用者，每日少量創作",
        "標準包" => "適合一般創作者，平衡價格與點數",
        "大額包" => "適合重度使用者，大量創作需求",
        _ => "高品質點數包",
    }
}

pub fn plan_description(name: &str) -> &'static str {
    match name {
        "基礎方案" => "適合個人創作者",
        "專業方案" => "適合小型團隊",
        "企業方案" => "適合大型企業",
        _ => "專業訂閱方案",
    }
}

/// Monthly display price in NTD.
pub fn plan_price(name: &str) -> u32 {
    match name {
        "基礎方案" => 299,
        "專業方案" => 999,
        "企業方案" => 2999,
        _ => 999,
    }
}

/// Checkout failure text for the toast.
pub fn purchase_error_text(err: &ReelError) -> String {
    match err {
        ReelError::Backend(detail) => format!("購買失敗：{detail}"),
        ReelError::Network(_) => "購買失敗，請稍後再試".to_string(),
        _ => "購買失敗：未知錯誤".to_string(),
    }
}

/// External subscription flow for a plan id.
pub type SubscribeHandler = Arc<dyn Fn(u32) + Send + Sync>;

/// Result of pressing the purchase button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Pack bought. The caller refreshes the wallet and re-runs `retry`.
    Purchased { message: String, retry: Option<ActionInfo> },
    Failed { message: String },
    /// Plans tab: subscription is handled elsewhere; the modal just closed.
    Closed,
    /// Nothing selected.
    Ignored,
}

#[derive(Default)]
pub struct PurchaseModal {
    visible: bool,
    tab: ModalTab,
    packs: Vec<PointPack>,
    plans: Vec<Plan>,
    selected_pack: Option<u32>,
    selected_plan: Option<u32>,
    purchasing: bool,
    retry: Option<ActionInfo>,
    subscribe: Option<SubscribeHandler>,
}

impl fmt::Debug for PurchaseModal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurchaseModal")
            .field("visible", &self.visible)
            .field("tab", &self.tab)
            .field("packs", &self.packs.len())
            .field("plans", &self.plans.len())
            .field("selected_pack", &self.selected_pack)
            .field("purchasing", &self.purchasing)
            .finish()
    }
}

impl PurchaseModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribe_handler(mut self, handler: SubscribeHandler) -> Self {
        self.subscribe = Some(handler);
        self
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn tab(&self) -> ModalTab {
        self.tab
    }

    pub fn selected_pack(&self) -> Option<u32> {
        self.selected_pack
    }

    pub fn selected_plan(&self) -> Option<u32> {
        self.selected_plan
    }

    pub fn retry_action(&self) -> Option<&ActionInfo> {
        self.retry.as_ref()
    }

    /// Open for a top-up, preselecting the first suggested pack.
    pub fn show(&mut self, suggest_pack_ids: &[u32], retry: Option<ActionInfo>) {
        self.retry = retry;
        if let Some(first) = suggest_pack_ids.first() {
            self.switch_tab(ModalTab::Packs);
            self.select_pack(*first);
        }
        self.visible = true;
    }

    /// Open on the plans tab.
    pub fn show_upgrade(&mut self, retry: Option<ActionInfo>) {
        self.retry = retry;
        self.switch_tab(ModalTab::Plans);
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.retry = None;
    }

    /// Switching tabs clears the selection state of the button.
    pub fn switch_tab(&mut self, tab: ModalTab) {
        self.tab = tab;
        self.selected_pack = None;
        self.selected_plan = None;
    }

    pub fn next_tab(&mut self) {
        let next = match self.tab {
            ModalTab::Packs => ModalTab::Plans,
            ModalTab::Plans => ModalTab::Packs,
        };
        self.switch_tab(next);
    }

    /// Select a pack. Ids not in the loaded catalog are ignored; before the
    /// catalog arrives the id is kept as-is.
    pub fn select_pack(&mut self, pack_id: u32) -> bool {
        if !self.packs.is_empty() && !self.packs.iter().any(|p| p.pack_id == pack_id) {
            warn!(pack_id, "Unknown pack id");
            return false;
        }
        self.selected_pack = Some(pack_id);
        true
    }

    pub fn select_plan(&mut self, plan_id: u32) -> bool {
        if !self.plans.iter().any(|p| p.plan_id == plan_id) {
            return false;
        }
        self.selected_plan = Some(plan_id);
        true
    }

    /// Move the selection on the current tab by `delta` rows.
    pub fn move_selection(&mut self, delta: isize) {
        match self.tab {
            ModalTab::Packs => {
                let ids: Vec<u32> = self.packs.iter().map(|p| p.pack_id).collect();
                if let Some(id) = step(&ids, self.selected_pack, delta) {
                    self.selected_pack = Some(id);
                }
            }
            ModalTab::Plans => {
                let ids: Vec<u32> = self.plans.iter().map(|p| p.plan_id).collect();
                if let Some(id) = step(&ids, self.selected_plan, delta) {
                    self.selected_plan = Some(id);
                }
            }
        }
    }

    pub fn button(&self) -> PurchaseButton {
        if self.purchasing {
            return PurchaseButton { label: BUSY_LABEL.to_string(), enabled: false };
        }
        let selected = match self.tab {
            ModalTab::Packs => self.selected_pack.is_some(),
            ModalTab::Plans => self.selected_plan.is_some(),
        };
        if selected {
            PurchaseButton { label: BUY_NOW.to_string(), enabled: true }
        } else {
            PurchaseButton { label: self.tab.placeholder().to_string(), enabled: false }
        }
    }

    /// Install freshly loaded catalogs.
    pub fn set_catalog(&mut self, packs: Vec<PointPack>, plans: Vec<Plan>) {
        self.packs = packs;
        self.plans = plans;
        if let Some(id) = self.selected_pack {
            if !self.packs.is_empty() && !self.packs.iter().any(|p| p.pack_id == id) {
                self.selected_pack = None;
            }
        }
    }

    pub fn pack_cards(&self) -> Vec<PackCard> {
        self.packs
            .iter()
            .map(|p| PackCard {
                pack_id: p.pack_id,
                name: p.name.clone(),
                points_text: format!("{} 點", p.points),
                price_text: format!("NT$ {}", p.price_ntd),
                validity_text: format!("有效期 {} 天", p.valid_days),
                description: pack_description(&p.name),
                recommended: p.name == RECOMMENDED_PACK,
                selected: self.selected_pack == Some(p.pack_id),
            })
            .collect()
    }

    pub fn plan_cards(&self) -> Vec<PlanCard> {
        self.plans
            .iter()
            .map(|p| PlanCard {
                plan_id: p.plan_id,
                name: p.name.clone(),
                description: plan_description(&p.name),
                price_text: format!("NT$ {}", plan_price(&p.name)),
                features: vec![
                    format!("每月 {} 點數", p.monthly_points),
                    format!("批次上限 {} 次", p.batch_limit),
                    format!("角色上限 {} 個", p.roles_limit),
                ],
                selected: self.selected_plan == Some(p.plan_id),
            })
            .collect()
    }

    /// Hand a plan to the external subscription flow. Returns a toast when
    /// none is installed.
    pub fn open_subscribe(&self, plan_id: u32) -> Option<&'static str> {
        match &self.subscribe {
            Some(handler) => {
                info!(plan_id, "Opening subscription");
                handler(plan_id);
                None
            }
            None => Some(SUBSCRIBE_UNAVAILABLE),
        }
    }

    /// Start a purchase. Returns the pack to check out; on the plans tab the
    /// modal closes instead.
    pub fn begin_purchase(&mut self) -> Result<u32, PurchaseOutcome> {
        if self.tab == ModalTab::Plans {
            self.hide();
            return Err(PurchaseOutcome::Closed);
        }
        match self.selected_pack {
            Some(id) if !self.purchasing => {
                self.purchasing = true;
                Ok(id)
            }
            _ => Err(PurchaseOutcome::Ignored),
        }
    }

    /// Settle a checkout started with [`begin_purchase`](Self::begin_purchase).
    pub fn finish_purchase(&mut self, result: Result<(), ReelError>) -> PurchaseOutcome {
        self.purchasing = false;
        match result {
            Ok(()) => {
                let retry = self.retry.take();
                self.hide();
                PurchaseOutcome::Purchased { message: PURCHASE_SUCCESS.to_string(), retry }
            }
            Err(e) => {
                error!(error = %e, "Checkout failed");
                PurchaseOutcome::Failed { message: purchase_error_text(&e) }
            }
        }
    }

    /// Check out the selected pack against `backend`.
    pub async fn purchase(&mut self, backend: &dyn PointsBackend) -> PurchaseOutcome {
        let pack_id = match self.begin_purchase() {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        info!(pack_id, "Checking out pack");
        let result = backend.checkout(pack_id).await.map(|_| ());
        self.finish_purchase(result)
    }
}

/// Fetch packs and plans concurrently. Each failure yields its own toast.
pub async fn load_catalog(
    backend: &dyn PointsBackend,
) -> (Vec<PointPack>, Vec<Plan>, Vec<&'static str>) {
    let (packs, plans) = tokio::join!(backend.packs(), backend.plans());
    let mut errors = Vec::new();
    let packs = packs.unwrap_or_else(|e| {
        error!(error = %e, "Loading packs failed");
        errors.push(PACKS_LOAD_FAILED);
        Vec::new()
    });
    let plans = plans.unwrap_or_else(|e| {
        error!(error = %e, "Loading plans failed");
        errors.push(PLANS_LOAD_FAILED);
        Vec::new()
    });
    (packs, plans, errors)
}

fn step(ids: &[u32], current: Option<u32>, delta: isize) -> Option<u32> {
    if ids.is_empty() {
        return None;
    }
    let pos = current.and_then(|c| ids.iter().position(|id| *id == c));
    let next = match pos {
        Some(p) => (p as isize + delta).rem_euclid(ids.len() as isize) as usize,
        None => 0,
    };
    ids.get(next).copied()
}
