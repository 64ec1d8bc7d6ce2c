//! Points balance badge.

use serde::{Deserialize, Serialize};

use reelforge_core::WalletInfo;

pub const LOW_BALANCE_THRESHOLD: i64 = 50;
pub const WARNING_BALANCE_THRESHOLD: i64 = 100;

/// Color band for the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeBand {
    Low,
    Warning,
    Normal,
}

impl BadgeBand {
    pub fn for_balance(balance: i64, thresholds: Thresholds) -> Self {
        if balance < thresholds.low {
            BadgeBand::Low
        } else if balance < thresholds.warning {
            BadgeBand::Warning
        } else {
            BadgeBand::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub low: i64,
    pub warning: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { low: LOW_BALANCE_THRESHOLD, warning: WARNING_BALANCE_THRESHOLD }
    }
}

/// Rendered badge content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeView {
    pub balance_text: String,
    pub expiring_text: Option<String>,
    pub band: BadgeBand,
}

/// Badge state: the last wallet snapshot plus user visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    wallet: Option<WalletInfo>,
    visible: bool,
    thresholds: Thresholds,
}

impl Default for Badge {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Badge {
    pub fn new(visible: bool) -> Self {
        Self { wallet: None, visible, thresholds: Thresholds::default() }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Replace the snapshot after a successful wallet fetch.
    pub fn update(&mut self, wallet: WalletInfo) {
        self.wallet = Some(wallet);
    }

    /// A failed wallet fetch hides the badge until the next success.
    pub fn load_failed(&mut self) {
        self.wallet = None;
    }

    pub fn wallet(&self) -> Option<WalletInfo> {
        self.wallet
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// What to draw, or `None` when the badge is hidden.
    pub fn view(&self) -> Option<BadgeView> {
        if !self.visible {
            return None;
        }
        let wallet = self.wallet?;
        Some(BadgeView {
            balance_text: format!("{} 點", wallet.balance),
            expiring_text: (wallet.expiring_soon > 0)
                .then(|| format!("{} 點即將到期", wallet.expiring_soon)),
            band: BadgeBand::for_balance(wallet.balance, self.thresholds),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_switch_at_thresholds() {
        let t = Thresholds::default();
        assert_eq!(BadgeBand::for_balance(49, t), BadgeBand::Low);
        assert_eq!(BadgeBand::for_balance(50, t), BadgeBand::Warning);
        assert_eq!(BadgeBand::for_balance(99, t), BadgeBand::Warning);
        assert_eq!(BadgeBand::for_balance(100, t), BadgeBand::Normal);
    }

    #[test]
    fn view_texts() {
        let mut badge = Badge::default();
        assert!(badge.view().is_none());

        badge.update(WalletInfo { balance: 120, expiring_soon: 0 });
        let view = badge.view().unwrap();
        assert_eq!(view.balance_text, "120 點");
        assert_eq!(view.expiring_text, None);

        badge.update(WalletInfo { balance: 30, expiring_soon: 20 });
        let view = badge.view().unwrap();
        assert_eq!(view.expiring_text.as_deref(), Some("20 點即將到期"));
        assert_eq!(view.band, BadgeBand::Low);
    }

    #[test]
    fn hidden_when_toggled_or_failed() {
        let mut badge = Badge::default();
        badge.update(WalletInfo { balance: 10, expiring_soon: 0 });
        assert!(!badge.toggle());
        assert!(badge.view().is_none());
        badge.toggle();
        badge.load_failed();
        assert!(badge.view().is_none());
    }
}
