use reelforge_client::wire::AuthorizeResponse;

/// Denial reason that asks for a subscription upgrade.
pub const UPGRADE_REQUIRED: &str = "UPGRADE_REQUIRED";

/// Outcome of `POST /points/authorize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Authorized,
    /// Not enough points; the backend suggests packs to buy.
    NeedsTopup { suggest_pack_ids: Vec<u32> },
    NeedsUpgrade,
    Denied { reason: String },
}

impl From<AuthorizeResponse> for AuthDecision {
    fn from(resp: AuthorizeResponse) -> Self {
        if resp.authorized {
            AuthDecision::Authorized
        } else if resp.need_topup {
            AuthDecision::NeedsTopup { suggest_pack_ids: resp.suggest_pack_ids }
        } else if resp.reason.as_deref() == Some(UPGRADE_REQUIRED) {
            AuthDecision::NeedsUpgrade
        } else {
            AuthDecision::Denied { reason: resp.reason.unwrap_or_default() }
        }
    }
}
