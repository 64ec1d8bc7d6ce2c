//! Points layer: billable action detection, the authorize → execute →
//! consume bus, and the badge and purchase modal it drives.

pub mod audit;
pub mod badge;
pub mod bus;
pub mod decision;
pub mod detection;
pub mod modal;
pub mod settings;

pub use audit::{decision_label, log_outcome};
pub use badge::{Badge, BadgeBand, BadgeView, Thresholds};
pub use bus::{
    ActionCompletion, ActionPhase, BusEvent, BusOutcome, EventSink, PointsBus, BUSY_LABEL,
};
pub use decision::AuthDecision;
pub use detection::{detect, detect_submit, ActionInfo, Control, FormSubmission};
pub use modal::{load_catalog, ModalTab, PurchaseModal, PurchaseOutcome};
pub use settings::{PointsSettings, SETTINGS_KEY};
