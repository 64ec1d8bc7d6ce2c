pub mod action;
pub mod cleanup;
pub mod error;
pub mod page;
pub mod segment;
pub mod types;

pub use action::{module_label, ActionDescriptor, BillableModule};
pub use error::ReelError;
pub use page::{Page, ScriptMode};
pub use segment::{ScriptSegment, SegmentCard, SegmentList};
pub use types::{
    AgentKind, ChatLog, ChatMessage, Note, Plan, PointPack, Role, UserProfile, WalletInfo,
};
