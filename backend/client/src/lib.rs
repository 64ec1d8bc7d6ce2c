//! HTTP client for the ReelForge content-creation backend.
//!
//! - `ApiClient`: reqwest implementation of every endpoint
//! - `stream`: incremental reader for `data: {json}` line frames
//! - `agents`: positioning / topics / script chat clients
//! - `AgentBackend` / `PointsBackend`: the seams the UI and points layer talk to

pub mod agents;
pub mod api;
pub mod stream;
pub mod traits;
pub mod wire;

pub use agents::{AgentClient, PositioningReply, ProfileSnapshot, ScriptOptions, ScriptReply};
pub use api::ApiClient;
pub use stream::{parse_frame, read_frames, FrameDecoder};
pub use traits::{AgentBackend, DeltaSink, PointsBackend};
