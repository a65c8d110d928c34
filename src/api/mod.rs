pub mod client;
pub mod proxy_client;
pub mod request;
pub mod response;
pub mod streaming;

pub use client::ScoutClient;
pub use proxy_client::ProxyClient;
pub use request::{outbound_body, ChatRequest};
pub use response::{normalize_response, AssistantReply, FailureKind, Outcome, ScoutReply};
pub use streaming::{fold_event_stream, DeltaAccumulator, OnUpdate};
