mod scout;
mod session;

pub use scout::ScoutResult;
pub use session::{ChatMessage, ChatSession, Role};
