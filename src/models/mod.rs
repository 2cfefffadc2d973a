pub mod session;

pub use session::{ChatMessage, ConversationState, Stage};
