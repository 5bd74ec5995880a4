//! Domain entities

pub mod conversation;
pub mod message;
pub mod model;
pub mod turn;

pub use conversation::{Conversation, NewConversation};
pub use message::Message;
pub use model::{ModelConfig, SamplingParams, ShortcutConfig};
pub use turn::{truncate_oldest, Turn};

use uuid::Uuid;

pub type ConversationId = Uuid;
pub type MessageId = Uuid;
pub type ModelId = i64;

pub fn new_id() -> Uuid {
    Uuid::new_v4()
}
