//! Canned-answer coding assistant: an ordered keyword rule table with a
//! fallback, plus a transcript whose replies arrive after a fixed delay.
//! （以關鍵字規則表回覆的程式助手，回覆會在固定延遲後送達。）

pub mod conversation;
pub mod rules;

pub use conversation::{Conversation, Message, Speaker};
pub use rules::{Assistant, AssistantError, AssistantTable, Matcher, Rule};
