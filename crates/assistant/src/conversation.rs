use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::rules::Assistant;

/// Default delay before a reply is appended.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub speaker: Speaker,
    pub text: String,
}

impl Message {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// Transcript of queries and delayed replies.
/// （查詢與延遲回覆的對話紀錄。）
///
/// Each reply is computed when the query is sent and delivered from a detached
/// thread once the delay elapses. Replies are not cancelled and may arrive out
/// of send order.
#[derive(Debug)]
pub struct Conversation {
    assistant: Assistant,
    delay: Duration,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    transcript: Vec<Message>,
    pending: usize,
}

impl Conversation {
    pub fn new(assistant: Assistant, delay: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            assistant,
            delay,
            tx,
            rx,
            transcript: Vec::new(),
            pending: 0,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Replies scheduled but not yet appended.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Records `query` and schedules the reply. Blank queries are ignored.
    pub fn send(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        self.transcript.push(Message::new(Speaker::User, query));

        let reply = Message::new(Speaker::Assistant, self.assistant.respond(query));
        let tx = self.tx.clone();
        let delay = self.delay;
        thread::spawn(move || {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            // receiver gone means the conversation was dropped
            let _ = tx.send(reply);
        });
        self.pending += 1;
        debug!(pending = self.pending, "assistant reply scheduled");
        true
    }

    /// Appends every reply that has already arrived. Returns how many were appended.
    pub fn drain(&mut self) -> usize {
        let mut received = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.accept(message);
            received += 1;
        }
        received
    }

    /// Blocks up to `timeout` for the next reply.
    pub fn wait_reply(&mut self, timeout: Duration) -> Option<&Message> {
        if self.pending == 0 {
            return None;
        }
        let message = self.rx.recv_timeout(timeout).ok()?;
        self.accept(message);
        self.transcript.last()
    }

    fn accept(&mut self, message: Message) {
        self.pending = self.pending.saturating_sub(1);
        self.transcript.push(message);
    }
}
