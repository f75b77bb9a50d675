//! Chat transcript and the submit rule that ties it to highlight rounds.

use crate::highlight::HighlightSynchronizer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
	User,
	Assistant,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
	pub sender: Sender,
	pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatLog {
	messages: Vec<ChatMessage>,
}

impl ChatLog {
	pub fn messages(&self) -> &[ChatMessage] {
		&self.messages
	}

	pub fn push_assistant(&mut self, content: &str) {
		self.messages.push(ChatMessage {
			sender: Sender::Assistant,
			content: content.to_string(),
		});
	}

	/// Records a user message and returns the frame to send.
	///
	/// Blank input is rejected. Any accepted submission starts a fresh
	/// conversation turn, so the highlight set and round counter are reset.
	pub fn submit(&mut self, text: &str, highlight: &mut HighlightSynchronizer) -> Option<String> {
		if text.trim().is_empty() {
			return None;
		}
		self.messages.push(ChatMessage {
			sender: Sender::User,
			content: text.to_string(),
		});
		highlight.reset();
		Some(text.to_string())
	}
}
