use serde::Deserialize;

use crate::error::EditorError;

/// Inbound frame: `{AI?: string, relaciones?: string[], nodos?: string[]}`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct StreamEvent {
	/// Assistant chat text.
	#[serde(rename = "AI", default)]
	pub ai: Option<String>,
	/// Relationship type names whose incident nodes should light up.
	#[serde(default)]
	pub relaciones: Option<Vec<String>>,
	/// Node display names to light up.
	#[serde(default)]
	pub nodos: Option<Vec<String>>,
}

impl StreamEvent {
	pub fn parse(text: &str) -> Result<Self, EditorError> {
		Ok(serde_json::from_str(text)?)
	}

	/// A present list, even an empty one, opens a highlight round.
	pub fn requests_highlight(&self) -> bool {
		self.relaciones.is_some() || self.nodos.is_some()
	}

	/// Non-empty assistant text, if any.
	pub fn assistant_text(&self) -> Option<&str> {
		self.ai.as_deref().filter(|s| !s.is_empty())
	}
}
