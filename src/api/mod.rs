//! Collaborator REST API: wire payloads, the seams the core depends on, and
//! the `reqwest` client that implements them.

mod client;

use serde::Serialize;

use crate::components::graph_canvas::{NodeId, Properties};
use crate::error::EditorError;

pub use client::ApiClient;

/// Body of `POST /api/nodes` and `PUT /api/nodes/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodePayload {
	pub labels: Vec<String>,
	pub properties: Properties,
}

/// Body of `POST /api/relationships`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelationshipPayload {
	pub source: NodeId,
	pub target: NodeId,
	#[serde(rename = "type")]
	pub rel_type: String,
	#[serde(skip_serializing_if = "Properties::is_empty")]
	pub properties: Properties,
}

impl RelationshipPayload {
	/// Validated constructor; an empty type is a [`EditorError::Validation`].
	pub fn new(source: &str, target: &str, rel_type: &str) -> Result<Self, EditorError> {
		let rel_type = rel_type.trim();
		if rel_type.is_empty() {
			return Err(EditorError::Validation("relationship type is required".into()));
		}
		Ok(Self {
			source: source.into(),
			target: target.into(),
			rel_type: rel_type.into(),
			properties: Properties::new(),
		})
	}
}

/// Resolves a relationship type to the ids of nodes it touches.
#[allow(async_fn_in_trait)]
pub trait RelationLookup {
	async fn nodes_by_relation(&self, rel_type: &str) -> Result<Vec<NodeId>, EditorError>;
}

/// The create operations needed to paste a node.
#[allow(async_fn_in_trait)]
pub trait GraphWriter {
	async fn create_node(&self, node: &NodePayload) -> Result<NodeId, EditorError>;
	async fn create_relationship(&self, rel: &RelationshipPayload) -> Result<(), EditorError>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_canvas::Node;

	#[test]
	fn relationship_type_is_required() {
		assert!(matches!(
			RelationshipPayload::new("1", "2", "   "),
			Err(EditorError::Validation(_))
		));
		let rel = RelationshipPayload::new("1", "2", " KNOWS ").unwrap();
		assert_eq!(
			serde_json::to_value(&rel).unwrap(),
			serde_json::json!({"source": "1", "target": "2", "type": "KNOWS"})
		);
	}

	#[test]
	fn node_payload_keeps_integers_exact() {
		let node: Node = serde_json::from_str(
			r#"{"elementId": "4:a:1", "labels": ["Person"], "age": 31, "born": 1700000000123456789, "ratio": 0.5}"#,
		)
		.unwrap();
		let payload = NodePayload {
			labels: node.labels,
			properties: node.properties,
		};
		assert_eq!(
			serde_json::to_string(&payload).unwrap(),
			r#"{"labels":["Person"],"properties":{"age":31,"born":1700000000123456789,"ratio":0.5}}"#
		);
	}
}
