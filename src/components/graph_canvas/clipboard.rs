//! Node copy/paste: keyboard shortcut mapping, what gets copied, and the
//! create-node-then-relink workflow run against the collaborator.

use log::warn;

use super::layout::unit_hash;
use super::types::{Link, Node, NodeId, Position, Properties, PropertyValue};
use crate::api::{GraphWriter, NodePayload, RelationshipPayload};
use crate::error::EditorError;

/// Numeric arrays longer than this are treated as vectors and not copied.
const MAX_COPIED_VECTOR_LEN: usize = 32;
const PASTE_OFFSET_MIN: f64 = 50.0;
const PASTE_OFFSET_JITTER: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
	Copy,
	Paste,
}

/// Maps a keydown to a clipboard shortcut. Suppressed while typing in a text field.
pub fn shortcut_for(key: &str, ctrl: bool, meta: bool, typing: bool) -> Option<Shortcut> {
	if typing || !(ctrl || meta) {
		return None;
	}
	match key {
		"c" | "C" => Some(Shortcut::Copy),
		"v" | "V" => Some(Shortcut::Paste),
		_ => None,
	}
}

fn is_bulky(key: &str, value: &PropertyValue) -> bool {
	key == "embedding"
		|| (matches!(value, PropertyValue::Array(items) if items.len() > MAX_COPIED_VECTOR_LEN)
			&& value.is_numeric_vector())
}

/// Shallow copy of a node's data, without position and bulky vector properties.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipboardNode {
	pub source_id: NodeId,
	pub labels: Vec<String>,
	pub properties: Properties,
}

impl ClipboardNode {
	pub fn copy_of(node: &Node) -> Self {
		Self {
			source_id: node.id.clone(),
			labels: node.labels.clone(),
			properties: node
				.properties
				.iter()
				.filter(|(k, v)| !is_bulky(k, v))
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect(),
		}
	}
}

/// Everything a paste needs, captured from canvas state at keypress time.
#[derive(Clone, Debug, PartialEq)]
pub struct PastePlan {
	pub clipboard: ClipboardNode,
	pub origin: Option<Position>,
	pub incident: Vec<Link>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PasteOutcome {
	pub node_id: NodeId,
	pub position: Option<Position>,
	pub relinked: usize,
	pub relink_failures: usize,
}

/// Visual offset of a pasted node from its original, 50..80 px on each axis.
pub fn paste_offset(new_id: &str) -> (f64, f64) {
	(
		PASTE_OFFSET_MIN + unit_hash(new_id, 11) * PASTE_OFFSET_JITTER,
		PASTE_OFFSET_MIN + unit_hash(new_id, 12) * PASTE_OFFSET_JITTER,
	)
}

/// Creates the copy, then re-creates every relationship of the original
/// pointing at the copy in the same direction. Node creation failure aborts;
/// individual relationship failures are counted.
pub async fn paste<W: GraphWriter>(
	writer: &W,
	plan: &PastePlan,
) -> Result<PasteOutcome, EditorError> {
	let clip = &plan.clipboard;
	let node_id = writer
		.create_node(&NodePayload {
			labels: clip.labels.clone(),
			properties: clip.properties.clone(),
		})
		.await?;

	let position = plan.origin.map(|o| {
		let (dx, dy) = paste_offset(&node_id);
		Position::new(o.x + dx, o.y + dy)
	});

	let (mut relinked, mut relink_failures) = (0, 0);
	for link in &plan.incident {
		let outgoing = link.source == clip.source_id;
		let rel = RelationshipPayload {
			source: if outgoing { node_id.clone() } else { link.source.clone() },
			target: if outgoing { link.target.clone() } else { node_id.clone() },
			rel_type: link.rel_type.clone(),
			properties: link.properties.clone(),
		};
		match writer.create_relationship(&rel).await {
			Ok(()) => relinked += 1,
			Err(err) => {
				warn!("re-creating {} for pasted node {node_id}: {err}", link.rel_type);
				relink_failures += 1;
			}
		}
	}

	Ok(PasteOutcome {
		node_id,
		position,
		relinked,
		relink_failures,
	})
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use futures::executor::block_on;

	use super::*;

	#[derive(Default)]
	struct FakeWriter {
		nodes: RefCell<Vec<NodePayload>>,
		rels: RefCell<Vec<RelationshipPayload>>,
		reject_type: Option<&'static str>,
		fail_create: bool,
	}

	impl GraphWriter for FakeWriter {
		async fn create_node(&self, node: &NodePayload) -> Result<NodeId, EditorError> {
			if self.fail_create {
				return Err(EditorError::Network("HTTP 500".into()));
			}
			self.nodes.borrow_mut().push(node.clone());
			Ok("new".into())
		}

		async fn create_relationship(&self, rel: &RelationshipPayload) -> Result<(), EditorError> {
			if self.reject_type == Some(rel.rel_type.as_str()) {
				return Err(EditorError::Api("nope".into()));
			}
			self.rels.borrow_mut().push(rel.clone());
			Ok(())
		}
	}

	fn original() -> Node {
		Node::new("orig", &["Person"])
			.with_property("nombre", PropertyValue::String("Alice".into()))
			.with_property(
				"embedding",
				PropertyValue::from(serde_json::json!([0.1, 0.2, 0.3, 0.4])),
			)
			.with_property("scores", PropertyValue::Array(vec![PropertyValue::Number(1.into()); 3]))
			.with_property("vec", PropertyValue::Array(vec![PropertyValue::Number(1.into()); 64]))
	}

	fn plan() -> PastePlan {
		PastePlan {
			clipboard: ClipboardNode::copy_of(&original()),
			origin: Some(Position::new(100.0, 100.0)),
			incident: vec![
				Link::new("r1", "orig", "city", "LIVES_IN"),
				Link::new("r2", "bob", "orig", "KNOWS"),
			],
		}
	}

	#[test]
	fn shortcuts_need_modifier_and_no_text_focus() {
		assert_eq!(shortcut_for("c", true, false, false), Some(Shortcut::Copy));
		assert_eq!(shortcut_for("v", false, true, false), Some(Shortcut::Paste));
		assert_eq!(shortcut_for("c", false, false, false), None);
		assert_eq!(shortcut_for("v", true, false, true), None);
		assert_eq!(shortcut_for("x", true, false, false), None);
	}

	#[test]
	fn copy_drops_vectors_but_keeps_small_arrays() {
		let clip = ClipboardNode::copy_of(&original());
		assert_eq!(clip.source_id, "orig");
		assert_eq!(clip.labels, vec!["Person"]);
		assert!(clip.properties.contains_key("nombre"));
		assert!(clip.properties.contains_key("scores"));
		assert!(!clip.properties.contains_key("embedding"));
		assert!(!clip.properties.contains_key("vec"));
	}

	#[test]
	fn paste_creates_node_and_mirrors_relationships() {
		let writer = FakeWriter::default();
		let outcome = block_on(paste(&writer, &plan())).unwrap();

		assert_eq!(outcome.node_id, "new");
		assert_eq!(outcome.relinked, 2);
		assert_eq!(outcome.relink_failures, 0);
		let pos = outcome.position.unwrap();
		assert!((150.0..=180.0).contains(&pos.x) && (150.0..=180.0).contains(&pos.y));

		let nodes = writer.nodes.borrow();
		assert_eq!(nodes[0].labels, vec!["Person"]);
		assert!(!nodes[0].properties.contains_key("embedding"));

		let rels = writer.rels.borrow();
		assert_eq!((rels[0].source.as_str(), rels[0].target.as_str()), ("new", "city"));
		assert_eq!((rels[1].source.as_str(), rels[1].target.as_str()), ("bob", "new"));
		assert_eq!(rels[1].rel_type, "KNOWS");
	}

	#[test]
	fn failed_relationships_are_counted() {
		let writer = FakeWriter {
			reject_type: Some("KNOWS"),
			..Default::default()
		};
		let outcome = block_on(paste(&writer, &plan())).unwrap();
		assert_eq!((outcome.relinked, outcome.relink_failures), (1, 1));
	}

	#[test]
	fn failed_node_creation_aborts() {
		let writer = FakeWriter {
			fail_create: true,
			..Default::default()
		};
		assert!(block_on(paste(&writer, &plan())).is_err());
		assert!(writer.rels.borrow().is_empty());
	}

	#[test]
	fn paste_without_known_origin_has_no_position() {
		let writer = FakeWriter::default();
		let mut plan = plan();
		plan.origin = None;
		let outcome = block_on(paste(&writer, &plan)).unwrap();
		assert_eq!(outcome.position, None);
	}
}
