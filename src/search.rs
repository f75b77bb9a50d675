//! Node search. A non-empty query dims every node it does not match, the same
//! way a live highlight round does.

use std::collections::HashSet;

use crate::components::graph_canvas::{GraphSnapshot, Node, NodeId};

/// Which part of a node the query is matched against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchField {
	#[default]
	Name,
	Id,
	Label,
	Property,
}

impl SearchField {
	pub const ALL: [SearchField; 4] = [Self::Name, Self::Id, Self::Label, Self::Property];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Name => "name",
			Self::Id => "id",
			Self::Label => "label",
			Self::Property => "property",
		}
	}

	pub fn parse(raw: &str) -> Self {
		Self::ALL
			.into_iter()
			.find(|f| f.as_str() == raw)
			.unwrap_or_default()
	}
}

/// Case-insensitive substring search over one [`SearchField`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeSearch {
	pub field: SearchField,
	pub text: String,
}

impl NodeSearch {
	pub fn new(field: SearchField, text: &str) -> Self {
		Self {
			field,
			text: text.trim().to_lowercase(),
		}
	}

	pub fn is_active(&self) -> bool {
		!self.text.is_empty()
	}

	pub fn matches(&self, node: &Node) -> bool {
		let hit = |s: &str| s.to_lowercase().contains(&self.text);
		match self.field {
			SearchField::Name => hit(node.display_name().unwrap_or_default()),
			SearchField::Id => hit(node.id.as_str()),
			SearchField::Label => node.labels.iter().any(|l| hit(l.as_str())),
			SearchField::Property => node.properties.values().any(|v| hit(v.display().as_str())),
		}
	}

	/// Matching ids, empty while the query is blank.
	pub fn matching_ids(&self, snapshot: &GraphSnapshot) -> HashSet<NodeId> {
		if !self.is_active() {
			return HashSet::new();
		}
		snapshot
			.nodes()
			.iter()
			.filter(|n| self.matches(n))
			.map(|n| n.id.clone())
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_canvas::PropertyValue;

	fn snapshot() -> GraphSnapshot {
		GraphSnapshot::new(
			vec![
				Node::new("4:a:1", &["Person", "Actor"])
					.with_property("nombre", PropertyValue::String("Alice Smith".into()))
					.with_property("born", PropertyValue::Number(1967.into())),
				Node::new("4:a:2", &["City"])
					.with_property("name", PropertyValue::String("Lima".into())),
				Node::new("9", &[]),
			],
			vec![],
		)
	}

	fn ids(search: NodeSearch) -> Vec<NodeId> {
		let mut ids: Vec<_> = search.matching_ids(&snapshot()).into_iter().collect();
		ids.sort();
		ids
	}

	#[test]
	fn name_search_is_case_insensitive() {
		assert_eq!(ids(NodeSearch::new(SearchField::Name, " SMITH ")), vec!["4:a:1"]);
		assert_eq!(ids(NodeSearch::new(SearchField::Name, "li")), vec!["4:a:1", "4:a:2"]);
	}

	#[test]
	fn searches_ids_labels_and_property_values() {
		assert_eq!(ids(NodeSearch::new(SearchField::Id, "4:a")), vec!["4:a:1", "4:a:2"]);
		assert_eq!(ids(NodeSearch::new(SearchField::Label, "act")), vec!["4:a:1"]);
		assert_eq!(ids(NodeSearch::new(SearchField::Property, "1967")), vec!["4:a:1"]);
		assert!(ids(NodeSearch::new(SearchField::Label, "9")).is_empty());
	}

	#[test]
	fn blank_query_matches_nothing() {
		let search = NodeSearch::new(SearchField::Name, "   ");
		assert!(!search.is_active());
		assert!(ids(search).is_empty());
	}

	#[test]
	fn unknown_field_names_fall_back_to_name() {
		assert_eq!(SearchField::parse("label"), SearchField::Label);
		assert_eq!(SearchField::parse("bogus"), SearchField::Name);
	}
}
