//! Live highlight rounds driven by the event stream.
//!
//! A qualifying stream event opens a round: the round counter advances, names
//! are resolved against the snapshot right away and relationship types are
//! looked up through the collaborator. The round's result only replaces the
//! highlight set if no newer round (or chat reset) was started meanwhile.

use std::collections::HashSet;

use futures::future::join_all;
use log::{debug, info};

use crate::api::RelationLookup;
use crate::components::graph_canvas::{GraphSnapshot, HIGHLIGHT_PALETTE, NodeId};
use crate::error::EditorError;
use crate::stream::StreamEvent;

/// Highlighted node ids and the round that produced them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightState {
	pub round: u64,
	pub nodes: HashSet<NodeId>,
}

impl HighlightState {
	/// A filter is in effect; non-members render dimmed.
	pub fn is_active(&self) -> bool {
		!self.nodes.is_empty()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.nodes.contains(id)
	}

	pub fn palette_index(&self) -> usize {
		(self.round % HIGHLIGHT_PALETTE.len() as u64) as usize
	}

	pub fn color(&self) -> &'static str {
		HIGHLIGHT_PALETTE[self.palette_index()]
	}
}

/// A round that still has relationship lookups outstanding.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingRound {
	ticket: u64,
	relation_types: Vec<String>,
	named: HashSet<NodeId>,
}

/// Outcome of resolving a [`PendingRound`].
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRound {
	ticket: u64,
	nodes: Result<HashSet<NodeId>, EditorError>,
}

impl PendingRound {
	/// Runs every relationship lookup concurrently and joins them.
	/// Any failed lookup fails the whole round.
	pub async fn resolve<L: RelationLookup>(self, lookup: &L) -> ResolvedRound {
		let lookups =
			join_all(self.relation_types.iter().map(|t| lookup.nodes_by_relation(t))).await;
		let nodes = lookups
			.into_iter()
			.try_fold(self.named, |mut acc, ids| -> Result<_, EditorError> {
				acc.extend(ids?);
				Ok(acc)
			});
		ResolvedRound {
			ticket: self.ticket,
			nodes,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightSynchronizer {
	state: HighlightState,
	/// Strictly increasing; advanced by every round and every reset.
	ticket: u64,
}

impl HighlightSynchronizer {
	pub fn state(&self) -> &HighlightState {
		&self.state
	}

	/// Opens a round for a qualifying event. Returns `None` for events that
	/// carry neither relationship types nor node names.
	pub fn begin(&mut self, event: &StreamEvent, snapshot: &GraphSnapshot) -> Option<PendingRound> {
		if !event.requests_highlight() {
			return None;
		}
		self.state.round += 1;
		self.ticket += 1;

		let names = event.nodos.as_deref().unwrap_or_default();
		let named = snapshot
			.nodes()
			.iter()
			.filter(|n| n.display_name().is_some_and(|name| names.iter().any(|x| x == name)))
			.map(|n| n.id.clone())
			.collect();
		debug!("highlight round {} opened (ticket {})", self.state.round, self.ticket);

		Some(PendingRound {
			ticket: self.ticket,
			relation_types: event.relaciones.clone().unwrap_or_default(),
			named,
		})
	}

	/// Applies a resolved round if it is still the latest one.
	/// Returns `Ok(true)` when the highlight set was replaced.
	pub fn commit(&mut self, resolved: ResolvedRound) -> Result<bool, EditorError> {
		if resolved.ticket != self.ticket {
			debug!(
				"discarding stale highlight ticket {} (current {})",
				resolved.ticket, self.ticket
			);
			return Ok(false);
		}
		let nodes = resolved.nodes?;
		info!("highlighting {} nodes in round {}", nodes.len(), self.state.round);
		self.state.nodes = nodes;
		Ok(true)
	}

	/// Clears the set, zeroes the round and invalidates in-flight rounds.
	pub fn reset(&mut self) {
		self.state = HighlightState::default();
		self.ticket += 1;
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use futures::executor::block_on;

	use super::*;
	use crate::components::graph_canvas::{Node, PropertyValue};

	struct FakeLookup {
		calls: RefCell<Vec<String>>,
	}

	impl FakeLookup {
		fn new() -> Self {
			Self {
				calls: RefCell::new(Vec::new()),
			}
		}
	}

	impl RelationLookup for FakeLookup {
		async fn nodes_by_relation(&self, rel_type: &str) -> Result<Vec<NodeId>, EditorError> {
			self.calls.borrow_mut().push(rel_type.to_string());
			match rel_type {
				"KNOWS" => Ok(vec!["1".into(), "2".into()]),
				"LIVES_IN" => Ok(vec!["2".into(), "3".into()]),
				_ => Err(EditorError::Network("HTTP 500".into())),
			}
		}
	}

	fn snapshot() -> GraphSnapshot {
		GraphSnapshot::new(
			vec![
				Node::new("1", &["Person"])
					.with_property("nombre", PropertyValue::String("Alice".into())),
				Node::new("9", &["Person"])
					.with_property("name", PropertyValue::String("Bob".into())),
			],
			vec![],
		)
	}

	fn event(json: &str) -> StreamEvent {
		StreamEvent::parse(json).unwrap()
	}

	fn ids(list: &[&str]) -> HashSet<NodeId> {
		list.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn named_node_is_highlighted_in_round_one() {
		let mut sync = HighlightSynchronizer::default();
		let pending = sync.begin(&event(r#"{"nodos":["Alice"]}"#), &snapshot()).unwrap();
		let resolved = block_on(pending.resolve(&FakeLookup::new()));
		assert_eq!(sync.commit(resolved), Ok(true));
		assert_eq!(sync.state().nodes, ids(&["1"]));
		assert_eq!(sync.state().round, 1);
	}

	#[test]
	fn relation_and_name_results_are_unioned() {
		let mut sync = HighlightSynchronizer::default();
		let lookup = FakeLookup::new();
		let pending = sync
			.begin(&event(r#"{"relaciones":["KNOWS","LIVES_IN"],"nodos":["Bob"]}"#), &snapshot())
			.unwrap();
		let resolved = block_on(pending.resolve(&lookup));
		assert_eq!(sync.commit(resolved), Ok(true));
		assert_eq!(sync.state().nodes, ids(&["1", "2", "3", "9"]));
		assert_eq!(*lookup.calls.borrow(), vec!["KNOWS", "LIVES_IN"]);
	}

	#[test]
	fn rounds_increment_and_pick_palette_colors() {
		let mut sync = HighlightSynchronizer::default();
		for expected in 1..=7u64 {
			sync.begin(&event(r#"{"relaciones":[]}"#), &snapshot()).unwrap();
			assert_eq!(sync.state().round, expected);
			assert_eq!(sync.state().palette_index(), (expected % 5) as usize);
		}
		assert!(sync.begin(&event(r#"{"AI":"just talking"}"#), &snapshot()).is_none());
		assert_eq!(sync.state().round, 7);
		assert_eq!(sync.state().color(), HIGHLIGHT_PALETTE[2]);
	}

	#[test]
	fn stale_round_does_not_clobber_newer_one() {
		let mut sync = HighlightSynchronizer::default();
		let lookup = FakeLookup::new();
		let slow = sync.begin(&event(r#"{"relaciones":["KNOWS"]}"#), &snapshot()).unwrap();
		let fast = sync.begin(&event(r#"{"nodos":["Alice"]}"#), &snapshot()).unwrap();

		assert_eq!(sync.commit(block_on(fast.resolve(&lookup))), Ok(true));
		assert_eq!(sync.commit(block_on(slow.resolve(&lookup))), Ok(false));
		assert_eq!(sync.state().nodes, ids(&["1"]));
		assert_eq!(sync.state().round, 2);
	}

	#[test]
	fn reset_invalidates_in_flight_rounds() {
		let mut sync = HighlightSynchronizer::default();
		let pending = sync.begin(&event(r#"{"nodos":["Alice"]}"#), &snapshot()).unwrap();
		sync.reset();
		assert_eq!(sync.commit(block_on(pending.resolve(&FakeLookup::new()))), Ok(false));
		assert_eq!(sync.state(), &HighlightState::default());
	}

	#[test]
	fn failed_lookup_abandons_round_and_keeps_previous_set() {
		let mut sync = HighlightSynchronizer::default();
		let lookup = FakeLookup::new();
		let first = sync.begin(&event(r#"{"nodos":["Alice"]}"#), &snapshot()).unwrap();
		sync.commit(block_on(first.resolve(&lookup))).unwrap();

		let broken = sync
			.begin(&event(r#"{"relaciones":["KNOWS","BROKEN"]}"#), &snapshot())
			.unwrap();
		let res = sync.commit(block_on(broken.resolve(&lookup)));
		assert!(matches!(res, Err(EditorError::Network(_))));
		assert_eq!(sync.state().nodes, ids(&["1"]));
		assert_eq!(sync.state().round, 2);
	}
}
