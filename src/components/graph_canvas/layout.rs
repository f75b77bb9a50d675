//! Label-clustered initial placement.
//!
//! Each distinct primary label gets an anchor on a circle around the canvas
//! center; nodes of that label ring around the anchor. Placement is
//! incremental: only nodes without a stored position are touched, so
//! re-running after a snapshot refresh never moves anything already placed.

use std::collections::HashMap;
use std::f64::consts::PI;

use super::types::{GraphSnapshot, Node, Position, PositionMap};

/// Footprint of a node including its margin.
pub const NODE_FOOTPRINT: f64 = 25.0;
/// Minimum ring radius around a cluster anchor.
pub const CLUSTER_SPACING: f64 = NODE_FOOTPRINT * 2.0;
/// Growth of a cluster ring per member.
const RING_GROWTH_PER_NODE: f64 = 4.0;
/// Fraction of `min(width, height)` used for the label anchor circle.
const ANCHOR_CIRCLE: f64 = 0.4;
/// Fraction of `min(width, height)` used by the unlabeled radial fallback.
const RADIAL_CIRCLE: f64 = 0.35;

const DEFAULT_GROUP: &str = "default";

/// Deterministic value in `[0, 1)` derived from `key` (FNV-1a).
pub(crate) fn unit_hash(key: &str, salt: u64) -> f64 {
	let mut h: u64 = 0xcbf2_9ce4_8422_2325 ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
	for b in key.bytes() {
		h ^= b as u64;
		h = h.wrapping_mul(0x0100_0000_01b3);
	}
	h ^= h >> 29;
	(h >> 11) as f64 / (1u64 << 53) as f64
}

/// Anchor points for `labels`, evenly spaced on a circle around the canvas center.
pub fn cluster_anchors(labels: &[&str], width: f64, height: f64) -> HashMap<String, Position> {
	let (cx, cy) = (width / 2.0, height / 2.0);
	let radius = width.min(height) * ANCHOR_CIRCLE;
	let step = 2.0 * PI / labels.len().max(1) as f64;
	labels
		.iter()
		.enumerate()
		.map(|(i, label)| {
			let angle = i as f64 * step;
			(
				label.to_string(),
				Position::new(cx + radius * angle.cos(), cy + radius * angle.sin()),
			)
		})
		.collect()
}

/// Distinct primary labels in first-seen order.
fn primary_labels(snapshot: &GraphSnapshot) -> Vec<&str> {
	let mut labels: Vec<&str> = Vec::new();
	for label in snapshot.nodes().iter().filter_map(Node::primary_label) {
		if !labels.contains(&label) {
			labels.push(label);
		}
	}
	labels
}

/// Places every node of `snapshot` that has no entry in `positions`.
/// Returns how many nodes were placed.
pub fn place_new_nodes(
	snapshot: &GraphSnapshot,
	positions: &mut PositionMap,
	width: f64,
	height: f64,
) -> usize {
	let fresh: Vec<&Node> = snapshot
		.nodes()
		.iter()
		.filter(|n| !positions.contains(&n.id))
		.collect();
	if fresh.is_empty() {
		return 0;
	}

	let labels = primary_labels(snapshot);
	let placed = if labels.is_empty() {
		radial_layout(&fresh, width, height)
	} else {
		let mut occupied: HashMap<&str, usize> = HashMap::new();
		for node in snapshot.nodes().iter().filter(|n| positions.contains(&n.id)) {
			*occupied.entry(group_of(node)).or_default() += 1;
		}
		cluster_layout(&fresh, &labels, &occupied, width, height)
	};
	let count = placed.len();
	for (id, pos) in placed {
		positions.insert(id, pos);
	}
	count
}

fn group_of(node: &Node) -> &str {
	node.primary_label().unwrap_or(DEFAULT_GROUP)
}

/// `occupied` counts already placed members per group; fresh members take the
/// ring slots after them.
fn cluster_layout(
	nodes: &[&Node],
	labels: &[&str],
	occupied: &HashMap<&str, usize>,
	width: f64,
	height: f64,
) -> Vec<(String, Position)> {
	let anchors = cluster_anchors(labels, width, height);
	let center = Position::new(width / 2.0, height / 2.0);

	// Preserve snapshot order inside each group and across groups.
	let mut groups: Vec<(&str, Vec<&Node>)> = Vec::new();
	for &node in nodes {
		let key = group_of(node);
		match groups.iter_mut().find(|(k, _)| *k == key) {
			Some((_, members)) => members.push(node),
			None => groups.push((key, vec![node])),
		}
	}

	let mut out = Vec::with_capacity(nodes.len());
	for (key, members) in groups {
		let anchor = anchors.get(key).copied().unwrap_or(center);
		let before = occupied.get(key).copied().unwrap_or(0);
		if let ([only], 0) = (members.as_slice(), before) {
			out.push((only.id.clone(), anchor));
			continue;
		}
		let slots = before + members.len();
		let step = 2.0 * PI / slots as f64;
		let ring =
			(CLUSTER_SPACING * 2.0).max(CLUSTER_SPACING + slots as f64 * RING_GROWTH_PER_NODE);
		for (i, node) in members.iter().enumerate() {
			let angle = (before + i) as f64 * step;
			let r = ring + unit_hash(&node.id, 1) * NODE_FOOTPRINT * 0.8;
			out.push((
				node.id.clone(),
				Position::new(anchor.x + r * angle.cos(), anchor.y + r * angle.sin()),
			));
		}
	}
	out
}

fn radial_layout(nodes: &[&Node], width: f64, height: f64) -> Vec<(String, Position)> {
	let (cx, cy) = (width / 2.0, height / 2.0);
	if let [only] = nodes {
		return vec![(only.id.clone(), Position::new(cx, cy))];
	}
	let base = width.min(height) * RADIAL_CIRCLE;
	let step = 2.0 * PI / nodes.len() as f64;
	nodes
		.iter()
		.enumerate()
		.map(|(i, node)| {
			let angle = i as f64 * step;
			let r = base * (0.9 + unit_hash(&node.id, 2) * 0.2);
			(
				node.id.clone(),
				Position::new(cx + r * angle.cos(), cy + r * angle.sin()),
			)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn snapshot(nodes: Vec<Node>) -> GraphSnapshot {
		GraphSnapshot::new(nodes, vec![])
	}

	fn dist(a: Position, b: Position) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn two_people_ring_a_single_anchor() {
		let snap = snapshot(vec![
			Node::new("a", &["Person"]),
			Node::new("b", &["Person"]),
		]);
		let mut positions = PositionMap::default();
		assert_eq!(place_new_nodes(&snap, &mut positions, 800.0, 600.0), 2);

		// One label: its anchor sits at angle 0 on the anchor circle.
		let anchor = Position::new(400.0 + 600.0 * ANCHOR_CIRCLE, 300.0);
		let (a, b) = (positions.get("a").unwrap(), positions.get("b").unwrap());
		assert!(dist(a, b) > 0.0);
		for p in [a, b] {
			let r = dist(p, anchor);
			assert!(r >= CLUSTER_SPACING * 2.0 - 1e-9);
			assert!(r <= CLUSTER_SPACING * 2.0 + NODE_FOOTPRINT * 0.8 + 1e-9);
		}
	}

	#[test]
	fn layout_is_reproducible_and_idempotent() {
		let snap = snapshot(vec![
			Node::new("a", &["Person"]),
			Node::new("b", &["Person"]),
			Node::new("c", &["City"]),
			Node::new("d", &[]),
		]);
		let mut first = PositionMap::default();
		let mut second = PositionMap::default();
		place_new_nodes(&snap, &mut first, 800.0, 600.0);
		place_new_nodes(&snap, &mut second, 800.0, 600.0);
		assert_eq!(first, second);

		let before = first.clone();
		assert_eq!(place_new_nodes(&snap, &mut first, 800.0, 600.0), 0);
		assert_eq!(first, before);
	}

	#[test]
	fn new_nodes_do_not_disturb_placed_ones() {
		let mut positions = PositionMap::default();
		let snap = snapshot(vec![Node::new("a", &["Person"]), Node::new("b", &["City"])]);
		place_new_nodes(&snap, &mut positions, 800.0, 600.0);
		let (a, b) = (positions.get("a"), positions.get("b"));

		let grown = snapshot(vec![
			Node::new("a", &["Person"]),
			Node::new("b", &["City"]),
			Node::new("c", &["Movie"]),
			Node::new("e", &["Person"]),
		]);
		assert_eq!(place_new_nodes(&grown, &mut positions, 1024.0, 768.0), 2);
		assert_eq!(positions.get("a"), a);
		assert_eq!(positions.get("b"), b);
		assert!(positions.contains("c") && positions.contains("e"));
	}

	#[test]
	fn single_group_member_sits_on_its_anchor() {
		let snap = snapshot(vec![Node::new("a", &["A"]), Node::new("b", &["B"])]);
		let mut positions = PositionMap::default();
		place_new_nodes(&snap, &mut positions, 1000.0, 1000.0);
		let anchors = cluster_anchors(&["A", "B"], 1000.0, 1000.0);
		assert_eq!(positions.get("a"), anchors.get("A").copied());
		assert_eq!(positions.get("b"), anchors.get("B").copied());
	}

	#[test]
	fn late_group_member_rings_around_occupied_anchor() {
		let mut positions = PositionMap::default();
		let first = snapshot(vec![Node::new("a", &["A"])]);
		place_new_nodes(&first, &mut positions, 800.0, 600.0);
		let a = positions.get("a").unwrap();

		let grown = snapshot(vec![Node::new("a", &["A"]), Node::new("b", &["A"])]);
		assert_eq!(place_new_nodes(&grown, &mut positions, 800.0, 600.0), 1);
		assert_eq!(positions.get("a"), Some(a));
		assert!(dist(positions.get("b").unwrap(), a) >= CLUSTER_SPACING * 2.0 - 1e-9);
	}

	#[test]
	fn unlabeled_nodes_in_labeled_graph_go_to_center() {
		let snap = snapshot(vec![Node::new("a", &["A"]), Node::new("lonely", &[])]);
		let mut positions = PositionMap::default();
		place_new_nodes(&snap, &mut positions, 800.0, 600.0);
		assert_eq!(positions.get("lonely"), Some(Position::new(400.0, 300.0)));
	}

	#[test]
	fn radial_fallback_without_labels() {
		let single = snapshot(vec![Node::new("x", &[])]);
		let mut positions = PositionMap::default();
		place_new_nodes(&single, &mut positions, 800.0, 600.0);
		assert_eq!(positions.get("x"), Some(Position::new(400.0, 300.0)));

		let many = snapshot((0..6).map(|i| Node::new(i.to_string(), &[])).collect());
		let mut positions = PositionMap::default();
		place_new_nodes(&many, &mut positions, 800.0, 600.0);
		let center = Position::new(400.0, 300.0);
		let base = 600.0 * RADIAL_CIRCLE;
		for i in 0..6 {
			let r = dist(positions.get(&i.to_string()).unwrap(), center);
			assert!(r >= base * 0.9 - 1e-9 && r <= base * 1.1 + 1e-9);
		}
	}

	#[test]
	fn unit_hash_stays_in_range() {
		for key in ["", "a", "4:ab:1", "a much longer identifier"] {
			let v = unit_hash(key, 7);
			assert!((0.0..1.0).contains(&v));
		}
		assert_eq!(unit_hash("same", 1), unit_hash("same", 1));
	}
}
