//! Pointer hit-testing in screen space.

use super::state::ViewTransform;
use super::types::{GraphSnapshot, Link, Node, Position, PositionMap};

/// Node pick radius in world units; scales with zoom like the glyph itself.
pub const PICK_RADIUS: f64 = 20.0;
/// Link pick tolerance in screen pixels; does not scale with zoom.
pub const LINK_PICK_TOLERANCE: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hit<'a> {
	Node(&'a Node),
	Link(&'a Link),
}

/// What lies under `(sx, sy)`; nodes win over links.
pub fn pick<'a>(
	snapshot: &'a GraphSnapshot,
	positions: &PositionMap,
	transform: &ViewTransform,
	sx: f64,
	sy: f64,
) -> Option<Hit<'a>> {
	node_at(snapshot, positions, transform, sx, sy)
		.map(Hit::Node)
		.or_else(|| link_at(snapshot, positions, transform, sx, sy).map(Hit::Link))
}

/// First node, in snapshot order, whose screen position is within the pick radius.
pub fn node_at<'a>(
	snapshot: &'a GraphSnapshot,
	positions: &PositionMap,
	transform: &ViewTransform,
	sx: f64,
	sy: f64,
) -> Option<&'a Node> {
	let radius = PICK_RADIUS * transform.k;
	snapshot.nodes().iter().find(|node| {
		positions.get(&node.id).is_some_and(|pos| {
			let p = transform.to_screen(pos);
			(sx - p.x).hypot(sy - p.y) <= radius
		})
	})
}

/// First link whose screen segment passes within the tolerance of the pointer.
pub fn link_at<'a>(
	snapshot: &'a GraphSnapshot,
	positions: &PositionMap,
	transform: &ViewTransform,
	sx: f64,
	sy: f64,
) -> Option<&'a Link> {
	snapshot.links().iter().find(|link| {
		let (Some(s), Some(t)) = (positions.get(&link.source), positions.get(&link.target)) else {
			return false;
		};
		let (s, t) = (transform.to_screen(s), transform.to_screen(t));
		segment_distance(Position::new(sx, sy), s, t)
			.is_some_and(|d| d <= LINK_PICK_TOLERANCE)
	})
}

/// Distance from `p` to segment `a..b`; `None` for a degenerate segment.
fn segment_distance(p: Position, a: Position, b: Position) -> Option<f64> {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	if len_sq == 0.0 {
		return None;
	}
	let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
	let (px, py) = (a.x + t * dx, a.y + t * dy);
	Some((p.x - px).hypot(p.y - py))
}
