use std::sync::Arc;

use super::clipboard::{ClipboardNode, PasteOutcome, PastePlan};
use super::layout;
use super::pick::{self, Hit};
use super::types::{GraphSnapshot, LinkId, NodeId, Position, PositionMap};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;

/// Global pan/zoom: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn to_screen(&self, p: Position) -> Position {
		Position::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Sets the zoom (clamped) keeping the world point under `(cx, cy)` fixed.
	pub fn zoom_to(&mut self, k: f64, cx: f64, cy: f64) {
		let new_k = k.clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.k;
		self.x = cx - (cx - self.x) * ratio;
		self.y = cy - (cy - self.y) * ratio;
		self.k = new_k;
	}
}

/// Pointer gesture in progress. Coordinates are the last pointer sample.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	Panning { last_x: f64, last_y: f64 },
	DraggingNode {
		id: NodeId,
		last_x: f64,
		last_y: f64,
	},
}

/// Two-click relationship creation.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ConnectionMode {
	#[default]
	Off,
	AwaitingSource,
	Armed { source: NodeId },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Selection {
	#[default]
	None,
	Node(NodeId),
	Link(LinkId),
}

/// Emitted to the owning page on pointer-down.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEvent {
	Node(NodeId),
	Link(LinkId),
	ConnectionSource(NodeId),
	ConnectionTarget { source: NodeId, target: NodeId },
}

/// What the hover card shows for the node under the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverCard {
	pub id: NodeId,
	pub caption: String,
	pub labels: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoverState {
	pub node: Option<NodeId>,
	pub link: Option<LinkId>,
}

enum Picked {
	Node(NodeId),
	Link(LinkId),
}

/// Everything the canvas owns across frames. The snapshot is shared and never
/// mutated; dragging only touches `positions`.
pub struct CanvasState {
	pub snapshot: Arc<GraphSnapshot>,
	pub positions: PositionMap,
	pub transform: ViewTransform,
	pub gesture: Gesture,
	pub connection: ConnectionMode,
	pub selection: Selection,
	pub hover: HoverState,
	pub clipboard: Option<ClipboardNode>,
	pub width: f64,
	pub height: f64,
}

impl CanvasState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			snapshot: Arc::default(),
			positions: PositionMap::default(),
			transform: ViewTransform::default(),
			gesture: Gesture::Idle,
			connection: ConnectionMode::Off,
			selection: Selection::None,
			hover: HoverState::default(),
			clipboard: None,
			width,
			height,
		}
	}

	/// Swaps in a fresh snapshot, laying out only nodes never seen before.
	/// Selection, hover and gestures that point at vanished elements are dropped.
	pub fn set_snapshot(&mut self, snapshot: Arc<GraphSnapshot>) -> usize {
		let placed =
			layout::place_new_nodes(&snapshot, &mut self.positions, self.width, self.height);
		self.snapshot = snapshot;

		let snap = &self.snapshot;
		let keep_selection = match &self.selection {
			Selection::None => true,
			Selection::Node(id) => snap.contains(id),
			Selection::Link(id) => snap.link(id).is_some(),
		};
		if !keep_selection {
			self.selection = Selection::None;
		}
		if self.hover.node.as_deref().is_some_and(|id| !snap.contains(id)) {
			self.hover.node = None;
		}
		if self.hover.link.as_deref().is_some_and(|id| snap.link(id).is_none()) {
			self.hover.link = None;
		}
		if let Gesture::DraggingNode { id, .. } = &self.gesture {
			if !snap.contains(id) {
				self.gesture = Gesture::Idle;
			}
		}
		if let ConnectionMode::Armed { source } = &self.connection {
			if !snap.contains(source) {
				self.connection = ConnectionMode::AwaitingSource;
			}
		}
		placed
	}

	/// Adopts a selection made outside the canvas, e.g. the inspector closing.
	pub fn set_selection(&mut self, selection: Selection) {
		self.selection = selection;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn pick_owned(&self, sx: f64, sy: f64) -> Option<Picked> {
		pick::pick(&self.snapshot, &self.positions, &self.transform, sx, sy).map(|hit| match hit {
			Hit::Node(n) => Picked::Node(n.id.clone()),
			Hit::Link(l) => Picked::Link(l.id.clone()),
		})
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) -> Option<SelectionEvent> {
		let picked = self.pick_owned(sx, sy);
		match (picked, self.connection.clone()) {
			(Some(Picked::Node(id)), ConnectionMode::AwaitingSource) => {
				self.connection = ConnectionMode::Armed { source: id.clone() };
				Some(SelectionEvent::ConnectionSource(id))
			}
			(Some(Picked::Node(id)), ConnectionMode::Armed { source }) => {
				(source != id).then_some(SelectionEvent::ConnectionTarget { source, target: id })
			}
			(Some(Picked::Node(id)), ConnectionMode::Off) => {
				self.selection = Selection::Node(id.clone());
				self.gesture = Gesture::DraggingNode {
					id: id.clone(),
					last_x: sx,
					last_y: sy,
				};
				Some(SelectionEvent::Node(id))
			}
			(Some(Picked::Link(id)), ConnectionMode::Off) => {
				if self.gesture != Gesture::Idle {
					return None;
				}
				self.selection = Selection::Link(id.clone());
				Some(SelectionEvent::Link(id))
			}
			(Some(Picked::Link(_)), _) => None,
			(None, _) => {
				self.gesture = Gesture::Panning {
					last_x: sx,
					last_y: sy,
				};
				None
			}
		}
	}

	/// Returns whether the hover target changed.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> bool {
		let k = self.transform.k;
		match &mut self.gesture {
			Gesture::DraggingNode { id, last_x, last_y } => {
				// Zoom-compensated so the node tracks the cursor.
				self.positions.translate(id, (sx - *last_x) / k, (sy - *last_y) / k);
				(*last_x, *last_y) = (sx, sy);
				return false;
			}
			Gesture::Panning { last_x, last_y } => {
				self.transform.x += sx - *last_x;
				self.transform.y += sy - *last_y;
				(*last_x, *last_y) = (sx, sy);
			}
			Gesture::Idle => {}
		}
		self.update_hover(sx, sy)
	}

	fn update_hover(&mut self, sx: f64, sy: f64) -> bool {
		let hover = match self.pick_owned(sx, sy) {
			Some(Picked::Node(id)) => HoverState {
				node: Some(id),
				link: None,
			},
			Some(Picked::Link(id)) => HoverState {
				node: None,
				link: Some(id),
			},
			None => HoverState::default(),
		};
		if hover == self.hover {
			return false;
		}
		self.hover = hover;
		true
	}

	pub fn pointer_up(&mut self) {
		self.gesture = Gesture::Idle;
	}

	pub fn pointer_leave(&mut self) {
		self.gesture = Gesture::Idle;
		self.hover = HoverState::default();
	}

	/// One wheel notch at `(sx, sy)`: up zooms in, down zooms out.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let step = if delta_y < 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
		self.transform.zoom_to(self.transform.k + step, sx, sy);
	}

	pub fn zoom_in(&mut self) {
		let (cx, cy) = (self.width / 2.0, self.height / 2.0);
		self.transform.zoom_to(self.transform.k + ZOOM_STEP, cx, cy);
	}

	pub fn zoom_out(&mut self) {
		let (cx, cy) = (self.width / 2.0, self.height / 2.0);
		self.transform.zoom_to(self.transform.k - ZOOM_STEP, cx, cy);
	}

	pub fn reset_view(&mut self) {
		self.transform = ViewTransform::default();
	}

	pub fn set_connection_mode(&mut self, on: bool) {
		self.connection = match (on, &self.connection) {
			(false, _) => ConnectionMode::Off,
			(true, ConnectionMode::Off) => ConnectionMode::AwaitingSource,
			(true, current) => current.clone(),
		};
	}

	pub fn is_connection_source(&self, id: &str) -> bool {
		matches!(&self.connection, ConnectionMode::Armed { source } if source == id)
	}

	pub fn is_dragging(&self, id: &str) -> bool {
		matches!(&self.gesture, Gesture::DraggingNode { id: dragged, .. } if dragged == id)
	}

	pub fn is_grabbing(&self) -> bool {
		self.gesture != Gesture::Idle
	}

	pub fn hover_card(&self) -> Option<HoverCard> {
		let node = self.snapshot.node(self.hover.node.as_deref()?)?;
		Some(HoverCard {
			id: node.id.clone(),
			caption: node.caption(),
			labels: node.label_text(),
		})
	}

	/// Copies the selected node into the clipboard.
	pub fn copy_selected(&mut self) -> Option<&ClipboardNode> {
		let Selection::Node(id) = &self.selection else {
			return None;
		};
		let node = self.snapshot.node(id)?;
		self.clipboard = Some(ClipboardNode::copy_of(node));
		self.clipboard.as_ref()
	}

	/// What a paste of the current clipboard has to create.
	pub fn paste_plan(&self) -> Option<PastePlan> {
		let clipboard = self.clipboard.clone()?;
		let origin = self.positions.get(&clipboard.source_id);
		let incident = self
			.snapshot
			.incident_links(&clipboard.source_id)
			.cloned()
			.collect();
		Some(PastePlan {
			clipboard,
			origin,
			incident,
		})
	}

	/// Seeds the pasted node's position so layout leaves it next to the original.
	pub fn apply_paste(&mut self, outcome: &PasteOutcome) {
		if let Some(pos) = outcome.position {
			self.positions.insert(outcome.node_id.clone(), pos);
		}
	}
}
