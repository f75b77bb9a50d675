use std::f64::consts::PI;

use super::color::{LabelColors, brighten, transparent};
use super::state::{CanvasState, ConnectionMode, Selection};
use super::surface::Surface;
use super::types::{Link, Node, Position};
use crate::highlight::HighlightState;

pub const NODE_RADIUS: f64 = 20.0;
const HALO_RADIUS: f64 = 24.0;
const PULSE_RADIUS: f64 = 22.0;
const ARROW_LENGTH: f64 = 10.0;
const ARROW_ANGLE: f64 = PI / 6.0;
const BACKGROUND: &str = "#1a1a2e";

const LINK_SELECTED: &str = "#ff5733";
const LINK_HOVERED: &str = "#33ccff";
const LINK_DIMMED: &str = "rgba(155, 135, 245, 0.2)";
const LINK_DEFAULT: &str = "#9b87f5";
const LINK_LABEL_BOX: &str = "rgba(30, 30, 46, 0.7)";
const CONNECTION_GREEN: &str = "#33ff57";
const LABEL_TEXT: &str = "#d6bcfa";

/// Per-frame inputs that do not live in [`CanvasState`].
pub struct FrameStyle<'a> {
	pub highlight: &'a HighlightState,
	pub label_colors: &'a LabelColors,
	pub show_relationship_labels: bool,
	/// Animation clock driving the hover pulse.
	pub time_ms: f64,
}

/// Visual state of a node, in decreasing priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeLook {
	Selected,
	ConnectionSource,
	Dragged,
	Hovered,
	Dimmed,
	Highlighted,
	Normal,
}

pub fn node_look(state: &CanvasState, highlight: &HighlightState, id: &str) -> NodeLook {
	if matches!(&state.selection, Selection::Node(s) if s == id) {
		NodeLook::Selected
	} else if state.is_connection_source(id) {
		NodeLook::ConnectionSource
	} else if state.is_dragging(id) {
		NodeLook::Dragged
	} else if state.hover.node.as_deref() == Some(id) {
		NodeLook::Hovered
	} else if highlight.is_active() && !highlight.contains(id) {
		NodeLook::Dimmed
	} else if highlight.contains(id) {
		NodeLook::Highlighted
	} else {
		NodeLook::Normal
	}
}

/// Keeps texts up to `max` chars, otherwise the first `keep` plus an ellipsis.
pub fn truncate(text: &str, max: usize, keep: usize) -> String {
	if text.chars().count() <= max {
		return text.to_string();
	}
	let mut out: String = text.chars().take(keep).collect();
	out.push_str("...");
	out
}

pub fn render<S: Surface>(state: &CanvasState, style: &FrameStyle, ctx: &S) {
	ctx.set_shadow("transparent", 0.0);
	ctx.set_fill_style(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	ctx.translate(state.transform.x, state.transform.y);
	ctx.scale(state.transform.k);
	for link in state.snapshot.links() {
		draw_link(state, style, ctx, link);
	}
	draw_connection_preview(state, ctx);
	for node in state.snapshot.nodes() {
		draw_node(state, style, ctx, node);
	}
	ctx.restore();
}

struct LinkStroke {
	color: &'static str,
	width: f64,
	glow: bool,
}

fn link_stroke(state: &CanvasState, highlight: &HighlightState, link: &Link) -> LinkStroke {
	let lit = highlight.contains(&link.source) && highlight.contains(&link.target);
	if matches!(&state.selection, Selection::Link(id) if *id == link.id) {
		LinkStroke {
			color: LINK_SELECTED,
			width: 3.0,
			glow: true,
		}
	} else if state.hover.link.as_deref() == Some(link.id.as_str()) {
		LinkStroke {
			color: LINK_HOVERED,
			width: 2.0,
			glow: true,
		}
	} else if highlight.is_active() && !lit {
		LinkStroke {
			color: LINK_DIMMED,
			width: 1.0,
			glow: false,
		}
	} else {
		LinkStroke {
			color: LINK_DEFAULT,
			width: 1.5,
			glow: false,
		}
	}
}

fn draw_link<S: Surface>(state: &CanvasState, style: &FrameStyle, ctx: &S, link: &Link) {
	if !(state.snapshot.contains(&link.source) && state.snapshot.contains(&link.target)) {
		return;
	}
	let (Some(a), Some(b)) = (
		state.positions.get(&link.source),
		state.positions.get(&link.target),
	) else {
		return;
	};
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let (x1, y1) = (a.x + ux * NODE_RADIUS, a.y + uy * NODE_RADIUS);
	let (x2, y2) = (b.x - ux * NODE_RADIUS, b.y - uy * NODE_RADIUS);

	let stroke = link_stroke(state, style.highlight, link);
	ctx.set_stroke_style(stroke.color);
	ctx.set_line_width(stroke.width);
	if stroke.glow {
		ctx.set_shadow(stroke.color, 8.0);
	}
	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.line_to(x2, y2);
	ctx.stroke();

	let angle = dy.atan2(dx);
	ctx.begin_path();
	ctx.move_to(x2, y2);
	ctx.line_to(
		x2 - ARROW_LENGTH * (angle - ARROW_ANGLE).cos(),
		y2 - ARROW_LENGTH * (angle - ARROW_ANGLE).sin(),
	);
	ctx.move_to(x2, y2);
	ctx.line_to(
		x2 - ARROW_LENGTH * (angle + ARROW_ANGLE).cos(),
		y2 - ARROW_LENGTH * (angle + ARROW_ANGLE).sin(),
	);
	ctx.stroke();
	if stroke.glow {
		ctx.set_shadow("transparent", 0.0);
	}

	if style.show_relationship_labels && !link.rel_type.is_empty() {
		let text = truncate(&link.rel_type, 15, 12);
		let (mx, my) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
		ctx.set_font("12px Arial");
		let w = ctx.measure_text(&text);
		ctx.set_fill_style(LINK_LABEL_BOX);
		ctx.fill_rect(mx - w / 2.0 - 4.0, my - 8.0, w + 8.0, 16.0);
		ctx.set_fill_style("#ffffff");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		ctx.fill_text(&text, mx, my);
	}
}

/// Dashed line from the armed source to the node under the pointer.
fn draw_connection_preview<S: Surface>(state: &CanvasState, ctx: &S) {
	let ConnectionMode::Armed { source } = &state.connection else {
		return;
	};
	let Some(target) = state.hover.node.as_deref().filter(|t| *t != source) else {
		return;
	};
	let (Some(a), Some(b)) = (state.positions.get(source), state.positions.get(target)) else {
		return;
	};
	ctx.save();
	ctx.set_stroke_style(CONNECTION_GREEN);
	ctx.set_line_width(2.0);
	ctx.set_line_dash(&[5.0, 3.0]);
	ctx.begin_path();
	ctx.move_to(a.x, a.y);
	ctx.line_to(b.x, b.y);
	ctx.stroke();
	ctx.begin_path();
	ctx.arc(b.x, b.y, NODE_RADIUS + 6.0);
	ctx.stroke();
	ctx.restore();
}

fn circle<S: Surface>(ctx: &S, p: Position, r: f64) {
	ctx.begin_path();
	ctx.arc(p.x, p.y, r);
}

fn draw_node<S: Surface>(state: &CanvasState, style: &FrameStyle, ctx: &S, node: &Node) {
	let Some(p) = state.positions.get(&node.id) else {
		return;
	};
	let base = style.label_colors.fill_for(node.primary_label());
	let look = node_look(state, style.highlight, &node.id);

	let halo = match look {
		NodeLook::Selected => Some("rgba(255, 87, 51, 0.3)"),
		NodeLook::ConnectionSource => Some("rgba(51, 255, 87, 0.3)"),
		NodeLook::Hovered => Some("rgba(51, 153, 255, 0.3)"),
		_ => None,
	};
	if let Some(halo) = halo {
		circle(ctx, p, HALO_RADIUS);
		ctx.set_fill_style(halo);
		ctx.fill();
	}
	if look == NodeLook::Hovered {
		circle(ctx, p, PULSE_RADIUS + (style.time_ms / 200.0).sin() * 2.0);
		ctx.set_stroke_style("rgba(51, 153, 255, 0.6)");
		ctx.set_line_width(1.5);
		ctx.stroke();
	}

	let fill = match look {
		NodeLook::Selected => brighten(base, 40),
		NodeLook::ConnectionSource => CONNECTION_GREEN.to_string(),
		NodeLook::Dragged => brighten(base, 20),
		NodeLook::Hovered => brighten(base, 25),
		NodeLook::Dimmed => transparent(base, 0.2),
		NodeLook::Highlighted => brighten(base, 30),
		NodeLook::Normal => base.to_string(),
	};
	circle(ctx, p, NODE_RADIUS);
	ctx.set_fill_style(&fill);
	ctx.fill();

	if look == NodeLook::Highlighted {
		circle(ctx, p, NODE_RADIUS + 3.0);
		ctx.set_stroke_style(style.highlight.color());
		ctx.set_line_width(3.0);
		ctx.stroke();
	}

	let text_alpha = if look == NodeLook::Dimmed { 0.3 } else { 1.0 };
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_font("bold 12px Arial");
	ctx.set_fill_style(&format!("rgba(255, 255, 255, {text_alpha})"));
	ctx.fill_text(&truncate(&node.caption(), 15, 12), p.x, p.y);

	if !node.labels.is_empty() {
		ctx.set_font("10px Arial");
		ctx.set_text_baseline("bottom");
		ctx.set_fill_style(if look == NodeLook::Dimmed {
			"rgba(214, 188, 250, 0.3)"
		} else {
			LABEL_TEXT
		});
		ctx.fill_text(&truncate(&node.label_text(), 20, 17), p.x, p.y - NODE_RADIUS - 5.0);
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::collections::HashSet;
	use std::sync::Arc;

	use super::*;
	use crate::components::graph_canvas::types::GraphSnapshot;

	/// Records every drawing call as a short string.
	#[derive(Default)]
	struct Recorder(RefCell<Vec<String>>);

	impl Recorder {
		fn log(&self, op: String) {
			self.0.borrow_mut().push(op);
		}

		fn ops(&self) -> Vec<String> {
			self.0.borrow().clone()
		}

		fn has(&self, op: &str) -> bool {
			self.0.borrow().iter().any(|o| o == op)
		}
	}

	impl Surface for Recorder {
		fn save(&self) {
			self.log("save".into());
		}
		fn restore(&self) {
			self.log("restore".into());
		}
		fn translate(&self, x: f64, y: f64) {
			self.log(format!("translate {x} {y}"));
		}
		fn scale(&self, k: f64) {
			self.log(format!("scale {k}"));
		}
		fn set_fill_style(&self, style: &str) {
			self.log(format!("fill_style {style}"));
		}
		fn set_stroke_style(&self, style: &str) {
			self.log(format!("stroke_style {style}"));
		}
		fn set_line_width(&self, width: f64) {
			self.log(format!("line_width {width}"));
		}
		fn set_line_dash(&self, segments: &[f64]) {
			self.log(format!("line_dash {segments:?}"));
		}
		fn set_shadow(&self, color: &str, blur: f64) {
			self.log(format!("shadow {color} {blur}"));
		}
		fn set_font(&self, font: &str) {
			self.log(format!("font {font}"));
		}
		fn set_text_align(&self, _: &str) {}
		fn set_text_baseline(&self, _: &str) {}
		fn begin_path(&self) {}
		fn move_to(&self, x: f64, y: f64) {
			self.log(format!("move_to {x} {y}"));
		}
		fn line_to(&self, x: f64, y: f64) {
			self.log(format!("line_to {x} {y}"));
		}
		fn arc(&self, x: f64, y: f64, radius: f64) {
			self.log(format!("arc {x} {y} {radius}"));
		}
		fn fill(&self) {}
		fn stroke(&self) {}
		fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64) {
			self.log(format!("fill_rect {x} {y} {w} {h}"));
		}
		fn fill_text(&self, text: &str, _: f64, _: f64) {
			self.log(format!("text {text}"));
		}
		fn measure_text(&self, text: &str) -> f64 {
			text.chars().count() as f64 * 6.0
		}
	}

	fn state() -> CanvasState {
		let mut s = CanvasState::new(800.0, 600.0);
		s.positions.insert("a", Position::new(100.0, 100.0));
		s.positions.insert("b", Position::new(300.0, 100.0));
		s.set_snapshot(Arc::new(GraphSnapshot::new(
			vec![
				Node::new("a", &["Person"]),
				Node::new("b", &["City", "Place"]),
			],
			vec![Link::new("r", "a", "b", "A_VERY_LONG_RELATIONSHIP")],
		)));
		s
	}

	fn draw(state: &CanvasState, highlight: &HighlightState, labels: bool) -> Recorder {
		let colors = LabelColors::from_snapshot(&state.snapshot);
		let rec = Recorder::default();
		let style = FrameStyle {
			highlight,
			label_colors: &colors,
			show_relationship_labels: labels,
			time_ms: 0.0,
		};
		render(state, &style, &rec);
		rec
	}

	#[test]
	fn truncation_keeps_short_text() {
		assert_eq!(truncate("Alice", 15, 12), "Alice");
		assert_eq!(truncate("exactly fifteen", 15, 12), "exactly fifteen");
		assert_eq!(truncate("Bartholomew Jones", 15, 12), "Bartholomew ...");
	}

	#[test]
	fn frame_starts_with_background_and_transform() {
		let mut s = state();
		s.transform.x = 10.0;
		s.transform.k = 1.5;
		let ops = draw(&s, &HighlightState::default(), true).ops();
		assert_eq!(
			&ops[1..6],
			&[
				format!("fill_style {BACKGROUND}"),
				"fill_rect 0 0 800 600".to_string(),
				"save".to_string(),
				"translate 10 0".to_string(),
				"scale 1.5".to_string(),
			]
		);
		assert_eq!(ops.last().map(String::as_str), Some("restore"));
	}

	#[test]
	fn links_are_trimmed_and_labelled() {
		let rec = draw(&state(), &HighlightState::default(), true);
		assert!(rec.has("move_to 120 100"));
		assert!(rec.has("line_to 280 100"));
		assert!(rec.has(&format!("stroke_style {LINK_DEFAULT}")));
		assert!(rec.has("text A_VERY_LONG_..."));
		assert!(rec.has("text City:Place"));
		assert!(rec.has("text Node a"));
	}

	#[test]
	fn dangling_links_are_skipped() {
		let mut s = state();
		// "gone" keeps a stale position but is no longer in the snapshot; "c" was never placed.
		s.positions.insert("gone", Position::new(500.0, 500.0));
		s.snapshot = Arc::new(GraphSnapshot::new(
			vec![
				Node::new("a", &["Person"]),
				Node::new("b", &["City"]),
				Node::new("c", &["City"]),
			],
			vec![
				Link::new("stale", "a", "gone", "KNOWS"),
				Link::new("unplaced", "c", "b", "KNOWS"),
			],
		));
		let rec = draw(&s, &HighlightState::default(), true);
		assert!(
			!rec.ops()
				.iter()
				.any(|op| op.starts_with("move_to") || op.starts_with("line_to"))
		);
		assert!(!rec.has("text KNOWS"));
		assert!(rec.has("text Node a"));
	}

	#[test]
	fn relationship_labels_can_be_hidden() {
		let rec = draw(&state(), &HighlightState::default(), false);
		assert!(!rec.has("font 12px Arial"));
		assert!(!rec.has("text A_VERY_LONG_..."));
	}

	#[test]
	fn selection_wins_over_hover() {
		let mut s = state();
		s.selection = Selection::Node("a".into());
		s.hover.node = Some("a".into());
		assert_eq!(node_look(&s, &HighlightState::default(), "a"), NodeLook::Selected);
		let rec = draw(&s, &HighlightState::default(), true);
		assert!(rec.has(&format!("fill_style {}", brighten("#9b87f5", 40))));
		assert!(rec.has("fill_style rgba(255, 87, 51, 0.3)"));
		// No pulse ring for a selected node.
		assert!(!rec.has("arc 100 100 22"));
	}

	#[test]
	fn hovered_link_glows() {
		let mut s = state();
		s.hover.link = Some("r".into());
		let rec = draw(&s, &HighlightState::default(), true);
		assert!(rec.has(&format!("stroke_style {LINK_HOVERED}")));
		assert!(rec.has(&format!("shadow {LINK_HOVERED} 8")));
	}

	#[test]
	fn active_highlight_dims_the_rest() {
		let s = state();
		let highlight = HighlightState {
			round: 3,
			nodes: HashSet::from(["a".to_string()]),
		};
		assert_eq!(node_look(&s, &highlight, "a"), NodeLook::Highlighted);
		assert_eq!(node_look(&s, &highlight, "b"), NodeLook::Dimmed);

		let rec = draw(&s, &highlight, true);
		assert!(rec.has(&format!("stroke_style {LINK_DIMMED}")));
		assert!(rec.has("stroke_style red"));
		assert!(rec.has(&format!("fill_style {}", transparent("#F57DBD", 0.2))));
	}

	#[test]
	fn connection_preview_is_dashed() {
		let mut s = state();
		s.set_connection_mode(true);
		s.pointer_down(100.0, 100.0);
		s.pointer_move(300.0, 100.0);
		assert_eq!(node_look(&s, &HighlightState::default(), "a"), NodeLook::ConnectionSource);
		let rec = draw(&s, &HighlightState::default(), true);
		assert!(rec.has("line_dash [5.0, 3.0]"));
		assert!(rec.has("arc 300 100 26"));
		assert!(rec.has(&format!("fill_style {CONNECTION_GREEN}")));
	}

	#[test]
	fn nodes_without_positions_are_skipped() {
		let mut s = CanvasState::new(800.0, 600.0);
		s.snapshot = Arc::new(GraphSnapshot::new(vec![Node::new("ghost", &[])], vec![]));
		let rec = draw(&s, &HighlightState::default(), true);
		assert!(!rec.ops().iter().any(|o| o.starts_with("arc")));
	}
}
